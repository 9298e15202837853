// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # WebSocket Broadcast Server
//!
//! Serves the status-event stream to ingestion-side subscribers: every
//! accepted connection gets its own broadcast subscription and receives
//! events as JSON text frames. Connections are read only for close/ping
//! housekeeping; subscribers never send commands.
//!
//! A subscriber that falls behind the channel's ring buffer observes a
//! lag notice and continues from the live edge - the stream favors
//! liveness over completeness.

use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast::error::RecvError;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use recipe_import_bootstrap::CancellationToken;
use recipe_import_domain::ImportError;

use crate::infrastructure::broadcast::channel::ChannelBroadcaster;

pub struct WsBroadcastServer {
    local_addr: SocketAddr,
    accept_task: tokio::task::JoinHandle<()>,
}

impl WsBroadcastServer {
    /// Binds the listener and spawns the accept loop.
    pub async fn spawn(
        bind_addr: SocketAddr,
        broadcaster: Arc<ChannelBroadcaster>,
        token: CancellationToken,
    ) -> Result<Self, ImportError> {
        let listener = TcpListener::bind(bind_addr).await.map_err(|e| {
            ImportError::invalid_config(format!("failed to bind broadcaster on {bind_addr}: {e}"))
        })?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| ImportError::internal(format!("listener has no local addr: {e}")))?;
        info!(addr = %local_addr, "status broadcaster listening");

        let accept_token = token.clone();
        let accept_task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = accept_token.cancelled() => break,
                    accepted = listener.accept() => {
                        match accepted {
                            Ok((stream, peer)) => {
                                debug!(peer = %peer, "broadcast subscriber connecting");
                                let broadcaster = Arc::clone(&broadcaster);
                                let conn_token = accept_token.clone();
                                tokio::spawn(async move {
                                    if let Err(e) = serve_connection(stream, broadcaster, conn_token).await {
                                        debug!(peer = %peer, error = %e, "broadcast subscriber dropped");
                                    }
                                });
                            }
                            Err(e) => {
                                warn!(error = %e, "broadcast accept failed");
                            }
                        }
                    }
                }
            }
            debug!("broadcast accept loop stopped");
        });

        Ok(Self {
            local_addr,
            accept_task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops accepting; live connections close when the shared token
    /// cancels.
    pub async fn shutdown(self) {
        self.accept_task.abort();
        let _ = self.accept_task.await;
    }
}

async fn serve_connection(
    stream: TcpStream,
    broadcaster: Arc<ChannelBroadcaster>,
    token: CancellationToken,
) -> Result<(), ImportError> {
    let mut ws = tokio_tungstenite::accept_async(stream)
        .await
        .map_err(|e| ImportError::network(format!("websocket handshake failed: {e}")))?;
    let mut events = broadcaster.subscribe();

    loop {
        tokio::select! {
            _ = token.cancelled() => {
                let _ = ws.close(None).await;
                return Ok(());
            }
            event = events.recv() => {
                match event {
                    Ok(event) => {
                        let json = serde_json::to_string(&event)
                            .map_err(|e| ImportError::internal(format!("event serialization failed: {e}")))?;
                        ws.send(Message::Text(json.into()))
                            .await
                            .map_err(|e| ImportError::network(format!("websocket send failed: {e}")))?;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "broadcast subscriber lagged");
                    }
                    Err(RecvError::Closed) => {
                        let _ = ws.close(None).await;
                        return Ok(());
                    }
                }
            }
            incoming = ws.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => return Ok(()),
                    Some(Ok(_)) => {} // pings and stray frames are ignored
                    Some(Err(e)) => {
                        return Err(ImportError::network(format!("websocket receive failed: {e}")));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recipe_import_bootstrap::ShutdownCoordinator;
    use recipe_import_domain::services::StatusBroadcaster;
    use recipe_import_domain::{EventContext, ImportId, ImportStatus, StatusEvent};

    #[tokio::test]
    async fn test_subscriber_receives_emitted_event() {
        let coordinator = ShutdownCoordinator::default();
        let broadcaster = Arc::new(ChannelBroadcaster::new());
        let server = WsBroadcastServer::spawn(
            "127.0.0.1:0".parse().unwrap(),
            Arc::clone(&broadcaster),
            coordinator.token(),
        )
        .await
        .unwrap();

        let url = format!("ws://{}", server.local_addr());
        let (mut client, _) = tokio_tungstenite::connect_async(url).await.unwrap();

        // Allow the server side to finish its subscription setup.
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        let event = StatusEvent::new(
            ImportId::new("i1").unwrap(),
            None,
            ImportStatus::Processing,
            EventContext::ImageProcessing,
            "image processed",
        );
        broadcaster.emit(event).await.unwrap();

        let frame = tokio::time::timeout(std::time::Duration::from_secs(2), client.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        let text = frame.into_text().unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["context"], "image_processing");
        assert_eq!(value["status"], "PROCESSING");

        coordinator.initiate_shutdown();
        server.shutdown().await;
    }
}
