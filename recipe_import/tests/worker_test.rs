// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Worker behavior under failure: retry with backoff, terminal failure
//! with the failure hook, and health-gated admission.

mod common;

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::{wait_until, DepsBuilder};
use recipe_import::application::pipeline::{
    Action, ActionFactory, PipelineRuntime, WorkerDeps,
};
use recipe_import::application::services::HealthMonitor;
use recipe_import::application::workers::{
    BaseWorker, ManagedWorker, PipelineBuilder, TerminalFailureHandler,
};
use recipe_import::infrastructure::queue::InMemoryJobQueue;
use recipe_import_bootstrap::ShutdownCoordinator;
use recipe_import_domain::services::{HealthProbe, JobQueue};
use recipe_import_domain::{
    ActionContext, ActionName, ImportError, PushOptions, QueueName,
};

type Payload = String;

/// Action that fails with the given error until `succeed_after` attempts
/// have been observed.
struct FlakyAction {
    attempts: Arc<AtomicUsize>,
    succeed_after: usize,
    error: ImportError,
}

#[async_trait]
impl Action<Payload> for FlakyAction {
    fn name(&self) -> ActionName {
        ActionName::ProcessImage
    }

    async fn execute(
        &self,
        data: Payload,
        _deps: &WorkerDeps,
        _ctx: &ActionContext,
    ) -> Result<Payload, ImportError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.succeed_after {
            Err(self.error.clone())
        } else {
            Ok(data)
        }
    }
}

struct RecordingFailureHook {
    invoked: Arc<Mutex<Vec<(Payload, String)>>>,
}

#[async_trait]
impl TerminalFailureHandler<Payload> for RecordingFailureHook {
    async fn on_terminal_failure(
        &self,
        data: Payload,
        error: &ImportError,
        _deps: &WorkerDeps,
        _ctx: &ActionContext,
    ) {
        self.invoked.lock().push((data, error.root_message()));
    }
}

struct TogglingProbe {
    healthy: Arc<AtomicBool>,
}

#[async_trait]
impl HealthProbe for TogglingProbe {
    fn name(&self) -> &str {
        "toggling"
    }

    async fn check(&self) -> Result<(), ImportError> {
        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ImportError::network("probe down"))
        }
    }
}

struct WorkerRig {
    worker: BaseWorker<Payload>,
    queue: Arc<InMemoryJobQueue<Payload>>,
    attempts: Arc<AtomicUsize>,
    failures: Arc<Mutex<Vec<(Payload, String)>>>,
    healthy: Arc<AtomicBool>,
}

async fn build_rig(succeed_after: usize, error: ImportError) -> WorkerRig {
    // Shrink backoff so retry tests settle quickly.
    let config = recipe_import::AppConfig {
        database_path: ":memory:".to_string(),
        base_backoff_ms: 10,
        max_backoff_ms: 50,
        ..recipe_import::AppConfig::default()
    };
    let deps = DepsBuilder::new().with_config(config).build().await;
    let queue = Arc::new(InMemoryJobQueue::<Payload>::new(QueueName::Image));
    let attempts = Arc::new(AtomicUsize::new(0));
    let failures = Arc::new(Mutex::new(Vec::new()));
    let healthy = Arc::new(AtomicBool::new(true));

    let factory = Arc::new(ActionFactory::<Payload>::new());
    let action_attempts = Arc::clone(&attempts);
    factory
        .register(
            ActionName::ProcessImage,
            Arc::new(move |_| {
                Arc::new(FlakyAction {
                    attempts: Arc::clone(&action_attempts),
                    succeed_after,
                    error: error.clone(),
                })
            }),
        )
        .unwrap();

    let builder: PipelineBuilder<Payload> = Arc::new(|_data, _ctx, factory, deps| {
        Ok(vec![factory.create(ActionName::ProcessImage, deps)?])
    });

    let health = Arc::new(HealthMonitor::with_interval(
        vec![Arc::new(TogglingProbe {
            healthy: Arc::clone(&healthy),
        })],
        Duration::from_millis(1),
    ));

    let worker = BaseWorker::new(
        "test-image-worker",
        "image_processing",
        Arc::clone(&queue) as Arc<dyn JobQueue<Payload>>,
        deps,
        factory,
        builder,
        PipelineRuntime::new(),
        health,
        ShutdownCoordinator::new(Duration::from_secs(5)),
        2,
    )
    .with_failure_handler(Arc::new(RecordingFailureHook {
        invoked: Arc::clone(&failures),
    }));

    WorkerRig {
        worker,
        queue,
        attempts,
        failures,
        healthy,
    }
}

#[tokio::test]
async fn test_retryable_failure_is_rescheduled_until_success() {
    let rig = build_rig(2, ImportError::timeout("slow store")).await;
    rig.worker.start().await.unwrap();
    rig.queue.push("job".to_string(), PushOptions::default()).await.unwrap();

    let done = wait_until(Duration::from_secs(10), || {
        rig.attempts.load(Ordering::SeqCst) >= 3
    })
    .await;
    assert!(done, "job was not retried to success");
    assert!(rig.failures.lock().is_empty());
    rig.worker.stop().await.unwrap();
}

#[tokio::test]
async fn test_non_retryable_failure_invokes_failure_hook_once() {
    let rig = build_rig(usize::MAX, ImportError::validation("bad payload")).await;
    rig.worker.start().await.unwrap();
    rig.queue.push("doomed".to_string(), PushOptions::default()).await.unwrap();

    let failed = wait_until(Duration::from_secs(5), || !rig.failures.lock().is_empty()).await;
    assert!(failed, "failure hook never ran");

    tokio::time::sleep(Duration::from_millis(50)).await;
    let failures = rig.failures.lock().clone();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, "doomed");
    assert!(failures[0].1.contains("bad payload"));
    // No retry happened: the action ran exactly once.
    assert_eq!(rig.attempts.load(Ordering::SeqCst), 1);
    rig.worker.stop().await.unwrap();
}

#[tokio::test]
async fn test_unhealthy_process_bounces_jobs_without_failing_them() {
    let rig = build_rig(0, ImportError::timeout("unused")).await;
    rig.healthy.store(false, Ordering::SeqCst);
    rig.worker.start().await.unwrap();
    rig.queue.push("gated".to_string(), PushOptions::default()).await.unwrap();

    // The job is bounced by the health gate: the action never runs and
    // nothing lands in the failure hook.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(rig.attempts.load(Ordering::SeqCst), 0);
    assert!(rig.failures.lock().is_empty());

    // Recovery: once probes pass again, the rescheduled job completes.
    rig.healthy.store(true, Ordering::SeqCst);
    let done = wait_until(Duration::from_secs(10), || {
        rig.attempts.load(Ordering::SeqCst) >= 1
    })
    .await;
    assert!(done, "job did not run after recovery");
    rig.worker.stop().await.unwrap();
}

#[tokio::test]
async fn test_double_start_is_rejected() {
    let rig = build_rig(0, ImportError::timeout("unused")).await;
    rig.worker.start().await.unwrap();
    assert!(rig.worker.start().await.is_err());
    rig.worker.stop().await.unwrap();
    // Stop is idempotent.
    rig.worker.stop().await.unwrap();
}
