// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Health Monitor
//!
//! Aggregates liveness probes (database ping, queue-backend ping, optional
//! object-store reachability) and gates job admission on the result.
//!
//! Workers consult `is_healthy` before building a pipeline; an unhealthy
//! process rejects the job with a retryable `ServiceUnhealthy` error so it
//! returns to the queue rather than being marked failed.
//!
//! Probe results are cached for a short interval - admission checks happen
//! per job and must not turn into a ping storm against the database.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use recipe_import_domain::services::HealthProbe;

/// Cache interval between probe sweeps.
const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(5);

struct CachedVerdict {
    healthy: bool,
    checked_at: Instant,
}

/// Singleton per process; shared by all workers.
pub struct HealthMonitor {
    probes: Vec<Arc<dyn HealthProbe>>,
    probe_interval: Duration,
    cache: Mutex<Option<CachedVerdict>>,
}

impl HealthMonitor {
    pub fn new(probes: Vec<Arc<dyn HealthProbe>>) -> Self {
        Self::with_interval(probes, DEFAULT_PROBE_INTERVAL)
    }

    pub fn with_interval(probes: Vec<Arc<dyn HealthProbe>>, probe_interval: Duration) -> Self {
        Self {
            probes,
            probe_interval,
            cache: Mutex::new(None),
        }
    }

    /// Whether every subordinate probe currently passes.
    ///
    /// Uses the cached verdict when it is fresh enough; otherwise runs all
    /// probes sequentially and caches the aggregate.
    pub async fn is_healthy(&self) -> bool {
        if let Some(verdict) = self.cached_verdict() {
            return verdict;
        }
        let healthy = self.run_probes().await;
        *self.cache.lock() = Some(CachedVerdict {
            healthy,
            checked_at: Instant::now(),
        });
        healthy
    }

    /// Runs all probes immediately, bypassing and refreshing the cache.
    pub async fn check_now(&self) -> bool {
        let healthy = self.run_probes().await;
        *self.cache.lock() = Some(CachedVerdict {
            healthy,
            checked_at: Instant::now(),
        });
        healthy
    }

    fn cached_verdict(&self) -> Option<bool> {
        let cache = self.cache.lock();
        cache
            .as_ref()
            .filter(|v| v.checked_at.elapsed() < self.probe_interval)
            .map(|v| v.healthy)
    }

    async fn run_probes(&self) -> bool {
        let mut healthy = true;
        for probe in &self.probes {
            match probe.check().await {
                Ok(()) => debug!(probe = probe.name(), "health probe passed"),
                Err(e) => {
                    warn!(probe = probe.name(), error = %e, "health probe failed");
                    healthy = false;
                }
            }
        }
        healthy
    }
}

/// Probe adapter over a queue backend's `ping`.
pub struct QueuePingProbe<P>
where
    P: Send + 'static,
{
    label: String,
    queue: Arc<dyn recipe_import_domain::services::JobQueue<P>>,
}

impl<P> QueuePingProbe<P>
where
    P: Send + 'static,
{
    pub fn new(queue: Arc<dyn recipe_import_domain::services::JobQueue<P>>) -> Self {
        Self {
            label: format!("queue:{}", queue.name()),
            queue,
        }
    }
}

#[async_trait::async_trait]
impl<P> HealthProbe for QueuePingProbe<P>
where
    P: Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.label
    }

    async fn check(&self) -> Result<(), recipe_import_domain::ImportError> {
        self.queue.ping().await
    }
}

/// Probe adapter over the object store's reachability check.
pub struct ObjectStoreProbe {
    store: Arc<dyn recipe_import_domain::services::ObjectStore>,
}

impl ObjectStoreProbe {
    pub fn new(store: Arc<dyn recipe_import_domain::services::ObjectStore>) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl HealthProbe for ObjectStoreProbe {
    fn name(&self) -> &str {
        "object_store"
    }

    async fn check(&self) -> Result<(), recipe_import_domain::ImportError> {
        self.store.ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use recipe_import_domain::ImportError;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct StubProbe {
        name: &'static str,
        healthy: Arc<AtomicBool>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl HealthProbe for StubProbe {
        fn name(&self) -> &str {
            self.name
        }

        async fn check(&self) -> Result<(), ImportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.healthy.load(Ordering::SeqCst) {
                Ok(())
            } else {
                Err(ImportError::network("probe down"))
            }
        }
    }

    fn probe(name: &'static str) -> (Arc<StubProbe>, Arc<AtomicBool>, Arc<AtomicUsize>) {
        let healthy = Arc::new(AtomicBool::new(true));
        let calls = Arc::new(AtomicUsize::new(0));
        let probe = Arc::new(StubProbe {
            name,
            healthy: Arc::clone(&healthy),
            calls: Arc::clone(&calls),
        });
        (probe, healthy, calls)
    }

    #[tokio::test]
    async fn test_all_probes_passing_is_healthy() {
        let (db, _, _) = probe("database");
        let (queue, _, _) = probe("queue");
        let monitor = HealthMonitor::new(vec![db, queue]);
        assert!(monitor.is_healthy().await);
    }

    #[tokio::test]
    async fn test_one_failing_probe_is_unhealthy() {
        let (db, _, _) = probe("database");
        let (queue, queue_healthy, _) = probe("queue");
        queue_healthy.store(false, Ordering::SeqCst);
        let monitor = HealthMonitor::new(vec![db, queue]);
        assert!(!monitor.is_healthy().await);
    }

    #[tokio::test]
    async fn test_verdict_is_cached_within_interval() {
        let (db, _, calls) = probe("database");
        let monitor = HealthMonitor::with_interval(vec![db], Duration::from_secs(60));
        assert!(monitor.is_healthy().await);
        assert!(monitor.is_healthy().await);
        assert!(monitor.is_healthy().await);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_check_now_refreshes_cache() {
        let (db, healthy, calls) = probe("database");
        let monitor = HealthMonitor::with_interval(vec![db], Duration::from_secs(60));
        assert!(monitor.is_healthy().await);
        healthy.store(false, Ordering::SeqCst);
        assert!(!monitor.check_now().await);
        // Cached unhealthy verdict now serves is_healthy.
        assert!(!monitor.is_healthy().await);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_no_probes_is_vacuously_healthy() {
        let monitor = HealthMonitor::new(vec![]);
        assert!(monitor.is_healthy().await);
    }
}
