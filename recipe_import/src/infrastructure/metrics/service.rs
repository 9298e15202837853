// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Metrics Service
//!
//! Process-wide Prometheus registry for the worker platform: per-queue job
//! counters and in-flight gauges, per-action execution counters, and
//! pipeline duration histograms. The service also implements
//! [`PipelineObserver`] so the runtime feeds action lifecycle events into
//! the registry without the workers knowing about metrics at all.

use prometheus::{
    histogram_opts, opts, Histogram, HistogramVec, IntCounterVec, IntGaugeVec, Registry,
    TextEncoder,
};
use std::time::Duration;

use recipe_import_domain::{ActionContext, ActionName, ImportError, QueueName};

use crate::application::pipeline::PipelineObserver;

/// Prometheus metrics registry and instruments.
pub struct MetricsService {
    registry: Registry,
    jobs_total: IntCounterVec,
    jobs_in_flight: IntGaugeVec,
    actions_total: IntCounterVec,
    action_duration_seconds: HistogramVec,
    pipeline_duration_seconds: Histogram,
}

impl MetricsService {
    pub fn new() -> Result<Self, ImportError> {
        let registry = Registry::new();

        let jobs_total = IntCounterVec::new(
            opts!("recipe_import_jobs_total", "Jobs processed, by queue and outcome"),
            &["queue", "outcome"],
        )
        .map_err(|e| ImportError::internal(format!("metrics init failed: {e}")))?;

        let jobs_in_flight = IntGaugeVec::new(
            opts!("recipe_import_jobs_in_flight", "Jobs currently being processed, by queue"),
            &["queue"],
        )
        .map_err(|e| ImportError::internal(format!("metrics init failed: {e}")))?;

        let actions_total = IntCounterVec::new(
            opts!("recipe_import_actions_total", "Pipeline actions executed, by action"),
            &["action"],
        )
        .map_err(|e| ImportError::internal(format!("metrics init failed: {e}")))?;

        let action_duration_seconds = HistogramVec::new(
            histogram_opts!(
                "recipe_import_action_duration_seconds",
                "Per-action execution time in seconds"
            ),
            &["action"],
        )
        .map_err(|e| ImportError::internal(format!("metrics init failed: {e}")))?;

        let pipeline_duration_seconds = Histogram::with_opts(histogram_opts!(
            "recipe_import_pipeline_duration_seconds",
            "End-to-end pipeline execution time in seconds"
        ))
        .map_err(|e| ImportError::internal(format!("metrics init failed: {e}")))?;

        for collector in [
            Box::new(jobs_total.clone()) as Box<dyn prometheus::core::Collector>,
            Box::new(jobs_in_flight.clone()),
            Box::new(actions_total.clone()),
            Box::new(action_duration_seconds.clone()),
            Box::new(pipeline_duration_seconds.clone()),
        ] {
            registry
                .register(collector)
                .map_err(|e| ImportError::internal(format!("metrics registration failed: {e}")))?;
        }

        Ok(Self {
            registry,
            jobs_total,
            jobs_in_flight,
            actions_total,
            action_duration_seconds,
            pipeline_duration_seconds,
        })
    }

    /// Records a job entering processing.
    pub fn job_started(&self, queue: QueueName) {
        self.jobs_in_flight.with_label_values(&[queue.as_str()]).inc();
    }

    /// Records a finished job with its outcome label
    /// (`completed` / `retried` / `failed`).
    pub fn job_finished(&self, queue: QueueName, outcome: &str, elapsed: Duration) {
        self.jobs_in_flight.with_label_values(&[queue.as_str()]).dec();
        self.jobs_total.with_label_values(&[queue.as_str(), outcome]).inc();
        self.pipeline_duration_seconds.observe(elapsed.as_secs_f64());
    }

    /// Renders the registry in Prometheus text exposition format.
    pub fn gather(&self) -> Result<String, ImportError> {
        TextEncoder::new()
            .encode_to_string(&self.registry.gather())
            .map_err(|e| ImportError::internal(format!("metrics encoding failed: {e}")))
    }

    #[cfg(test)]
    fn action_count(&self, action: ActionName) -> u64 {
        self.actions_total.with_label_values(&[action.as_str()]).get()
    }
}

impl PipelineObserver for MetricsService {
    fn on_action_started(&self, _ctx: &ActionContext, _action: ActionName) {}

    fn on_action_completed(&self, _ctx: &ActionContext, action: ActionName, elapsed: Duration) {
        self.actions_total.with_label_values(&[action.as_str()]).inc();
        self.action_duration_seconds
            .with_label_values(&[action.as_str()])
            .observe(elapsed.as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recipe_import_domain::JobId;

    #[test]
    fn test_job_lifecycle_counters() {
        let metrics = MetricsService::new().unwrap();
        metrics.job_started(QueueName::Image);
        metrics.job_finished(QueueName::Image, "completed", Duration::from_millis(5));
        let text = metrics.gather().unwrap();
        assert!(text.contains("recipe_import_jobs_total"));
        assert!(text.contains("completed"));
    }

    #[test]
    fn test_observer_counts_actions() {
        let metrics = MetricsService::new().unwrap();
        let ctx = ActionContext::new(JobId::generate(), 0, QueueName::Image, "image_processing", "w");
        metrics.on_action_completed(&ctx, ActionName::SaveImage, Duration::from_millis(3));
        metrics.on_action_completed(&ctx, ActionName::SaveImage, Duration::from_millis(2));
        assert_eq!(metrics.action_count(ActionName::SaveImage), 2);
    }
}
