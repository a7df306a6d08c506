// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::sync::Arc;
use std::time::Duration;

use crate::app::errors::{AppError, AppErrorKind, AppResult};
use crate::app::ports::{ControlPlane, CredentialsPort, TelemetryEvent, TelemetryPort};
use crate::app::registry::{CancelSummary, RunRegistry};
use crate::app::strategies::{Strategy, SubmissionContext};
use crate::app::types::{ParsedModel, PollSettings, SubmissionMethod};
use crate::config::Settings;

#[derive(Clone)]
pub struct Submitter {
    pub(crate) remote: ControlPlane,
    pub(crate) credentials: Arc<dyn CredentialsPort>,
    pub(crate) registry: Arc<RunRegistry>,
    pub(crate) telemetry: Arc<dyn TelemetryPort>,
    pub(crate) poll: PollSettings,
    pub(crate) default_timeout_secs: i64,
}

impl Submitter {
    pub fn new(
        remote: ControlPlane,
        credentials: Arc<dyn CredentialsPort>,
        registry: Arc<RunRegistry>,
        telemetry: Arc<dyn TelemetryPort>,
        settings: &Settings,
    ) -> Self {
        Self {
            remote,
            credentials,
            registry,
            telemetry,
            poll: settings.poll_settings(),
            default_timeout_secs: settings.default_timeout_secs,
        }
    }

    pub fn registry(&self) -> &Arc<RunRegistry> {
        &self.registry
    }

    /// Validates the model, then submits `code` with the selected method and
    /// waits for it to finish. Nothing reaches the remote until every check
    /// has passed.
    pub async fn submit(&self, model: &ParsedModel, code: &str) -> AppResult<()> {
        let method = submission_method(model)?;
        let timeout = self.resolve_timeout(model)?;
        self.credentials.validate().map_err(|err| match err.kind() {
            AppErrorKind::Unauthenticated => err,
            _ => AppError::unauthenticated(err.message().to_string()),
        })?;
        let strategy = Strategy::prepare(method, model, self.credentials.as_ref())?;

        tracing::info!("submitting {} with {}", model.label(), strategy.method());
        self.telemetry.event(
            "submission.started",
            TelemetryEvent {
                model: Some(model.label()),
                method: Some(method.as_str()),
                ..TelemetryEvent::default()
            },
        );

        let ctx = SubmissionContext {
            remote: &self.remote,
            registry: &self.registry,
            telemetry: self.telemetry.as_ref(),
            poll: &self.poll,
            timeout,
        };
        strategy
            .submit(&ctx, model, code)
            .await
            .map_err(|err| match err.context() {
                Some(_) => err,
                None => err.with_context(model.label()),
            })
    }

    /// Cancels everything currently tracked, typically on shutdown.
    pub async fn cancel_all(&self) -> CancelSummary {
        let summary = self
            .registry
            .cancel_all(
                self.remote.job_runs.as_ref(),
                self.remote.commands.as_ref(),
            )
            .await;
        tracing::info!(
            "cancellation sweep finished: {} cancelled, {} failed",
            summary.cancelled,
            summary.failed
        );
        self.telemetry
            .event("registry.cancelled", TelemetryEvent::default());
        summary
    }

    fn resolve_timeout(&self, model: &ParsedModel) -> AppResult<Duration> {
        let secs = model.config.timeout.unwrap_or(self.default_timeout_secs);
        if secs <= 0 {
            return Err(AppError::invalid_config(
                "Timeout must be a positive integer",
            ));
        }
        Ok(Duration::from_secs(secs.unsigned_abs()))
    }
}

/// Explicit method wins; otherwise a cluster spec implies a job cluster.
fn submission_method(model: &ParsedModel) -> AppResult<SubmissionMethod> {
    match model.config.submission_method.as_deref() {
        Some(name) => name.parse().map_err(AppError::invalid_config),
        None if model.config.job_cluster_config().is_some() => Ok(SubmissionMethod::JobCluster),
        None => Ok(SubmissionMethod::AllPurposeCluster),
    }
}
