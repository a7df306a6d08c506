// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::sync::Arc;

use crate::app::errors::{AppError, AppResult};
use crate::app::ports::{CommandsPort, CredentialsPort, TelemetryEvent};
use crate::app::services::{paths, polling};
use crate::app::strategies::SubmissionContext;
use crate::app::types::{ClusterSettings, ParsedModel, RunHandle};

/// Runs on an existing interactive cluster, either as a notebook job or
/// directly inside a command execution context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllPurposeStrategy {
    cluster_id: String,
    create_notebook: bool,
}

impl AllPurposeStrategy {
    /// The cluster comes from `cluster_id`, else the model's `http_path`,
    /// else the connection's default `http_path`.
    pub fn prepare(model: &ParsedModel, credentials: &dyn CredentialsPort) -> AppResult<Self> {
        let explicit = model
            .config
            .cluster_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string);
        let cluster_id = explicit
            .or_else(|| {
                model
                    .config
                    .http_path
                    .as_deref()
                    .and_then(paths::cluster_id_from_http_path)
            })
            .or_else(|| {
                credentials
                    .http_path()
                    .as_deref()
                    .and_then(paths::cluster_id_from_http_path)
            })
            .ok_or_else(|| {
                AppError::invalid_config(
                    "`http_path` or `cluster_id` of an all-purpose cluster is required \
                     for the `all_purpose_cluster` submission method",
                )
            })?;
        Ok(Self {
            cluster_id,
            create_notebook: model.config.create_notebook,
        })
    }

    pub fn cluster_id(&self) -> &str {
        &self.cluster_id
    }

    pub async fn submit(
        &self,
        ctx: &SubmissionContext<'_>,
        model: &ParsedModel,
        code: &str,
    ) -> AppResult<()> {
        if self.create_notebook {
            return ctx
                .submit_through_notebook(
                    model,
                    code,
                    &ClusterSettings::Existing(self.cluster_id.clone()),
                    model.config.access_control_list.clone(),
                )
                .await;
        }

        polling::ensure_cluster_running(ctx.remote.clusters.as_ref(), &self.cluster_id, ctx.poll)
            .await?;
        let context_id = ctx.remote.commands.create_context(&self.cluster_id).await?;
        tracing::debug!("created context {context_id} on cluster {}", self.cluster_id);
        let lease = ContextLease::new(ctx.remote.commands.clone(), &self.cluster_id, context_id);

        let outcome = self
            .run_command(ctx, model, lease.context_id(), code)
            .await;
        let destroyed = lease.release().await;

        // The command's own failure takes precedence over a cleanup failure.
        match (outcome, destroyed) {
            (Err(err), Err(cleanup)) => {
                tracing::warn!(
                    "failed to destroy context on cluster {}: {cleanup}",
                    self.cluster_id
                );
                Err(err)
            }
            (Err(err), Ok(())) => Err(err),
            (Ok(()), destroyed) => destroyed,
        }
    }

    async fn run_command(
        &self,
        ctx: &SubmissionContext<'_>,
        model: &ParsedModel,
        context_id: &str,
        code: &str,
    ) -> AppResult<()> {
        let command = ctx
            .remote
            .commands
            .execute(&self.cluster_id, context_id, code)
            .await?;
        tracing::info!(
            "executing command {} on cluster {}",
            command.command_id,
            self.cluster_id
        );
        ctx.emit(
            "command.executed",
            model,
            TelemetryEvent {
                cluster_id: Some(self.cluster_id.clone()),
                ..TelemetryEvent::default()
            },
        );

        let _registration = ctx.registry.track(RunHandle::Command(command.clone()));
        polling::wait_for_command(ctx.remote.commands.as_ref(), &command, ctx.poll, ctx.timeout)
            .await
    }
}

/// An execution context that must be destroyed. When the owning future is
/// dropped before `release`, destruction is handed to the runtime.
struct ContextLease {
    commands: Arc<dyn CommandsPort>,
    cluster_id: String,
    context_id: String,
    released: bool,
}

impl ContextLease {
    fn new(commands: Arc<dyn CommandsPort>, cluster_id: &str, context_id: String) -> Self {
        Self {
            commands,
            cluster_id: cluster_id.to_string(),
            context_id,
            released: false,
        }
    }

    fn context_id(&self) -> &str {
        &self.context_id
    }

    async fn release(mut self) -> AppResult<()> {
        self.released = true;
        self.commands
            .destroy_context(&self.cluster_id, &self.context_id)
            .await
    }
}

impl Drop for ContextLease {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let commands = self.commands.clone();
        let cluster_id = std::mem::take(&mut self.cluster_id);
        let context_id = std::mem::take(&mut self.context_id);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(err) = commands.destroy_context(&cluster_id, &context_id).await {
                        tracing::warn!(
                            "failed to destroy context {context_id} on cluster {cluster_id}: {err}"
                        );
                    }
                });
            }
            Err(_) => tracing::warn!(
                "context {context_id} on cluster {cluster_id} left open; no runtime to destroy it"
            ),
        }
    }
}
