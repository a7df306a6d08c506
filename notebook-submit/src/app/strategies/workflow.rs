// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use crate::app::errors::{AppError, AppResult};
use crate::app::ports::TelemetryEvent;
use crate::app::services::{acl, job_spec, paths};
use crate::app::strategies::SubmissionContext;
use crate::app::types::ParsedModel;

/// Keeps one named workflow job per model and observes one run of it.
///
/// The job is reconciled on every submission: an explicit `existing_job_id`
/// is reused as is, otherwise the job is looked up by name and created when
/// missing. A reused job has its whole definition replaced, so fields edited
/// outside this crate (tags, schedules) do not survive the reset.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowStrategy {
    notebook_path: String,
    plan: job_spec::WorkflowPlan,
}

impl WorkflowStrategy {
    pub fn prepare(model: &ParsedModel) -> AppResult<Self> {
        let config = model
            .config
            .workflow_job_config
            .as_ref()
            .ok_or_else(|| {
                AppError::invalid_config(
                    "`workflow_job_config` is required for the `workflow_job` submission method",
                )
            })?;
        if config.timeout_seconds.is_some_and(|secs| secs <= 0) {
            return Err(AppError::invalid_config(
                "`workflow_job_config.timeout_seconds` must be a positive integer",
            ));
        }

        let notebook_path = paths::workflow_notebook_path(model);
        let plan = job_spec::build_workflow_plan(
            config,
            model.config.job_cluster_config(),
            paths::default_job_name(model),
            &notebook_path,
        )?;
        Ok(Self {
            notebook_path,
            plan,
        })
    }

    pub fn job_name(&self) -> &str {
        &self.plan.settings.name
    }

    pub async fn submit(
        &self,
        ctx: &SubmissionContext<'_>,
        model: &ParsedModel,
        code: &str,
    ) -> AppResult<()> {
        let workspace = ctx.remote.workspace.as_ref();
        workspace.mkdirs(&paths::workflow_notebook_dir(model)).await?;
        workspace.upload_notebook(&self.notebook_path, code).await?;
        tracing::debug!("uploaded workflow notebook to {}", self.notebook_path);

        let job_id = self.reconcile_job(ctx, model).await?;
        self.apply_permissions(ctx, &job_id).await?;
        let run_id = self.active_or_new_run(ctx, &job_id).await?;

        ctx.emit(
            "run.submitted",
            model,
            TelemetryEvent {
                run_id: Some(run_id.clone()),
                job_id: Some(job_id),
                ..TelemetryEvent::default()
            },
        );
        ctx.await_run(model, &run_id).await
    }

    async fn reconcile_job(
        &self,
        ctx: &SubmissionContext<'_>,
        model: &ParsedModel,
    ) -> AppResult<String> {
        let workflows = ctx.remote.workflows.as_ref();
        let settings = &self.plan.settings;

        let existing = match &self.plan.existing_job_id {
            Some(job_id) => Some(job_id.clone()),
            None => {
                let mut matches = workflows.search_by_name(&settings.name).await?;
                if matches.len() > 1 {
                    return Err(AppError::ambiguous_job(format!(
                        "Multiple jobs found with name {}. Use a unique job name or \
                         specify `existing_job_id` in `workflow_job_config`",
                        settings.name
                    )));
                }
                matches.pop().map(|job| job.job_id)
            }
        };

        match existing {
            Some(job_id) => {
                workflows.reset_job(&job_id, settings).await?;
                tracing::info!("reset workflow job {job_id} ({})", settings.name);
                ctx.emit(
                    "workflow.job_reset",
                    model,
                    TelemetryEvent {
                        job_id: Some(job_id.clone()),
                        ..TelemetryEvent::default()
                    },
                );
                Ok(job_id)
            }
            None => {
                let job_id = workflows.create_job(settings).await?;
                tracing::info!("created workflow job {job_id} ({})", settings.name);
                ctx.emit(
                    "workflow.job_created",
                    model,
                    TelemetryEvent {
                        job_id: Some(job_id.clone()),
                        ..TelemetryEvent::default()
                    },
                );
                Ok(job_id)
            }
        }
    }

    async fn apply_permissions(&self, ctx: &SubmissionContext<'_>, job_id: &str) -> AppResult<()> {
        let permissions = ctx.remote.permissions.as_ref();
        let current = permissions.get_permissions(job_id).await?;
        let owner = acl::current_owner(&current).ok_or_else(|| {
            AppError::remote("error getting current owner for workflow job")
                .with_context(format!("job {job_id}: {current:?}"))
        })?;
        let entries = acl::build_job_acl(owner, &self.plan.grants);
        tracing::debug!("applying {} permission entries to job {job_id}", entries.len());
        permissions.put_permissions(job_id, &entries).await
    }

    /// An active run is observed rather than triggering a second one.
    async fn active_or_new_run(&self, ctx: &SubmissionContext<'_>, job_id: &str) -> AppResult<String> {
        let active = ctx.remote.job_runs.list_active_runs(job_id).await?;
        if let Some(run_id) = active.into_iter().next() {
            tracing::info!("job {job_id} already has active run {run_id}; waiting on it");
            return Ok(run_id);
        }
        ctx.remote.workflows.run_now(job_id).await
    }
}
