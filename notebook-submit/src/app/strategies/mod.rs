// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

//! The four ways a model reaches remote compute. Each strategy checks its
//! prerequisites up front so that a bad config never issues a remote call.

mod all_purpose;
mod job_cluster;
mod serverless;
mod workflow;

use std::time::Duration;

pub use all_purpose::AllPurposeStrategy;
pub use job_cluster::JobClusterStrategy;
pub use serverless::ServerlessStrategy;
pub use workflow::WorkflowStrategy;

use crate::app::errors::AppResult;
use crate::app::ports::{ControlPlane, CredentialsPort, TelemetryEvent, TelemetryPort};
use crate::app::registry::RunRegistry;
use crate::app::services::{job_spec, paths, polling};
use crate::app::types::{
    AclEntry, ClusterSettings, ParsedModel, PollSettings, RunHandle, SubmissionMethod,
};

#[derive(Debug, Clone)]
pub enum Strategy {
    JobCluster(JobClusterStrategy),
    AllPurpose(AllPurposeStrategy),
    Serverless(ServerlessStrategy),
    Workflow(WorkflowStrategy),
}

impl Strategy {
    /// Resolves everything `method` needs from the model and credentials.
    pub fn prepare(
        method: SubmissionMethod,
        model: &ParsedModel,
        credentials: &dyn CredentialsPort,
    ) -> AppResult<Self> {
        Ok(match method {
            SubmissionMethod::JobCluster => Strategy::JobCluster(JobClusterStrategy::prepare(model)?),
            SubmissionMethod::AllPurposeCluster => {
                Strategy::AllPurpose(AllPurposeStrategy::prepare(model, credentials)?)
            }
            SubmissionMethod::Serverless => Strategy::Serverless(ServerlessStrategy),
            SubmissionMethod::WorkflowJob => Strategy::Workflow(WorkflowStrategy::prepare(model)?),
        })
    }

    pub fn method(&self) -> SubmissionMethod {
        match self {
            Strategy::JobCluster(_) => SubmissionMethod::JobCluster,
            Strategy::AllPurpose(_) => SubmissionMethod::AllPurposeCluster,
            Strategy::Serverless(_) => SubmissionMethod::Serverless,
            Strategy::Workflow(_) => SubmissionMethod::WorkflowJob,
        }
    }

    pub async fn submit(
        &self,
        ctx: &SubmissionContext<'_>,
        model: &ParsedModel,
        code: &str,
    ) -> AppResult<()> {
        match self {
            Strategy::JobCluster(strategy) => strategy.submit(ctx, model, code).await,
            Strategy::AllPurpose(strategy) => strategy.submit(ctx, model, code).await,
            Strategy::Serverless(strategy) => strategy.submit(ctx, model, code).await,
            Strategy::Workflow(strategy) => strategy.submit(ctx, model, code).await,
        }
    }
}

/// Collaborators shared by every strategy for one submission.
pub struct SubmissionContext<'a> {
    pub remote: &'a ControlPlane,
    pub registry: &'a RunRegistry,
    pub telemetry: &'a dyn TelemetryPort,
    pub poll: &'a PollSettings,
    pub timeout: Duration,
}

impl SubmissionContext<'_> {
    pub(crate) fn emit(&self, name: &'static str, model: &ParsedModel, event: TelemetryEvent) {
        self.telemetry.event(
            name,
            TelemetryEvent {
                model: Some(model.label()),
                ..event
            },
        );
    }

    /// Uploads `code` into the model folder and submits it as a one-off
    /// notebook run, then waits for the run.
    pub(crate) async fn submit_through_notebook(
        &self,
        model: &ParsedModel,
        code: &str,
        cluster: &ClusterSettings,
        access_control_list: Vec<AclEntry>,
    ) -> AppResult<()> {
        let folder = paths::create_model_dir(self.remote.workspace.as_ref(), model).await?;
        let notebook_path = format!("{folder}{}", model.identifier);
        self.remote
            .workspace
            .upload_notebook(&notebook_path, code)
            .await?;
        tracing::debug!("uploaded notebook to {notebook_path}");

        let submission = job_spec::notebook_run(
            paths::run_name(model),
            &notebook_path,
            cluster,
            &model.config,
            access_control_list,
        );
        let run_id = self.remote.job_runs.submit_run(&submission).await?;
        tracing::info!("submitted run {run_id} as {}", submission.run_name);
        self.emit(
            "run.submitted",
            model,
            TelemetryEvent {
                run_id: Some(run_id.clone()),
                ..TelemetryEvent::default()
            },
        );

        self.await_run(model, &run_id).await
    }

    /// Tracks `run_id` for the whole wait so an outside sweep can cancel it.
    pub(crate) async fn await_run(&self, model: &ParsedModel, run_id: &str) -> AppResult<()> {
        let _registration = self.registry.track(RunHandle::Run(run_id.to_string()));
        polling::wait_for_run(
            self.remote.job_runs.as_ref(),
            run_id,
            self.poll,
            self.timeout,
        )
        .await?;
        self.emit(
            "run.finished",
            model,
            TelemetryEvent {
                run_id: Some(run_id.to_string()),
                ..TelemetryEvent::default()
            },
        );
        Ok(())
    }
}
