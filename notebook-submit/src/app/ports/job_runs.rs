// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use async_trait::async_trait;

use crate::app::errors::AppResult;
use crate::app::types::{RunOutput, RunStatus, RunSubmission};

#[async_trait]
/// One-off and job-triggered runs.
pub trait JobRunsPort: Send + Sync {
    async fn submit_run(&self, submission: &RunSubmission) -> AppResult<String>;

    /// Single status check; never blocks until completion.
    async fn poll_run(&self, run_id: &str) -> AppResult<RunStatus>;

    async fn get_run_output(&self, task_run_id: &str) -> AppResult<RunOutput>;

    async fn list_active_runs(&self, job_id: &str) -> AppResult<Vec<String>>;

    async fn cancel_run(&self, run_id: &str) -> AppResult<()>;
}
