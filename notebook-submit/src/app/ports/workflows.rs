// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use async_trait::async_trait;

use crate::app::errors::AppResult;
use crate::app::types::{JobSettings, JobSummary};

#[async_trait]
/// Named, persistent jobs.
pub trait WorkflowsPort: Send + Sync {
    async fn search_by_name(&self, name: &str) -> AppResult<Vec<JobSummary>>;
    async fn create_job(&self, settings: &JobSettings) -> AppResult<String>;
    /// Replaces the whole job definition.
    async fn reset_job(&self, job_id: &str, settings: &JobSettings) -> AppResult<()>;
    async fn run_now(&self, job_id: &str) -> AppResult<String>;
}
