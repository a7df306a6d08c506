// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use serde_json::{Map, Value};

use crate::app::errors::{AppError, AppResult};
use crate::app::strategies::SubmissionContext;
use crate::app::types::{ClusterSettings, ParsedModel};

/// Runs the notebook on an ephemeral cluster created for this run only.
#[derive(Debug, Clone, PartialEq)]
pub struct JobClusterStrategy {
    cluster_spec: Map<String, Value>,
}

impl JobClusterStrategy {
    pub fn prepare(model: &ParsedModel) -> AppResult<Self> {
        let cluster_spec = model.config.job_cluster_config().cloned().ok_or_else(|| {
            AppError::invalid_config(
                "`job_cluster_config` is required for the `job_cluster` submission method",
            )
        })?;
        Ok(Self { cluster_spec })
    }

    pub async fn submit(
        &self,
        ctx: &SubmissionContext<'_>,
        model: &ParsedModel,
        code: &str,
    ) -> AppResult<()> {
        ctx.submit_through_notebook(
            model,
            code,
            &ClusterSettings::New(self.cluster_spec.clone()),
            model.config.access_control_list.clone(),
        )
        .await
    }
}
