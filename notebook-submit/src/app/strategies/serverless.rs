// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use crate::app::errors::AppResult;
use crate::app::strategies::SubmissionContext;
use crate::app::types::{ClusterSettings, ParsedModel};

/// Submits with no cluster section; the remote picks serverless compute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServerlessStrategy;

impl ServerlessStrategy {
    pub async fn submit(
        &self,
        ctx: &SubmissionContext<'_>,
        model: &ParsedModel,
        code: &str,
    ) -> AppResult<()> {
        ctx.submit_through_notebook(model, code, &ClusterSettings::Serverless, Vec::new())
            .await
    }
}
