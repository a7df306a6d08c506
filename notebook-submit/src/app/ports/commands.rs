// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use async_trait::async_trait;

use crate::app::errors::AppResult;
use crate::app::types::{CommandExecution, CommandSnapshot};

#[async_trait]
/// Interactive execution contexts on an existing cluster.
pub trait CommandsPort: Send + Sync {
    async fn create_context(&self, cluster_id: &str) -> AppResult<String>;

    async fn execute(
        &self,
        cluster_id: &str,
        context_id: &str,
        source: &str,
    ) -> AppResult<CommandExecution>;

    async fn poll_command(&self, command: &CommandExecution) -> AppResult<CommandSnapshot>;

    async fn cancel_command(&self, command: &CommandExecution) -> AppResult<()>;

    async fn destroy_context(&self, cluster_id: &str, context_id: &str) -> AppResult<()>;
}
