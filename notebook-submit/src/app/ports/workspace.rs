// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use async_trait::async_trait;

use crate::app::errors::AppResult;

#[async_trait]
/// Remote workspace filesystem that holds uploaded notebooks.
pub trait WorkspacePort: Send + Sync {
    async fn mkdirs(&self, path: &str) -> AppResult<()>;

    /// Imports `source` as a notebook at `path`, overwriting what is there.
    async fn upload_notebook(&self, path: &str, source: &str) -> AppResult<()>;

    async fn current_user_name(&self) -> AppResult<Option<String>>;
}
