// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use async_trait::async_trait;

use crate::app::errors::AppResult;
use crate::app::types::ClusterState;

#[async_trait]
pub trait ClustersPort: Send + Sync {
    async fn cluster_state(&self, cluster_id: &str) -> AppResult<ClusterState>;
    async fn start_cluster(&self, cluster_id: &str) -> AppResult<()>;
}
