// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use async_trait::async_trait;

use crate::app::errors::AppResult;
use crate::app::types::{AclEntry, JobPermissions};

#[async_trait]
pub trait PermissionsPort: Send + Sync {
    async fn get_permissions(&self, job_id: &str) -> AppResult<JobPermissions>;
    /// Overwrites the job's permission list.
    async fn put_permissions(&self, job_id: &str, acl: &[AclEntry]) -> AppResult<()>;
}
