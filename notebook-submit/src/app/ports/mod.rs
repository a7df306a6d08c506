// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::sync::Arc;

pub mod clusters;
pub mod commands;
pub mod credentials;
pub mod job_runs;
pub mod permissions;
pub mod telemetry;
pub mod workflows;
pub mod workspace;

pub use clusters::ClustersPort;
pub use commands::CommandsPort;
pub use credentials::CredentialsPort;
pub use job_runs::JobRunsPort;
pub use permissions::PermissionsPort;
pub use telemetry::{NoopTelemetry, TelemetryEvent, TelemetryPort};
pub use workflows::WorkflowsPort;
pub use workspace::WorkspacePort;

/// Every remote API the strategies talk to.
#[derive(Clone)]
pub struct ControlPlane {
    pub workspace: Arc<dyn WorkspacePort>,
    pub job_runs: Arc<dyn JobRunsPort>,
    pub commands: Arc<dyn CommandsPort>,
    pub clusters: Arc<dyn ClustersPort>,
    pub workflows: Arc<dyn WorkflowsPort>,
    pub permissions: Arc<dyn PermissionsPort>,
}

impl ControlPlane {
    /// Builds the bundle from one client that serves every API.
    pub fn from_client<C>(client: Arc<C>) -> Self
    where
        C: WorkspacePort
            + JobRunsPort
            + CommandsPort
            + ClustersPort
            + WorkflowsPort
            + PermissionsPort
            + 'static,
    {
        Self {
            workspace: client.clone(),
            job_runs: client.clone(),
            commands: client.clone(),
            clusters: client.clone(),
            workflows: client.clone(),
            permissions: client,
        }
    }
}
