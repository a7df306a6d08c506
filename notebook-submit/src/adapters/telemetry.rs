// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use crate::app::ports::{TelemetryEvent, TelemetryPort};

#[derive(Clone, Default)]
pub struct TracingTelemetry;

impl TracingTelemetry {
    pub fn new() -> Self {
        Self
    }
}

impl TelemetryPort for TracingTelemetry {
    fn event(&self, name: &'static str, fields: TelemetryEvent) {
        let TelemetryEvent {
            model,
            method,
            run_id,
            job_id,
            cluster_id,
        } = fields;

        tracing::info!(
            target: "notebook_submit::telemetry",
            event = name,
            model = model.as_deref(),
            method = method,
            run_id = run_id.as_deref(),
            job_id = job_id.as_deref(),
            cluster_id = cluster_id.as_deref(),
        );
    }
}
