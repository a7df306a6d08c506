// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

//! Submits compiled Python models to a remote compute control plane and
//! waits for them, tracking every in-flight run so it can be cancelled.

pub mod adapters;
pub mod app;
pub mod config;
pub mod logging;

pub use app::errors::{AppError, AppErrorKind, AppResult};
pub use app::ports::ControlPlane;
pub use app::registry::{CancelSummary, RunRegistry};
pub use app::types::{ParsedModel, SubmissionMethod};
pub use app::usecases::Submitter;
