// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use crate::app::errors::AppResult;

/// Credential checks happen outside this crate; this is the seam.
pub trait CredentialsPort: Send + Sync {
    fn validate(&self) -> AppResult<()>;

    /// Connection path of the configured compute, if any.
    fn http_path(&self) -> Option<String>;
}
