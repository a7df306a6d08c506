// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::fmt;

pub mod codes {
    pub const INVALID_CONFIG: &str = "invalid_config";
    pub const AUTHENTICATION_FAILURE: &str = "authentication_failure";
    pub const AMBIGUOUS_JOB: &str = "ambiguous_job";
    pub const REMOTE_ERROR: &str = "remote_error";
    pub const TIMEOUT: &str = "timeout";
    pub const INTERNAL_ERROR: &str = "internal_error";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppErrorKind {
    InvalidConfig,
    Unauthenticated,
    Ambiguous,
    Remote,
    DeadlineExceeded,
    Internal,
}

#[derive(Debug, Clone)]
pub struct AppError {
    kind: AppErrorKind,
    code: &'static str,
    message: String,
    context: Option<String>,
}

impl AppError {
    pub fn new(kind: AppErrorKind, code: &'static str) -> Self {
        Self {
            kind,
            code,
            message: code.to_string(),
            context: None,
        }
    }

    pub fn with_message(
        kind: AppErrorKind,
        code: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            code,
            message: message.into(),
            context: None,
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::with_message(AppErrorKind::InvalidConfig, codes::INVALID_CONFIG, message)
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::with_message(
            AppErrorKind::Unauthenticated,
            codes::AUTHENTICATION_FAILURE,
            message,
        )
    }

    pub fn ambiguous_job(message: impl Into<String>) -> Self {
        Self::with_message(AppErrorKind::Ambiguous, codes::AMBIGUOUS_JOB, message)
    }

    pub fn remote(message: impl Into<String>) -> Self {
        Self::with_message(AppErrorKind::Remote, codes::REMOTE_ERROR, message)
    }

    pub fn timed_out(message: impl Into<String>) -> Self {
        Self::with_message(AppErrorKind::DeadlineExceeded, codes::TIMEOUT, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::with_message(AppErrorKind::Internal, codes::INTERNAL_ERROR, message)
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn kind(&self) -> AppErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// Remote failures and timeouts both mean the remote execution did not succeed.
    pub fn is_remote_failure(&self) -> bool {
        matches!(
            self.kind,
            AppErrorKind::Remote | AppErrorKind::DeadlineExceeded
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ctx) = &self.context {
            write!(f, "{} ({})", self.message, ctx)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;
