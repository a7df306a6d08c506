// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

pub mod acl;
pub mod job_spec;
pub mod libraries;
pub mod paths;
pub mod polling;
