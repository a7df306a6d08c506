// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

pub mod errors;
pub mod ports;
pub mod registry;
pub mod services;
pub mod strategies;
pub mod types;
pub mod usecases;

#[cfg(test)]
pub(crate) mod fakes;
