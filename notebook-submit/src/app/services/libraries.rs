// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use serde_json::Value;

use crate::app::types::{Library, PypiPackage};

/// PyPI packages first (pinned to `index_url` when given), then the extra
/// library descriptors in their configured order.
pub fn resolve_libraries(
    packages: &[String],
    index_url: Option<&str>,
    additional: &[Value],
) -> Vec<Library> {
    let repo = index_url
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string);

    packages
        .iter()
        .map(|package| Library::Pypi {
            pypi: PypiPackage {
                package: package.clone(),
                repo: repo.clone(),
            },
        })
        .chain(additional.iter().cloned().map(Library::Other))
        .collect()
}
