// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::sync::OnceLock;

use regex::Regex;
use uuid::Uuid;

use crate::app::errors::{AppError, AppResult};
use crate::app::ports::WorkspacePort;
use crate::app::types::ParsedModel;

const SHARED_MODELS_ROOT: &str = "/Shared/dbt_python_models";
const WORKFLOW_NOTEBOOK_ROOT: &str = "/Shared/dbt_python_model";

fn cluster_path_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^/?sql/protocolv1/o/\d+/([^/\s]+)/?$").expect("cluster path pattern is valid")
    })
}

/// Cluster id encoded in an all-purpose cluster connection path
/// (`sql/protocolv1/o/<org>/<cluster-id>`). Warehouse paths yield nothing.
pub fn cluster_id_from_http_path(http_path: &str) -> Option<String> {
    cluster_path_pattern()
        .captures(http_path.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn run_name(model: &ParsedModel) -> String {
    format!(
        "{}-{}-{}-{}",
        model.catalog(),
        model.schema,
        model.identifier,
        Uuid::new_v4()
    )
}

pub fn default_job_name(model: &ParsedModel) -> String {
    format!(
        "{}-{}-{}__dbt",
        model.catalog(),
        model.schema,
        model.identifier
    )
}

pub fn workflow_notebook_dir(model: &ParsedModel) -> String {
    format!(
        "{WORKFLOW_NOTEBOOK_ROOT}/{}/{}",
        model.catalog(),
        model.schema
    )
}

pub fn workflow_notebook_path(model: &ParsedModel) -> String {
    format!("{}/{}", workflow_notebook_dir(model), model.identifier)
}

/// Creates the notebook folder for one-off submissions and returns it with a
/// trailing slash. User folders live under the caller's home directory.
pub async fn create_model_dir(
    workspace: &dyn WorkspacePort,
    model: &ParsedModel,
) -> AppResult<String> {
    let folder = if model.config.user_folder_for_python {
        let user = workspace
            .current_user_name()
            .await?
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| AppError::remote("error retrieving current user name"))?;
        format!(
            "/Users/{user}/dbt_python_models/{}/{}/",
            model.catalog(),
            model.schema
        )
    } else {
        tracing::warn!(
            "uploading notebook to '{SHARED_MODELS_ROOT}/{}/'; writing to '/Shared' is deprecated, set `user_folder_for_python: true` to use the current user's home directory",
            model.schema
        );
        format!("{SHARED_MODELS_ROOT}/{}/", model.schema)
    };
    tracing::debug!("using python model folder '{folder}'");
    workspace.mkdirs(&folder).await?;
    Ok(folder)
}
