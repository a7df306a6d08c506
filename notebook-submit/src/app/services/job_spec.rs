// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use serde_json::{Map, Value};

use crate::app::errors::{AppError, AppResult};
use crate::app::services::libraries::resolve_libraries;
use crate::app::types::{
    AclEntry, ClusterSettings, Grants, JobSettings, ModelConfig, NotebookTask, RunSubmission,
    TaskSpec, WorkflowJobConfig,
};

pub const ONE_OFF_TASK_KEY: &str = "inner_notebook";
pub const WORKFLOW_TASK_KEY: &str = "task_a";

/// Notebook run with the model's libraries and, when given, an access list.
pub fn notebook_run(
    run_name: String,
    notebook_path: &str,
    cluster: &ClusterSettings,
    config: &ModelConfig,
    access_control_list: Vec<AclEntry>,
) -> RunSubmission {
    let mut task = TaskSpec::notebook(ONE_OFF_TASK_KEY, NotebookTask::new(notebook_path));
    cluster.apply_to(&mut task);
    task.libraries = resolve_libraries(
        &config.packages,
        config.index_url.as_deref(),
        &config.additional_libs,
    );
    RunSubmission {
        run_name,
        tasks: vec![task],
        access_control_list,
    }
}

/// A new-cluster spec wins over an existing cluster id; neither leaves the
/// remote to pick serverless compute.
pub fn workflow_cluster(
    job_cluster_config: Option<&Map<String, Value>>,
    existing_cluster_id: Option<&str>,
) -> ClusterSettings {
    if let Some(spec) = job_cluster_config.filter(|spec| !spec.is_empty()) {
        return ClusterSettings::New(spec.clone());
    }
    match existing_cluster_id.map(str::trim).filter(|id| !id.is_empty()) {
        Some(cluster_id) => ClusterSettings::Existing(cluster_id.to_string()),
        None => ClusterSettings::Serverless,
    }
}

/// Job definition plus the reconciliation inputs that must not be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowPlan {
    pub settings: JobSettings,
    pub existing_job_id: Option<String>,
    pub grants: Grants,
}

pub fn build_workflow_plan(
    config: &WorkflowJobConfig,
    job_cluster_config: Option<&Map<String, Value>>,
    default_name: String,
    notebook_path: &str,
) -> AppResult<WorkflowPlan> {
    let cluster = workflow_cluster(job_cluster_config, config.existing_cluster_id.as_deref());

    let mut primary = TaskSpec::notebook(
        WORKFLOW_TASK_KEY,
        NotebookTask::from_workspace(notebook_path),
    );
    cluster.apply_to(&mut primary);
    let primary = merge_task_settings(primary, &config.additional_task_settings)?;

    let mut tasks = Vec::with_capacity(1 + config.post_hook_tasks.len());
    tasks.push(primary);
    for hook in &config.post_hook_tasks {
        let mut hook = hook.clone();
        if !hook.has_cluster() {
            cluster.apply_to(&mut hook);
        }
        tasks.push(hook);
    }

    let name = config
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or(default_name);

    Ok(WorkflowPlan {
        settings: JobSettings {
            name,
            tasks,
            email_notifications: config.email_notifications.clone(),
            webhook_notifications: config.webhook_notifications.clone(),
            notification_settings: config.notification_settings.clone(),
            timeout_seconds: config.timeout_seconds,
            health: config.health.clone(),
            environments: config.environments.clone(),
        },
        existing_job_id: config.existing_job_id.clone(),
        grants: config.grants.clone(),
    })
}

/// Overlays raw task fields onto `task`, key by key. Setting one cluster
/// reference drops the other.
pub fn merge_task_settings(task: TaskSpec, overrides: &Map<String, Value>) -> AppResult<TaskSpec> {
    if overrides.is_empty() {
        return Ok(task);
    }
    let mut fields = match serde_json::to_value(&task) {
        Ok(Value::Object(fields)) => fields,
        Ok(_) => return Err(AppError::internal("task did not serialize to an object")),
        Err(err) => return Err(AppError::internal(format!("failed to serialize task: {err}"))),
    };
    if overrides.contains_key("new_cluster") {
        fields.remove("existing_cluster_id");
    }
    if overrides.contains_key("existing_cluster_id") {
        fields.remove("new_cluster");
    }
    fields.extend(overrides.iter().map(|(key, value)| (key.clone(), value.clone())));
    serde_json::from_value(Value::Object(fields))
        .map_err(|err| AppError::invalid_config(format!("invalid additional_task_settings: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::app::types::Principal;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn workflow(value: Value) -> WorkflowJobConfig {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn notebook_run_carries_cluster_libraries_and_acl() {
        let config: ModelConfig = serde_json::from_value(json!({
            "packages": ["pandas"],
            "index_url": "https://pypi.internal/simple"
        }))
        .unwrap();
        let acl = vec![AclEntry::new(
            Principal::User("viewer@example.com".to_string()),
            crate::app::types::PermissionLevel::CanView,
        )];
        let run = notebook_run(
            "main-s-m-1".to_string(),
            "/Shared/dbt_python_models/s/m",
            &ClusterSettings::New(map(json!({"spark_version": "15.4.x-scala2.12"}))),
            &config,
            acl,
        );
        assert_eq!(
            serde_json::to_value(&run).unwrap(),
            json!({
                "run_name": "main-s-m-1",
                "tasks": [{
                    "task_key": "inner_notebook",
                    "notebook_task": {"notebook_path": "/Shared/dbt_python_models/s/m"},
                    "new_cluster": {"spark_version": "15.4.x-scala2.12"},
                    "libraries": [{"pypi": {"package": "pandas", "repo": "https://pypi.internal/simple"}}]
                }],
                "access_control_list": [{"user_name": "viewer@example.com", "permission_level": "CAN_VIEW"}]
            })
        );
    }

    #[test]
    fn serverless_run_has_no_cluster_section() {
        let run = notebook_run(
            "r".to_string(),
            "/p",
            &ClusterSettings::Serverless,
            &ModelConfig::default(),
            Vec::new(),
        );
        let value = serde_json::to_value(&run).unwrap();
        let task = &value["tasks"][0];
        assert!(task.get("new_cluster").is_none());
        assert!(task.get("existing_cluster_id").is_none());
        assert!(value.get("access_control_list").is_none());
    }

    #[test]
    fn new_cluster_spec_wins_over_existing_cluster_id() {
        let spec = map(json!({"num_workers": 2}));
        assert_eq!(
            workflow_cluster(Some(&spec), Some("abc")),
            ClusterSettings::New(spec.clone())
        );
        assert_eq!(
            workflow_cluster(None, Some("abc")),
            ClusterSettings::Existing("abc".to_string())
        );
        assert_eq!(
            workflow_cluster(Some(&Map::new()), None),
            ClusterSettings::Serverless
        );
    }

    #[test]
    fn workflow_plan_strips_orchestration_only_keys() {
        let config = workflow(json!({
            "existing_job_id": "77",
            "existing_cluster_id": "abc",
            "grants": {"manage": [{"group_name": "admins"}]},
            "post_hook_tasks": [{"task_key": "hook", "notebook_task": {"notebook_path": "/hook"}}],
            "additional_task_settings": {"max_retries": 2},
            "timeout_seconds": 600
        }));
        let plan = build_workflow_plan(&config, None, "main-s-m__dbt".to_string(), "/nb").unwrap();

        assert_eq!(plan.existing_job_id.as_deref(), Some("77"));
        assert_eq!(plan.grants.manage, vec![Principal::Group("admins".to_string())]);

        let sent = serde_json::to_value(&plan.settings).unwrap();
        for key in [
            "existing_job_id",
            "post_hook_tasks",
            "grants",
            "additional_task_settings",
            "existing_cluster_id",
        ] {
            assert!(sent.get(key).is_none(), "{key} must not be sent");
        }
        assert_eq!(sent["name"], "main-s-m__dbt");
        assert_eq!(sent["timeout_seconds"], 600);
        assert_eq!(
            sent["tasks"][0],
            json!({
                "task_key": "task_a",
                "notebook_task": {"notebook_path": "/nb", "source": "WORKSPACE"},
                "existing_cluster_id": "abc",
                "max_retries": 2
            })
        );
        assert_eq!(sent["tasks"][1]["existing_cluster_id"], "abc");
    }

    #[test]
    fn post_hook_with_own_cluster_keeps_it() {
        let config = workflow(json!({
            "name": "nightly",
            "post_hook_tasks": [
                {"task_key": "own", "new_cluster": {"num_workers": 1}},
                {"task_key": "inherits"}
            ]
        }));
        let spec = map(json!({"num_workers": 4}));
        let plan = build_workflow_plan(&config, Some(&spec), "unused".to_string(), "/nb").unwrap();

        assert_eq!(plan.settings.name, "nightly");
        let tasks = &plan.settings.tasks;
        assert_eq!(tasks.len(), 3);
        assert_eq!(tasks[0].new_cluster, Some(spec.clone()));
        assert_eq!(tasks[1].new_cluster, Some(map(json!({"num_workers": 1}))));
        assert_eq!(tasks[2].new_cluster, Some(spec));
    }

    #[test]
    fn additional_settings_can_swap_cluster_reference() {
        let mut task = TaskSpec::notebook("task_a", NotebookTask::new("/nb"));
        ClusterSettings::New(map(json!({"num_workers": 4}))).apply_to(&mut task);
        let merged = merge_task_settings(
            task,
            &map(json!({"existing_cluster_id": "pinned", "task_key": "renamed"})),
        )
        .unwrap();
        assert_eq!(merged.task_key, "renamed");
        assert_eq!(merged.existing_cluster_id.as_deref(), Some("pinned"));
        assert_eq!(merged.new_cluster, None);
    }

    #[test]
    fn malformed_additional_settings_are_a_config_error() {
        let task = TaskSpec::notebook("task_a", NotebookTask::new("/nb"));
        let err = merge_task_settings(task, &map(json!({"task_key": 5}))).expect_err("must fail");
        assert_eq!(err.kind(), crate::app::errors::AppErrorKind::InvalidConfig);
    }
}
