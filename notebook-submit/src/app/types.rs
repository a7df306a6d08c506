// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_CATALOG: &str = "hive_metastore";
pub const DEFAULT_SCHEMA: &str = "default";

/// How a model reaches compute on the remote control plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmissionMethod {
    JobCluster,
    AllPurposeCluster,
    Serverless,
    WorkflowJob,
}

impl SubmissionMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            SubmissionMethod::JobCluster => "job_cluster",
            SubmissionMethod::AllPurposeCluster => "all_purpose_cluster",
            SubmissionMethod::Serverless => "serverless_cluster",
            SubmissionMethod::WorkflowJob => "workflow_job",
        }
    }
}

impl fmt::Display for SubmissionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmissionMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "job_cluster" => Ok(Self::JobCluster),
            "all_purpose_cluster" => Ok(Self::AllPurposeCluster),
            "serverless_cluster" => Ok(Self::Serverless),
            "workflow_job" => Ok(Self::WorkflowJob),
            other => Err(format!("unknown submission method: {other}")),
        }
    }
}

/// A compiled model plus the options that drive its submission.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ParsedModel {
    #[serde(default, alias = "catalog")]
    pub database: Option<String>,
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(alias = "alias")]
    pub identifier: String,
    #[serde(default)]
    pub config: ModelConfig,
}

impl ParsedModel {
    pub fn catalog(&self) -> &str {
        self.database
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(DEFAULT_CATALOG)
    }

    pub fn label(&self) -> String {
        format!("{}.{}.{}", self.catalog(), self.schema, self.identifier)
    }
}

fn default_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub submission_method: Option<String>,
    pub user_folder_for_python: bool,
    /// Seconds; falls back to the orchestrator default when unset.
    pub timeout: Option<i64>,
    pub job_cluster_config: Option<Map<String, Value>>,
    pub access_control_list: Vec<AclEntry>,
    pub packages: Vec<String>,
    pub index_url: Option<String>,
    pub additional_libs: Vec<Value>,
    /// `None` when the key is missing, null or an empty object.
    #[serde(deserialize_with = "deserialize_workflow_config")]
    pub workflow_job_config: Option<WorkflowJobConfig>,
    pub cluster_id: Option<String>,
    pub http_path: Option<String>,
    pub create_notebook: bool,
}

impl ModelConfig {
    pub fn job_cluster_config(&self) -> Option<&Map<String, Value>> {
        self.job_cluster_config.as_ref().filter(|cfg| !cfg.is_empty())
    }
}

/// Workflow job options. The last five fields steer reconciliation and never
/// reach the remote job definition.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct WorkflowJobConfig {
    pub name: Option<String>,
    pub email_notifications: Option<Value>,
    pub webhook_notifications: Option<Value>,
    pub notification_settings: Option<Value>,
    pub timeout_seconds: Option<i64>,
    pub health: Option<Value>,
    pub environments: Option<Vec<Value>>,
    pub existing_cluster_id: Option<String>,
    pub grants: Grants,
    #[serde(deserialize_with = "deserialize_optional_id")]
    pub existing_job_id: Option<String>,
    pub post_hook_tasks: Vec<TaskSpec>,
    pub additional_task_settings: Map<String, Value>,
}

fn deserialize_workflow_config<'de, D>(deserializer: D) -> Result<Option<WorkflowJobConfig>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Map<String, Value>>::deserialize(deserializer)? {
        Some(raw) if !raw.is_empty() => serde_json::from_value(Value::Object(raw))
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match Option::<RawId>::deserialize(deserializer)? {
        Some(RawId::Text(text)) => Some(text.trim().to_string()).filter(|id| !id.is_empty()),
        Some(RawId::Number(number)) => Some(number.to_string()),
        None => None,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Principal {
    #[serde(rename = "user_name")]
    User(String),
    #[serde(rename = "group_name")]
    Group(String),
    #[serde(rename = "service_principal_name")]
    ServicePrincipal(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermissionLevel {
    IsOwner,
    CanView,
    CanManageRun,
    CanManage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclEntry {
    #[serde(flatten)]
    pub principal: Principal,
    pub permission_level: PermissionLevel,
}

impl AclEntry {
    pub fn new(principal: Principal, permission_level: PermissionLevel) -> Self {
        Self {
            principal,
            permission_level,
        }
    }
}

/// Principals per grant bucket; an absent bucket grants nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Grants {
    pub view: Vec<Principal>,
    pub run: Vec<Principal>,
    pub manage: Vec<Principal>,
}

/// Permission list as reported by the remote for one job.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct JobPermissions {
    #[serde(default)]
    pub access_control_list: Vec<PrincipalPermissions>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PrincipalPermissions {
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub service_principal_name: Option<String>,
    #[serde(default)]
    pub all_permissions: Vec<PermissionGrant>,
}

impl PrincipalPermissions {
    /// First present of user, group, service principal.
    pub fn principal(&self) -> Option<Principal> {
        fn present(value: &Option<String>) -> Option<String> {
            value.clone().filter(|v| !v.is_empty())
        }
        present(&self.user_name)
            .map(Principal::User)
            .or_else(|| present(&self.group_name).map(Principal::Group))
            .or_else(|| present(&self.service_principal_name).map(Principal::ServicePrincipal))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PermissionGrant {
    pub permission_level: String,
    #[serde(default)]
    pub inherited: bool,
}

pub const NOTEBOOK_SOURCE_WORKSPACE: &str = "WORKSPACE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotebookTask {
    pub notebook_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NotebookTask {
    pub fn new(notebook_path: impl Into<String>) -> Self {
        Self {
            notebook_path: notebook_path.into(),
            source: None,
            extra: Map::new(),
        }
    }

    pub fn from_workspace(notebook_path: impl Into<String>) -> Self {
        Self {
            source: Some(NOTEBOOK_SOURCE_WORKSPACE.to_string()),
            ..Self::new(notebook_path)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PypiPackage {
    pub package: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Library {
    Pypi { pypi: PypiPackage },
    Other(Value),
}

/// One task of a run submission or workflow job. `settings` carries any
/// remote task fields this crate does not model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub task_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notebook_task: Option<NotebookTask>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_cluster: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_cluster_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub libraries: Vec<Library>,
    #[serde(flatten)]
    pub settings: Map<String, Value>,
}

impl TaskSpec {
    pub fn notebook(task_key: impl Into<String>, notebook_task: NotebookTask) -> Self {
        Self {
            task_key: task_key.into(),
            notebook_task: Some(notebook_task),
            new_cluster: None,
            existing_cluster_id: None,
            libraries: Vec::new(),
            settings: Map::new(),
        }
    }

    pub fn has_cluster(&self) -> bool {
        self.new_cluster.is_some() || self.existing_cluster_id.is_some()
    }
}

/// Where a task runs. A new-cluster spec and an existing cluster id are
/// mutually exclusive; neither means serverless compute.
#[derive(Debug, Clone, PartialEq)]
pub enum ClusterSettings {
    New(Map<String, Value>),
    Existing(String),
    Serverless,
}

impl ClusterSettings {
    pub fn apply_to(&self, task: &mut TaskSpec) {
        match self {
            ClusterSettings::New(spec) => {
                task.new_cluster = Some(spec.clone());
                task.existing_cluster_id = None;
            }
            ClusterSettings::Existing(cluster_id) => {
                task.existing_cluster_id = Some(cluster_id.clone());
                task.new_cluster = None;
            }
            ClusterSettings::Serverless => {}
        }
    }
}

/// Payload of a one-off run submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSubmission {
    pub run_name: String,
    pub tasks: Vec<TaskSpec>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub access_control_list: Vec<AclEntry>,
}

/// Definition sent when creating or resetting a workflow job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSettings {
    pub name: String,
    pub tasks: Vec<TaskSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_notifications: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_notifications: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_settings: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environments: Option<Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JobSummary {
    pub job_id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunLifecycleState {
    Queued,
    Pending,
    Running,
    Terminating,
    Terminated,
    Skipped,
    InternalError,
    Blocked,
    WaitingForRetry,
    #[serde(other)]
    Unknown,
}

impl RunLifecycleState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunLifecycleState::Terminated
                | RunLifecycleState::Skipped
                | RunLifecycleState::InternalError
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStatus {
    pub life_cycle_state: RunLifecycleState,
    pub result_state: Option<String>,
    pub state_message: Option<String>,
    /// Run ids of the individual tasks, first task first.
    pub task_run_ids: Vec<String>,
}

impl RunStatus {
    pub fn succeeded(&self) -> bool {
        self.life_cycle_state == RunLifecycleState::Terminated
            && self
                .result_state
                .as_deref()
                .is_none_or(|state| state == "SUCCESS")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutput {
    pub error: Option<String>,
    pub error_trace: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum CommandStatus {
    Queued,
    Running,
    Cancelling,
    Finished,
    Cancelled,
    Error,
    #[serde(other)]
    Unknown,
}

impl CommandStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CommandStatus::Finished | CommandStatus::Cancelled | CommandStatus::Error
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSnapshot {
    pub status: CommandStatus,
    pub result_type: Option<String>,
    pub data: Option<String>,
    pub cause: Option<String>,
}

impl CommandSnapshot {
    pub fn succeeded(&self) -> bool {
        self.status == CommandStatus::Finished && self.result_type.as_deref() != Some("error")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClusterState {
    Pending,
    Running,
    Restarting,
    Resizing,
    Terminating,
    Terminated,
    Error,
    #[serde(other)]
    Unknown,
}

/// One command running inside an interactive execution context.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommandExecution {
    pub cluster_id: String,
    pub context_id: String,
    pub command_id: String,
}

/// Anything the run registry can cancel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RunHandle {
    Run(String),
    Command(CommandExecution),
}

impl fmt::Display for RunHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunHandle::Run(run_id) => write!(f, "run {run_id}"),
            RunHandle::Command(command) => write!(
                f,
                "command {} (cluster {}, context {})",
                command.command_id, command.cluster_id, command.context_id
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub cluster_start_timeout: Duration,
    pub cluster_start_interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            cluster_start_timeout: Duration::from_secs(900),
            cluster_start_interval: Duration::from_secs(5),
        }
    }
}
