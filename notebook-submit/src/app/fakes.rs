// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

//! In-memory control plane used by unit tests. Every port call is logged as a
//! short text line so tests can assert on the exact remote traffic.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::app::errors::{AppError, AppResult};
use crate::app::ports::{
    ClustersPort, CommandsPort, CredentialsPort, JobRunsPort, PermissionsPort, WorkflowsPort,
    WorkspacePort,
};
use crate::app::registry::RunRegistry;
use crate::app::types::{
    AclEntry, ClusterState, CommandExecution, CommandSnapshot, CommandStatus, JobPermissions,
    JobSettings, JobSummary, PermissionGrant, PrincipalPermissions, RunHandle, RunLifecycleState,
    RunOutput, RunStatus, RunSubmission,
};

pub const OWNER: &str = "owner@example.com";

pub fn run_status(state: RunLifecycleState, result: Option<&str>) -> RunStatus {
    RunStatus {
        life_cycle_state: state,
        result_state: result.map(str::to_string),
        state_message: None,
        task_run_ids: Vec::new(),
    }
}

pub fn command_status(status: CommandStatus) -> CommandSnapshot {
    CommandSnapshot {
        status,
        result_type: None,
        data: None,
        cause: None,
    }
}

fn default_permissions() -> JobPermissions {
    JobPermissions {
        access_control_list: vec![
            PrincipalPermissions {
                group_name: Some("admins".to_string()),
                all_permissions: vec![PermissionGrant {
                    permission_level: "CAN_MANAGE".to_string(),
                    inherited: true,
                }],
                ..PrincipalPermissions::default()
            },
            PrincipalPermissions {
                user_name: Some(OWNER.to_string()),
                all_permissions: vec![PermissionGrant {
                    permission_level: "IS_OWNER".to_string(),
                    inherited: false,
                }],
                ..PrincipalPermissions::default()
            },
        ],
    }
}

struct FakeState {
    calls: Vec<String>,
    failing: HashSet<&'static str>,
    next_id: u64,
    current_user: Option<String>,
    uploads: Vec<(String, String)>,
    submissions: Vec<RunSubmission>,
    run_polls: VecDeque<AppResult<RunStatus>>,
    keep_running: bool,
    run_output: RunOutput,
    stall_run_output: bool,
    command_polls: VecDeque<AppResult<CommandSnapshot>>,
    executed: Vec<String>,
    cluster_states: VecDeque<ClusterState>,
    jobs: Vec<JobSummary>,
    job_settings: Vec<(String, JobSettings)>,
    active_runs: Vec<String>,
    permissions: JobPermissions,
    put_acls: Vec<(String, Vec<AclEntry>)>,
    watched: Option<Arc<RunRegistry>>,
    tracked_at_poll: Vec<bool>,
}

pub struct FakeControlPlane {
    state: Mutex<FakeState>,
}

impl FakeControlPlane {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                calls: Vec::new(),
                failing: HashSet::new(),
                next_id: 0,
                current_user: Some(OWNER.to_string()),
                uploads: Vec::new(),
                submissions: Vec::new(),
                run_polls: VecDeque::new(),
                keep_running: false,
                run_output: RunOutput::default(),
                stall_run_output: false,
                command_polls: VecDeque::new(),
                executed: Vec::new(),
                cluster_states: VecDeque::new(),
                jobs: Vec::new(),
                job_settings: Vec::new(),
                active_runs: Vec::new(),
                permissions: default_permissions(),
                put_acls: Vec::new(),
                watched: None,
                tracked_at_poll: Vec::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake control plane lock")
    }

    /// Logs `call` and fails it if `op` was marked as failing.
    fn record(&self, op: &'static str, call: String) -> AppResult<()> {
        let mut state = self.state();
        state.calls.push(call);
        if state.failing.contains(op) {
            return Err(AppError::remote(format!("{op} failed")));
        }
        Ok(())
    }

    fn next_id(&self, prefix: &str) -> String {
        let mut state = self.state();
        state.next_id += 1;
        format!("{prefix}-{}", state.next_id)
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn calls_matching(&self, prefix: &str) -> Vec<String> {
        self.state()
            .calls
            .iter()
            .filter(|call| call.starts_with(prefix))
            .cloned()
            .collect()
    }

    pub fn fail_on(&self, op: &'static str) {
        self.state().failing.insert(op);
    }

    pub fn fail_run_cancels(&self) {
        self.fail_on("cancel_run");
    }

    pub fn set_current_user(&self, user: Option<&str>) {
        self.state().current_user = user.map(str::to_string);
    }

    pub fn script_run_polls(&self, polls: Vec<AppResult<RunStatus>>) {
        self.state().run_polls = polls.into();
    }

    /// Runs without a scripted status stay RUNNING forever.
    pub fn keep_runs_running(&self) {
        self.state().keep_running = true;
    }

    pub fn set_run_output(&self, output: RunOutput) {
        self.state().run_output = output;
    }

    /// Makes `get_run_output` never resolve.
    pub fn stall_run_output(&self) {
        self.state().stall_run_output = true;
    }

    pub fn script_command_polls(&self, polls: Vec<AppResult<CommandSnapshot>>) {
        self.state().command_polls = polls.into();
    }

    pub fn script_cluster_states(&self, states: Vec<ClusterState>) {
        self.state().cluster_states = states.into();
    }

    pub fn add_job(&self, job_id: &str, name: &str) {
        self.state().jobs.push(JobSummary {
            job_id: job_id.to_string(),
            name: Some(name.to_string()),
        });
    }

    pub fn set_active_runs(&self, run_ids: &[&str]) {
        self.state().active_runs = run_ids.iter().map(|id| id.to_string()).collect();
    }

    pub fn set_permissions(&self, permissions: JobPermissions) {
        self.state().permissions = permissions;
    }

    /// Records, at every poll, whether the polled handle is in `registry`.
    pub fn watch_registry(&self, registry: Arc<RunRegistry>) {
        self.state().watched = Some(registry);
    }

    pub fn tracked_at_poll(&self) -> Vec<bool> {
        self.state().tracked_at_poll.clone()
    }

    pub fn uploads(&self) -> Vec<(String, String)> {
        self.state().uploads.clone()
    }

    pub fn submissions(&self) -> Vec<RunSubmission> {
        self.state().submissions.clone()
    }

    pub fn executed(&self) -> Vec<String> {
        self.state().executed.clone()
    }

    pub fn job_settings(&self) -> Vec<(String, JobSettings)> {
        self.state().job_settings.clone()
    }

    pub fn put_acls(&self) -> Vec<(String, Vec<AclEntry>)> {
        self.state().put_acls.clone()
    }

    fn probe(&self, handle: RunHandle) {
        let mut state = self.state();
        if let Some(registry) = state.watched.clone() {
            state.tracked_at_poll.push(registry.contains(&handle));
        }
    }
}

#[async_trait]
impl WorkspacePort for FakeControlPlane {
    async fn mkdirs(&self, path: &str) -> AppResult<()> {
        self.record("mkdirs", format!("mkdirs {path}"))
    }

    async fn upload_notebook(&self, path: &str, source: &str) -> AppResult<()> {
        self.record("upload_notebook", format!("upload_notebook {path}"))?;
        self.state()
            .uploads
            .push((path.to_string(), source.to_string()));
        Ok(())
    }

    async fn current_user_name(&self) -> AppResult<Option<String>> {
        self.record("current_user_name", "current_user_name".to_string())?;
        Ok(self.state().current_user.clone())
    }
}

#[async_trait]
impl JobRunsPort for FakeControlPlane {
    async fn submit_run(&self, submission: &RunSubmission) -> AppResult<String> {
        self.record("submit_run", format!("submit_run {}", submission.run_name))?;
        self.state().submissions.push(submission.clone());
        Ok(self.next_id("run"))
    }

    async fn poll_run(&self, run_id: &str) -> AppResult<RunStatus> {
        self.record("poll_run", format!("poll_run {run_id}"))?;
        self.probe(RunHandle::Run(run_id.to_string()));
        let mut state = self.state();
        if let Some(next) = state.run_polls.pop_front() {
            return next;
        }
        if state.keep_running {
            return Ok(run_status(RunLifecycleState::Running, None));
        }
        Ok(run_status(RunLifecycleState::Terminated, Some("SUCCESS")))
    }

    async fn get_run_output(&self, task_run_id: &str) -> AppResult<RunOutput> {
        self.record("get_run_output", format!("get_run_output {task_run_id}"))?;
        let stalled = self.state().stall_run_output;
        if stalled {
            std::future::pending::<()>().await;
        }
        Ok(self.state().run_output.clone())
    }

    async fn list_active_runs(&self, job_id: &str) -> AppResult<Vec<String>> {
        self.record("list_active_runs", format!("list_active_runs {job_id}"))?;
        Ok(self.state().active_runs.clone())
    }

    async fn cancel_run(&self, run_id: &str) -> AppResult<()> {
        self.record("cancel_run", format!("cancel_run {run_id}"))
    }
}

#[async_trait]
impl CommandsPort for FakeControlPlane {
    async fn create_context(&self, cluster_id: &str) -> AppResult<String> {
        self.record("create_context", format!("create_context {cluster_id}"))?;
        Ok(self.next_id("ctx"))
    }

    async fn execute(
        &self,
        cluster_id: &str,
        context_id: &str,
        source: &str,
    ) -> AppResult<CommandExecution> {
        self.record("execute", format!("execute {cluster_id} {context_id}"))?;
        self.state().executed.push(source.to_string());
        Ok(CommandExecution {
            cluster_id: cluster_id.to_string(),
            context_id: context_id.to_string(),
            command_id: self.next_id("cmd"),
        })
    }

    async fn poll_command(&self, command: &CommandExecution) -> AppResult<CommandSnapshot> {
        self.record("poll_command", format!("poll_command {}", command.command_id))?;
        self.probe(RunHandle::Command(command.clone()));
        match self.state().command_polls.pop_front() {
            Some(next) => next,
            None => Ok(command_status(CommandStatus::Finished)),
        }
    }

    async fn cancel_command(&self, command: &CommandExecution) -> AppResult<()> {
        self.record(
            "cancel_command",
            format!(
                "cancel_command {} {} {}",
                command.cluster_id, command.context_id, command.command_id
            ),
        )
    }

    async fn destroy_context(&self, cluster_id: &str, context_id: &str) -> AppResult<()> {
        self.record(
            "destroy_context",
            format!("destroy_context {cluster_id} {context_id}"),
        )
    }
}

#[async_trait]
impl ClustersPort for FakeControlPlane {
    async fn cluster_state(&self, cluster_id: &str) -> AppResult<ClusterState> {
        self.record("cluster_state", format!("cluster_state {cluster_id}"))?;
        Ok(self
            .state()
            .cluster_states
            .pop_front()
            .unwrap_or(ClusterState::Running))
    }

    async fn start_cluster(&self, cluster_id: &str) -> AppResult<()> {
        self.record("start_cluster", format!("start_cluster {cluster_id}"))
    }
}

#[async_trait]
impl WorkflowsPort for FakeControlPlane {
    async fn search_by_name(&self, name: &str) -> AppResult<Vec<JobSummary>> {
        self.record("search_by_name", format!("search_by_name {name}"))?;
        Ok(self
            .state()
            .jobs
            .iter()
            .filter(|job| job.name.as_deref() == Some(name))
            .cloned()
            .collect())
    }

    async fn create_job(&self, settings: &JobSettings) -> AppResult<String> {
        self.record("create_job", format!("create_job {}", settings.name))?;
        let job_id = self.next_id("job");
        let mut state = self.state();
        state.jobs.push(JobSummary {
            job_id: job_id.clone(),
            name: Some(settings.name.clone()),
        });
        state.job_settings.push((job_id.clone(), settings.clone()));
        Ok(job_id)
    }

    async fn reset_job(&self, job_id: &str, settings: &JobSettings) -> AppResult<()> {
        self.record("reset_job", format!("reset_job {job_id} {}", settings.name))?;
        self.state()
            .job_settings
            .push((job_id.to_string(), settings.clone()));
        Ok(())
    }

    async fn run_now(&self, job_id: &str) -> AppResult<String> {
        self.record("run_now", format!("run_now {job_id}"))?;
        Ok(self.next_id("run"))
    }
}

#[async_trait]
impl PermissionsPort for FakeControlPlane {
    async fn get_permissions(&self, job_id: &str) -> AppResult<JobPermissions> {
        self.record("get_permissions", format!("get_permissions {job_id}"))?;
        Ok(self.state().permissions.clone())
    }

    async fn put_permissions(&self, job_id: &str, acl: &[AclEntry]) -> AppResult<()> {
        self.record("put_permissions", format!("put_permissions {job_id}"))?;
        self.state()
            .put_acls
            .push((job_id.to_string(), acl.to_vec()));
        Ok(())
    }
}

pub struct StaticCredentials {
    pub valid: bool,
    pub http_path: Option<String>,
}

impl StaticCredentials {
    pub fn valid() -> Self {
        Self {
            valid: true,
            http_path: None,
        }
    }

    pub fn with_http_path(http_path: &str) -> Self {
        Self {
            valid: true,
            http_path: Some(http_path.to_string()),
        }
    }

    pub fn rejected() -> Self {
        Self {
            valid: false,
            http_path: None,
        }
    }
}

impl CredentialsPort for StaticCredentials {
    fn validate(&self) -> AppResult<()> {
        if self.valid {
            Ok(())
        } else {
            Err(AppError::unauthenticated("token expired"))
        }
    }

    fn http_path(&self) -> Option<String> {
        self.http_path.clone()
    }
}
