// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use tokio::time::{sleep, timeout};

use crate::app::errors::{AppError, AppResult};
use crate::app::ports::{ClustersPort, CommandsPort, JobRunsPort};
use crate::app::types::{ClusterState, CommandExecution, CommandSnapshot, PollSettings, RunStatus};

const TRACEBACK_HEADER: &str = "Python model failed with traceback as:\n\
(Note that the line number here does not match the line number in your code due to templating)";

/// Polls `run_id` every `poll.interval` until it reaches a terminal state.
/// Fails with a timeout once `deadline` elapses, or with the remote
/// diagnostic when the run did not succeed. The diagnostic fetch counts
/// against the same deadline.
pub async fn wait_for_run(
    runs: &dyn JobRunsPort,
    run_id: &str,
    poll: &PollSettings,
    deadline: Duration,
) -> AppResult<()> {
    let outcome = async {
        let status = loop {
            let status = runs.poll_run(run_id).await?;
            if status.life_cycle_state.is_terminal() {
                break status;
            }
            tracing::debug!("run {run_id} is {:?}", status.life_cycle_state);
            sleep(poll.interval).await;
        };
        if status.succeeded() {
            tracing::info!("run {run_id} finished");
            return Ok::<_, AppError>(());
        }
        Err(run_failure(runs, &status).await.with_context(format!("run {run_id}")))
    };
    match timeout(deadline, outcome).await {
        Ok(result) => result,
        Err(_) => Err(AppError::timed_out("Python model run timed out")
            .with_context(format!("run {run_id}"))),
    }
}

async fn run_failure(runs: &dyn JobRunsPort, status: &RunStatus) -> AppError {
    if let Some(task_run_id) = status.task_run_ids.first() {
        match runs.get_run_output(task_run_id).await {
            Ok(output) => {
                if let Some(error) = output.error.filter(|e| !e.is_empty()) {
                    let trace = output.error_trace.as_deref().map(strip_ansi).unwrap_or_default();
                    return AppError::remote(format!("{TRACEBACK_HEADER}\n{error}\n{trace}"));
                }
            }
            Err(err) => {
                tracing::debug!("failed to fetch output for task run {task_run_id}: {err}");
            }
        }
    }
    let result = status
        .result_state
        .clone()
        .unwrap_or_else(|| format!("{:?}", status.life_cycle_state).to_ascii_uppercase());
    AppError::remote(format!(
        "Python model run ended in state {result} with state_message\n{}",
        status.state_message.as_deref().unwrap_or_default()
    ))
}

/// Polls a command until it finishes, errors or is cancelled.
pub async fn wait_for_command(
    commands: &dyn CommandsPort,
    command: &CommandExecution,
    poll: &PollSettings,
    deadline: Duration,
) -> AppResult<()> {
    let terminal = async {
        loop {
            let snapshot = commands.poll_command(command).await?;
            if snapshot.status.is_terminal() {
                return Ok::<_, AppError>(snapshot);
            }
            sleep(poll.interval).await;
        }
    };
    let snapshot = match timeout(deadline, terminal).await {
        Ok(result) => result?,
        Err(_) => {
            return Err(AppError::timed_out("Python model run timed out")
                .with_context(format!("command {}", command.command_id)));
        }
    };

    if snapshot.succeeded() {
        tracing::info!("command {} finished", command.command_id);
        return Ok(());
    }
    Err(command_failure(&snapshot).with_context(format!("command {}", command.command_id)))
}

fn command_failure(snapshot: &CommandSnapshot) -> AppError {
    let detail = snapshot
        .cause
        .as_deref()
        .or(snapshot.data.as_deref())
        .map(strip_ansi)
        .unwrap_or_default();
    AppError::remote(format!(
        "Python model run ended in state {:?} with state_message\n{detail}",
        snapshot.status
    ))
}

/// Starts a stopped cluster and waits until it reports RUNNING.
pub async fn ensure_cluster_running(
    clusters: &dyn ClustersPort,
    cluster_id: &str,
    poll: &PollSettings,
) -> AppResult<()> {
    match clusters.cluster_state(cluster_id).await? {
        ClusterState::Running => return Ok(()),
        ClusterState::Terminated | ClusterState::Terminating => {
            tracing::debug!("cluster {cluster_id} is not running; attempting to restart");
            clusters.start_cluster(cluster_id).await?;
        }
        state => tracing::debug!("cluster {cluster_id} is {state:?}; waiting for it to start"),
    }

    let started = async {
        loop {
            if clusters.cluster_state(cluster_id).await? == ClusterState::Running {
                return Ok::<_, AppError>(());
            }
            sleep(poll.cluster_start_interval).await;
        }
    };
    match timeout(poll.cluster_start_timeout, started).await {
        Ok(result) => {
            result?;
            tracing::debug!("cluster {cluster_id} is now running");
            Ok(())
        }
        Err(_) => Err(AppError::timed_out(format!(
            "Cluster {cluster_id} restart timed out after {} seconds",
            poll.cluster_start_timeout.as_secs()
        ))),
    }
}

fn ansi_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]").expect("ansi escape pattern is valid")
    })
}

pub fn strip_ansi(text: &str) -> String {
    ansi_pattern().replace_all(text, "").into_owned()
}
