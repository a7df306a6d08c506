// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

//! In-flight runs and commands, shared by every submission so they can be
//! cancelled from outside the submission call path.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::app::ports::{CommandsPort, JobRunsPort};
use crate::app::types::{CommandExecution, RunHandle};

// Counts are per registration: two submissions may observe the same run.
#[derive(Default)]
struct Tracked {
    run_ids: HashMap<String, usize>,
    commands: HashMap<CommandExecution, usize>,
}

fn acquire<K: Eq + Hash>(counts: &mut HashMap<K, usize>, key: K) {
    *counts.entry(key).or_default() += 1;
}

fn release<K: Eq + Hash + Clone>(counts: &mut HashMap<K, usize>, key: &K) -> bool {
    match counts.entry(key.clone()) {
        Entry::Occupied(mut slot) => {
            *slot.get_mut() -= 1;
            if *slot.get() == 0 {
                slot.remove();
            }
            true
        }
        Entry::Vacant(_) => false,
    }
}

#[derive(Default)]
pub struct RunRegistry {
    tracked: Mutex<Tracked>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CancelSummary {
    pub cancelled: usize,
    pub failed: usize,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave the sets half-updated.
    fn lock(&self) -> MutexGuard<'_, Tracked> {
        self.tracked.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert(&self, handle: RunHandle) {
        let mut tracked = self.lock();
        match handle {
            RunHandle::Run(run_id) => acquire(&mut tracked.run_ids, run_id),
            RunHandle::Command(command) => acquire(&mut tracked.commands, command),
        }
    }

    /// Drops one registration of `handle`; the handle stays tracked while
    /// any other registration of it is alive.
    pub fn remove(&self, handle: &RunHandle) -> bool {
        let mut tracked = self.lock();
        match handle {
            RunHandle::Run(run_id) => release(&mut tracked.run_ids, run_id),
            RunHandle::Command(command) => release(&mut tracked.commands, command),
        }
    }

    pub fn contains(&self, handle: &RunHandle) -> bool {
        let tracked = self.lock();
        match handle {
            RunHandle::Run(run_id) => tracked.run_ids.contains_key(run_id),
            RunHandle::Command(command) => tracked.commands.contains_key(command),
        }
    }

    pub fn len(&self) -> usize {
        let tracked = self.lock();
        tracked.run_ids.len() + tracked.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> Vec<RunHandle> {
        let tracked = self.lock();
        tracked
            .run_ids
            .keys()
            .cloned()
            .map(RunHandle::Run)
            .chain(tracked.commands.keys().cloned().map(RunHandle::Command))
            .collect()
    }

    /// Inserts `handle` and returns a guard that removes it again on drop,
    /// whichever way the caller leaves its scope.
    pub fn track(&self, handle: RunHandle) -> Registration<'_> {
        tracing::debug!("tracking {handle}");
        self.insert(handle.clone());
        Registration {
            registry: self,
            handle,
        }
    }

    /// Cancels every tracked run and command and empties the registry.
    /// A failed cancel is logged and does not stop the sweep.
    pub async fn cancel_all(
        &self,
        runs: &dyn JobRunsPort,
        commands: &dyn CommandsPort,
    ) -> CancelSummary {
        let drained = std::mem::take(&mut *self.lock());
        let mut summary = CancelSummary::default();

        tracing::debug!("run ids to cancel: {:?}", drained.run_ids.keys());
        for run_id in drained.run_ids.keys() {
            match runs.cancel_run(run_id).await {
                Ok(()) => summary.cancelled += 1,
                Err(err) => {
                    tracing::warn!("cancel run {run_id} failed: {err}");
                    summary.failed += 1;
                }
            }
        }

        tracing::debug!("commands to cancel: {:?}", drained.commands.keys());
        for command in drained.commands.keys() {
            match commands.cancel_command(command).await {
                Ok(()) => summary.cancelled += 1,
                Err(err) => {
                    tracing::warn!("cancel command {} failed: {err}", command.command_id);
                    summary.failed += 1;
                }
            }
        }
        summary
    }
}

/// Keeps one handle registered for as long as it lives.
#[must_use = "dropping the registration untracks the handle immediately"]
pub struct Registration<'a> {
    registry: &'a RunRegistry,
    handle: RunHandle,
}

impl Registration<'_> {
    pub fn handle(&self) -> &RunHandle {
        &self.handle
    }
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        self.registry.remove(&self.handle);
        tracing::debug!("untracked {}", self.handle);
    }
}
