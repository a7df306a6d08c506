// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::app::types::PollSettings;

const APP_DIR_NAME: &str = "notebook-submit";
const CONFIG_FILE_NAME: &str = "notebook-submit.toml";
const CONFIG_ENV_VAR: &str = "NOTEBOOK_SUBMIT_CONFIG_PATH";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
const DEFAULT_CLUSTER_START_TIMEOUT_SECS: u64 = 900;
const DEFAULT_CLUSTER_START_POLL_SECS: u64 = 5;
const DEFAULT_TIMEOUT_SECS: i64 = 60 * 60 * 24;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    poll_interval_secs: Option<u64>,
    cluster_start_timeout_secs: Option<u64>,
    cluster_start_poll_secs: Option<u64>,
    default_timeout_secs: Option<i64>,
    verbose: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub poll_interval_secs: u64,
    pub cluster_start_timeout_secs: u64,
    pub cluster_start_poll_secs: u64,
    /// Used for models that do not set their own `timeout`.
    pub default_timeout_secs: i64,
    pub verbose: bool,
    pub config_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            cluster_start_timeout_secs: DEFAULT_CLUSTER_START_TIMEOUT_SECS,
            cluster_start_poll_secs: DEFAULT_CLUSTER_START_POLL_SECS,
            default_timeout_secs: DEFAULT_TIMEOUT_SECS,
            verbose: false,
            config_path: None,
        }
    }
}

impl Settings {
    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: Duration::from_secs(self.poll_interval_secs),
            cluster_start_timeout: Duration::from_secs(self.cluster_start_timeout_secs),
            cluster_start_interval: Duration::from_secs(self.cluster_start_poll_secs),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingSource {
    Override,
    Env,
    ConfigFile,
    Default,
}

impl SettingSource {
    pub fn as_str(self) -> &'static str {
        match self {
            SettingSource::Override => "override",
            SettingSource::Env => "env",
            SettingSource::ConfigFile => "config",
            SettingSource::Default => "default",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingValue<T> {
    pub value: T,
    pub source: SettingSource,
}

#[derive(Debug)]
pub struct SettingsReport {
    pub config_path: Option<PathBuf>,
    pub config_path_source: Option<SettingSource>,
    pub config_file_present: bool,
    pub poll_interval_secs: SettingValue<u64>,
    pub cluster_start_timeout_secs: SettingValue<u64>,
    pub cluster_start_poll_secs: SettingValue<u64>,
    pub default_timeout_secs: SettingValue<i64>,
    pub verbose: SettingValue<bool>,
}

#[derive(Debug)]
pub struct LoadResult {
    pub settings: Settings,
    pub report: SettingsReport,
}

#[derive(Debug, Default)]
pub struct Overrides {
    pub poll_interval_secs: Option<u64>,
    pub cluster_start_timeout_secs: Option<u64>,
    pub cluster_start_poll_secs: Option<u64>,
    pub default_timeout_secs: Option<i64>,
    pub verbose: Option<bool>,
}

pub fn load(config_path_override: Option<PathBuf>, overrides: Overrides) -> Result<Settings> {
    Ok(load_with_report(config_path_override, overrides)?.settings)
}

pub fn load_with_report(
    config_path_override: Option<PathBuf>,
    overrides: Overrides,
) -> Result<LoadResult> {
    let (config_path, config_path_source, required) = match config_path_override {
        Some(path) => (Some(expand_path(path)), Some(SettingSource::Override), true),
        None => match config_path_from_env()? {
            Some(path) => (Some(expand_path(path)), Some(SettingSource::Env), true),
            None => match default_config_path().ok() {
                Some(path) => (Some(path), Some(SettingSource::Default), false),
                None => (None, None, false),
            },
        },
    };
    let config_file_present = config_path.as_deref().is_some_and(Path::exists);

    let file_config = match config_path.as_deref() {
        Some(path) => read_config_file(path, required)?,
        None => FileConfig::default(),
    };

    let poll_interval_secs = pick(
        overrides.poll_interval_secs,
        file_config.poll_interval_secs,
        DEFAULT_POLL_INTERVAL_SECS,
    );
    if poll_interval_secs.value == 0 {
        anyhow::bail!("poll_interval_secs must be at least 1");
    }
    let cluster_start_poll_secs = pick(
        overrides.cluster_start_poll_secs,
        file_config.cluster_start_poll_secs,
        DEFAULT_CLUSTER_START_POLL_SECS,
    );
    if cluster_start_poll_secs.value == 0 {
        anyhow::bail!("cluster_start_poll_secs must be at least 1");
    }
    let cluster_start_timeout_secs = pick(
        overrides.cluster_start_timeout_secs,
        file_config.cluster_start_timeout_secs,
        DEFAULT_CLUSTER_START_TIMEOUT_SECS,
    );
    let default_timeout_secs = pick(
        overrides.default_timeout_secs,
        file_config.default_timeout_secs,
        DEFAULT_TIMEOUT_SECS,
    );
    if default_timeout_secs.value <= 0 {
        anyhow::bail!("default_timeout_secs must be a positive integer");
    }
    let verbose = pick(overrides.verbose, file_config.verbose, false);

    let settings = Settings {
        poll_interval_secs: poll_interval_secs.value,
        cluster_start_timeout_secs: cluster_start_timeout_secs.value,
        cluster_start_poll_secs: cluster_start_poll_secs.value,
        default_timeout_secs: default_timeout_secs.value,
        verbose: verbose.value,
        config_path: config_path.clone(),
    };
    let report = SettingsReport {
        config_path,
        config_path_source,
        config_file_present,
        poll_interval_secs,
        cluster_start_timeout_secs,
        cluster_start_poll_secs,
        default_timeout_secs,
        verbose,
    };

    Ok(LoadResult { settings, report })
}

fn pick<T>(overridden: Option<T>, from_file: Option<T>, default: T) -> SettingValue<T> {
    match (overridden, from_file) {
        (Some(value), _) => SettingValue {
            value,
            source: SettingSource::Override,
        },
        (None, Some(value)) => SettingValue {
            value,
            source: SettingSource::ConfigFile,
        },
        (None, None) => SettingValue {
            value: default,
            source: SettingSource::Default,
        },
    }
}

fn read_config_file(path: &Path, required: bool) -> Result<FileConfig> {
    if !path.exists() {
        if required {
            anyhow::bail!("config file not found at {}", path.display());
        }
        return Ok(FileConfig::default());
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file {}", path.display()))
}

fn expand_path(path: PathBuf) -> PathBuf {
    let path_string = path.to_string_lossy().to_string();
    let expanded = shellexpand::tilde(&path_string);
    PathBuf::from(expanded.as_ref())
}

fn config_path_from_env() -> Result<Option<PathBuf>> {
    match std::env::var_os(CONFIG_ENV_VAR) {
        Some(value) => {
            if value.is_empty() {
                anyhow::bail!("{CONFIG_ENV_VAR} is set but empty");
            }
            Ok(Some(PathBuf::from(value)))
        }
        None => Ok(None),
    }
}

fn default_config_path() -> Result<PathBuf> {
    let base = dirs::config_dir().context("failed to resolve config directory")?;
    Ok(base.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}
