// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

//! Tracing setup for hosts embedding the submitter. Logs go to stderr and,
//! when `NOTEBOOK_SUBMIT_LOG_FILE` is set, to that file as well.

use std::env;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use tracing::Subscriber;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, Registry};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const LOG_ENV: &str = "NOTEBOOK_SUBMIT_LOG";
const LOG_FORMAT_ENV: &str = "NOTEBOOK_SUBMIT_LOG_FORMAT";
const LOG_SPAN_EVENTS_ENV: &str = "NOTEBOOK_SUBMIT_LOG_SPAN_EVENTS";
const LOG_FILE_ENV: &str = "NOTEBOOK_SUBMIT_LOG_FILE";

static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum LogFormat {
    Json,
    Pretty,
    Compact,
}

/// Installs the global subscriber. Fails if one is already installed.
pub fn try_init(verbose: bool) -> Result<()> {
    let format = parse_format(env::var(LOG_FORMAT_ENV).ok().as_deref());
    let span_events = parse_span_events(env::var(LOG_SPAN_EVENTS_ENV).ok().as_deref());
    let file_writer = build_file_writer();
    let file_layer = file_writer
        .as_ref()
        .map(|(writer, _)| fmt_layer(format, span_events.clone(), writer.clone(), false));

    Registry::default()
        .with(build_filter(verbose))
        .with(tracing_error::ErrorLayer::default())
        .with(fmt_layer(format, span_events, std::io::stderr, true))
        .with(file_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;
    if let Some((_, guard)) = file_writer {
        let _ = FILE_GUARD.set(guard);
    }
    Ok(())
}

/// Like [`try_init`], but leaves an existing subscriber in place.
pub fn init(verbose: bool) {
    if let Err(err) = try_init(verbose) {
        tracing::debug!("logging already initialized: {err:#}");
    }
}

fn fmt_layer<S, W>(format: LogFormat, span_events: FmtSpan, writer: W, ansi: bool) -> BoxedLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_ansi(ansi)
        .with_timer(UtcTime::rfc_3339())
        .with_span_events(span_events)
        .with_writer(writer);
    match format {
        LogFormat::Json => layer.json().boxed(),
        LogFormat::Pretty => layer.pretty().boxed(),
        LogFormat::Compact => layer.compact().boxed(),
    }
}

fn build_filter(verbose: bool) -> EnvFilter {
    match env::var(LOG_ENV) {
        Ok(value) => EnvFilter::new(value),
        Err(_) if verbose => EnvFilter::new("debug"),
        Err(_) => EnvFilter::new("info"),
    }
}

fn normalized(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_ascii_lowercase)
}

fn parse_format(value: Option<&str>) -> LogFormat {
    match normalized(value).as_deref() {
        Some("json") => LogFormat::Json,
        Some("pretty") => LogFormat::Pretty,
        _ => LogFormat::Compact,
    }
}

fn parse_span_events(value: Option<&str>) -> FmtSpan {
    match normalized(value).as_deref() {
        Some("new") => FmtSpan::NEW,
        Some("enter") => FmtSpan::ENTER,
        Some("exit") => FmtSpan::EXIT,
        Some("close") => FmtSpan::CLOSE,
        _ => FmtSpan::NONE,
    }
}

fn build_file_writer() -> Option<(NonBlocking, WorkerGuard)> {
    let file_path = env::var(LOG_FILE_ENV)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())?;

    let path = Path::new(&file_path);
    let file_name = path.file_name()?.to_string_lossy().to_string();
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let appender = tracing_appender::rolling::never(dir, file_name);
    Some(tracing_appender::non_blocking(appender))
}
