// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rauthd project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Log Sink configuration: the destination named by `LogFile` and the
//! verbosity named by `LogLevel`. A single initializer wires either
//! variant into the `log` facade; there is no global mutable logger
//! object beyond what the facade itself requires.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum LogSink {
    Stderr,
    Syslog,
    None,
    File(PathBuf),
}

impl Default for LogSink {
    fn default() -> Self {
        LogSink::Stderr
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Info,
    Debug,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

impl LogLevel {
    pub fn to_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
        }
    }
}

/// Initializes the `log` facade for the configured sink and level.
///
/// `Syslog` and `File` are one-shot setups performed once at process
/// startup; `None` installs a no-op logger so call sites can log
/// unconditionally without checking whether logging is enabled.
pub fn init(sink: &LogSink, level: LogLevel) -> anyhow::Result<()> {
    match sink {
        LogSink::Stderr => {
            env_logger::Builder::from_default_env()
                .filter_level(level.to_filter())
                .init();
        }
        LogSink::File(path) => {
            let target = Box::new(
                std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)?,
            );
            env_logger::Builder::new()
                .filter_level(level.to_filter())
                .target(env_logger::Target::Pipe(target))
                .init();
        }
        LogSink::Syslog => {
            let formatter = syslog::Formatter3164 {
                facility: syslog::Facility::LOG_DAEMON,
                hostname: None,
                process: "rauthd".into(),
                pid: std::process::id(),
            };
            let logger = syslog::unix(formatter)
                .map_err(|e| anyhow::anyhow!("failed to connect to syslog: {e}"))?;
            log::set_boxed_logger(Box::new(syslog::BasicLogger::new(logger)))
                .map_err(|e| anyhow::anyhow!("failed to install syslog logger: {e}"))?;
            log::set_max_level(level.to_filter());
        }
        LogSink::None => {
            log::set_max_level(log::LevelFilter::Off);
        }
    }
    Ok(())
}
