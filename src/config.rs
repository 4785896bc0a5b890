//! Reduction settings.
//!
//! Every field has a default, so `{}` is a complete configuration:
//!
//! ```json
//! {
//!   "null_ordering": "nulls_last",
//!   "exec_mode": { "mode": "parallel", "threads": 8 },
//!   "timeout_ms": 10000,
//!   "collect_metrics": true
//! }
//! ```

use crate::comparator::NullOrdering;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// How segment producers are driven.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ExecMode {
    /// Run producers one after another on the calling thread.
    Sequential,
    /// Run producers on a dedicated rayon pool. `threads: None` sizes the
    /// pool from the number of CPUs.
    Parallel {
        #[serde(default)]
        threads: Option<usize>,
    },
}

impl Default for ExecMode {
    fn default() -> Self {
        Self::Parallel { threads: None }
    }
}

impl ExecMode {
    /// Worker threads this mode uses.
    #[must_use]
    pub fn threads(&self) -> usize {
        match self {
            Self::Sequential => 1,
            Self::Parallel { threads } => threads.unwrap_or_else(|| num_cpus::get().max(1)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MergeConfig {
    pub null_ordering: NullOrdering,
    pub exec_mode: ExecMode,
    /// Reduction deadline. Zero expires immediately.
    pub timeout_ms: Option<u64>,
    pub collect_metrics: bool,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            null_ordering: NullOrdering::default(),
            exec_mode: ExecMode::default(),
            timeout_ms: None,
            collect_metrics: true,
        }
    }
}

impl MergeConfig {
    #[must_use]
    pub fn sequential() -> Self {
        Self {
            exec_mode: ExecMode::Sequential,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_null_ordering(mut self, null_ordering: NullOrdering) -> Self {
        self.null_ordering = null_ordering;
        self
    }

    #[must_use]
    pub const fn with_exec_mode(mut self, exec_mode: ExecMode) -> Self {
        self.exec_mode = exec_mode;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    #[must_use]
    pub const fn with_metrics(mut self, collect_metrics: bool) -> Self {
        self.collect_metrics = collect_metrics;
        self
    }

    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Parse and validate a JSON document.
    ///
    /// # Errors
    /// Fails on malformed JSON, unknown fields or invalid values.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).context("parsing merge config")?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    ///
    /// # Errors
    /// Fails if the file cannot be read or [`from_json`](Self::from_json)
    /// fails.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading merge config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("in {}", path.display()))
    }

    /// # Errors
    /// Rejects a parallel mode with zero threads.
    pub fn validate(&self) -> Result<()> {
        if let ExecMode::Parallel { threads: Some(0) } = self.exec_mode {
            bail!("exec_mode.threads must be at least 1");
        }
        Ok(())
    }
}
