use super::*;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub(crate) const DEFAULT_TRACE_LOG_LIMIT: usize = 10_000;

/// Trace settings applied to every session the editor loads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    pub enabled: bool,
    /// Facts gathered while reading a plan, such as shadowed duplicate properties.
    pub parse: bool,
    /// One line per mutation.
    pub edits: bool,
    pub log_limit: usize,
    /// Also emit every line through `tracing` at debug level.
    pub forward: bool,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            parse: true,
            edits: true,
            log_limit: DEFAULT_TRACE_LOG_LIMIT,
            forward: true,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct TraceState {
    pub(crate) enabled: bool,
    pub(crate) parse: bool,
    pub(crate) edits: bool,
    pub(crate) logs: VecDeque<String>,
    pub(crate) log_limit: usize,
    pub(crate) forward: bool,
}

impl Default for TraceState {
    fn default() -> Self {
        Self::from_config(&TraceConfig::default())
    }
}

impl TraceState {
    pub(crate) fn from_config(config: &TraceConfig) -> Self {
        Self {
            enabled: config.enabled,
            parse: config.parse,
            edits: config.edits,
            logs: VecDeque::new(),
            log_limit: config.log_limit.max(1),
            forward: config.forward,
        }
    }

    pub(crate) fn parse_line(&mut self, line: impl FnOnce() -> String) {
        if self.enabled && self.parse {
            self.trace_line(format!("[parse] {}", line()));
        }
    }

    pub(crate) fn edit_line(&mut self, line: impl FnOnce() -> String) {
        if self.enabled && self.edits {
            self.trace_line(format!("[edit] {}", line()));
        }
    }

    fn trace_line(&mut self, line: String) {
        if self.forward {
            tracing::debug!(target: "jmx_studio::trace", "{line}");
        }
        if self.logs.len() >= self.log_limit {
            self.logs.pop_front();
        }
        self.logs.push_back(line);
    }

    pub(crate) fn set_log_limit(&mut self, max_entries: usize) -> Result<()> {
        if max_entries == 0 {
            return Err(Error::Validation(
                "set_trace_log_limit requires at least 1 entry".into(),
            ));
        }
        self.log_limit = max_entries;
        while self.logs.len() > self.log_limit {
            self.logs.pop_front();
        }
        Ok(())
    }

    pub(crate) fn take_logs(&mut self) -> Vec<String> {
        self.logs.drain(..).collect()
    }
}
