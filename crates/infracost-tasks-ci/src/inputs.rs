//! Task input surface.
//!
//! The pipeline agent hands task inputs to the process as `INPUT_<NAME>`
//! environment variables. Names are matched case-insensitively with `.` and
//! spaces folded to `_`, the same way the agent writes them.

use infracost_tasks_core::{Result, TaskError};
use std::collections::BTreeMap;

const INPUT_PREFIX: &str = "INPUT_";

/// Named string inputs for a single task invocation.
#[derive(Debug, Clone, Default)]
pub struct TaskInputs {
    values: BTreeMap<String, String>,
}

impl TaskInputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect inputs from the current process environment.
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Collect inputs from `INPUT_*` variables in `vars`.
    pub fn from_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let values = vars
            .into_iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(INPUT_PREFIX)
                    .map(|name| (normalize_name(name), value))
            })
            .collect();
        Self { values }
    }

    /// Set an input, replacing any value collected from the environment.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        self.values.insert(normalize_name(name), value.into());
        self
    }

    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Read an input. Blank values count as absent.
    pub fn get_input(&self, name: &str, required: bool) -> Result<Option<String>> {
        let value = self
            .values
            .get(&normalize_name(name))
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        match value {
            None if required => Err(TaskError::MissingInput(name.to_string())),
            other => Ok(other),
        }
    }

    /// Read a required input.
    pub fn require(&self, name: &str) -> Result<String> {
        self.get_input(name, true)?
            .ok_or_else(|| TaskError::MissingInput(name.to_string()))
    }

    /// Read an optional input.
    pub fn optional(&self, name: &str) -> Option<String> {
        self.get_input(name, false).ok().flatten()
    }

    /// Boolean inputs are true only when spelled `true` (any case).
    pub fn get_bool_input(&self, name: &str) -> bool {
        self.optional(name)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    /// Parse an optional input, falling back to `default` when absent.
    pub fn parse_or<T>(&self, name: &str, default: T) -> Result<T>
    where
        T: std::str::FromStr<Err = TaskError>,
    {
        match self.optional(name) {
            Some(raw) => raw.parse(),
            None => Ok(default),
        }
    }
}

fn normalize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '.' | ' ' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect()
}
