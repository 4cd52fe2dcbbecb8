//! A stand-in for a paused debuggee.
//!
//! Variables are plain integers. Every [`SimulatedDebuggee::step`] advances
//! the step counter and moves each variable by its 1-based position, so
//! watch values visibly change from one step to the next.

use indexmap::IndexMap;
use thiserror::Error;
use tracing::debug;

use crate::eval::{Scope, Value};

/// Error returned when a `NAME=VALUE` binding cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseVarError {
    #[error("expected NAME=VALUE, got '{0}'")]
    MissingEquals(String),
    #[error("invalid variable name '{0}'")]
    InvalidName(String),
    #[error("invalid integer value '{0}'")]
    InvalidValue(String),
}

/// Parse a `NAME=VALUE` binding such as `x=3`.
pub fn parse_var(input: &str) -> Result<(String, i64), ParseVarError> {
    let (name, value) = input
        .split_once('=')
        .ok_or_else(|| ParseVarError::MissingEquals(input.to_string()))?;
    let name = name.trim();
    let valid_name = name.chars().next().is_some_and(|c| c.is_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_alphanumeric() || c == '_');
    if !valid_name || matches!(name, "true" | "false") {
        return Err(ParseVarError::InvalidName(name.to_string()));
    }
    let value = value
        .trim()
        .parse::<i64>()
        .map_err(|_| ParseVarError::InvalidValue(value.trim().to_string()))?;
    Ok((name.to_string(), value))
}

#[derive(Debug, Clone, Default)]
pub struct SimulatedDebuggee {
    variables: IndexMap<String, i64>,
    steps: u64,
}

impl SimulatedDebuggee {
    pub fn new(variables: impl IntoIterator<Item = (String, i64)>) -> Self {
        Self {
            variables: variables.into_iter().collect(),
            steps: 0,
        }
    }

    pub fn variables(&self) -> &IndexMap<String, i64> {
        &self.variables
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn step(&mut self) {
        self.steps += 1;
        for (position, value) in self.variables.values_mut().enumerate() {
            *value = value.wrapping_add(position as i64 + 1);
        }
        debug!(steps = self.steps, "debuggee stepped");
    }
}

impl Scope for SimulatedDebuggee {
    /// Variables shadow the built-in `step` counter.
    fn lookup(&self, name: &str) -> Option<Value> {
        self.variables.lookup(name).or_else(|| {
            (name == "step").then(|| Value::Int(i64::try_from(self.steps).unwrap_or(i64::MAX)))
        })
    }
}
