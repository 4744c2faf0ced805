use crate::samples;
use crate::vm::stack::DEFAULT_STACK_CAPACITY;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read run file: {0}")]
    FileReadError(#[from] std::io::Error),
    #[error("Failed to parse run file: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid run file: {0}")]
    Invalid(String),
}

fn default_stack_capacity() -> usize {
    DEFAULT_STACK_CAPACITY
}

/// A run file: the stack bound shared by every program and the programs themselves.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_stack_capacity")]
    pub stack_capacity: usize,
    #[serde(default)]
    pub programs: Vec<ProgramConfig>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ProgramConfig {
    pub name: String,
    /// Flat encoding: opcodes interleaved with inline operands.
    pub code: Vec<i64>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// The built-in reference programs at the default capacity.
    pub fn samples() -> Self {
        Self {
            stack_capacity: DEFAULT_STACK_CAPACITY,
            programs: samples::ALL
                .iter()
                .map(|s| ProgramConfig {
                    name: s.name.to_string(),
                    code: s.code.to_vec(),
                })
                .collect(),
        }
    }

    /// Checks the run file for mistakes the interpreter itself would not report.
    /// Malformed bytecode is left to evaluation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stack_capacity == 0 {
            return Err(ConfigError::Invalid(
                "stack_capacity must be at least 1".to_string(),
            ));
        }
        if self.programs.is_empty() {
            return Err(ConfigError::Invalid("no programs to run".to_string()));
        }

        let mut seen = HashSet::new();
        for (i, program) in self.programs.iter().enumerate() {
            if program.name.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("program #{} has no name", i + 1)));
            }
            if !seen.insert(program.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate program name '{}'",
                    program.name
                )));
            }
        }
        Ok(())
    }
}
