//! Machine definition files
//!
//! A definition describes a string-symbol Moore machine in TOML:
//!
//! ```toml
//! [machine]
//! name = "turnstile"
//! alphabet = ["coin", "push"]
//! initial = "Locked"
//!
//! [[state]]
//! name = "Locked"
//! output = "locked"
//!
//! [[state]]
//! name = "Unlocked"
//! output = "unlocked"
//!
//! [[transition]]
//! from = "Locked"
//! input = "coin"
//! to = "Unlocked"
//! ```

use crate::state_machine::{MooreMachine, OutputSink, State, TransitionTable};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineDefinition {
    pub machine: MachineInfo,
    #[serde(default, rename = "state")]
    pub states: Vec<StateDef>,
    #[serde(default, rename = "transition")]
    pub transitions: Vec<TransitionDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineInfo {
    pub name: String,
    pub description: Option<String>,
    pub alphabet: Vec<String>,
    pub initial: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateDef {
    pub name: String,
    /// Value emitted on every tick spent in this state
    pub output: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionDef {
    pub from: String,
    pub input: String,
    pub to: String,
}

/// Problems found by [`MachineDefinition::validate`]
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

impl MachineDefinition {
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let contents = std::fs::read_to_string(&path)?;
        toml::from_str(&contents).map_err(|e| Error::DefinitionParse {
            file: path,
            message: e.to_string(),
        })
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Check the definition without building anything
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();

        if self.machine.name.trim().is_empty() {
            report.errors.push("Machine name cannot be empty".to_string());
        }
        if self.states.is_empty() {
            report.errors.push("At least one state is required".to_string());
        }

        let mut state_names = HashSet::new();
        for state in &self.states {
            if state.name.trim().is_empty() {
                report.errors.push("State name cannot be empty".to_string());
            } else if !state_names.insert(state.name.as_str()) {
                report
                    .errors
                    .push(format!("Duplicate state name: {}", state.name));
            }
            if state.output.is_none() {
                report
                    .warnings
                    .push(format!("State {} has no output", state.name));
            }
        }

        let mut symbols = HashSet::new();
        for symbol in &self.machine.alphabet {
            if !symbols.insert(symbol.as_str()) {
                report
                    .errors
                    .push(format!("Duplicate alphabet symbol: {}", symbol));
            }
        }

        if !state_names.contains(self.machine.initial.as_str()) {
            report.errors.push(format!(
                "Initial state {} is not a declared state",
                self.machine.initial
            ));
        }

        let mut defined: HashMap<(&str, &str), &str> = HashMap::new();
        let mut used_symbols = HashSet::new();
        for t in &self.transitions {
            if !state_names.contains(t.from.as_str()) {
                report
                    .errors
                    .push(format!("Transition from unknown state {}", t.from));
            }
            if !state_names.contains(t.to.as_str()) {
                report
                    .errors
                    .push(format!("Transition to unknown state {}", t.to));
            }
            if !symbols.contains(t.input.as_str()) {
                report.errors.push(format!(
                    "Transition on symbol {} which is not in the alphabet",
                    t.input
                ));
            }
            used_symbols.insert(t.input.as_str());

            if let Some(existing) = defined.insert((t.from.as_str(), t.input.as_str()), &t.to)
                && existing != t.to
            {
                report.errors.push(format!(
                    "Conflicting transitions for ({}, {}): {} and {}",
                    t.from, t.input, existing, t.to
                ));
            }
        }

        for symbol in &self.machine.alphabet {
            if !used_symbols.contains(symbol.as_str()) {
                report
                    .warnings
                    .push(format!("Symbol {} is never used by a transition", symbol));
            }
        }

        report
    }

    /// Build a machine whose states emit their outputs to `sink`
    pub fn build(&self, sink: Arc<dyn OutputSink>) -> Result<MooreMachine<String>> {
        let report = self.validate();
        if let Some(first) = report.errors.first() {
            return Err(Error::definition(format!(
                "{} ({} error(s) in total)",
                first,
                report.errors.len()
            )));
        }

        let states: Vec<State> = self
            .states
            .iter()
            .map(|def| match &def.output {
                Some(output) => State::emitting(def.name.clone(), sink.clone(), output.clone()),
                None => State::silent(def.name.clone()),
            })
            .collect();
        let by_name: HashMap<&str, &State> = states.iter().map(|s| (s.name(), s)).collect();

        let mut table = TransitionTable::new();
        for t in &self.transitions {
            let (Some(from), Some(to)) = (by_name.get(t.from.as_str()), by_name.get(t.to.as_str()))
            else {
                return Err(Error::definition(format!(
                    "Transition ({}, {}) references an unknown state",
                    t.from, t.input
                )));
            };
            table.insert(from, t.input.clone(), to)?;
        }

        let initial = State::silent(self.machine.initial.clone());
        tracing::debug!(
            machine = %self.machine.name,
            transitions = table.len(),
            "Building machine from definition"
        );

        MooreMachine::new(self.machine.alphabet.clone(), states, initial, table)
    }
}
