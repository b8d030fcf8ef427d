//! Transition representation

use crate::state_machine::{State, StateId};
use crate::{Error, Result};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// Maps a (state, symbol) pair to the next state.
///
/// `None` means the pair is undefined, which is a normal result and distinct
/// from a self-loop. Implementations must be pure: the run loop and the
/// analyzer both rely on repeated calls agreeing.
pub trait TransitionFunction<T>: Send + Sync {
    fn resolve(&self, state: &State, symbol: &T) -> Option<State>;
}

impl<T, F> TransitionFunction<T> for F
where
    F: Fn(&State, &T) -> Option<State> + Send + Sync,
{
    fn resolve(&self, state: &State, symbol: &T) -> Option<State> {
        self(state, symbol)
    }
}

/// Hash-table backed transition function
#[derive(Clone)]
pub struct TransitionTable<T> {
    table: HashMap<StateId, HashMap<T, State>>,
}

impl<T> Default for TransitionTable<T> {
    fn default() -> Self {
        Self {
            table: HashMap::new(),
        }
    }
}

impl<T> TransitionTable<T>
where
    T: Eq + Hash + fmt::Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `(from, symbol)` to `to`.
    ///
    /// Mapping an already defined pair to the same destination is a no-op;
    /// mapping it to a different one would make the machine nondeterministic
    /// and is rejected.
    pub fn insert(&mut self, from: &State, symbol: T, to: &State) -> Result<()> {
        let row = self.table.entry(from.name().to_string()).or_default();
        if let Some(existing) = row.get(&symbol) {
            if existing == to {
                return Ok(());
            }
            return Err(Error::ConflictingTransition {
                state: from.name().to_string(),
                symbol: format!("{:?}", symbol),
                existing: existing.name().to_string(),
            });
        }
        row.insert(symbol, to.clone());
        Ok(())
    }

    /// Chainable form of [`insert`](Self::insert)
    pub fn define(mut self, from: &State, symbol: T, to: &State) -> Result<Self> {
        self.insert(from, symbol, to)?;
        Ok(self)
    }

    /// Number of defined pairs
    pub fn len(&self) -> usize {
        self.table.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> TransitionFunction<T> for TransitionTable<T>
where
    T: Eq + Hash + Send + Sync,
{
    fn resolve(&self, state: &State, symbol: &T) -> Option<State> {
        self.table
            .get(state.name())
            .and_then(|row| row.get(symbol))
            .cloned()
    }
}

/// A (source, symbol, destination) triple.
///
/// The analyzer reports gaps as transitions with no destination.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<T> {
    pub from: State,
    pub input: T,
    pub to: Option<State>,
}

impl<T> Transition<T> {
    pub fn new(from: State, input: T, to: Option<State>) -> Self {
        Self { from, input, to }
    }

    /// Transition with no destination
    pub fn undefined(from: State, input: T) -> Self {
        Self::new(from, input, None)
    }
}

impl<T: fmt::Display> fmt::Display for Transition<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.to {
            Some(to) => write!(f, "({}, \"{}\") -> {}", self.from, self.input, to),
            None => write!(f, "({}, \"{}\") -> undefined", self.from, self.input),
        }
    }
}
