//! Moore finite state machines
//!
//! A Moore machine's output depends only on its current state; its next
//! state depends on the current state and the consumed input symbol.
//!
//! This library provides functionality for:
//! - Declaring states with output actions and (possibly partial) transition functions
//! - Running a machine as a cancellable, paced tokio task fed by external producers
//! - Analyzing whether a transition function is total over states × alphabet
//! - Loading machines from TOML definition files and exporting them to Graphviz
//!
//! ```
//! use moore_fsm::state_machine::{MooreMachine, State, TransitionTable, Verdict};
//!
//! let s0 = State::silent("S0");
//! let s1 = State::silent("S1");
//! let table = TransitionTable::new()
//!     .define(&s0, 'a', &s1)?
//!     .define(&s1, 'b', &s0)?;
//! let machine = MooreMachine::new(vec!['a', 'b'], vec![s0.clone(), s1], s0, table)?;
//!
//! let report = machine.analyze();
//! assert_eq!(report.verdict(), Verdict::PartiallySpecified);
//! assert_eq!(report.missing.len(), 2);
//! # Ok::<(), moore_fsm::Error>(())
//! ```

pub mod cli;
pub mod config;
pub mod definition;
pub mod error;
pub mod shutdown;
pub mod state_machine;

pub use config::Config;
pub use error::{Error, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initialize logging from the logging configuration.
///
/// `RUST_LOG` takes precedence over the configured level. Logs go to the
/// configured file, or to stderr so they never mix with machine output.
pub fn init_logging(logging: &config::LoggingConfig) -> Result<()> {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| Error::Config(format!("Failed to open log file {:?}: {}", path, e)))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(std::sync::Mutex::new(file)),
                )
                .try_init()
                .map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))?;
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .try_init()
                .map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert_eq!(NAME, "moore-fsm");
    }
}
