//! CLI command implementations
//!
//! This module contains the implementation for each CLI command.

use crate::definition::MachineDefinition;
use crate::state_machine::{MooreMachine, OutputSink, StateGraph};
use crate::{Result, cli::Cli};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Load a definition file and build its machine
fn load_machine(
    path: &Path,
    sink: Arc<dyn OutputSink>,
) -> Result<(MachineDefinition, MooreMachine<String>)> {
    tracing::info!("Loading machine definition from {:?}", path);
    let definition = MachineDefinition::from_file(path)?;
    let machine = definition.build(sink)?;
    Ok((definition, machine))
}

/// Analyze command implementation
pub mod analyze {
    use super::*;
    use crate::cli::OutputFormat;
    use crate::state_machine::{TextReport, TracingSink};

    /// Execute the analyze command
    pub fn execute(definition: PathBuf, output_format: OutputFormat) -> Result<()> {
        let (definition, machine) = load_machine(&definition, Arc::new(TracingSink))?;
        let graph = StateGraph::from_machine(&machine);
        let unreachable = graph.unreachable_states();
        let stats = graph.stats();

        let mut stdout = std::io::stdout();
        let report = match output_format {
            OutputFormat::Text => {
                let mut sink = TextReport::new(&mut stdout);
                let report = machine.analyze_with(&mut sink)?;
                crate::cli::output::output_text_notes(&mut stdout, &unreachable, &stats)?;
                report
            }
            OutputFormat::Json => {
                let report = machine.analyze();
                crate::cli::output::output_json(
                    &mut stdout,
                    &definition.machine.name,
                    &report,
                    &unreachable,
                    &stats,
                )?;
                report
            }
        };

        tracing::info!(
            "Analysis of {} finished: {} ({} missing transition(s))",
            definition.machine.name,
            report.verdict(),
            report.missing.len()
        );
        Ok(())
    }
}

/// Run command implementation
pub mod run {
    use super::*;
    use crate::Config;
    use crate::cli::Commands;
    use crate::shutdown::shutdown_signal;
    use crate::state_machine::StdoutSink;
    use std::time::Duration;
    use tokio::io::{AsyncBufReadExt, BufReader};

    /// Execute the run command
    pub async fn execute(args: Cli, config: Config) -> Result<()> {
        let (definition, delay_ms, interval_ms, consume_delay_ms, duration_secs) =
            match args.command {
                Commands::Run {
                    definition,
                    delay_ms,
                    interval_ms,
                    consume_delay_ms,
                    duration_secs,
                } => (
                    definition,
                    delay_ms,
                    interval_ms,
                    consume_delay_ms,
                    duration_secs,
                ),
                _ => unreachable!("run::execute called with wrong command"),
            };

        let mut timing = config.timing.clone();
        if let Some(ms) = delay_ms {
            timing.delay_ms = ms;
        }
        if let Some(ms) = interval_ms {
            timing.interval_ms = ms;
        }
        if let Some(ms) = consume_delay_ms {
            timing.consume_delay_ms = ms;
        }

        let (definition, machine) = load_machine(&definition, Arc::new(StdoutSink))?;
        let machine = Arc::new(machine.with_pacing((&timing).into()));
        tracing::info!(
            "Running {} (interval {} ms); type input symbols followed by Enter",
            definition.machine.name,
            timing.interval_ms
        );

        // Input source: one symbol per stdin line
        let producer = {
            let machine = machine.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(tokio::io::stdin()).lines();
                loop {
                    match lines.next_line().await {
                        Ok(Some(line)) => {
                            let symbol = line.trim().to_string();
                            if symbol.is_empty() {
                                continue;
                            }
                            if !machine.accepts(&symbol) {
                                tracing::warn!("Ignoring {:?}: not in the alphabet", symbol);
                                continue;
                            }
                            machine.set_input(symbol);
                        }
                        Ok(None) => {
                            tracing::debug!("Input closed");
                            break;
                        }
                        Err(e) => {
                            tracing::warn!("Failed to read input: {}", e);
                            break;
                        }
                    }
                }
            })
        };

        let stop = async move {
            let signal = async {
                if let Err(error) = shutdown_signal().await {
                    tracing::warn!(error = %error, "shutdown signal listener failed");
                }
            };

            match duration_secs {
                Some(secs) => {
                    tokio::select! {
                        _ = signal => {}
                        _ = tokio::time::sleep(Duration::from_secs(secs)) => {
                            tracing::info!("Run duration of {}s elapsed", secs);
                        }
                    }
                }
                None => signal.await,
            }
        };

        let result = machine.run(stop).await;
        producer.abort();
        result
    }
}

/// Validate command implementation
pub mod validate {
    use super::*;

    /// Execute the validate command
    pub fn execute(path: PathBuf) -> Result<()> {
        tracing::info!("Validating machine definition: {:?}", path);

        let definition = match MachineDefinition::from_file(&path) {
            Ok(d) => d,
            Err(e) => {
                eprintln!("❌ Failed to load definition: {}", e);
                return Err(e);
            }
        };
        let report = definition.validate();

        println!("📋 Machine Definition Report");
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        println!("File: {:?}", path);
        println!();
        println!("Machine:");
        println!("  Name: {}", definition.machine.name);
        if let Some(ref desc) = definition.machine.description {
            println!("  Description: {}", desc);
        }
        println!("  Initial: {}", definition.machine.initial);
        println!("  Alphabet: {}", definition.machine.alphabet.join(", "));
        println!();
        println!("States: {}", definition.states.len());
        for state in &definition.states {
            match &state.output {
                Some(output) => println!("    - {} => {}", state.name, output),
                None => println!("    - {}", state.name),
            }
        }
        println!("Transitions: {}", definition.transitions.len());
        println!();

        if !report.errors.is_empty() {
            println!("❌ Errors:");
            for error in &report.errors {
                println!("   {}", error);
            }
            println!();
        }

        if !report.warnings.is_empty() {
            println!("⚠️  Warnings:");
            for warning in &report.warnings {
                println!("   {}", warning);
            }
            println!();
        }

        if report.is_valid() {
            println!("✅ Definition is valid!");
            Ok(())
        } else {
            println!(
                "❌ Definition validation failed with {} error(s)",
                report.errors.len()
            );
            Err(crate::Error::definition("validation failed"))
        }
    }
}

/// Graph command implementation
pub mod graph {
    use super::*;
    use crate::state_machine::TracingSink;

    /// Execute the graph command
    pub fn execute(definition: PathBuf, out: Option<PathBuf>) -> Result<()> {
        let (_, machine) = load_machine(&definition, Arc::new(TracingSink))?;
        let dot = StateGraph::from_machine(&machine).to_dot();

        match out {
            Some(path) => {
                std::fs::write(&path, dot)?;
                tracing::info!("Graph exported to {:?}", path);
            }
            None => print!("{}", dot),
        }
        Ok(())
    }
}
