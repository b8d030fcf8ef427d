//! Output formatting module
//!
//! This module formats analysis results for the supported output formats.

use crate::{
    Result,
    state_machine::{AnalysisReport, GraphStats, State},
};
use serde_json::json;

/// Output an analysis report as JSON
pub fn output_json(
    w: &mut impl std::io::Write,
    machine_name: &str,
    report: &AnalysisReport<String>,
    unreachable: &[&State],
    stats: &GraphStats,
) -> Result<()> {
    let output = json!({
        "machine": machine_name,
        "verdict": report.verdict().display_name(),
        "deterministic": report.is_complete(),
        "checked": report.checked,
        "missing": report.missing.iter().map(|t| {
            json!({
                "state": t.from.name(),
                "input": t.input,
            })
        }).collect::<Vec<_>>(),
        "unreachable": unreachable.iter().map(|s| s.name()).collect::<Vec<_>>(),
        "stats": {
            "states": stats.total_states,
            "transitions": stats.total_transitions,
            "trap_states": stats.trap_states,
            "cycles": stats.has_cycles,
        },
    });

    serde_json::to_writer_pretty(&mut *w, &output)?;
    writeln!(w)?;
    Ok(())
}

/// Output reachability notes that follow the analyzer's text report
pub fn output_text_notes(
    w: &mut impl std::io::Write,
    unreachable: &[&State],
    stats: &GraphStats,
) -> Result<()> {
    writeln!(w)?;
    writeln!(w, "Summary:")?;
    writeln!(w, "  States:       {}", stats.total_states)?;
    writeln!(w, "  Transitions:  {}", stats.total_transitions)?;
    writeln!(w, "  Trap states:  {}", stats.trap_states)?;
    writeln!(w, "  Cycles:       {}", if stats.has_cycles { "yes" } else { "no" })?;

    if !unreachable.is_empty() {
        writeln!(w)?;
        writeln!(w, "Unreachable from the initial state:")?;
        for state in unreachable {
            writeln!(w, "  {}", state)?;
        }
    }

    Ok(())
}
