use std::fmt::Write;
use std::path::Path;

use crate::models::log::LogLevel;
use crate::models::outcome::OperationReport;

/// Plain operation history, one `[HH:MM:SS] message` line per event.
/// Debug events are left out.
pub fn export_log(report: &OperationReport, output_path: &Path) -> anyhow::Result<()> {
    std::fs::write(output_path, render_log(report)?)?;
    Ok(())
}

pub fn render_log(report: &OperationReport) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    writeln!(
        out,
        "# {} -> {}",
        report.request.source_root.display(),
        report.request.destination_root.display()
    )?;
    writeln!(out, "# started {}", report.started_at.format("%Y-%m-%d %H:%M:%S"))?;

    for event in report.log.iter().filter(|e| e.level > LogLevel::Debug) {
        writeln!(out, "{}", event)?;
    }

    let s = &report.summary;
    writeln!(
        out,
        "# {}: {}/{} items in {} ms",
        s.outcome, s.completed, s.total, s.elapsed_ms
    )?;
    Ok(out)
}
