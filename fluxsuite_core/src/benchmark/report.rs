//! Markdown and terminal rendering of comparison results
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use prettytable::{row, Table};

use crate::benchmark::comparator::{ComparisonResult, ComparisonSummary, Statistics};
use crate::benchmark::{BenchmarkError, FLUX_TOLERANCE, OBJECTIVE_TOLERANCE};

/// Rows shown in the detail table unless asked otherwise
pub const DEFAULT_DETAIL_ROWS: usize = 20;

fn milliseconds(value: f64) -> String {
    format!("{:.1}", value)
}

fn optional(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.2e}", v))
}

fn verdict(comparison: &ComparisonResult) -> &'static str {
    if comparison.passed {
        "PASS"
    } else {
        "FAIL"
    }
}

/// Failed comparisons first, then the rest, each group keeping its order
fn detail_rows(comparisons: &[ComparisonResult], max_rows: usize) -> Vec<&ComparisonResult> {
    let (failed, passed): (Vec<_>, Vec<_>) = comparisons.iter().partition(|c| !c.passed);
    failed.into_iter().chain(passed).take(max_rows).collect()
}

/// Render the summary and up to `max_rows` comparisons as a Markdown document
pub fn render_markdown(
    summary: &ComparisonSummary,
    comparisons: &[ComparisonResult],
    max_rows: usize,
) -> String {
    let mut out = String::new();
    // Writing into a String can't fail
    let _ = write_markdown(&mut out, summary, comparisons, max_rows);
    out
}

fn write_markdown(
    out: &mut String,
    summary: &ComparisonSummary,
    comparisons: &[ComparisonResult],
    max_rows: usize,
) -> std::fmt::Result {
    writeln!(out, "# Solver benchmark report\n")?;
    writeln!(out, "Generated: {}\n", summary.timestamp)?;
    writeln!(
        out,
        "Objective tolerance: {:.0e}, flux tolerance: {:.0e}\n",
        OBJECTIVE_TOLERANCE, FLUX_TOLERANCE
    )?;

    writeln!(out, "## Summary\n")?;
    writeln!(out, "| Metric | Value |")?;
    writeln!(out, "|---|---|")?;
    writeln!(out, "| Comparisons | {} |", summary.total_comparisons)?;
    writeln!(out, "| Passed | {} |", summary.passed)?;
    writeln!(out, "| Failed | {} |", summary.failed)?;
    writeln!(out, "| Pass rate | {:.1}% |", summary.pass_rate * 100.)?;
    let mut stat_rows = |label: &str, stats: &Option<Statistics>| -> std::fmt::Result {
        if let Some(stats) = stats {
            writeln!(out, "| {} mean | {:.2e} |", label, stats.mean)?;
            writeln!(out, "| {} std | {:.2e} |", label, stats.std)?;
            writeln!(out, "| {} max | {:.2e} |", label, stats.max)?;
        }
        Ok(())
    };
    stat_rows("Objective difference", &summary.objective_diff)?;
    stat_rows("Flux L2 norm", &summary.flux_l2_norm)?;

    let rows = detail_rows(comparisons, max_rows);
    writeln!(out, "\n## Comparisons\n")?;
    if rows.len() < comparisons.len() {
        writeln!(
            out,
            "Showing {} of {} comparisons, failures first.\n",
            rows.len(),
            comparisons.len()
        )?;
    }
    writeln!(
        out,
        "| Model | Method | Solvers | Time A (ms) | Time B (ms) | Objective diff | Flux L2 | Max flux diff | Result | Notes |"
    )?;
    writeln!(out, "|---|---|---|---|---|---|---|---|---|---|")?;
    for c in rows {
        writeln!(
            out,
            "| {} | {} | {}/{} | {} | {} | {} | {} | {} | {} | {} |",
            c.model_id,
            c.method,
            c.solver_a,
            c.solver_b,
            milliseconds(c.time_a_ms),
            milliseconds(c.time_b_ms),
            optional(c.objective_diff),
            optional(c.flux_l2_norm),
            optional(c.flux_max_diff),
            verdict(c),
            c.notes.join("; ")
        )?;
    }
    Ok(())
}

/// Terminal table of up to `max_rows` comparisons
pub fn comparison_table(comparisons: &[ComparisonResult], max_rows: usize) -> Table {
    let mut table = Table::new();
    table.add_row(row![
        "model",
        "method",
        "time A (ms)",
        "time B (ms)",
        "objective diff",
        "flux L2",
        "result"
    ]);
    for c in detail_rows(comparisons, max_rows) {
        table.add_row(row![
            c.model_id,
            c.method,
            milliseconds(c.time_a_ms),
            milliseconds(c.time_b_ms),
            optional(c.objective_diff),
            optional(c.flux_l2_norm),
            verdict(c),
        ]);
    }
    table
}

/// Write the Markdown report to `path`, and the summary with every comparison as JSON
/// next to it
pub fn write_report<P: AsRef<Path>>(
    path: P,
    summary: &ComparisonSummary,
    comparisons: &[ComparisonResult],
    max_rows: usize,
) -> Result<(), BenchmarkError> {
    let path = path.as_ref();
    fs::write(path, render_markdown(summary, comparisons, max_rows))
        .map_err(|e| BenchmarkError::io(path, e))?;
    let json_path = path.with_extension("json");
    let document = serde_json::json!({"summary": summary, "comparisons": comparisons});
    fs::write(&json_path, serde_json::to_string_pretty(&document)?)
        .map_err(|e| BenchmarkError::io(&json_path, e))?;
    log::info!("Report written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmark::comparator::{compare, summarize};
    use crate::benchmark::runner::SolveResult;

    fn comparisons() -> Vec<ComparisonResult> {
        (0..4)
            .map(|i| {
                let a = SolveResult {
                    model_id: format!("m{}", i),
                    method: "fba".to_string(),
                    solver: "clarabel".to_string(),
                    status: "optimal".to_string(),
                    objective_value: Some(1.),
                    fluxes: None,
                    solve_time_ms: 1.,
                    error: None,
                };
                let mut b = a.clone();
                b.solver = "microlp".to_string();
                b.solve_time_ms = 2.5;
                if i == 3 {
                    b.objective_value = Some(2.);
                }
                compare(&a, &b)
            })
            .collect()
    }

    #[test]
    fn markdown_lists_failures_first() {
        let comparisons = comparisons();
        let summary = summarize(&comparisons);
        let markdown = render_markdown(&summary, &comparisons, 2);
        assert!(markdown.contains("| Pass rate | 75.0% |"));
        assert!(markdown.contains("Showing 2 of 4 comparisons"));
        let failed = markdown.find("| m3 |").unwrap();
        let first_pass = markdown.find("| m0 |").unwrap();
        assert!(failed < first_pass);
        assert!(!markdown.contains("| m1 |"));
        assert!(markdown.contains("| Time A (ms) | Time B (ms) |"));
        assert!(markdown.contains("| m3 | fba | clarabel/microlp | 1.0 | 2.5 |"));
    }

    #[test]
    fn table_rows() {
        let table = comparison_table(&comparisons(), DEFAULT_DETAIL_ROWS);
        assert_eq!(table.len(), 5);
        let header = table.get_row(0).unwrap();
        assert_eq!(header.get_cell(2).unwrap().get_content(), "time A (ms)");
        assert_eq!(table.get_row(1).unwrap().get_cell(3).unwrap().get_content(), "2.5");
    }

    #[test]
    fn report_files() {
        let comparisons = comparisons();
        let summary = summarize(&comparisons);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.md");
        write_report(&path, &summary, &comparisons, DEFAULT_DETAIL_ROWS).unwrap();
        assert!(fs::read_to_string(&path).unwrap().starts_with("# Solver benchmark report"));
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("report.json")).unwrap())
                .unwrap();
        assert_eq!(json["comparisons"].as_array().unwrap().len(), 4);
    }
}
