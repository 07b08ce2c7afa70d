use clap::{Args, ValueEnum};
use grade_highlighter::config::AppConfig;
use grade_highlighter::error::AppError;
use grade_highlighter::highlight::{
    legend, render_html, HighlightReport, HighlightScanner, ScanInput, SettingsStore,
    TableImporter,
};
use serde::Serialize;
use std::path::PathBuf;

use crate::infra::settings_store;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Text,
    Json,
    Html,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct ScanArgs {
    /// CSV export of the students table
    pub(crate) table: PathBuf,
    /// CSV of `label,count` rows from the distribution widget
    #[arg(long)]
    pub(crate) distribution: Option<PathBuf>,
    /// Total number of students shown next to the distribution widget
    #[arg(long)]
    pub(crate) total: Option<String>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub(crate) format: OutputFormat,
    /// Write the rendered report here instead of stdout
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    /// Override the configured settings file
    #[arg(long)]
    pub(crate) settings: Option<PathBuf>,
}

pub(crate) fn run_scan(args: ScanArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let rendered = scan_once(&config, &args)?;
    emit(&args, &rendered)
}

/// Loads inputs and settings fresh and renders one pass.
pub(crate) fn scan_once(config: &AppConfig, args: &ScanArgs) -> Result<String, AppError> {
    let settings = settings_store(config, args.settings.clone()).load()?;
    let input = load_input(args)?;
    let report = HighlightScanner::new(settings).scan(&input);
    render(&input, &report, args.format)
}

pub(crate) fn emit(args: &ScanArgs, rendered: &str) -> Result<(), AppError> {
    match &args.output {
        Some(path) => std::fs::write(path, rendered)?,
        None => println!("{rendered}"),
    }
    Ok(())
}

pub(crate) fn load_input(args: &ScanArgs) -> Result<ScanInput, AppError> {
    let rows = TableImporter::rows_from_path(&args.table)?;
    let distribution = match &args.distribution {
        Some(path) => Some(TableImporter::distribution_from_path(
            path,
            args.total.clone(),
        )?),
        None => None,
    };

    Ok(ScanInput { rows, distribution })
}

#[derive(Serialize)]
struct JsonReport<'a> {
    report: &'a HighlightReport,
    summary: grade_highlighter::highlight::ScanSummary,
}

pub(crate) fn render(
    input: &ScanInput,
    report: &HighlightReport,
    format: OutputFormat,
) -> Result<String, AppError> {
    match format {
        OutputFormat::Text => Ok(render_text(input, report)),
        OutputFormat::Html => Ok(render_html(input, report)),
        OutputFormat::Json => serde_json::to_string_pretty(&JsonReport {
            report,
            summary: report.summary(),
        })
        .map_err(|err| AppError::Io(err.into())),
    }
}

fn render_text(input: &ScanInput, report: &HighlightReport) -> String {
    let summary = report.summary();
    let mut lines = vec![
        "Grade highlight pass".to_string(),
        format!(
            "Rows evaluated: {} ({} skipped, {} highlighted)",
            summary.data_rows, summary.skipped_rows, summary.highlighted_rows
        ),
        String::new(),
    ];

    if summary.highlighted_rows == 0 {
        lines.push("Highlighted rows: none".to_string());
    } else {
        lines.push("Highlighted rows".to_string());
        for row in &report.rows {
            let Some(rule) = row.rule else {
                continue;
            };
            let cells = input
                .rows
                .get(row.index)
                .map(|cells| cells.join(" | "))
                .unwrap_or_default();
            lines.push(format!(
                "- row {}: {} ({}) | {}",
                row.index + 1,
                rule,
                rule.label(),
                cells
            ));
        }
    }
    lines.push(String::new());

    if !report.distribution_applicable {
        lines.push("Distribution: not present".to_string());
    } else if report.distribution.is_empty() {
        lines.push("Distribution flags: none".to_string());
    } else {
        lines.push("Distribution flags".to_string());
        lines.extend(report.distribution.iter().map(|highlight| {
            format!(
                "- {}: {} ({})",
                highlight.bucket,
                highlight.flag.as_str(),
                highlight.flag.label()
            )
        }));
    }

    if !summary.per_rule.is_empty() {
        lines.push(String::new());
        lines.push("Rule counts".to_string());
        lines.extend(
            summary
                .per_rule
                .iter()
                .map(|(rule, count)| format!("- {rule}: {count}")),
        );
    }

    lines.join("\n")
}

pub(crate) fn run_legend() -> Result<(), AppError> {
    println!("Color meaning");
    for entry in legend() {
        let toggle = entry
            .setting
            .map(|setting| format!(" [toggle: {}]", setting.key))
            .unwrap_or_else(|| " [always on]".to_string());
        println!(
            "- {}: {} fill {}, outline {}{}",
            entry.key,
            entry.label,
            entry.style.fill_color,
            entry.style.outline_color,
            toggle
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use grade_highlighter::highlight::{DistributionInput, RuleSettings};
    use std::collections::BTreeMap;

    fn input() -> ScanInput {
        let row = |final_mark: &str, total: &str, status: &str| -> Vec<String> {
            ["1", "441000101", "Student", "30", final_mark, total, "", status]
                .into_iter()
                .map(String::from)
                .collect()
        };
        ScanInput {
            rows: vec![row("34", "64", "ناجح"), row("40", "90", "ناجح")],
            distribution: Some(DistributionInput {
                counters: BTreeMap::from([
                    ("أ+".to_string(), "3".to_string()),
                    ("هـ".to_string(), "0".to_string()),
                ]),
                total_students: Some("3".to_string()),
            }),
        }
    }

    #[test]
    fn text_report_lists_highlighted_rows_and_flags() {
        let input = input();
        let report = HighlightScanner::new(RuleSettings::default()).scan(&input);

        let text = render(&input, &report, OutputFormat::Text).expect("renders");

        assert!(text.contains("Rows evaluated: 2 (0 skipped, 1 highlighted)"));
        assert!(text.contains("- row 1: borderline (Borderline total (4,9))"));
        assert!(text.contains("- أ+: maxNonAbsenceBucket"));
        assert!(!text.contains("highAbsenceRatio"));
    }

    #[test]
    fn text_report_without_highlights_or_widget() {
        let input = ScanInput {
            rows: vec![["1", "2", "3", "4", "40", "90", "", "ناجح"]
                .into_iter()
                .map(String::from)
                .collect()],
            distribution: None,
        };
        let report = HighlightScanner::new(RuleSettings::default()).scan(&input);

        let text = render(&input, &report, OutputFormat::Text).expect("renders");

        assert_eq!(
            text,
            "Grade highlight pass\nRows evaluated: 1 (0 skipped, 0 highlighted)\n\nHighlighted rows: none\n\nDistribution: not present"
        );
    }

    #[test]
    fn json_report_includes_summary() {
        let input = input();
        let report = HighlightScanner::new(RuleSettings::default()).scan(&input);

        let json = render(&input, &report, OutputFormat::Json).expect("renders");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");

        assert_eq!(value["summary"]["highlighted_rows"], serde_json::json!(1));
        assert_eq!(value["report"]["rows"][0]["rule"], serde_json::json!("borderline"));
    }

    #[test]
    fn load_input_reads_table_and_distribution() {
        let dir = tempfile::tempdir().expect("temp dir");
        let table = dir.path().join("students.csv");
        let distribution = dir.path().join("distribution.csv");
        std::fs::write(&table, "1,2,3,4,0,64,7,ناجح\nfooter\n").expect("write table");
        std::fs::write(&distribution, "أ+,1\nهـ,1\n").expect("write distribution");

        let args = ScanArgs {
            table,
            distribution: Some(distribution),
            total: Some("2".to_string()),
            format: OutputFormat::Json,
            output: None,
            settings: None,
        };
        let input = load_input(&args).expect("loads");

        assert_eq!(input.rows.len(), 2);
        let counts = input
            .distribution
            .as_ref()
            .and_then(DistributionInput::counts)
            .expect("widget present");
        assert_eq!(counts.total_students, Some(2));
    }
}
