//! Paints a [`HighlightReport`] back onto the scanned table as standalone HTML.

use super::{HighlightReport, ScanInput};
use crate::highlight::distribution::GradeBucket;
use crate::highlight::palette::{legend, StyleDescriptor};
use crate::highlight::record::extract_mark;

pub fn render_html(input: &ScanInput, report: &HighlightReport) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="ar" dir="rtl">
<head>
    <meta charset="UTF-8">
    <title>Grade highlights</title>
    <style>{css}</style>
</head>
<body>
    <p class="meta">Evaluated {evaluated_at}</p>
    {students}
    {distribution}
    {legend}
</body>
</html>"#,
        css = inline_css(),
        evaluated_at = report.evaluated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        students = render_students(input, report),
        distribution = render_distribution(input, report),
        legend = render_legend(),
    )
}

fn inline_css() -> &'static str {
    "body{font-family:sans-serif;font-size:13px;margin:16px;}\
     table{border-collapse:separate;border-spacing:0 4px;margin-bottom:16px;}\
     td{padding:2px 8px;}\
     .meta{color:#666;}\
     .dot{display:inline-block;width:10px;height:10px;border-radius:50%;margin-left:6px;}"
}

fn render_students(input: &ScanInput, report: &HighlightReport) -> String {
    let mut body = String::new();
    for (index, cells) in input.rows.iter().enumerate() {
        let style = report
            .row(index)
            .and_then(|row| row.style)
            .map(|style| row_style(&style))
            .unwrap_or_default();
        let cells: String = cells
            .iter()
            .map(|cell| format!("<td>{}</td>", escape(cell)))
            .collect();
        body.push_str(&format!("<tr{style}>{cells}</tr>\n"));
    }

    format!("<table id=\"students\"><tbody>\n{body}</tbody></table>")
}

fn render_distribution(input: &ScanInput, report: &HighlightReport) -> String {
    let Some(distribution) = input.distribution.as_ref() else {
        return String::new();
    };
    if !report.distribution_applicable {
        return String::new();
    }

    let counters = distribution.bucket_counters();
    let mut cells = String::new();
    for bucket in GradeBucket::ALL {
        let Some(text) = counters.get(&bucket) else {
            continue;
        };
        let style = report
            .bucket_style(bucket)
            .map(|style| cell_style(&style))
            .unwrap_or_default();
        cells.push_str(&format!(
            "<tr><th>{label}</th><td id=\"{id}\"{style}>{text}</td></tr>\n",
            label = bucket.label(),
            id = escape(bucket.element_id()),
            text = escape(text),
        ));
    }

    let total = distribution
        .total_students
        .as_deref()
        .and_then(extract_mark)
        .map(|total| total.to_string())
        .unwrap_or_else(|| "-".to_string());

    format!(
        "<table id=\"distribution\"><tbody>\n{cells}<tr><th>Total</th><td>{total}</td></tr>\n</tbody></table>"
    )
}

fn render_legend() -> String {
    let items: String = legend()
        .iter()
        .map(|entry| {
            format!(
                "<li><span class=\"dot\" style=\"background:{};\"></span>{}</li>",
                entry.style.fill_color,
                escape(entry.label)
            )
        })
        .collect();
    format!("<ul class=\"legend\">{items}</ul>")
}

fn row_style(style: &StyleDescriptor) -> String {
    format!(
        " style=\"background-color: {}; outline: {};\"",
        style.fill_color,
        style.outline_css()
    )
}

fn cell_style(style: &StyleDescriptor) -> String {
    format!(
        " style=\"background-color: {}; outline: {}; border-radius: 4px; padding: 2px 4px;\"",
        style.fill_color,
        style.outline_css()
    )
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::scan::{DistributionInput, HighlightScanner};
    use std::collections::BTreeMap;

    fn input() -> ScanInput {
        let data_row = |total: &str| -> Vec<String> {
            ["1", "4410001", "<b>Student</b>", "30", "10", total, "", "ناجح"]
                .into_iter()
                .map(String::from)
                .collect()
        };
        ScanInput {
            rows: vec![data_row("64"), data_row("90")],
            distribution: Some(DistributionInput {
                counters: BTreeMap::from([
                    ("أ+".to_string(), "1".to_string()),
                    ("هـ".to_string(), "1".to_string()),
                ]),
                total_students: Some("2".to_string()),
            }),
        }
    }

    #[test]
    fn highlighted_rows_get_inline_style() {
        let input = input();
        let report = HighlightScanner::default().scan(&input);

        let html = render_html(&input, &report);

        assert!(html.contains(
            "<tr style=\"background-color: rgba(0, 13, 255, 0.35); outline: 2px solid rgba(18, 219, 14, 0.95);\">"
        ));
        assert_eq!(html.matches("<tr style=").count(), 1);
        assert!(html.contains("&lt;b&gt;Student&lt;/b&gt;"));
    }

    #[test]
    fn distribution_cells_are_styled() {
        let input = input();
        let report = HighlightScanner::default().scan(&input);

        let html = render_html(&input, &report);

        assert!(html.contains("id=\"myFrm:h\" style=\"background-color: rgba(255, 235, 59, 0.25)"));
        assert!(html.contains("id=\"myFrm:a_plus\" style=\"background-color: rgba(25, 135, 84, 0.18)"));
        assert!(html.contains("<th>Total</th><td>2</td>"));
    }

    #[test]
    fn label_entry_wins_over_element_id_in_counts_and_cells() {
        let mut input = input();
        if let Some(distribution) = input.distribution.as_mut() {
            distribution
                .counters
                .insert("myFrm:h".to_string(), "0".to_string());
        }
        let report = HighlightScanner::default().scan(&input);

        let counts = input
            .distribution
            .as_ref()
            .and_then(DistributionInput::counts)
            .expect("anchor present");
        assert_eq!(counts.count(GradeBucket::H), Some(1));

        let html = render_html(&input, &report);
        assert!(html.contains("rgba(255, 235, 59, 0.25); outline: 2px solid rgba(255, 193, 7, 0.8); border-radius: 4px; padding: 2px 4px;\">1</td>"));
        assert_eq!(html.matches("id=\"myFrm:h\"").count(), 1);
    }
}
