//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the gateway and session code stay free of presentation details
//! - the CLI and the TUI print identical text for the same outcome

use serde_json::Value;

use crate::domain::{BrowserTable, FittingRequest, FittingResponse, TableData};
use crate::models::MODELS;

/// Status text used when the backend gives no summary for a successful fit.
///
/// One line each, in order: a headline, processed rows, whether the best
/// model was saved, and the configured models.
pub fn fit_summary(response: &FittingResponse) -> String {
    let mut lines = vec!["Fitting completed successfully.".to_string()];
    if let Some(rows) = response.processed_rows {
        lines.push(format!("Processed experiments: {rows}"));
    }
    if let Some(saved) = response.best_model_saved {
        lines.push(format!("Best model saved: {}", if saved { "Yes" } else { "No" }));
    }
    if let Some(models) = response.models.as_ref().filter(|m| !m.is_empty()) {
        lines.push("Configured models:".to_string());
        for model in models {
            lines.push(format!("  - {model}"));
        }
    }
    lines.join("\n")
}

/// Short preview of a dataset status line: whitespace collapsed, first two
/// sentences kept.
pub fn dataset_preview(text: &str) -> String {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() {
        return "Load a dataset to see quick statistics.".to_string();
    }
    normalized
        .split(". ")
        .take(2)
        .collect::<Vec<_>>()
        .join(". ")
        .trim()
        .to_string()
}

/// List every model with its constants, default ranges and equation.
pub fn format_catalog() -> String {
    let mut out = String::new();
    for model in &MODELS {
        out.push_str(&format!("{} ({})\n", model.name, model.id));
        out.push_str(&format!("  {}\n", model.equation));
        out.push_str(&format!("  {}\n", model.description));
        for p in model.parameters {
            out.push_str(&format!(
                "    {:<10} [{}, {}]\n",
                p.name,
                fmt_bound(p.default_min),
                fmt_bound(p.default_max)
            ));
        }
        out.push('\n');
    }
    out
}

/// Compact listing of what a request will ask the backend to fit.
pub fn format_request_summary(request: &FittingRequest) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "method={} max_iterations={} save_best={} rows={}\n",
        request.optimization_method,
        request.max_iterations,
        request.save_best,
        request.dataset.sample_count()
    ));
    for (model, bounds) in &request.parameter_bounds {
        out.push_str(&format!("{model}:\n"));
        for (name, min) in &bounds.min {
            let max = bounds.max.get(name).copied().unwrap_or(f64::NAN);
            let initial = bounds.initial.get(name).copied().unwrap_or(f64::NAN);
            out.push_str(&format!(
                "  {:<10} [{}, {}] initial={}\n",
                name,
                fmt_bound(*min),
                fmt_bound(max),
                fmt_bound(initial)
            ));
        }
    }
    out
}

pub fn format_table_list(tables: &[BrowserTable]) -> String {
    let width = tables.iter().map(|t| t.table_name.len()).max().unwrap_or(0).max(10);
    let mut out = String::new();
    for t in tables {
        out.push_str(&format!("{:<width$}  {}\n", t.table_name, t.display_name));
    }
    out
}

/// Fixed-width rendering of browsed rows (at most `limit`).
pub fn format_table(data: &TableData, limit: usize) -> String {
    const MAX_CELL: usize = 24;

    let mut out = String::new();
    out.push_str(&format!(
        "{} ({} rows, {} columns)\n",
        data.display_name, data.row_count, data.column_count
    ));
    if data.columns.is_empty() {
        return out;
    }

    let shown: Vec<_> = data.rows.iter().take(limit).collect();
    let widths: Vec<usize> = data
        .columns
        .iter()
        .map(|col| {
            let cells = shown
                .iter()
                .map(|row| cell_text(row.get(col)).chars().count())
                .max()
                .unwrap_or(0);
            cells.max(col.chars().count()).min(MAX_CELL)
        })
        .collect();

    let header: Vec<String> = data
        .columns
        .iter()
        .zip(&widths)
        .map(|(col, w)| format!("{:<w$}", truncate(col, *w)))
        .collect();
    out.push_str(header.join("  ").trim_end());
    out.push('\n');

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&rule.join("  "));
    out.push('\n');

    for row in &shown {
        let cells: Vec<String> = data
            .columns
            .iter()
            .zip(&widths)
            .map(|(col, w)| format!("{:<w$}", truncate(&cell_text(row.get(col)), *w)))
            .collect();
        out.push_str(cells.join("  ").trim_end());
        out.push('\n');
    }

    if data.rows.len() > shown.len() {
        out.push_str(&format!("... {} more rows\n", data.rows.len() - shown.len()));
    }
    out
}

/// Display text of one cell: strings as-is, null/missing as empty.
pub fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

pub fn fmt_bound(v: f64) -> String {
    if v != 0.0 && (v.abs() < 1e-3 || v.abs() >= 1e6) {
        format!("{v:e}")
    } else {
        format!("{v}")
    }
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn fit_summary_lists_fields_in_order() {
        let response = FittingResponse {
            status: Some("success".into()),
            processed_rows: Some(12.0),
            best_model_saved: Some(false),
            models: Some(vec!["Langmuir".into(), "Sips".into()]),
            ..FittingResponse::default()
        };
        assert_eq!(
            fit_summary(&response),
            "Fitting completed successfully.\n\
             Processed experiments: 12\n\
             Best model saved: No\n\
             Configured models:\n  - Langmuir\n  - Sips"
        );
    }

    #[test]
    fn fit_summary_skips_absent_fields() {
        let response = FittingResponse {
            models: Some(vec![]),
            ..FittingResponse::default()
        };
        assert_eq!(fit_summary(&response), "Fitting completed successfully.");
    }

    #[test]
    fn dataset_preview_keeps_two_sentences() {
        let text = "Loaded  12 rows. Found 3\nexperiments. Temperature range 273-300 K.";
        assert_eq!(dataset_preview(text), "Loaded 12 rows. Found 3 experiments");
        assert_eq!(dataset_preview("   "), "Load a dataset to see quick statistics.");
    }

    #[test]
    fn cell_text_renders_null_as_empty() {
        assert_eq!(cell_text(Some(&Value::Null)), "");
        assert_eq!(cell_text(None), "");
        assert_eq!(cell_text(Some(&json!("abc"))), "abc");
        assert_eq!(cell_text(Some(&json!(1.5))), "1.5");
    }

    #[test]
    fn format_table_aligns_and_limits() {
        let rows: Vec<_> = (0..3)
            .map(|i| json!({"experiment": format!("E{i}"), "uptake": i}).as_object().cloned().unwrap())
            .collect();
        let data = TableData {
            table_name: "ADSORPTION_DATA".into(),
            display_name: "Uploaded Adsorption Data".into(),
            columns: vec!["experiment".into(), "uptake".into()],
            rows,
            row_count: 3,
            column_count: 2,
        };
        let text = format_table(&data, 2);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Uploaded Adsorption Data (3 rows, 2 columns)");
        assert_eq!(lines[1], "experiment  uptake");
        assert_eq!(lines[3], "E0          0");
        assert_eq!(lines.last().copied(), Some("... 1 more rows"));
    }

    #[test]
    fn catalog_mentions_every_model() {
        let text = format_catalog();
        for model in &MODELS {
            assert!(text.contains(model.name));
        }
    }

    #[test]
    fn fmt_bound_uses_scientific_for_tiny_values() {
        assert_eq!(fmt_bound(1e-6), "1e-6");
        assert_eq!(fmt_bound(10.0), "10");
        assert_eq!(fmt_bound(0.0), "0");
    }
}
