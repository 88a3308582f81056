//! Static HTML dashboard for a governance report
//!
//! One self-contained page: summary cards (total, passed, failed, average
//! score) and one row per spec. No scripts.

use super::{ReportEntry, ReportSummary, SpecStatus};
use chrono::Local;

/// Render the dashboard stamped with the current local time
pub fn render(report: &[ReportEntry]) -> String {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    render_with_timestamp(report, &timestamp)
}

pub fn render_with_timestamp(report: &[ReportEntry], timestamp: &str) -> String {
    let summary = ReportSummary::from_entries(report);
    let mut html = String::new();

    html.push_str(&render_head());
    html.push_str("<body>\n<div class=\"container\">\n");
    html.push_str(&render_header(timestamp));
    html.push_str("<div class=\"content\">\n");
    html.push_str(&render_summary(&summary));
    html.push_str(&render_table(report));
    html.push_str("</div>\n");
    html.push_str("</div>\n</body>\n</html>\n");

    html
}

fn render_head() -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>API Governance Dashboard</title>
    <style>
{CSS}
    </style>
</head>
"#
    )
}

fn render_header(timestamp: &str) -> String {
    format!(
        r#"<div class="header">
    <h1>API Governance Dashboard</h1>
    <p class="timestamp">Generated {}</p>
</div>
"#,
        html_escape(timestamp)
    )
}

fn render_summary(summary: &ReportSummary) -> String {
    format!(
        r#"<div class="summary">
    <div class="card"><h3>Total Specs</h3><div class="value">{}</div></div>
    <div class="card pass"><h3>Passed</h3><div class="value">{}</div></div>
    <div class="card fail"><h3>Failed</h3><div class="value">{}</div></div>
    <div class="card"><h3>Average Score</h3><div class="value">{:.1}</div></div>
</div>
"#,
        summary.total, summary.passed, summary.failed, summary.average_score
    )
}

fn render_table(report: &[ReportEntry]) -> String {
    if report.is_empty() {
        return "<p class=\"empty\">No specs were scored.</p>\n".to_string();
    }

    let mut html = String::from(
        r#"<table>
    <thead>
        <tr><th>Spec</th><th>Id / Path</th><th>Score</th><th>Violations</th><th>Status</th></tr>
    </thead>
    <tbody>
"#,
    );
    for entry in report {
        html.push_str(&render_row(entry));
    }
    html.push_str("    </tbody>\n</table>\n");
    html
}

fn render_row(entry: &ReportEntry) -> String {
    let (class, label) = status_badge(entry);
    let error = entry
        .error
        .as_deref()
        .map(|e| format!("<div class=\"error\">{}</div>", html_escape(e)))
        .unwrap_or_default();
    format!(
        r#"        <tr class="{class}">
            <td>{}{}</td>
            <td><code>{}</code></td>
            <td><div class="score">{}</div><div class="bar"><div class="bar-fill {class}" style="width: {}%"></div></div></td>
            <td>{}</td>
            <td><span class="badge {class}">{label}</span></td>
        </tr>
"#,
        html_escape(&entry.name),
        error,
        html_escape(&entry.id),
        entry.score,
        entry.score.min(100),
        entry.violations_count,
    )
}

/// A zero score almost always means the spec could not be linted at all
fn status_badge(entry: &ReportEntry) -> (&'static str, &'static str) {
    if entry.score == 0 {
        ("invalid", "INVALID SPEC")
    } else {
        match entry.status {
            SpecStatus::Pass => ("pass", "PASS"),
            SpecStatus::Fail => ("fail", "FAIL"),
        }
    }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

const CSS: &str = r#"
* { margin: 0; padding: 0; box-sizing: border-box; }
body {
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
    line-height: 1.5;
    color: #1e293b;
    background: #f8fafc;
    padding: 2rem;
}
.container {
    max-width: 1100px;
    margin: 0 auto;
    background: white;
    border-radius: 12px;
    box-shadow: 0 4px 6px -1px rgba(0,0,0,0.1);
    overflow: hidden;
}
.header {
    background: linear-gradient(135deg, #0f766e 0%, #0369a1 100%);
    color: white;
    padding: 2.5rem 2rem;
    text-align: center;
}
.header h1 { font-size: 2rem; margin-bottom: 0.25rem; }
.header .timestamp { opacity: 0.9; font-size: 0.9rem; }
.content { padding: 2rem; }
.summary {
    display: grid;
    grid-template-columns: repeat(auto-fit, minmax(180px, 1fr));
    gap: 1rem;
    margin-bottom: 2rem;
}
.card { background: #f1f5f9; border-radius: 8px; padding: 1.25rem; text-align: center; }
.card h3 { font-size: 0.85rem; text-transform: uppercase; color: #64748b; }
.card .value { font-size: 2rem; font-weight: 700; }
.card.pass .value { color: #16a34a; }
.card.fail .value { color: #dc2626; }
table { width: 100%; border-collapse: collapse; }
th, td { text-align: left; padding: 0.75rem; border-bottom: 1px solid #e2e8f0; vertical-align: top; }
th { background: #f1f5f9; font-size: 0.8rem; text-transform: uppercase; color: #475569; }
code { font-size: 0.85rem; color: #475569; }
.score { font-weight: 600; }
.bar { background: #e2e8f0; border-radius: 4px; height: 6px; width: 120px; margin-top: 4px; }
.bar-fill { height: 6px; border-radius: 4px; }
.bar-fill.pass { background: #16a34a; }
.bar-fill.fail { background: #f59e0b; }
.bar-fill.invalid { background: #dc2626; }
.badge { padding: 0.2rem 0.6rem; border-radius: 999px; font-size: 0.75rem; font-weight: 700; color: white; }
.badge.pass { background: #16a34a; }
.badge.fail { background: #f59e0b; }
.badge.invalid { background: #dc2626; }
.error { font-size: 0.8rem; color: #b91c1c; margin-top: 0.25rem; }
.empty { color: #64748b; text-align: center; padding: 2rem; }
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, score: u32, status: SpecStatus, error: Option<&str>) -> ReportEntry {
        ReportEntry {
            name: name.into(),
            id: format!("specs/{}.yaml", name),
            score,
            violations_count: 3,
            status,
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn test_empty_report_average_is_zero() {
        let html = render_with_timestamp(&[], "2026-01-01 00:00:00");
        assert!(html.contains("<div class=\"value\">0.0</div>"));
        assert!(!html.contains("NaN"));
        assert!(html.contains("No specs were scored."));
    }

    #[test]
    fn test_summary_and_rows() {
        let report = vec![
            entry("pets", 90, SpecStatus::Pass, None),
            entry("stores", 50, SpecStatus::Fail, None),
        ];
        let html = render_with_timestamp(&report, "2026-01-01 00:00:00");
        assert!(html.contains("<h3>Passed</h3><div class=\"value\">1</div>"));
        assert!(html.contains("<h3>Failed</h3><div class=\"value\">1</div>"));
        assert!(html.contains("<div class=\"value\">70.0</div>"));
        assert!(html.contains("<span class=\"badge pass\">PASS</span>"));
        assert!(html.contains("<span class=\"badge fail\">FAIL</span>"));
        assert!(html.contains("Generated 2026-01-01 00:00:00"));
    }

    #[test]
    fn test_zero_score_marked_invalid() {
        let report = vec![entry("broken", 0, SpecStatus::Fail, Some("couldn't parse <root>"))];
        let html = render_with_timestamp(&report, "now");
        assert!(html.contains("INVALID SPEC"));
        assert!(!html.contains("<span class=\"badge fail\">"));
        assert!(html.contains("couldn&#39;t parse &lt;root&gt;"));
    }
}
