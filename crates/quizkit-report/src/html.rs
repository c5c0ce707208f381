//! HTML renderers for the admin dashboard and a printable results page.
//!
//! Both produce a self-contained HTML file with all CSS/JS inlined and
//! charts drawn as inline SVG.

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::path::Path;

use quizkit_core::dashboard::{DashboardView, ScoreBucket, ScorePoint};
use quizkit_core::model::FeedbackTier;
use quizkit_core::session::AttemptOutcome;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn page_head(html: &mut String, title: &str) {
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!("<title>{}</title>\n", html_escape(title)));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");
}

/// Generate the admin dashboard page.
pub fn generate_dashboard_html(view: &DashboardView, generated_at: DateTime<Utc>) -> String {
    let mut html = String::new();
    page_head(&mut html, "Quiz admin dashboard");

    html.push_str("<header>\n");
    html.push_str("<h1>Admin Dashboard</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">View quiz performance analytics and statistics | generated {}</p>\n",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    if view.is_empty() {
        html.push_str("<p class=\"warning\">No quiz data available yet.</p>\n");
        html.push_str("</body>\n</html>");
        return html;
    }

    // Summary
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Summary</h2>\n");
    html.push_str("<table class=\"summary\">\n");
    html.push_str("<thead><tr><th>Attempts</th><th>Mean score</th><th>Mean %</th></tr></thead>\n");
    html.push_str(&format!(
        "<tbody><tr><td>{}</td><td>{:.2}</td><td>{:.1}%</td></tr></tbody>\n",
        view.attempt_count, view.mean_score, view.mean_percentage
    ));
    html.push_str("</table>\n");

    html.push_str("<h2>Score Distribution</h2>\n");
    html.push_str(&generate_histogram(&view.histogram));

    html.push_str("<h2>Performance Over Time</h2>\n");
    html.push_str(&generate_line_chart(&view.series));
    html.push_str("</section>\n");

    // Recent attempts
    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Recent Quiz Attempts</h2>\n");
    html.push_str("<table class=\"results-table\" id=\"recent\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable(0)\">Timestamp</th><th onclick=\"sortTable(1)\">Name</th><th onclick=\"sortTable(2)\">Score</th><th onclick=\"sortTable(3)\">Total</th><th onclick=\"sortTable(4)\">Time taken</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for s in &view.recent {
        let tier_class = tier_class(FeedbackTier::for_percentage(s.percentage()));
        html.push_str(&format!(
            "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            tier_class,
            s.timestamp.format("%Y-%m-%d %H:%M:%S"),
            html_escape(&s.taker_name),
            s.score,
            s.total_questions,
            html_escape(&s.time_taken),
        ));
    }
    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(
        &serde_json::to_string_pretty(view).unwrap_or_default(),
    ));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write the dashboard page to a file.
pub fn write_dashboard_html(
    view: &DashboardView,
    generated_at: DateTime<Utc>,
    path: &Path,
) -> Result<()> {
    write_page(path, &generate_dashboard_html(view, generated_at))
}

/// Generate a printable results page for one attempt.
pub fn generate_results_html(outcome: &AttemptOutcome) -> String {
    let mut html = String::new();
    page_head(&mut html, "Quiz Results");

    html.push_str("<header>\n<h1>Quiz Results</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">{}</p>\n",
        html_escape(&outcome.taker_name)
    ));
    html.push_str("</header>\n");

    html.push_str(&format!(
        "<div class=\"score-circle\" style=\"background: conic-gradient(#4a90e2 {pct:.1}%, #eee 0);\">\
         <div class=\"inner\"><h2>{}/{}</h2><p>{pct:.1}%</p></div></div>\n",
        outcome.score,
        outcome.total_questions,
        pct = outcome.percentage,
    ));

    html.push_str(&format!(
        "<div class=\"feedback {}\"><h3>{}</h3><p>{}</p></div>\n",
        tier_class(outcome.tier),
        outcome.tier.headline(),
        outcome.tier.message(),
    ));

    html.push_str(&format!(
        "<p><strong>Time taken:</strong> {}</p>\n",
        html_escape(&outcome.time_taken)
    ));
    if outcome.timed_out {
        html.push_str("<p class=\"meta\">The time limit was reached before all questions were answered.</p>\n");
    }

    html.push_str("<script>window.onload = () => window.print();</script>\n");
    html.push_str("</body>\n</html>");
    html
}

/// Write the printable results page to a file.
pub fn write_results_html(outcome: &AttemptOutcome, path: &Path) -> Result<()> {
    write_page(path, &generate_results_html(outcome))
}

fn write_page(path: &Path, html: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}

fn tier_class(tier: FeedbackTier) -> &'static str {
    match tier {
        FeedbackTier::Excellent => "pass",
        FeedbackTier::Good => "good",
        FeedbackTier::KeepPracticing => "fail",
    }
}

fn generate_histogram(buckets: &[ScoreBucket]) -> String {
    let bar_width = 40;
    let gap = 16;
    let max_height = 200;
    let padding = 30;

    let max_count = buckets.iter().map(|b| b.count).max().unwrap_or(1).max(1);
    let width = buckets.len() * (bar_width + gap) + padding * 2;
    let height = max_height + padding * 2;

    let mut svg = format!(
        "<svg width=\"{width}\" height=\"{height}\" xmlns=\"http://www.w3.org/2000/svg\">\n"
    );

    for (i, bucket) in buckets.iter().enumerate() {
        let x = padding + i * (bar_width + gap);
        let bar_height = bucket.count * max_height / max_count;
        let y = padding + max_height - bar_height;

        svg.push_str(&format!(
            "  <rect x=\"{x}\" y=\"{y}\" width=\"{bar_width}\" height=\"{bar_height}\" fill=\"#4a90e2\" rx=\"4\"/>\n"
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" text-anchor=\"middle\">{}</text>\n",
            x + bar_width / 2,
            y.saturating_sub(6),
            bucket.count
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"middle\">{}</text>\n",
            x + bar_width / 2,
            padding + max_height + 18,
            bucket.score
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

fn generate_line_chart(points: &[ScorePoint]) -> String {
    let width = 640.0;
    let height = 240.0;
    let padding = 30.0;

    let max_score = points.iter().map(|p| p.score).max().unwrap_or(1).max(1) as f64;
    let (first, last) = match (points.first(), points.last()) {
        (Some(f), Some(l)) => (f.timestamp, l.timestamp),
        _ => return String::new(),
    };
    let span = (last - first).num_seconds().max(1) as f64;

    let coords: Vec<(f64, f64)> = points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let t = if points.len() == 1 {
                0.5
            } else if last == first {
                i as f64 / (points.len() - 1) as f64
            } else {
                (p.timestamp - first).num_seconds() as f64 / span
            };
            let x = padding + t * (width - padding * 2.0);
            let y = height - padding - (p.score as f64 / max_score) * (height - padding * 2.0);
            (x, y)
        })
        .collect();

    let path: Vec<String> = coords.iter().map(|(x, y)| format!("{x:.1},{y:.1}")).collect();

    let mut svg = format!(
        "<svg width=\"{width}\" height=\"{height}\" xmlns=\"http://www.w3.org/2000/svg\">\n"
    );
    svg.push_str(&format!(
        "  <polyline points=\"{}\" fill=\"none\" stroke=\"#4a90e2\" stroke-width=\"2\"/>\n",
        path.join(" ")
    ));
    for ((x, y), p) in coords.iter().zip(points) {
        svg.push_str(&format!(
            "  <circle cx=\"{x:.1}\" cy=\"{y:.1}\" r=\"3\" fill=\"#357abd\"><title>{}: {}</title></circle>\n",
            p.timestamp.format("%Y-%m-%d %H:%M"),
            p.score
        ));
    }
    svg.push_str(&format!(
        "  <text x=\"{padding}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\">{}</text>\n",
        height - 8.0,
        first.format("%Y-%m-%d")
    ));
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" text-anchor=\"end\">{}</text>\n",
        width - padding,
        height - 8.0,
        last.format("%Y-%m-%d")
    ));
    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #f5f6fa; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --good: #dbeafe; --fail: #fef3c7; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --good: #1e3a8a; --fail: #78350f; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
.warning { padding: 1rem; border-radius: 8px; background: var(--fail); }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); cursor: pointer; }
.pass { background: var(--pass); }
.good { background: var(--good); }
.fail { background: var(--fail); }
.score-circle { width: 200px; height: 200px; border-radius: 50%; display: flex; align-items: center; justify-content: center; margin: 20px auto; }
.score-circle .inner { width: 180px; height: 180px; background: white; color: #1a1a1a; border-radius: 50%; display: flex; flex-direction: column; align-items: center; justify-content: center; }
.score-circle h2, .score-circle p { margin: 0; }
.feedback { padding: 1rem; border-radius: 8px; text-align: center; }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(col) {
  const table = document.getElementById('recent');
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    return asc ? va.localeCompare(vb, undefined, {numeric: true}) : vb.localeCompare(va, undefined, {numeric: true});
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;
