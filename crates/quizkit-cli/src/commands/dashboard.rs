//! The `quizkit dashboard` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use quizkit_core::admin::AdminGate;
use quizkit_core::config::load_config_from;
use quizkit_core::dashboard::{load_dashboard, DashboardView};
use quizkit_store::CsvResultStore;

const NO_DATA: &str = "No quiz data available yet.";

pub fn execute(
    password: Option<String>,
    format: String,
    output: PathBuf,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    if config.uses_default_password() {
        tracing::warn!("admin password is the default; set ADMIN_PASSWORD");
    }

    let password = match password {
        Some(p) => p,
        None => read_password()?,
    };

    let mut gate = AdminGate::new(config.admin_password.clone());
    gate.login(&password)?;

    let store = CsvResultStore::from_config(&config);
    let view = load_dashboard(&store).context("failed to load quiz results")?;

    let result = match format.as_str() {
        "text" => {
            print_text(&view);
            Ok(())
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&view)?);
            Ok(())
        }
        "html" => {
            quizkit_report::write_dashboard_html(&view, chrono::Utc::now(), &output)?;
            if view.is_empty() {
                println!("{NO_DATA}");
            }
            println!("Dashboard written to {}", output.display());
            Ok(())
        }
        other => Err(anyhow::anyhow!(
            "unknown format '{other}' (expected text, json or html)"
        )),
    };

    gate.logout();
    result
}

fn read_password() -> Result<String> {
    use std::io::Write;

    print!("Admin password: ");
    std::io::stdout().flush().ok();
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("failed to read password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn print_text(view: &DashboardView) {
    println!("Admin Dashboard");

    if view.is_empty() {
        println!("{NO_DATA}");
        return;
    }

    println!(
        "{} attempts, mean score {:.2} ({:.1}%)",
        view.attempt_count, view.mean_score, view.mean_percentage
    );

    println!("\nScore Distribution");
    let mut histogram = Table::new();
    histogram.set_header(vec!["Score", "Attempts", ""]);
    for bucket in &view.histogram {
        histogram.add_row(vec![
            Cell::new(bucket.score),
            Cell::new(bucket.count),
            Cell::new("#".repeat(bucket.count)),
        ]);
    }
    println!("{histogram}");

    println!("\nPerformance Over Time");
    let mut series = Table::new();
    series.set_header(vec!["Timestamp", "Score"]);
    for point in &view.series {
        series.add_row(vec![
            Cell::new(point.timestamp.format("%Y-%m-%d %H:%M:%S")),
            Cell::new(point.score),
        ]);
    }
    println!("{series}");

    println!("\nRecent Quiz Attempts");
    let mut recent = Table::new();
    recent.set_header(vec!["Timestamp", "Name", "Score", "Total", "Time taken"]);
    for s in &view.recent {
        recent.add_row(vec![
            Cell::new(s.timestamp.format("%Y-%m-%d %H:%M:%S")),
            Cell::new(&s.taker_name),
            Cell::new(s.score),
            Cell::new(s.total_questions),
            Cell::new(&s.time_taken),
        ]);
    }
    println!("{recent}");
}
