//! The `quizkit init` command.

use std::path::Path;

use anyhow::Result;

use quizkit_core::config::load_config;
use quizkit_store::seed_default_questions;

const CONFIG_FILE: &str = "quizkit.toml";

pub fn execute() -> Result<()> {
    if Path::new(CONFIG_FILE).exists() {
        println!("{CONFIG_FILE} already exists, skipping.");
    } else {
        std::fs::write(CONFIG_FILE, SAMPLE_CONFIG)?;
        println!("Created {CONFIG_FILE}");
    }

    let config = load_config()?;
    let questions = config.questions_path();
    if seed_default_questions(&questions)? {
        println!("Created {} with the default questions", questions.display());
    } else {
        println!("{} already exists, skipping.", questions.display());
    }

    println!("\nNext steps:");
    println!("  1. Set ADMIN_PASSWORD (or admin_password in {CONFIG_FILE})");
    println!("  2. Run: quizkit validate");
    println!("  3. Run: quizkit take");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# quizkit configuration

data_dir = "./data"
time_limit_minutes = 30

# ADMIN_PASSWORD (environment or .env) overrides this.
# admin_password = "change-me"

[files]
questions = "Questions.csv"
attempts = "Quiz Attempts.csv"
answers = "Answers.csv"
"#;
