//! The `quizkit validate` command.

use std::path::PathBuf;

use anyhow::Result;

use quizkit_core::config::load_config_from;

pub fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let path = config.questions_path();
    if !path.exists() {
        anyhow::bail!(
            "question file not found: {} (run `quizkit init`)",
            path.display()
        );
    }

    let bank = quizkit_store::load_question_bank(&path)?;
    println!("Question bank: {} ({} questions)", path.display(), bank.size());
    for q in bank.iter() {
        println!("  [{}] {}", q.id, q.text);
    }

    if config.uses_default_password() {
        println!("  WARNING: admin password is the default; set ADMIN_PASSWORD");
    }
    println!("Question bank valid.");

    Ok(())
}
