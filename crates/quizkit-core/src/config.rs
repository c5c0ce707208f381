//! Configuration loading.
//!
//! Search order:
//! 1. an explicit `--config` path
//! 2. `quizkit.toml` in the current directory
//! 3. `~/.config/quizkit/config.toml`
//!
//! Environment overrides: `ADMIN_PASSWORD`, `QUIZKIT_DATA_DIR`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Password used when nothing else is configured. Not secure.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// Default time budget for one attempt, in minutes.
pub const DEFAULT_TIME_LIMIT_MINUTES: u64 = 30;

/// Longest accepted time budget (one day).
pub const MAX_TIME_LIMIT_MINUTES: u64 = 24 * 60;

/// Top-level quizkit configuration.
///
/// Note: Custom Debug impl masks the admin password.
#[derive(Clone, Serialize, Deserialize)]
pub struct QuizConfig {
    /// Directory holding the questions, attempts, and answers tables.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Time budget for one attempt.
    #[serde(default = "default_time_limit")]
    pub time_limit_minutes: u64,
    /// Shared secret for the admin dashboard.
    #[serde(default = "default_admin_password")]
    pub admin_password: String,
    /// File names inside `data_dir`.
    #[serde(default)]
    pub files: DataFiles,
}

/// File names of the three tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataFiles {
    #[serde(default = "default_questions_file")]
    pub questions: String,
    #[serde(default = "default_attempts_file")]
    pub attempts: String,
    #[serde(default = "default_answers_file")]
    pub answers: String,
}

impl Default for DataFiles {
    fn default() -> Self {
        Self {
            questions: default_questions_file(),
            attempts: default_attempts_file(),
            answers: default_answers_file(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_time_limit() -> u64 {
    DEFAULT_TIME_LIMIT_MINUTES
}
fn default_admin_password() -> String {
    DEFAULT_ADMIN_PASSWORD.to_string()
}
fn default_questions_file() -> String {
    "Questions.csv".to_string()
}
fn default_attempts_file() -> String {
    "Quiz Attempts.csv".to_string()
}
fn default_answers_file() -> String {
    "Answers.csv".to_string()
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            time_limit_minutes: default_time_limit(),
            admin_password: default_admin_password(),
            files: DataFiles::default(),
        }
    }
}

impl std::fmt::Debug for QuizConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuizConfig")
            .field("data_dir", &self.data_dir)
            .field("time_limit_minutes", &self.time_limit_minutes)
            .field("admin_password", &"***")
            .field("files", &self.files)
            .finish()
    }
}

impl QuizConfig {
    pub fn questions_path(&self) -> PathBuf {
        self.data_dir.join(&self.files.questions)
    }

    pub fn attempts_path(&self) -> PathBuf {
        self.data_dir.join(&self.files.attempts)
    }

    pub fn answers_path(&self) -> PathBuf {
        self.data_dir.join(&self.files.answers)
    }

    /// The attempt time budget.
    pub fn time_limit(&self) -> Duration {
        let minutes = self.time_limit_minutes.min(MAX_TIME_LIMIT_MINUTES);
        Duration::minutes(minutes as i64)
    }

    /// `true` if the admin secret was never changed from the default.
    pub fn uses_default_password(&self) -> bool {
        self.admin_password == DEFAULT_ADMIN_PASSWORD
    }

    /// Resolve `${VAR}` references in file values, then apply
    /// `ADMIN_PASSWORD` / `QUIZKIT_DATA_DIR` from `lookup`.
    ///
    /// Override values are taken verbatim.
    pub fn apply_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        self.admin_password = resolve_env_vars(&self.admin_password, &lookup);
        let data_dir = self.data_dir.to_string_lossy().into_owned();
        if data_dir.contains("${") {
            self.data_dir = PathBuf::from(resolve_env_vars(&data_dir, &lookup));
        }

        if let Some(pw) = lookup("ADMIN_PASSWORD").filter(|p| !p.is_empty()) {
            self.admin_password = pw;
        }
        if let Some(dir) = lookup("QUIZKIT_DATA_DIR").filter(|d| !d.is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        self
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are not scanned again.
fn resolve_env_vars<F>(s: &str, lookup: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        result.push_str(&lookup(&rest[start + 2..start + end]).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

/// Load configuration from the default locations.
pub fn load_config() -> Result<QuizConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<QuizConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("quizkit.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let config = match &config_path {
        Some(path) => parse_config_file(path)?,
        None => QuizConfig::default(),
    };

    let config = config.apply_env(|name| std::env::var(name).ok());
    anyhow::ensure!(
        (1..=MAX_TIME_LIMIT_MINUTES).contains(&config.time_limit_minutes),
        "time_limit_minutes must be between 1 and {MAX_TIME_LIMIT_MINUTES}"
    );
    anyhow::ensure!(
        !config.admin_password.is_empty(),
        "admin_password must not be empty"
    );

    tracing::debug!(?config, source = ?config_path, "configuration loaded");
    Ok(config)
}

fn parse_config_file(path: &Path) -> Result<QuizConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    toml::from_str::<QuizConfig>(&content)
        .with_context(|| format!("failed to parse config: {}", path.display()))
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("quizkit"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn default_config() {
        let config = QuizConfig::default();
        assert_eq!(config.time_limit_minutes, 30);
        assert_eq!(config.time_limit(), Duration::minutes(30));
        assert!(config.uses_default_password());
        assert_eq!(
            config.attempts_path(),
            PathBuf::from("./data").join("Quiz Attempts.csv")
        );
    }

    #[test]
    fn debug_masks_password() {
        let config = QuizConfig {
            admin_password: "hunter2".into(),
            ..Default::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn parse_partial_toml() {
        let config: QuizConfig = toml::from_str(
            r#"
time_limit_minutes = 10

[files]
attempts = "attempts.csv"
"#,
        )
        .unwrap();
        assert_eq!(config.time_limit_minutes, 10);
        assert_eq!(config.files.attempts, "attempts.csv");
        assert_eq!(config.files.answers, "Answers.csv");
        assert_eq!(config.admin_password, DEFAULT_ADMIN_PASSWORD);
    }

    #[test]
    fn env_overrides_password_and_data_dir() {
        let config = QuizConfig::default().apply_env(env(&[
            ("ADMIN_PASSWORD", "s3cret"),
            ("QUIZKIT_DATA_DIR", "/srv/quiz"),
        ]));
        assert_eq!(config.admin_password, "s3cret");
        assert_eq!(config.data_dir, PathBuf::from("/srv/quiz"));
        assert!(!config.uses_default_password());
    }

    #[test]
    fn empty_env_password_is_ignored() {
        let config = QuizConfig::default().apply_env(env(&[("ADMIN_PASSWORD", "")]));
        assert!(config.uses_default_password());
    }

    #[test]
    fn resolves_var_references() {
        let config = QuizConfig {
            admin_password: "${QUIZ_SECRET}".into(),
            data_dir: PathBuf::from("${QUIZ_HOME}/data"),
            ..Default::default()
        }
        .apply_env(env(&[("QUIZ_SECRET", "from-env"), ("QUIZ_HOME", "/opt/q")]));
        assert_eq!(config.admin_password, "from-env");
        assert_eq!(config.data_dir, PathBuf::from("/opt/q/data"));
    }

    #[test]
    fn env_password_is_taken_verbatim() {
        let config = QuizConfig::default().apply_env(env(&[
            ("ADMIN_PASSWORD", "pa${ss}word"),
            ("ss", "oops"),
        ]));
        assert_eq!(config.admin_password, "pa${ss}word");
    }

    #[test]
    fn self_referencing_var_expands_once() {
        let config = QuizConfig {
            admin_password: "${X}-${Y}".into(),
            ..Default::default()
        }
        .apply_env(env(&[("X", "${X}"), ("Y", "y")]));
        assert_eq!(config.admin_password, "${X}-y");

        let config =
            QuizConfig::default().apply_env(env(&[("ADMIN_PASSWORD", "${X}"), ("X", "${X}")]));
        assert_eq!(config.admin_password, "${X}");
    }

    #[test]
    fn unterminated_reference_is_kept() {
        assert_eq!(resolve_env_vars("a${b", &env(&[("b", "x")])), "a${b");
        assert_eq!(resolve_env_vars("${a}${b", &env(&[("a", "1")])), "1${b");
    }

    #[test]
    fn load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quizkit.toml");
        std::fs::write(&path, "time_limit_minutes = 5\n").unwrap();
        let config = parse_config_file(&path).unwrap();
        assert_eq!(config.time_limit_minutes, 5);

        assert!(load_config_from(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
