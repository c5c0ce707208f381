//! The `quizkit take` command.
//!
//! Reads answers line by line from stdin while a one-second interval
//! drives the session timer, so an idle taker is still timed out.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::time::{interval, Duration, MissedTickBehavior};

use quizkit_core::clock::SystemClock;
use quizkit_core::config::load_config_from;
use quizkit_core::error::QuizError;
use quizkit_core::model::Question;
use quizkit_core::session::{AttemptOutcome, AttemptSession, SessionState};
use quizkit_core::traits::ResultStore;
use quizkit_store::{load_question_bank, CsvResultStore};

const RESULTS_PAGE: &str = "quiz-results.html";

type Input = Lines<BufReader<Stdin>>;

pub async fn execute(name: Option<String>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let bank = Arc::new(load_question_bank(&config.questions_path())?);
    let store = CsvResultStore::from_config(&config);
    let mut session = AttemptSession::new(bank, Arc::new(SystemClock), config.time_limit());

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut preset_name = name;

    println!("Quiz Application");
    println!(
        "You have {} minutes to answer {} questions.",
        config.time_limit().num_minutes(),
        session.total_questions()
    );

    loop {
        if !start_attempt(&mut session, &mut input, preset_name.take()).await? {
            return Ok(());
        }

        if !run_questions(&mut session, &store, &mut input).await? {
            println!("\nQuiz abandoned; no results were saved.");
            return Ok(());
        }

        if let Err(e) = session.finalize(&store) {
            match e {
                QuizError::Storage(_) => eprintln!("Warning: {e}"),
                other => return Err(other.into()),
            }
        }
        let outcome = session.outcome()?;
        print_results(&outcome);

        if !results_menu(&outcome, &mut input).await? {
            return Ok(());
        }
        session.reset();
    }
}

/// Prompt for a name until the session starts. Returns `false` on EOF.
async fn start_attempt(
    session: &mut AttemptSession,
    input: &mut Input,
    mut preset: Option<String>,
) -> Result<bool> {
    loop {
        let name = match preset.take() {
            Some(n) => n,
            None => {
                prompt("\nEnter your name to begin: ");
                match input.next_line().await? {
                    Some(line) => line,
                    None => return Ok(false),
                }
            }
        };

        match session.start(&name) {
            Ok(()) => return Ok(true),
            Err(e @ QuizError::Validation(_)) => println!("{e}"),
            Err(e) => return Err(e.into()),
        }
    }
}

/// Answer questions until the attempt completes. Returns `false` on EOF.
///
/// The timer is checked every second whether or not input arrives.
async fn run_questions<R>(
    session: &mut AttemptSession,
    store: &dyn ResultStore,
    input: &mut Lines<R>,
) -> Result<bool>
where
    R: AsyncBufRead + Unpin,
{
    let mut timer = interval(Duration::from_secs(1));
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    show_question(session);

    loop {
        tokio::select! {
            line = input.next_line() => {
                let Some(line) = line? else {
                    return Ok(false);
                };
                let Some(question) = session.current_question().cloned() else {
                    return Ok(true);
                };
                let Some(choice) = resolve_choice(&question, &line) else {
                    println!("Please enter a number between 1 and {} or the option text.", question.options.len());
                    prompt("> ");
                    continue;
                };

                match session.submit_answer(&choice, store) {
                    Ok(outcome) if outcome.completed => return Ok(true),
                    Ok(_) => show_question(session),
                    Err(QuizError::TimeExpired) => {
                        println!("\nTime's up! That answer was not recorded.");
                        return Ok(true);
                    }
                    Err(e @ QuizError::Storage(_)) => {
                        eprintln!("Warning: {e}");
                        if session.state() == SessionState::Completed {
                            return Ok(true);
                        }
                        show_question(session);
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            _ = timer.tick() => {
                if session.tick() == SessionState::Completed {
                    println!("\nTime's up!");
                    return Ok(true);
                }
            }
        }
    }
}

/// Offer restart / print / quit. Returns `true` to restart.
async fn results_menu(outcome: &AttemptOutcome, input: &mut Input) -> Result<bool> {
    loop {
        prompt("\n[r]estart, [p]rint results, [q]uit: ");
        let Some(line) = input.next_line().await? else {
            return Ok(false);
        };
        match line.trim().to_ascii_lowercase().as_str() {
            "r" | "restart" => return Ok(true),
            "q" | "quit" => return Ok(false),
            "p" | "print" => {
                let path = PathBuf::from(RESULTS_PAGE);
                quizkit_report::write_results_html(outcome, &path)?;
                println!("Results page written to {}", path.display());
            }
            other => println!("Unknown choice: {other}"),
        }
    }
}

fn show_question(session: &AttemptSession) {
    let Some(question) = session.current_question() else {
        return;
    };
    let countdown = session.countdown().unwrap_or_else(|_| "00:00".into());
    println!(
        "\nQuestion {} of {}  [{:.0}%]  Time remaining: {}",
        session.current_index() + 1,
        session.total_questions(),
        session.progress() * 100.0,
        countdown
    );
    println!("{}", question.text);
    for (i, option) in question.options.iter().enumerate() {
        println!("  {}. {}", i + 1, option);
    }
    prompt("> ");
}

fn print_results(outcome: &AttemptOutcome) {
    println!("\nQuiz Results for {}", outcome.taker_name);
    println!(
        "Score: {}/{} ({:.1}%)",
        outcome.score, outcome.total_questions, outcome.percentage
    );
    println!("{} {}", outcome.tier.headline(), outcome.tier.message());
    println!("Time taken: {}", outcome.time_taken);
}

/// Map a typed line to one of the question's options.
///
/// Accepts a 1-based option number or the option text (case-insensitive).
fn resolve_choice(question: &Question, line: &str) -> Option<String> {
    let line = line.trim();
    if let Ok(n) = line.parse::<usize>() {
        return n
            .checked_sub(1)
            .and_then(|i| question.options.get(i))
            .cloned();
    }
    question
        .options
        .iter()
        .find(|o| o.eq_ignore_ascii_case(line))
        .cloned()
}

fn prompt(text: &str) {
    print!("{text}");
    std::io::stdout().flush().ok();
}
