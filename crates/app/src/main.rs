use std::fmt;
use std::sync::Arc;

use engine::{PhaseKind, QuizController, QuizRules, SessionSnapshot};
use provider::{OpenTriviaClient, OpenTriviaConfig};
use tokio::sync::mpsc;
use trivia_core::Clock;
use trivia_core::model::{Category, CategoryId};
use url::Url;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidNumber { flag: &'static str, raw: String },
    InvalidBaseUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidBaseUrl { raw } => write!(f, "invalid --base-url value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

struct Args {
    category: Option<CategoryId>,
    questions: Option<u8>,
    seconds: Option<u32>,
    base_url: Option<String>,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [--category <id>] [--questions <n>] [--seconds <n>] [--base-url <url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --questions 5");
    eprintln!("  --seconds 10");
    eprintln!();
    eprintln!("During play:");
    eprintln!("  1-9  pick a category or an answer");
    eprintln!("  n    next question");
    eprintln!("  r    restart");
    eprintln!("  q    quit");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  TRIVIA_API_BASE_URL, RUST_LOG");
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self {
            category: None,
            questions: None,
            seconds: None,
            base_url: None,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--category" => {
                    let value = require_value(args, "--category")?;
                    let id: CategoryId = value.parse().map_err(|_| ArgsError::InvalidNumber {
                        flag: "--category",
                        raw: value.clone(),
                    })?;
                    parsed.category = Some(id);
                }
                "--questions" => {
                    let value = require_value(args, "--questions")?;
                    let amount: u8 = value.parse().map_err(|_| ArgsError::InvalidNumber {
                        flag: "--questions",
                        raw: value.clone(),
                    })?;
                    parsed.questions = Some(amount);
                }
                "--seconds" => {
                    let value = require_value(args, "--seconds")?;
                    let seconds: u32 = value.parse().map_err(|_| ArgsError::InvalidNumber {
                        flag: "--seconds",
                        raw: value.clone(),
                    })?;
                    parsed.seconds = Some(seconds);
                }
                "--base-url" => {
                    let value = require_value(args, "--base-url")?;
                    if Url::parse(&value).is_err() {
                        return Err(ArgsError::InvalidBaseUrl { raw: value });
                    }
                    parsed.base_url = Some(value);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }
}

/// Reads stdin on a dedicated thread so the async loop never blocks on it.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn render_menu(categories: &[Category]) {
    println!();
    println!("Pick a category:");
    for (i, category) in categories.iter().enumerate() {
        println!("  {}. {}", i + 1, category.name);
    }
    println!("Type a number to start, or q to quit.");
}

fn render_question(snapshot: &SessionSnapshot) {
    let Some(question) = snapshot.current_question() else {
        return;
    };
    println!();
    println!(
        "Question {}/{}  [{}s left]  score {}",
        snapshot.current_index + 1,
        snapshot.question_total(),
        snapshot.timer_seconds,
        snapshot.score
    );
    println!("{}", question.text());
    for (i, answer) in question.answers().iter().enumerate() {
        let marker = if snapshot.selected_answer.as_deref() == Some(answer.as_str()) {
            ">"
        } else {
            " "
        };
        println!(" {marker} {}. {answer}", i + 1);
    }
    if snapshot.answer_locked {
        println!("Answer locked in. Type n for the next question.");
    }
}

fn render_score_card(snapshot: &SessionSnapshot) {
    let Some(report) = &snapshot.report else {
        return;
    };
    println!();
    println!(
        "Quiz complete: {}/{} in {}",
        report.score(),
        report.total(),
        report.category().name
    );
    for entry in report.entries() {
        let mark = if entry.was_correct { "✓" } else { "✗" };
        println!("  {mark} {}", entry.question);
        if !entry.was_correct {
            println!("      correct answer: {}", entry.correct_answer);
        }
    }
    println!("Type r to play again, or q to quit.");
}

fn render_failure(snapshot: &SessionSnapshot) {
    let message = snapshot.error.as_deref().unwrap_or("something went wrong");
    println!();
    println!("Could not start the quiz: {message}");
    println!("Type r to return to the menu, or q to quit.");
}

fn render(snapshot: &SessionSnapshot, previous: Option<&SessionSnapshot>, categories: &[Category]) {
    match snapshot.phase {
        PhaseKind::Idle => render_menu(categories),
        PhaseKind::Loading => {
            if let Some(category) = &snapshot.category {
                println!();
                println!("Loading {} questions...", category.name);
            }
        }
        PhaseKind::InProgress => {
            // Reprint the question on entry and on selection; plain ticks
            // only update the countdown line.
            let same_view = previous.is_some_and(|p| {
                p.phase == PhaseKind::InProgress
                    && p.current_index == snapshot.current_index
                    && p.answer_locked == snapshot.answer_locked
            });
            if same_view {
                println!("  {}s left", snapshot.timer_seconds);
            } else {
                render_question(snapshot);
            }
        }
        PhaseKind::Complete => render_score_card(snapshot),
        PhaseKind::Failed => render_failure(snapshot),
    }
}

async fn dispatch_number(controller: &QuizController, categories: &[Category], number: usize) {
    let snapshot = controller.snapshot();
    match snapshot.phase {
        PhaseKind::Idle => {
            let Some(category) = categories.get(number - 1) else {
                println!("no category {number} on the menu");
                return;
            };
            if let Err(error) = controller.select_category(category.id).await {
                println!("{error}");
            }
        }
        PhaseKind::InProgress => {
            let Some(question) = snapshot.current_question() else {
                return;
            };
            let Some(answer) = question.answers().get(number - 1) else {
                println!("no option {number} for this question");
                return;
            };
            if let Err(error) = controller.select_answer(answer) {
                println!("{error}");
            }
        }
        _ => println!("numbers only work on the menu or a question"),
    }
}

/// Handles one input line. Returns `false` when the player quits.
async fn dispatch(controller: &QuizController, categories: &[Category], line: &str) -> bool {
    match line {
        "" => {}
        "q" | "quit" => return false,
        "r" => {
            if let Err(error) = controller.restart() {
                println!("{error}");
            }
        }
        "n" => {
            if let Err(error) = controller.advance() {
                println!("{error}");
            }
        }
        _ => match line.parse::<usize>() {
            Ok(number) if number >= 1 => dispatch_number(controller, categories, number).await,
            _ => println!("unrecognized input: {line} (number, n, r, or q)"),
        },
    }
    true
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let parsed = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let mut rules = QuizRules::default();
    if let Some(amount) = parsed.questions {
        rules = rules.with_questions_per_set(amount);
    }
    if let Some(seconds) = parsed.seconds {
        rules = rules.with_seconds_per_question(seconds);
    }

    let config = match parsed.base_url {
        Some(base_url) => OpenTriviaConfig { base_url },
        None => OpenTriviaConfig::from_env(),
    };
    let source = Arc::new(OpenTriviaClient::new(config));
    let controller = QuizController::new(source, rules, Clock::default());
    let mut updates = controller.subscribe();

    let categories = controller.categories().await?;
    log::info!("loaded {} categories", categories.len());

    if let Some(id) = parsed.category {
        if let Err(error) = controller.select_category(id).await {
            eprintln!("could not start with category {id}: {error}");
            render_menu(&categories);
        }
    } else {
        render_menu(&categories);
    }

    let mut input = spawn_stdin_reader();
    let mut previous: Option<SessionSnapshot> = None;

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                render(&snapshot, previous.as_ref(), &categories);
                previous = Some(snapshot);
            }
            line = input.recv() => {
                let Some(line) = line else { break };
                if !dispatch(&controller, &categories, line.trim()).await {
                    break;
                }
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    pretty_env_logger::init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
