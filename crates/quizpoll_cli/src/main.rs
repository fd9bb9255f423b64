//! QuizPoll command-line front end.
//!
//! # Responsibility
//! - Drive the core session against a SQLite file, one command per run.
//! - Print results the way a quiz card would render them.

use clap::{Parser, Subcommand};
use log::info;
use quizpoll_core::db::open_db;
use quizpoll_core::{
    init_logging, parse_question_set, CommentService, PollConfig, PollSession, Question,
    QuestionResults, SelectOutcome, SqliteCommentRepository, SqliteVoteStore, VoteService,
};
use rusqlite::Connection;
use std::error::Error;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "quizpoll", version, about = "Vote on quiz questions and see live results")]
struct Cli {
    /// SQLite file shared by everyone voting on this machine.
    #[arg(long, default_value = "quizpoll.sqlite3")]
    db: PathBuf,

    /// Absolute directory for rolling log files; logging is off when unset.
    #[arg(long)]
    log_dir: Option<String>,

    #[arg(long, default_value_t = quizpoll_core::default_log_level().to_string())]
    log_level: String,

    #[arg(long, default_value_t = quizpoll_core::config::DEFAULT_SEED_MIN)]
    seed_min: u32,

    #[arg(long, default_value_t = quizpoll_core::config::DEFAULT_SEED_MAX)]
    seed_max: u32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Declare the display name used for voting and commenting.
    Identify { name: String },
    /// Show the declared display name.
    Whoami,
    /// Seed starting counts for options nobody voted on yet.
    Seed { questions: PathBuf },
    /// Vote for an option.
    Vote {
        questions: PathBuf,
        question_id: String,
        option_id: String,
        /// Declare this name first when no identity is set.
        #[arg(long)]
        name: Option<String>,
    },
    /// Show results for every question.
    Results { questions: PathBuf },
    /// Post a comment on a page.
    Comment { page_id: String, text: String },
    /// List comments of a page, newest first.
    Comments { page_id: String },
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    if let Some(log_dir) = cli.log_dir.as_deref() {
        init_logging(&cli.log_level, log_dir)?;
    }
    let config = PollConfig::with_seed_bounds(cli.seed_min, cli.seed_max)?;
    let conn = open_db(&cli.db)?;
    info!("event=cli_start module=cli status=ok version={}", quizpoll_core::core_version());

    match cli.command {
        Command::Identify { name } => {
            let service = VoteService::new(SqliteVoteStore::try_new(&conn)?);
            let identity = service.set_identity(&name)?;
            println!("Voting as {identity}");
        }
        Command::Whoami => {
            let service = VoteService::new(SqliteVoteStore::try_new(&conn)?);
            match service.identity()? {
                Some(identity) => println!("{identity}"),
                None => println!("No identity declared; run `quizpoll identify <name>`"),
            }
        }
        Command::Seed { questions } => {
            let service = VoteService::with_config(SqliteVoteStore::try_new(&conn)?, config);
            let seeded = service.seed(&load_questions(&questions)?)?;
            println!("Seeded {seeded} option(s)");
        }
        Command::Vote {
            questions,
            question_id,
            option_id,
            name,
        } => {
            let mut session = open_session(&conn, config, &questions)?;
            let mut outcome = session.select_option(&question_id, &option_id)?;
            if outcome == SelectOutcome::IdentityRequired {
                if let Some(name) = name.as_deref() {
                    outcome = session
                        .confirm_identity(name)?
                        .unwrap_or(SelectOutcome::IdentityRequired);
                }
            }
            report_outcome(&outcome);
            if let Some(results) = session.results(&question_id) {
                print_results(&results);
            }
        }
        Command::Results { questions } => {
            let session = open_session(&conn, config, &questions)?;
            for results in session.all_results() {
                print_results(&results);
            }
        }
        Command::Comment { page_id, text } => {
            let service = CommentService::new(
                SqliteCommentRepository::try_new(&conn)?,
                SqliteVoteStore::try_new(&conn)?,
            );
            let comment = service.post_comment(&page_id, &text)?;
            println!("Posted comment {}", comment.id);
        }
        Command::Comments { page_id } => {
            let service = CommentService::new(
                SqliteCommentRepository::try_new(&conn)?,
                SqliteVoteStore::try_new(&conn)?,
            );
            for comment in service.list_comments(&page_id)? {
                println!("[{}] {}: {}", comment.created_at, comment.author, comment.body);
            }
        }
    }

    Ok(())
}

fn load_questions(path: &Path) -> Result<Vec<Question>, Box<dyn Error>> {
    let json = std::fs::read_to_string(path)?;
    Ok(parse_question_set(&json)?)
}

fn open_session<'conn>(
    conn: &'conn Connection,
    config: PollConfig,
    questions: &Path,
) -> Result<PollSession<SqliteVoteStore<'conn>>, Box<dyn Error>> {
    let service = VoteService::with_config(SqliteVoteStore::try_new(conn)?, config);
    let mut session = PollSession::new(service, load_questions(questions)?)?;
    session.load()?;
    Ok(session)
}

fn report_outcome(outcome: &SelectOutcome) {
    match outcome {
        SelectOutcome::Recorded => println!("Vote recorded."),
        SelectOutcome::IdentityRequired => {
            println!("Who's voting? Run `quizpoll identify <name>` or pass --name.")
        }
        SelectOutcome::AlreadyAnswered { option_id } => {
            println!("Already answered with `{option_id}`.")
        }
        SelectOutcome::Failed { reason } => println!("Vote not saved ({reason}); try again."),
    }
}

fn print_results(results: &QuestionResults) {
    println!();
    println!("[{}] {}", results.kind.label(), results.prompt);
    for option in &results.options {
        let marker = match results.selected.as_deref() {
            Some(choice) if choice == option.option_id => ">",
            _ => " ",
        };
        if results.is_revealed() {
            println!(
                " {marker} {:<32} {:>3}% ({})",
                option.text, option.percentage, option.count
            );
        } else {
            println!(" {marker} {} [{}]", option.text, option.option_id);
        }
    }
    if let Some(feedback) = results.feedback {
        println!("   {}", feedback.message());
    }
}
