/// A CLI to manage an exam question bank and bulk-import questions into it.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// The command to execute. If no command is given, help is shown.
    #[command(subcommand)]
    command: Option<Commands>,

    /// Database URL. Overrides DATABASE_URL.
    #[arg(long, global = true)]
    database: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage exams.
    #[command(subcommand)]
    Exam(ExamCommand),

    /// Manage subjects.
    #[command(subcommand)]
    Subject(SubjectCommand),

    /// Lists every exam with its subjects.
    Exams,

    /// Imports a JSON array of questions into one subject.
    #[command(alias = "i")]
    Import {
        /// Exam title or slug.
        #[arg(long)]
        exam: String,
        /// Subject name under the exam.
        #[arg(long)]
        subject: String,
        /// Year recorded on every imported question.
        #[arg(long)]
        year: Option<String>,
        /// Creator recorded on every imported question.
        #[arg(long)]
        creator: Option<String>,
        /// Path to the JSON file, or `-` for stdin.
        source: String,
    },

    /// Processes an upload document ({exam_id, subject, year, questions}) and prints the JSON report.
    Upload {
        /// Creator recorded on every imported question.
        #[arg(long)]
        creator: Option<String>,
        /// Path to the JSON file, or `-` for stdin.
        source: String,
    },

    /// Shows the questions of one subject.
    Questions {
        #[arg(long)]
        exam: String,
        #[arg(long)]
        subject: String,
    },

    /// Stages credentials, runs migrations and starts the application server.
    Boot,
}

#[derive(Subcommand, Debug)]
enum ExamCommand {
    /// Creates an exam.
    Add {
        title: String,
        /// URL-friendly identifier. Derived from the title when omitted.
        #[arg(long)]
        slug: Option<String>,
        #[arg(long, default_value_t = 120)]
        time_limit: i64,
        #[arg(long, default_value = "")]
        description: String,
    },
}

#[derive(Subcommand, Debug)]
enum SubjectCommand {
    /// Adds a subject to an exam.
    Add {
        /// Exam title or slug.
        #[arg(long)]
        exam: String,
        name: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(url) = cli.database.clone() {
        config.database_url = url;
    }
    logger::init(&config.log_level);

    let Some(command) = cli.command else {
        // If no command was given, print help.
        Cli::parse_from(["", "--help"]);
        return Ok(());
    };

    if let Commands::Boot = command {
        let code = bootstrap::run(&config).await?;
        std::process::exit(code);
    }

    // --- Database Setup ---
    let pool = db::connect(&config.database_url).await?;
    db::migrate(&pool).await?;

    match command {
        Commands::Exam(ExamCommand::Add {
            title,
            slug,
            time_limit,
            description,
        }) => {
            let mut new_exam = NewExam::titled(&title);
            new_exam.slug = slug;
            new_exam.time_limit_minutes = time_limit;
            new_exam.description = description;
            let exam = new_exam.insert(&pool).await?;
            println!("Created exam '{}' (slug: {})", exam.title, exam.slug);
        }
        Commands::Subject(SubjectCommand::Add { exam, name }) => {
            let exam = find_exam(&pool, &exam).await?;
            let subject = exam.add_subject(&pool, &name).await?;
            println!("Added subject '{}' to exam '{}'", subject.name, exam.title);
        }
        Commands::Exams => {
            let exams = fetch_all_exams(&pool).await?;
            if exams.is_empty() {
                println!("No exams found. Use `exam add` to create one.");
            }
            for exam in &exams {
                println!("{} [{}] - {} min", exam.title, exam.slug, exam.time_limit_minutes);
                for subject in fetch_subjects_for_exam(&pool, exam.id).await? {
                    println!("  - {}", subject.name);
                }
            }
        }
        Commands::Import {
            exam,
            subject,
            year,
            creator,
            source,
        } => {
            let exam = find_exam(&pool, &exam).await?;
            let subject = find_subject(&pool, &exam, &subject).await?;
            let text = read_payload(&source)?;
            let records = parse_batch(&text)?;

            println!(
                "\n--- Importing {} question(s) into {} / {} ---",
                records.len(),
                exam.title,
                subject.name
            );
            let provenance = Provenance { year, creator };
            let report = import_batch(&pool, &subject, &records, &provenance).await;

            for notice in report.notices(&subject.name) {
                match notice.level {
                    NoticeLevel::Success => println!("✓ {}", notice.message),
                    NoticeLevel::Warning => println!("⚠ {}", notice.message),
                    NoticeLevel::Error => eprintln!("✗ {}", notice.message),
                }
            }

            match report.outcome() {
                Outcome::Complete | Outcome::Partial => {
                    print_questions(&pool, &subject).await?;
                }
                Outcome::Failed => {
                    anyhow::bail!("No questions were imported.");
                }
                Outcome::Empty => {}
            }
        }
        Commands::Upload { creator, source } => {
            let text = read_payload(&source)?;
            let request = upload::parse_request(&text)?;
            let response = upload::handle_upload(&pool, request, creator).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Questions { exam, subject } => {
            let exam = find_exam(&pool, &exam).await?;
            let subject = find_subject(&pool, &exam, &subject).await?;
            print_questions(&pool, &subject).await?;
        }
        Commands::Boot => unreachable!(),
    }

    Ok(())
}

async fn find_exam(pool: &SqlitePool, key: &str) -> anyhow::Result<Exam> {
    fetch_exam_by_key(pool, key)
        .await?
        .with_context(|| format!("Exam '{}' not found. Create it with `exam add` first.", key))
}

async fn find_subject(pool: &SqlitePool, exam: &Exam, name: &str) -> anyhow::Result<Subject> {
    fetch_subject_by_name(pool, exam.id, name)
        .await?
        .with_context(|| {
            format!(
                "Selected subject '{}' does not belong to exam '{}'.",
                name, exam.title
            )
        })
}

async fn print_questions(pool: &SqlitePool, subject: &Subject) -> anyhow::Result<()> {
    let listing = fetch_subject_questions(pool, subject.id).await?;
    println!("\n--- {} ({} question(s)) ---", subject.name, listing.len());
    for view in &listing {
        println!("  #{}: {}", view.question.id, view.question.text);
        for option in &view.options {
            let marker = if option.is_correct { "*" } else { " " };
            println!("    {} {}. {}", marker, option.label, option.text);
        }
    }
    Ok(())
}

pub mod bootstrap;
pub mod config;
pub mod db;
pub mod error;
pub mod exams;
pub mod logger;
pub mod question_bank;
pub mod question_bank_populator;
pub mod questions;
pub mod report;
pub mod upload;

use crate::question_bank_populator::import_batch;
use anyhow::Context;
use clap::Parser;
use clap::Subcommand;
use config::Config;
use db::*;
use exams::{Exam, NewExam, Subject};
use question_bank::{parse_batch, read_payload};
use questions::Provenance;
use report::{NoticeLevel, Outcome};
use sqlx::sqlite::SqlitePool;
