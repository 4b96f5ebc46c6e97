mod checklist;
mod db;
mod parser;
mod protocol;
mod settings;
mod source;

use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::info;

use checklist::ChecklistItem;
use protocol::{Request, Response, SCRAPE_ACTION};
use settings::Settings;
use source::Source;

#[derive(Parser)]
#[command(name = "course_scraper", about = "Course list and weekly checklist from an LMS dashboard")]
struct Cli {
    /// SQLite file (overrides COURSE_SCRAPER_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct PageArgs {
    /// Saved HTML file, `-` for stdin, or an http(s) URL to fetch
    source: String,
    /// Address of a saved page, used to resolve relative links
    #[arg(long)]
    page_url: Option<String>,
    /// Session cookie sent when fetching (e.g. "MoodleSession=...")
    #[arg(long)]
    cookie: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect courses on a page and replace the stored course list
    Scrape {
        #[command(flatten)]
        page: PageArgs,
        /// Print the response envelope as JSON instead of a table
        #[arg(long)]
        json: bool,
        /// Do not touch the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Answer a JSON request (e.g. {"action":"scrapeData"}) against a page
    Message {
        /// Request object
        #[arg(long, default_value = r#"{"action":"scrapeData"}"#)]
        request: String,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Show stored courses with their checklist
    List,
    /// Add a course by hand
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        code: String,
    },
    /// Correct a course name
    Rename { id: String, name: String },
    /// Tick (or with --off, clear) a checklist item
    Check {
        id: String,
        #[arg(value_enum)]
        item: ChecklistItem,
        #[arg(long)]
        off: bool,
    },
    /// Checklist totals
    Summary,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let mut settings = Settings::load()?;
    if let Some(db) = cli.db {
        settings.db_path = db;
    }

    let result = match cli.command {
        Commands::Scrape { page, json, dry_run } => {
            let loaded = load_page(&page, &settings).await?;
            let request = Request {
                action: SCRAPE_ACTION.to_string(),
            };
            let response = protocol::handle(&request, &loaded.html, loaded.url.as_deref());

            let courses = report_scrape(&mut std::io::stdout(), response, json)?;

            if courses.is_empty() {
                Ok(())
            } else if dry_run {
                if !json {
                    print_records(&courses);
                }
                Ok(())
            } else {
                let conn = open_db(&settings)?;
                let saved = db::refresh_courses(&conn, &courses)?;
                if !json {
                    print_stored(&db::fetch_courses(&conn)?);
                    println!("\nFound {} courses.", saved);
                }
                Ok(())
            }
        }
        Commands::Message { request, page } => {
            let request: Request =
                serde_json::from_str(&request).context("Request is not valid JSON")?;
            let response = match load_page(&page, &settings).await {
                Ok(loaded) => protocol::handle(&request, &loaded.html, loaded.url.as_deref()),
                Err(e) => Response::failure(format!("{:#}", e)),
            };
            println!("{}", serde_json::to_string(&response)?);
            Ok(())
        }
        Commands::List => {
            let conn = open_db(&settings)?;
            let rows = db::fetch_courses(&conn)?;
            if rows.is_empty() {
                println!("No courses yet. Run 'scrape' on your dashboard page or 'add' one.");
                return Ok(());
            }
            print_stored(&rows);
            Ok(())
        }
        Commands::Add { name, code } => {
            let conn = open_db(&settings)?;
            let course = db::add_manual(&conn, &name, &code)?;
            println!("Added {} ({}) as {}", course.name, course.code, course.id);
            Ok(())
        }
        Commands::Rename { id, name } => {
            let conn = open_db(&settings)?;
            db::rename(&conn, &id, &name)?;
            println!("Renamed {} to: {}", id, name.trim());
            Ok(())
        }
        Commands::Check { id, item, off } => {
            let conn = open_db(&settings)?;
            db::set_check(&conn, &id, item, !off)?;
            let s = db::summary(&conn)?;
            println!(
                "Attendance {} | Tasks {} | Discussions {}",
                s.attendance, s.tasks, s.discussions
            );
            Ok(())
        }
        Commands::Summary => {
            let conn = open_db(&settings)?;
            let s = db::summary(&conn)?;
            println!("Attendance:  {}", s.attendance);
            println!("Tasks:       {}", s.tasks);
            println!("Discussions: {}", s.discussions);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("\nDone in {:.1}s", elapsed.as_secs_f64());
    }

    result
}

/// Print the envelope (with `json`) or the empty-page notice, and hand back
/// the detected courses. With `json` the envelope is the only thing on `out`.
fn report_scrape(
    out: &mut impl Write,
    response: Response,
    json: bool,
) -> anyhow::Result<Vec<parser::CourseRecord>> {
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&response)?)?;
    }
    let courses = match response {
        Response {
            success: true,
            data: Some(data),
            ..
        } => data.courses,
        Response { error, .. } => {
            bail!(error.unwrap_or_else(|| "Scrape failed".to_string()))
        }
    };

    if courses.is_empty() {
        if json {
            info!("No courses found on this page; stored list left unchanged");
        } else {
            writeln!(out, "No courses found on this page; stored list left unchanged.")?;
        }
    }
    Ok(courses)
}

async fn load_page(args: &PageArgs, settings: &Settings) -> anyhow::Result<source::LoadedPage> {
    let source = Source::parse(&args.source);
    source::load(&source, args.page_url.clone(), args.cookie.as_deref(), settings).await
}

fn open_db(settings: &Settings) -> anyhow::Result<rusqlite::Connection> {
    let conn = db::connect(&settings.db_path)?;
    db::init_schema(&conn)?;
    Ok(conn)
}

fn print_records(courses: &[parser::CourseRecord]) {
    println!("{:>3} | {:<12} | {:<36} | {:<10}", "#", "Id", "Name", "Code");
    println!("{}", "-".repeat(70));
    for (i, c) in courses.iter().enumerate() {
        println!(
            "{:>3} | {:<12} | {:<36} | {:<10}",
            i + 1,
            truncate(&c.id, 12),
            truncate(display_name(&c.name), 36),
            truncate(&c.code, 10)
        );
    }
}

fn print_stored(rows: &[db::StoredCourse]) {
    println!(
        "{:>3} | {:<16} | {:<36} | {:<10} | {:^4} | {:^4} | {:^4}",
        "#", "Id", "Name", "Code", "Att", "Task", "Disc"
    );
    println!("{}", "-".repeat(96));
    for (i, row) in rows.iter().enumerate() {
        let mark = |item| if row.checklist.get(item) { "x" } else { "" };
        println!(
            "{:>3} | {:<16} | {:<36} | {:<10} | {:^4} | {:^4} | {:^4}",
            i + 1,
            truncate(&row.course.id, 16),
            truncate(display_name(&row.course.name), 36),
            truncate(&row.course.code, 10),
            mark(ChecklistItem::Attendance),
            mark(ChecklistItem::Task),
            mark(ChecklistItem::Discussion),
        );
    }
}

/// Empty names need the user to fill them in.
fn display_name(name: &str) -> &str {
    if name.trim().is_empty() {
        "(no name, use 'rename')"
    } else {
        name
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}
