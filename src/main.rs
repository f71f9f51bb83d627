mod config;
mod db;
mod ingest;
mod models;
mod schema;
mod tui;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use config::Config;
use db::{Database, JobListingFilter};
use ingest::HttpFetcher;
use models::{
    ExperienceLevel, JobListing, JobListingStatus, JobListingType, LocationRequirement,
    NewJobListing, NewScrapedJob, QuestionType, ScrapedJob, WageInterval,
};
use schema::{Cardinality, ColumnKind, DefaultValue, OnDelete, TableDef};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "copilot")]
#[command(about = "Career copilot - scrape, save and prepare for jobs")]
struct Cli {
    /// Database file (overrides config and COPILOT_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Config file (default: <config dir>/career-copilot/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Describe tables, enums and relations
    Schema {
        /// Only this table
        #[arg(short, long)]
        table: Option<String>,

        /// Values of one enumerated type
        #[arg(short, long = "enum", conflicts_with = "table")]
        enum_name: Option<String>,

        /// Print the CREATE statements instead
        #[arg(long)]
        sql: bool,
    },

    /// Manage users
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Manage organizations
    Org {
        #[command(subcommand)]
        command: OrgCommands,
    },

    /// Manage on-platform job listings
    Listing {
        #[command(subcommand)]
        command: ListingCommands,
    },

    /// Scrape job boards into the database
    Scrape {
        /// Source to scrape (python.org, simplify); repeatable, default all
        #[arg(short, long)]
        source: Vec<String>,

        /// Max jobs per source
        #[arg(short, long)]
        limit: Option<usize>,

        /// Parse and report without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Browse scraped jobs
    Jobs {
        #[command(subcommand)]
        command: JobsCommands,
    },

    /// Manage a user's saved jobs
    Saved {
        #[command(subcommand)]
        command: SavedCommands,
    },

    /// Manage generated cover letters
    Letter {
        #[command(subcommand)]
        command: LetterCommands,
    },

    /// Mock interview sessions
    Interview {
        #[command(subcommand)]
        command: InterviewCommands,
    },

    /// Open the terminal shell
    Shell,
}

#[derive(Subcommand)]
enum UserCommands {
    /// Add a user
    Add {
        /// External identity (e.g. auth provider user id)
        id: String,

        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        /// Profile image URL
        #[arg(short, long)]
        image_url: String,
    },

    /// Show a user by id or email
    Show { user: String },

    /// List users
    List,

    /// Change a user's fields
    Update {
        id: String,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        email: Option<String>,

        #[arg(short, long)]
        image_url: Option<String>,
    },

    /// Delete a user (fails while saved jobs, letters or sessions exist)
    Delete { id: String },
}

#[derive(Subcommand)]
enum OrgCommands {
    /// Add an organization
    Add {
        id: String,

        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        image_url: Option<String>,
    },

    /// List organizations
    List,

    /// Delete an organization and all of its listings
    Delete { id: String },
}

#[derive(Args)]
struct ListingArgs {
    /// Owning organization id
    #[arg(long)]
    org: String,

    #[arg(short, long)]
    title: String,

    #[arg(short, long)]
    description: String,

    /// Full-time, Part-time or Internship
    #[arg(long = "type")]
    listing_type: JobListingType,

    /// In-Office, Remote or Hybrid
    #[arg(long)]
    location_requirement: LocationRequirement,

    /// Junior, Mid-level or Senior
    #[arg(long)]
    experience: ExperienceLevel,

    #[arg(long, requires = "wage_interval")]
    wage: Option<i64>,

    /// hourly or yearly
    #[arg(long)]
    wage_interval: Option<WageInterval>,

    /// Two-letter state code
    #[arg(long)]
    state: Option<String>,

    #[arg(long)]
    city: Option<String>,

    #[arg(long)]
    featured: bool,

    /// Initial status (default Draft)
    #[arg(long)]
    status: Option<JobListingStatus>,
}

#[derive(Subcommand)]
enum ListingCommands {
    /// Create a listing
    Add(ListingArgs),

    /// List listings, featured first
    List {
        #[arg(long)]
        org: Option<String>,

        #[arg(long)]
        state: Option<String>,

        #[arg(long)]
        status: Option<JobListingStatus>,

        #[arg(long)]
        featured: bool,
    },

    /// Show a listing
    Show { id: String },

    /// Mark a listing Published
    Publish { id: String },

    /// Mark a listing De-listed
    Delist { id: String },

    /// Feature (or with --off, unfeature) a listing
    Feature {
        id: String,

        #[arg(long)]
        off: bool,
    },

    /// Delete a listing
    Delete { id: String },
}

#[derive(Subcommand)]
enum JobsCommands {
    /// List scraped jobs, newest first
    List {
        /// Filter by source site
        #[arg(short, long)]
        source: Option<String>,

        #[arg(short, long)]
        limit: Option<usize>,

        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a scraped job by id or source URL
    Show {
        job: String,

        #[arg(long)]
        json: bool,
    },

    /// Record a job found by hand
    Add {
        #[arg(short, long)]
        title: String,

        #[arg(short, long)]
        company: String,

        /// Posting URL (must be unique)
        #[arg(short, long)]
        url: String,

        #[arg(long, default_value = "Manual")]
        site: String,

        #[arg(short, long, default_value = "")]
        description: String,

        #[arg(long, default_value = "Not specified")]
        location: String,

        #[arg(long)]
        wage: Option<String>,
    },

    /// Delete a scraped job (fails while it is saved or referenced)
    Delete { id: String },
}

#[derive(Subcommand)]
enum SavedCommands {
    /// Save a scraped job for a user
    Add {
        user: String,
        job: String,

        /// Match score, 0-100
        #[arg(short, long, default_value = "0")]
        score: i64,
    },

    /// List a user's saved jobs, best match first
    List { user: String },

    /// Change the match score of a saved job
    Score { id: String, score: i64 },

    /// Remove a saved job
    Remove { id: String },
}

#[derive(Subcommand)]
enum LetterCommands {
    /// Record a cover letter; without --text or --file it is left pending
    Add {
        user: String,
        job: String,

        #[arg(short, long)]
        text: Option<String>,

        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,
    },

    /// Fill in the text of a pending letter
    Set {
        id: String,

        #[arg(short, long)]
        text: Option<String>,

        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,
    },

    /// List a user's letters
    List { user: String },

    /// Print a letter
    Show { id: String },

    /// Delete a letter
    Delete { id: String },
}

#[derive(Subcommand)]
enum InterviewCommands {
    /// Start a session for a user, optionally about a scraped job
    Start {
        user: String,

        #[arg(short, long)]
        job: Option<String>,
    },

    /// Add a question to a session
    Ask {
        session: String,
        question: String,

        /// Behavioral, Technical or Situational
        #[arg(short = 't', long = "type")]
        question_type: QuestionType,

        #[arg(short, long, default_value = "Pending")]
        feedback: String,
    },

    /// Answer a question
    Answer {
        qna: String,
        answer: String,

        #[arg(short, long, default_value = "Pending")]
        feedback: String,
    },

    /// Show a session transcript
    Show { session: String },

    /// List a user's sessions
    List { user: String },

    /// Delete a session and its questions
    Delete { session: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    config.logging.init(cli.verbose);

    let db_path = cli.db.clone().unwrap_or_else(|| config.database_path());
    let db = Database::open(&db_path)
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;

    match cli.command {
        Commands::Init => {
            println!(
                "Database initialized at {} (schema v{})",
                db.path().display(),
                db.schema_version()?
            );
        }

        Commands::Schema { table, enum_name, sql } => {
            if let Some(name) = enum_name {
                let values = schema::enum_values(&name)
                    .ok_or_else(|| anyhow!("Unknown enum '{}'", name))?;
                println!("{}: {}", name, values.join(", "));
                return Ok(());
            }

            let tables: Vec<&TableDef> = match &table {
                Some(name) => vec![schema::table(name).ok_or_else(|| anyhow!("Unknown table '{}'", name))?],
                None => schema::tables().to_vec(),
            };
            for t in tables {
                if sql {
                    println!("{}", t.create_table_sql());
                    for idx in t.create_index_sql() {
                        println!("{}", idx);
                    }
                    println!();
                } else {
                    print_table_def(t);
                }
            }
            if table.is_none() && !sql {
                println!("Enums:");
                for e in schema::ENUMS {
                    println!("  {:<28} {}", e.name, e.values.join(" | "));
                }
            }
        }

        Commands::User { command } => match command {
            UserCommands::Add {
                id,
                name,
                email,
                image_url,
            } => {
                let user = db.create_user(&id, &name, &email, &image_url)?;
                println!("Added user '{}' <{}>", user.id, user.email);
            }

            UserCommands::Show { user } => {
                let found = match db.get_user(&user)? {
                    Some(u) => Some(u),
                    None => db.get_user_by_email(&user)?,
                };
                match found {
                    Some(u) => {
                        println!("User {}", u.id);
                        println!("Name: {}", u.name);
                        println!("Email: {}", u.email);
                        println!("Image: {}", u.image_url);
                        println!("Created: {}", fmt_timestamp(&u.created_at));
                        println!("Saved jobs: {}", db.list_saved_jobs(&u.id)?.len());
                        println!("Cover letters: {}", db.list_cover_letters(&u.id)?.len());
                        println!("Interview sessions: {}", db.list_sessions(&u.id)?.len());
                    }
                    None => println!("User '{}' not found.", user),
                }
            }

            UserCommands::List => {
                let users = db.list_users()?;
                if users.is_empty() {
                    println!("No users found.");
                } else {
                    println!("{:<24} {:<24} {:<30}", "ID", "NAME", "EMAIL");
                    println!("{}", "-".repeat(80));
                    for u in users {
                        println!(
                            "{:<24} {:<24} {:<30}",
                            truncate(&u.id, 22),
                            truncate(&u.name, 22),
                            truncate(&u.email, 30)
                        );
                    }
                }
            }

            UserCommands::Update {
                id,
                name,
                email,
                image_url,
            } => {
                let user = db.update_user(&id, name.as_deref(), email.as_deref(), image_url.as_deref())?;
                println!("Updated user '{}' ({} <{}>)", user.id, user.name, user.email);
            }

            UserCommands::Delete { id } => {
                db.delete_user(&id)
                    .with_context(|| format!("Could not delete user '{}'", id))?;
                println!("Deleted user '{}'.", id);
            }
        },

        Commands::Org { command } => match command {
            OrgCommands::Add { id, name, image_url } => {
                let org = db.create_organization(&id, &name, image_url.as_deref())?;
                println!("Added organization '{}' ({})", org.name, org.id);
            }

            OrgCommands::List => {
                let orgs = db.list_organizations()?;
                if orgs.is_empty() {
                    println!("No organizations found.");
                } else {
                    println!("{:<24} {:<30} {:>8}", "ID", "NAME", "LISTINGS");
                    println!("{}", "-".repeat(64));
                    for org in orgs {
                        let listings = db.list_job_listings(&JobListingFilter {
                            organization_id: Some(org.id.clone()),
                            ..Default::default()
                        })?;
                        println!(
                            "{:<24} {:<30} {:>8}",
                            truncate(&org.id, 22),
                            truncate(&org.name, 28),
                            listings.len()
                        );
                    }
                }
            }

            OrgCommands::Delete { id } => {
                let listings = db.list_job_listings(&JobListingFilter {
                    organization_id: Some(id.clone()),
                    ..Default::default()
                })?;
                db.delete_organization(&id)?;
                println!("Deleted organization '{}' and {} listing(s).", id, listings.len());
            }
        },

        Commands::Listing { command } => match command {
            ListingCommands::Add(args) => {
                let listing = db.create_job_listing(&NewJobListing {
                    organization_id: args.org,
                    title: args.title,
                    description: args.description,
                    wage: args.wage,
                    wage_interval: args.wage_interval,
                    state_abbreviation: args.state,
                    city: args.city,
                    is_featured: args.featured.then_some(true),
                    location_requirement: args.location_requirement,
                    experience_level: args.experience,
                    status: args.status,
                    listing_type: args.listing_type,
                })?;
                println!("Added listing {} ({})", listing.id, listing.status);
            }

            ListingCommands::List {
                org,
                state,
                status,
                featured,
            } => {
                let listings = db.list_job_listings(&JobListingFilter {
                    organization_id: org,
                    state_abbreviation: state,
                    status,
                    featured_only: featured,
                })?;
                if listings.is_empty() {
                    println!("No listings found.");
                } else {
                    println!("{:<36} {:<10} {:<28} {:<16} {:<10}", "ID", "STATUS", "TITLE", "LOCATION", "TYPE");
                    println!("{}", "-".repeat(104));
                    for l in listings {
                        let star = if l.is_featured { "*" } else { "" };
                        println!(
                            "{:<36} {:<10} {:<28} {:<16} {:<10}",
                            l.id,
                            l.status,
                            truncate(&format!("{}{}", star, l.title), 26),
                            truncate(&listing_location(&l), 16),
                            l.listing_type
                        );
                    }
                }
            }

            ListingCommands::Show { id } => match db.get_job_listing(&id)? {
                Some(l) => print_listing(&l),
                None => println!("Listing {} not found.", id),
            },

            ListingCommands::Publish { id } => {
                let l = db.set_job_listing_status(&id, JobListingStatus::Published)?;
                println!("Published '{}' (posted {})", l.title, l.posted_at.as_deref().map(fmt_timestamp).unwrap_or_default());
            }

            ListingCommands::Delist { id } => {
                let l = db.set_job_listing_status(&id, JobListingStatus::Delisted)?;
                println!("De-listed '{}'", l.title);
            }

            ListingCommands::Feature { id, off } => {
                db.set_job_listing_featured(&id, !off)?;
                println!("Listing {} {}.", id, if off { "unfeatured" } else { "featured" });
            }

            ListingCommands::Delete { id } => {
                db.delete_job_listing(&id)?;
                println!("Deleted listing {}.", id);
            }
        },

        Commands::Scrape {
            source,
            limit,
            dry_run,
        } => {
            let sources = ingest::sources_by_name(&source)?;
            let mut settings = config.scraper.settings(dry_run);
            if let Some(limit) = limit {
                if limit == 0 {
                    bail!("--limit must be at least 1");
                }
                settings.max_jobs_per_source = limit;
            }

            let fetcher = HttpFetcher::new(config.scraper.timeout()).context("Failed to build HTTP client")?;
            let report = ingest::run_scrape(&db, &sources, &fetcher, &config.scraper.pacer(), &settings);

            println!("\n{:<14} {:>6} {:>9} {:>11} {:>7}", "SOURCE", "FOUND", "INSERTED", "DUPLICATES", "ERRORS");
            println!("{}", "-".repeat(51));
            for s in &report.sources {
                println!(
                    "{:<14} {:>6} {:>9} {:>11} {:>7}",
                    s.source, s.found, s.inserted, s.duplicates, s.errors
                );
                if let Some(failure) = &s.failure {
                    println!("  failed: {}", failure);
                }
            }
            println!("\nTotal new jobs: {}", report.total_inserted());
            if dry_run {
                println!("(Dry run - nothing was written)");
            }
        }

        Commands::Jobs { command } => match command {
            JobsCommands::List { source, limit, json } => {
                let jobs = db.list_scraped_jobs(source.as_deref(), limit)?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&jobs)?);
                } else if jobs.is_empty() {
                    println!("No jobs found.");
                } else {
                    println!("{:<36} {:<12} {:<30} {:<20} {:<8}", "ID", "SOURCE", "TITLE", "COMPANY", "WHERE");
                    println!("{}", "-".repeat(110));
                    for job in jobs {
                        println!(
                            "{:<36} {:<12} {:<30} {:<20} {:<8}",
                            job.id,
                            truncate(&job.source_site, 12),
                            truncate(&job.title, 28),
                            truncate(&job.company_name, 18),
                            truncate(&job.location_requirement, 8)
                        );
                    }
                }
            }

            JobsCommands::Show { job, json } => {
                let found = match db.get_scraped_job(&job)? {
                    Some(j) => Some(j),
                    None => db.get_scraped_job_by_url(&job)?,
                };
                match found {
                    Some(j) if json => println!("{}", serde_json::to_string_pretty(&j)?),
                    Some(j) => print_scraped_job(&j),
                    None => println!("Job '{}' not found.", job),
                }
            }

            JobsCommands::Add {
                title,
                company,
                url,
                site,
                description,
                location,
                wage,
            } => {
                let job = NewScrapedJob {
                    location_requirement: ingest::heuristics::infer_location_requirement(&title, &location, &description),
                    experience_level: ingest::heuristics::infer_experience_level(&title, &description),
                    wage: wage.or_else(|| ingest::heuristics::extract_salary(&description)),
                    title,
                    company_name: company,
                    description,
                    location,
                    source_url: url,
                    source_site: site,
                    posted_at: None,
                };
                let id = db.create_scraped_job(&job)?;
                println!("Added job {}", id);
            }

            JobsCommands::Delete { id } => {
                db.delete_scraped_job(&id)
                    .with_context(|| format!("Could not delete job {}", id))?;
                println!("Deleted job {}.", id);
            }
        },

        Commands::Saved { command } => match command {
            SavedCommands::Add { user, job, score } => {
                if !(0..=100).contains(&score) {
                    bail!("Score must be between 0 and 100");
                }
                let saved = db.save_job(&user, &job, score)?;
                println!("Saved job {} for '{}' (id {})", saved.job_id, saved.user_id, saved.id);
            }

            SavedCommands::List { user } => {
                let saved = db.list_saved_jobs(&user)?;
                if saved.is_empty() {
                    println!("No saved jobs for '{}'.", user);
                } else {
                    println!("{:<36} {:>5} {:<30} {:<20}", "ID", "SCORE", "TITLE", "COMPANY");
                    println!("{}", "-".repeat(94));
                    for s in saved {
                        println!(
                            "{:<36} {:>5} {:<30} {:<20}",
                            s.saved.id,
                            s.saved.ai_match_score,
                            truncate(&s.title, 28),
                            truncate(&s.company_name, 18)
                        );
                    }
                }
            }

            SavedCommands::Score { id, score } => {
                if !(0..=100).contains(&score) {
                    bail!("Score must be between 0 and 100");
                }
                db.update_match_score(&id, score)?;
                println!("Saved job {} now scores {}.", id, score);
            }

            SavedCommands::Remove { id } => {
                db.unsave_job(&id)?;
                println!("Removed saved job {}.", id);
            }
        },

        Commands::Letter { command } => match command {
            LetterCommands::Add { user, job, text, file } => {
                let body = letter_body(text, file)?;
                let letter = db.create_cover_letter(&user, &job, body.as_deref())?;
                let state = if letter.cover_letter.is_some() { "saved" } else { "pending" };
                println!("Cover letter {} {}.", letter.id, state);
            }

            LetterCommands::Set { id, text, file } => {
                let body = letter_body(text, file)?.ok_or_else(|| anyhow!("Provide --text or --file"))?;
                db.set_cover_letter_text(&id, &body)?;
                println!("Cover letter {} updated.", id);
            }

            LetterCommands::List { user } => {
                let letters = db.list_cover_letters(&user)?;
                if letters.is_empty() {
                    println!("No cover letters for '{}'.", user);
                } else {
                    println!("{:<36} {:<30} {:<8} {:<16}", "ID", "JOB", "STATE", "UPDATED");
                    println!("{}", "-".repeat(93));
                    for l in letters {
                        let title = db
                            .get_scraped_job(&l.job_id)?
                            .map(|j| j.title)
                            .unwrap_or_else(|| l.job_id.clone());
                        println!(
                            "{:<36} {:<30} {:<8} {:<16}",
                            l.id,
                            truncate(&title, 28),
                            if l.cover_letter.is_some() { "ready" } else { "pending" },
                            fmt_timestamp(&l.updated_at)
                        );
                    }
                }
            }

            LetterCommands::Show { id } => match db.get_cover_letter(&id)? {
                Some(l) => {
                    println!("Cover letter {}", l.id);
                    println!("User: {}", l.user_id);
                    println!("Job: {}", l.job_id);
                    println!("Updated: {}", fmt_timestamp(&l.updated_at));
                    match &l.cover_letter {
                        Some(text) => println!("\n{}", textwrap::fill(text, 80)),
                        None => println!("\n(pending)"),
                    }
                }
                None => println!("Cover letter {} not found.", id),
            },

            LetterCommands::Delete { id } => {
                db.delete_cover_letter(&id)?;
                println!("Deleted cover letter {}.", id);
            }
        },

        Commands::Interview { command } => match command {
            InterviewCommands::Start { user, job } => {
                let session = db.start_interview_session(&user, job.as_deref())?;
                println!("Started interview session {}", session.id);
            }

            InterviewCommands::Ask {
                session,
                question,
                question_type,
                feedback,
            } => {
                let qna = db.add_interview_qna(&session, &question, question_type, &feedback)?;
                println!("Added {} question {}", qna.question_type, qna.id);
            }

            InterviewCommands::Answer { qna, answer, feedback } => {
                let qna = db.answer_question(&qna, &answer, &feedback)?;
                println!("Answered question {}", qna.id);
            }

            InterviewCommands::Show { session } => {
                let s = db
                    .get_interview_session(&session)?
                    .ok_or_else(|| anyhow!("Interview session {} not found", session))?;
                println!("Session {}", s.id);
                println!("User: {}", s.user_id);
                if let Some(job_id) = &s.job_id {
                    match db.get_scraped_job(job_id)? {
                        Some(job) => println!("Job: {} at {}", job.title, job.company_name),
                        None => println!("Job: {}", job_id),
                    }
                }
                println!("Started: {}", fmt_timestamp(&s.created_at));

                let qna = db.list_qna(&s.id)?;
                if qna.is_empty() {
                    println!("\nNo questions yet.");
                }
                for (i, q) in qna.iter().enumerate() {
                    println!("\n{}. [{}] {}", i + 1, q.question_type, q.question);
                    println!("   id: {}", q.id);
                    match &q.answer {
                        Some(answer) => {
                            for line in textwrap::fill(answer, 74).lines() {
                                println!("   > {}", line);
                            }
                        }
                        None => println!("   (unanswered)"),
                    }
                    println!("   Feedback: {}", q.ai_feedback);
                }
            }

            InterviewCommands::List { user } => {
                let sessions = db.list_sessions(&user)?;
                if sessions.is_empty() {
                    println!("No interview sessions for '{}'.", user);
                } else {
                    println!("{:<36} {:>9} {:<16}", "ID", "QUESTIONS", "STARTED");
                    println!("{}", "-".repeat(63));
                    for s in sessions {
                        println!(
                            "{:<36} {:>9} {:<16}",
                            s.id,
                            db.list_qna(&s.id)?.len(),
                            fmt_timestamp(&s.created_at)
                        );
                    }
                }
            }

            InterviewCommands::Delete { session } => {
                db.delete_interview_session(&session)?;
                println!("Deleted interview session {}.", session);
            }
        },

        Commands::Shell => {
            let counts = db.table_counts()?;
            tui::run_shell(counts)?;
        }
    }

    Ok(())
}

fn print_table_def(t: &TableDef) {
    println!("{}", t.name);
    for c in t.columns {
        let mut flags = Vec::new();
        if c.primary_key {
            flags.push("primary key".to_string());
        }
        if c.not_null {
            flags.push("not null".to_string());
        }
        if c.unique {
            flags.push("unique".to_string());
        }
        match c.default {
            Some(DefaultValue::Now) => flags.push("default now()".to_string()),
            Some(DefaultValue::Bool(b)) => flags.push(format!("default {}", b)),
            Some(DefaultValue::Literal(v)) => flags.push(format!("default '{}'", v)),
            None => {}
        }
        if let Some(fk) = &c.references {
            let cascade = if fk.on_delete == OnDelete::Cascade { " on delete cascade" } else { "" };
            flags.push(format!("-> {}.{}{}", fk.table, fk.column, cascade));
        }
        let kind = match c.kind {
            ColumnKind::Enum(def) => format!("{} ({})", def.name, def.values.join("|")),
            other => other.label().to_string(),
        };
        println!("  {:<22} {:<30} {}", c.name, truncate(&kind, 30), flags.join(", "));
    }
    for idx in t.indexes {
        println!("  index {} ({})", idx.name, idx.columns.join(", "));
    }
    for r in schema::relations_of(t.name) {
        let arity = match r.cardinality {
            Cardinality::One => "one",
            Cardinality::Many => "many",
        };
        println!(
            "  {} -> {} {} ({} = {})",
            r.name,
            arity,
            r.target,
            r.fields.join(", "),
            r.references.join(", ")
        );
    }
    println!();
}

fn print_listing(l: &JobListing) {
    println!("Listing {}", l.id);
    println!("Title: {}", l.title);
    println!("Organization: {}", l.organization_id);
    println!("Status: {}{}", l.status, if l.is_featured { " (featured)" } else { "" });
    println!("Type: {}", l.listing_type);
    println!("Experience: {}", l.experience_level);
    println!("Location: {} ({})", listing_location(l), l.location_requirement);
    if let (Some(wage), Some(interval)) = (l.wage, l.wage_interval) {
        println!("Wage: ${} {}", wage, interval);
    }
    if let Some(posted) = &l.posted_at {
        println!("Posted: {}", fmt_timestamp(posted));
    }
    println!("Created: {}", fmt_timestamp(&l.created_at));
    println!("\n{}", textwrap::fill(&l.description, 80));
}

fn print_scraped_job(j: &ScrapedJob) {
    println!("Job {}", j.id);
    println!("Title: {}", j.title);
    println!("Company: {}", j.company_name);
    println!("Location: {} ({})", j.location, j.location_requirement);
    if let Some(level) = &j.experience_level {
        println!("Experience: {}", level);
    }
    if let Some(wage) = &j.wage {
        println!("Wage: {}", wage);
    }
    println!("Source: {} {}", j.source_site, j.source_url);
    if let Some(posted) = &j.posted_at {
        println!("Posted: {}", posted);
    }
    println!("Scraped: {}", fmt_timestamp(&j.scraped_at));
    println!("\n--- Description ---\n{}", textwrap::fill(&j.description, 80));
}

fn listing_location(l: &JobListing) -> String {
    match (&l.city, &l.state_abbreviation) {
        (Some(city), Some(state)) => format!("{}, {}", city, state),
        (Some(city), None) => city.clone(),
        (None, Some(state)) => state.clone(),
        (None, None) => "-".to_string(),
    }
}

fn letter_body(text: Option<String>, file: Option<PathBuf>) -> Result<Option<String>> {
    match (text, file) {
        (Some(text), _) => Ok(Some(text)),
        (None, Some(path)) => std::fs::read_to_string(&path)
            .map(Some)
            .with_context(|| format!("Failed to read cover letter file: {}", path.display())),
        (None, None) => Ok(None),
    }
}

/// Local time for stored RFC 3339 timestamps; unparseable values pass through.
fn fmt_timestamp(ts: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(ts)
        .map(|dt| dt.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| ts.to_string())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
