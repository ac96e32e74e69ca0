//! `calsync` CLI: merge two .ics calendars and report overlapping events.
//!
//! ## Usage
//!
//! ```sh
//! # Merge work.ics into personal.ics, skipping events we synced the other way
//! calsync sync --source work.ics --destination personal.ics --output merged.ics \
//!     --filter-prefix "ATP:" --add-prefix "[Work] " --check-conflicts
//!
//! # Apply filter/prefix rules to a single file
//! calsync filter --input work.ics --output filtered.ics --filter-prefix "ATP:"
//!
//! # List overlapping events in the next 10 days
//! calsync check-conflicts --file1 work.ics --file2 personal.ics --days 10
//!
//! # Same, as JSON, anchored at a fixed instant
//! calsync check-conflicts --file1 a.ics --file2 b.ics --from 2026-03-01T00:00:00Z --json
//! ```
//!
//! Logs go to stderr and follow `RUST_LOG` (default `warn`, `-v` for `debug`).

use anyhow::{Context, Result};
use calsync_core::{
    detect_conflicts, reconcile, read_document, CalendarDocument, Conflict, EventSet,
    ExtractOptions, ReconcileOptions, ReconcileOutcome, TimeWindow,
};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(
    name = "calsync",
    version,
    about = "Merge two .ics calendars and report overlapping events"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge a source calendar into a destination calendar
    Sync {
        /// Calendar to read events from
        #[arg(short, long)]
        source: String,
        /// Calendar to merge into (not modified)
        #[arg(short, long)]
        destination: String,
        /// Where to write the merged calendar
        #[arg(short, long)]
        output: String,
        #[command(flatten)]
        titles: TitleArgs,
        /// Keep the destination version of rescheduled events and report them
        #[arg(long)]
        check_conflicts: bool,
    },
    /// Apply filter/prefix rules to a single calendar
    Filter {
        #[arg(short, long)]
        input: String,
        #[arg(short, long)]
        output: String,
        #[command(flatten)]
        titles: TitleArgs,
    },
    /// List overlapping events between two calendars
    CheckConflicts {
        #[arg(long)]
        file1: String,
        #[arg(long)]
        file2: String,
        /// Number of days ahead to check
        #[arg(long, default_value_t = 7)]
        days: u32,
        /// Start of the window (RFC 3339); defaults to now
        #[arg(long)]
        from: Option<DateTime<Utc>>,
        /// Print conflicts as a JSON array
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::Args)]
struct TitleArgs {
    /// Skip source events whose title starts with this (exact, case-sensitive)
    #[arg(long)]
    filter_prefix: Option<String>,
    /// Prefix added to the title of newly inserted events
    #[arg(long)]
    add_prefix: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.command {
        Commands::Sync {
            source,
            destination,
            output,
            titles,
            check_conflicts,
        } => {
            let source_doc = read_calendar(&source)?;
            let destination_doc = read_calendar(&destination)?;
            let options = reconcile_options(titles, check_conflicts);

            let outcome = reconcile_documents(&source_doc, &destination_doc, &options)?;
            let mut merged =
                CalendarDocument::new(Vec::new(), destination_doc.components.clone());
            merged.merge_timezones(&source_doc);
            write_merged(merged, &outcome, &output)?;

            println!("Synced {} into {} -> {}", source, destination, output);
            print_summary(&outcome);
        }
        Commands::Filter {
            input,
            output,
            titles,
        } => {
            let input_doc = read_calendar(&input)?;
            let options = reconcile_options(titles, false);

            let outcome =
                reconcile_documents(&input_doc, &CalendarDocument::default(), &options)?;
            let merged = CalendarDocument::new(Vec::new(), input_doc.components.clone());
            write_merged(merged, &outcome, &output)?;

            println!("Filtered {} -> {}", input, output);
            print_summary(&outcome);
        }
        Commands::CheckConflicts {
            file1,
            file2,
            days,
            from,
            json,
        } => {
            let window = TimeWindow::days_ahead(from.unwrap_or_else(Utc::now), days);
            let options = ExtractOptions::within(window);
            let events_a = read_document(&file1, &options)
                .with_context(|| format!("Failed to load calendar: {}", file1))?
                .events;
            let events_b = read_document(&file2, &options)
                .with_context(|| format!("Failed to load calendar: {}", file2))?
                .events;

            let conflicts = detect_conflicts(&events_a, &events_b);
            if json {
                println!("{}", serde_json::to_string_pretty(&conflicts)?);
            } else {
                print_conflicts(&file1, &file2, days, &conflicts);
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) -> Result<()> {
    let default = if verbose { "debug" } else { "warn" };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("Failed to set up logging")?;
    Ok(())
}

fn read_calendar(path: &str) -> Result<CalendarDocument> {
    read_document(path, &ExtractOptions::default())
        .with_context(|| format!("Failed to load calendar: {}", path))
}

fn reconcile_options(titles: TitleArgs, check_conflicts: bool) -> ReconcileOptions {
    ReconcileOptions {
        filter_prefix: titles.filter_prefix,
        add_prefix: titles.add_prefix,
        check_conflicts,
    }
}

fn reconcile_documents(
    source: &CalendarDocument,
    destination: &CalendarDocument,
    options: &ReconcileOptions,
) -> Result<ReconcileOutcome> {
    let source = EventSet::from_events(source.events.iter().cloned())
        .context("Source calendar is not a valid event collection")?;
    let destination = EventSet::from_events(destination.events.iter().cloned())
        .context("Destination calendar is not a valid event collection")?;
    Ok(reconcile(&source, &destination, options))
}

fn write_merged(
    mut document: CalendarDocument,
    outcome: &ReconcileOutcome,
    output: &str,
) -> Result<()> {
    document.events = outcome.events.as_slice().to_vec();
    document
        .write_file(output)
        .with_context(|| format!("Failed to write file: {}", output))
}

fn print_summary(outcome: &ReconcileOutcome) {
    let summary = outcome.summary();
    println!(
        "{} events written: {} inserted, {} replaced, {} kept, {} removed, {} filtered",
        outcome.events.len(),
        summary.inserted,
        summary.replaced,
        summary.kept,
        summary.removed,
        summary.filtered
    );
    for warning in &outcome.warnings {
        println!("Conflict: {}", warning);
    }
}

fn print_conflicts(file1: &str, file2: &str, days: u32, conflicts: &[Conflict]) {
    println!(
        "Checking conflicts between {} and {} for the next {} days",
        file1, file2, days
    );
    if conflicts.is_empty() {
        println!("No conflicts found.");
        return;
    }
    println!("Found {} conflicts:", conflicts.len());
    for conflict in conflicts {
        let (a, b) = (&conflict.event_a, &conflict.event_b);
        println!(
            "- {} '{}' ({} - {}) overlaps {} '{}' ({} - {}) by {} min",
            a.uid,
            a.title,
            a.start,
            a.end,
            b.uid,
            b.title,
            b.start,
            b.end,
            conflict.overlap_minutes
        );
    }
}
