//! gridcal CLI - weekly timetable spreadsheets to calendar feeds
//!
//! A command-line tool for turning XLSX timetables into iCalendar feeds,
//! HTML listings, plain text agendas and JSON.

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use colored::*;
use gridcal::render::{JsonFormat, RenderOptions};
use gridcal::{RetentionWindow, Schedule, ScheduleOptions, SheetOutcome, WeekdayLocale};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

/// Weekly timetable spreadsheets to calendar feeds
#[derive(Parser)]
#[command(
    name = "gridcal",
    version,
    about = "Turn weekly timetable spreadsheets into calendar events",
    long_about = "gridcal - finds the time grid in free-form weekly timetable workbooks.\n\n\
                  Converts XLSX timetables to iCalendar feeds, HTML listings, text or JSON."
)]
struct Cli {
    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write an iCalendar feed
    #[command(visible_alias = "ical")]
    Ics {
        #[command(flatten)]
        schedule: ScheduleArgs,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Calendar name shown to subscribers
        #[arg(long)]
        calendar_name: Option<String>,
    },

    /// Write an HTML listing page
    Html {
        #[command(flatten)]
        schedule: ScheduleArgs,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Page title
        #[arg(long)]
        title: Option<String>,

        /// Line shown under the title
        #[arg(long)]
        subtitle: Option<String>,

        /// Link to the calendar feed
        #[arg(long)]
        feed_link: Option<String>,
    },

    /// Print a plain text agenda
    Text {
        #[command(flatten)]
        schedule: ScheduleArgs,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write events and the per-sheet report as JSON
    Json {
        #[command(flatten)]
        schedule: ScheduleArgs,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output compact JSON (no indentation)
        #[arg(long)]
        compact: bool,

        /// Only the event list, without the sheet report
        #[arg(long)]
        events_only: bool,
    },

    /// Show which worksheets were recognized
    Info {
        #[command(flatten)]
        schedule: ScheduleArgs,
    },

    /// Show version information
    Version,
}

/// Input and extraction settings shared by all commands.
#[derive(Args)]
struct ScheduleArgs {
    /// Input workbook (.xlsx)
    input: PathBuf,

    /// JSON file with extraction options
    #[arg(long)]
    config: Option<PathBuf>,

    /// IANA time zone of the printed times, e.g. Europe/Vienna
    #[arg(long)]
    tz: Option<String>,

    /// Language of the weekday headers (de, en)
    #[arg(long)]
    locale: Option<String>,

    /// Keep events that ended up to this many days ago
    #[arg(long)]
    past_days: Option<i64>,

    /// Keep events that start up to this many days ahead
    #[arg(long)]
    future_days: Option<i64>,

    /// Reference time for the window (RFC 3339, default: now)
    #[arg(long, value_parser = parse_now)]
    now: Option<DateTime<Utc>>,

    /// Keep all events regardless of date
    #[arg(long, conflicts_with_all = ["past_days", "future_days"])]
    no_window: bool,
}

impl ScheduleArgs {
    /// Options from the config file (if any) with flags applied on top.
    fn options(&self) -> Result<ScheduleOptions, Box<dyn std::error::Error>> {
        let mut options = match self.config {
            Some(ref path) => ScheduleOptions::from_json(&fs::read_to_string(path)?)?,
            None => ScheduleOptions::default(),
        };

        if let Some(ref tz) = self.tz {
            options = options.with_timezone_name(tz)?;
        }
        if let Some(ref locale) = self.locale {
            options = options.with_locale(WeekdayLocale::from_name(locale)?);
        }

        if self.no_window {
            options = options.without_retention();
        } else if self.past_days.is_some() || self.future_days.is_some() {
            let base = options.retention.unwrap_or_default();
            options = options.with_retention(RetentionWindow::new(
                self.past_days.unwrap_or(base.past_days),
                self.future_days.unwrap_or(base.future_days),
            ));
        }

        options.validate()?;
        Ok(options)
    }

    fn load(&self, pb: &ProgressBar) -> Result<(Schedule, ScheduleOptions), Box<dyn std::error::Error>> {
        let options = self.options()?;
        pb.set_message("Parsing workbook...");
        let now = self.now.unwrap_or_else(Utc::now);
        let schedule = gridcal::parse_file_at(&self.input, &options, now)?;
        Ok((schedule, options))
    }
}

fn parse_now(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp: {}", e))
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Ics {
            schedule,
            output,
            calendar_name,
        } => {
            let pb = create_spinner("Reading options...");
            let (parsed, options) = schedule.load(&pb)?;
            pb.set_message("Rendering calendar...");

            let mut render = RenderOptions::for_locale(&options.locale);
            if let Some(name) = calendar_name {
                render = render.with_calendar_name(name);
            }
            let ics = gridcal::render::to_ics(&parsed.events, &render)?;

            pb.finish_and_clear();
            write_output(output.as_ref(), &ics)?;
            report_written(output.as_ref(), "calendar", parsed.events.len());
        }

        Commands::Html {
            schedule,
            output,
            title,
            subtitle,
            feed_link,
        } => {
            let pb = create_spinner("Reading options...");
            let (parsed, options) = schedule.load(&pb)?;
            pb.set_message("Rendering listing...");

            let mut render = RenderOptions::for_locale(&options.locale);
            if let Some(title) = title {
                render = render.with_page_title(title);
            }
            if let Some(subtitle) = subtitle {
                render = render.with_subtitle(subtitle);
            }
            if let Some(href) = feed_link {
                render = render.with_feed_link(href);
            }
            let html = gridcal::render::to_html(&parsed.events, &render)?;

            pb.finish_and_clear();
            write_output(output.as_ref(), &html)?;
            report_written(output.as_ref(), "listing", parsed.events.len());
        }

        Commands::Text { schedule, output } => {
            let pb = create_spinner("Reading options...");
            let (parsed, options) = schedule.load(&pb)?;

            let render = RenderOptions::for_locale(&options.locale);
            let text = gridcal::render::to_text(&parsed.events, &render)?;

            pb.finish_and_clear();
            write_output(output.as_ref(), &text)?;
            report_written(output.as_ref(), "agenda", parsed.events.len());
        }

        Commands::Json {
            schedule,
            output,
            compact,
            events_only,
        } => {
            let pb = create_spinner("Reading options...");
            let (parsed, _) = schedule.load(&pb)?;
            pb.set_message("Rendering to JSON...");

            let format = if compact {
                JsonFormat::Compact
            } else {
                JsonFormat::Pretty
            };
            let json = if events_only {
                gridcal::render::to_json(&parsed.events, format)?
            } else {
                gridcal::render::to_json(&parsed, format)?
            };

            pb.finish_and_clear();
            write_output(output.as_ref(), &json)?;
            report_written(output.as_ref(), "JSON", parsed.events.len());
        }

        Commands::Info { schedule } => {
            let pb = create_spinner("Analyzing workbook...");
            let (parsed, options) = schedule.load(&pb)?;
            pb.finish_and_clear();

            print_info(&schedule, &parsed, &options);
        }

        Commands::Version => {
            print_version();
        }
    }

    Ok(())
}

fn print_info(args: &ScheduleArgs, schedule: &Schedule, options: &ScheduleOptions) {
    println!("{}", "Workbook Information".cyan().bold());
    println!("{}", "─".repeat(40));
    println!(
        "{}: {}",
        "File".bold(),
        args.input.file_name().unwrap_or_default().to_string_lossy()
    );
    println!("{}: {}", "Time zone".bold(), options.timezone);
    println!("{}: {}", "Week sheets".bold(), schedule.sheets.len());
    match options.retention {
        Some(window) => println!(
            "{}: -{}d / +{}d",
            "Window".bold(),
            window.past_days,
            window.future_days
        ),
        None => println!("{}: none", "Window".bold()),
    }

    println!("\n{}", "Worksheets".cyan().bold());
    println!("{}", "─".repeat(40));
    for sheet in &schedule.sheets {
        match &sheet.outcome {
            SheetOutcome::Extracted { events, anchors } => println!(
                "{} {} (week {}): {} events, {} days, grid from row {}",
                "✓".green().bold(),
                sheet.name,
                sheet.week,
                events,
                anchors.day_columns.len(),
                anchors.grid_start_row + 1
            ),
            SheetOutcome::Skipped { reason } => println!(
                "{} {} (week {}): skipped, {}",
                "!".yellow().bold(),
                sheet.name,
                sheet.week,
                reason
            ),
        }
    }

    println!("\n{}", "Events".cyan().bold());
    println!("{}", "─".repeat(40));
    println!("{}: {}", "Total".bold(), schedule.events.len());
    if let (Some(first), Some(last)) = (schedule.events.first(), schedule.events.last()) {
        println!("{}: {}", "First".bold(), first.start.format("%Y-%m-%d %H:%M"));
        println!("{}: {}", "Last".bold(), last.start.format("%Y-%m-%d %H:%M"));
    }
}

fn report_written(path: Option<&PathBuf>, what: &str, count: usize) {
    if let Some(path) = path {
        println!(
            "{} Wrote {} with {} events: {}",
            "✓".green().bold(),
            what,
            count,
            path.display()
        );
    }
}

fn print_version() {
    println!("{} {}", "gridcal".green().bold(), env!("CARGO_PKG_VERSION"));
    println!("Weekly timetable spreadsheets to calendar events");
    println!();
    println!("Input: XLSX workbooks with one worksheet per week");
    println!("Output: iCalendar, HTML, text, JSON");
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
        .template("{spinner:.blue} {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn write_output(path: Option<&PathBuf>, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            write!(handle, "{}", content)?;
        }
    }
    Ok(())
}
