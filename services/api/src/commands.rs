use crate::infra::{load_collection, load_preferences};
use chrono::{Local, NaiveDate};
use clap::{Args, ValueEnum};
use dram_planner::config::AppConfig;
use dram_planner::error::AppError;
use dram_planner::workflows::tasting::export::{self, export_rows};
use dram_planner::workflows::tasting::{
    GenerationRequest, Item, Schedule, ScheduleGenerator, ScheduleLength, SchedulePreview,
    ScheduleSummary,
};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Json,
    Csv,
}

#[derive(Args, Debug)]
pub(crate) struct ScheduleArgs {
    /// Collection file in the collection manager's JSON format
    #[arg(long)]
    pub(crate) collection: PathBuf,
    /// Preference document with a `user_preferences` section (defaults apply when omitted)
    #[arg(long)]
    pub(crate) preferences: Option<PathBuf>,
    /// First eligible tasting date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) start_date: Option<NaiveDate>,
    /// Number of tastings to schedule, overriding the preferences
    #[arg(long, conflicts_with = "until")]
    pub(crate) weeks: Option<usize>,
    /// Last allowed tasting date (YYYY-MM-DD), overriding the preferences
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) until: Option<NaiveDate>,
    /// Seed for reproducible selection
    #[arg(long)]
    pub(crate) seed: Option<u64>,
}

impl ScheduleArgs {
    fn request(&self, today: NaiveDate) -> Result<GenerationRequest, AppError> {
        let mut request = GenerationRequest::starting(self.start_date.unwrap_or(today));
        match (self.weeks, self.until) {
            (Some(0), _) => {
                return Err(AppError::Input("--weeks must be at least 1".to_string()));
            }
            (Some(weeks), _) => request = request.with_length(ScheduleLength::Count(weeks)),
            (None, Some(until)) => request = request.with_length(ScheduleLength::Until(until)),
            (None, None) => {}
        }
        if let Some(seed) = self.seed {
            request = request.with_seed(seed);
        }
        Ok(request)
    }
}

#[derive(Args, Debug)]
pub(crate) struct GenerateArgs {
    #[command(flatten)]
    pub(crate) schedule: ScheduleArgs,
    /// Write the schedule here instead of stdout
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub(crate) format: OutputFormat,
}

#[derive(Args, Debug)]
pub(crate) struct PreviewArgs {
    #[command(flatten)]
    pub(crate) schedule: ScheduleArgs,
    /// Number of upcoming tastings to list
    #[arg(long, default_value_t = 10)]
    pub(crate) rows: usize,
}

pub(crate) fn run_generate(args: GenerateArgs) -> Result<(), AppError> {
    let today = Local::now().date_naive();
    let (items, preview) = run_pipeline(&args.schedule, today)?;

    let rendered = match args.format {
        OutputFormat::Json => export::to_json(&preview.schedule, &items, today)?,
        OutputFormat::Csv => {
            let mut buffer = Vec::new();
            export::write_csv(&preview.schedule, &items, &mut buffer)?;
            String::from_utf8_lossy(&buffer).into_owned()
        }
    };

    match args.output {
        Some(path) => {
            std::fs::write(&path, rendered)?;
            println!(
                "Saved {} tastings to {} (seed {})",
                preview.schedule.len(),
                path.display(),
                preview.seed
            );
        }
        None => println!("{rendered}"),
    }
    for warning in preview.warnings() {
        eprintln!("warning: {warning}");
    }
    Ok(())
}

pub(crate) fn run_preview(args: PreviewArgs) -> Result<(), AppError> {
    let today = Local::now().date_naive();
    let (items, preview) = run_pipeline(&args.schedule, today)?;
    render_preview(&preview, &items, args.rows);
    Ok(())
}

fn run_pipeline(
    args: &ScheduleArgs,
    today: NaiveDate,
) -> Result<(Vec<Item>, SchedulePreview), AppError> {
    let items = load_collection(&args.collection)?;
    let preferences = load_preferences(args.preferences.as_deref())?;
    let request = args.request(today)?;
    let timeout = AppConfig::load()?.planner.generation_timeout;
    let preview = ScheduleGenerator::new(&preferences)
        .with_timeout(timeout)
        .preview(&items, &request)?;
    Ok((items, preview))
}

fn render_preview(preview: &SchedulePreview, items: &[Item], rows: usize) {
    render_summary(&preview.summary, preview.seed);

    println!("\nUpcoming tastings");
    let head = Schedule::from_items(preview.head(rows).to_vec());
    for row in export_rows(&head, items) {
        let marker = if row.is_repeat { " (repeat)" } else { "" };
        let abv = row
            .abv
            .map(|abv| format!("{abv:.1}%"))
            .unwrap_or_else(|| "n/a".to_string());
        println!(
            "  Week {:>3} | {} | {} [{}] {}{}",
            row.week, row.date, row.bottle_name, row.category, abv, marker
        );
    }
    if preview.schedule.len() > rows {
        println!("  ... {} more", preview.schedule.len() - rows);
    }

    let warnings = preview.warnings();
    if !warnings.is_empty() {
        println!("\nRelaxations");
        for warning in warnings {
            println!("  - {warning}");
        }
    }
}

fn render_summary(summary: &ScheduleSummary, seed: u64) {
    println!("Tasting schedule summary (seed {seed})");
    println!("- Total tastings: {}", summary.total);
    if let (Some(first), Some(last)) = (summary.first_date, summary.last_date) {
        println!("- Date range: {first} to {last}");
    }
    println!(
        "- New bottles: {} | repeats: {}",
        summary.new_tastings, summary.repeat_tastings
    );
    println!("Category breakdown:");
    for entry in &summary.categories {
        println!("  - {}: {}", entry.category, entry.count);
    }
}
