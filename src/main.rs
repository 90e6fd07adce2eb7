use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use shelfclean::language::LinguaDetector;
use shelfclean::pipeline::PipelineConfig;
use shelfclean::source;
use shelfclean::stats::NormalizeStats;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "shelfclean")]
#[command(about = "Normalize raw book-catalog dumps into clean relational tables")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize raw dumps into per-genre CSV tables
    Normalize(NormalizeArgs),
    /// Merge per-genre CSV tables into one file per table
    MergeTables(MergeTablesArgs),
}

#[derive(Args)]
struct NormalizeArgs {
    /// Directory containing books.csv, authors.csv and tags.csv (each optionally .bz2)
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory for clean tables
    #[arg(short, long)]
    output: PathBuf,

    /// Tag category to exclude; repeat to build the list (replaces the default denylist)
    #[arg(long = "exclude-tag-category", value_name = "LABEL")]
    exclude_tag_category: Vec<String>,

    /// Only process this genre; repeatable (default: every genre)
    #[arg(long, value_name = "GENRE")]
    category: Vec<String>,

    /// Dry run - don't write output files
    #[arg(long)]
    dry_run: bool,

    /// Clear existing outputs before starting
    #[arg(long)]
    clean: bool,
}

#[derive(Args)]
struct MergeTablesArgs {
    /// Output directory containing per-genre tables (e.g., books/science.csv)
    #[arg(short, long)]
    output: PathBuf,
}

fn clean_output(output: &Path) -> Result<()> {
    if output.exists() {
        info!("Cleaning output directory: {}", output.display());
        fs::remove_dir_all(output).with_context(|| {
            format!("Failed to clean output directory: {}", output.display())
        })?;
    }
    Ok(())
}

fn run_normalize(args: NormalizeArgs) -> Result<()> {
    let config = PipelineConfig {
        input_dir: args.input,
        output_dir: args.output,
        excluded_tag_categories: args.exclude_tag_category,
        categories: args.category,
        dry_run: args.dry_run,
        clean: args.clean,
    };

    if config.clean && !config.dry_run {
        clean_output(&config.output_dir)?;
    }

    let denylist = config.tag_denylist();
    info!(
        denylist = ?denylist.labels().collect::<Vec<_>>(),
        "Tag categories excluded"
    );

    let start_reading = Instant::now();
    let catalog = source::read_catalog(&config.input_dir, &config.category_filter())?;
    let reading_duration = start_reading.elapsed();
    info!(
        duration_secs = reading_duration.as_secs_f64(),
        "Reading complete"
    );

    info!("Building language detector");
    let detector = LinguaDetector::new();

    info!("Starting normalization pass");
    let start_normalizing = Instant::now();
    let stats = NormalizeStats::new();
    let clean = shelfclean::pipeline::run_pipeline(&catalog, &detector, &denylist, &stats);
    let normalizing_duration = start_normalizing.elapsed();
    info!(
        duration_secs = normalizing_duration.as_secs_f64(),
        "Normalization complete"
    );

    let start_writing = Instant::now();
    let exported = if config.dry_run {
        info!("Dry run, skipping table export");
        None
    } else {
        Some(shelfclean::export::write_catalog(&clean, &config.output_dir)?)
    };
    let writing_duration = start_writing.elapsed();

    println!();
    println!("=== Summary ===");
    println!("Reading time:        {:.2}s", reading_duration.as_secs_f64());
    println!(
        "Normalization time:  {:.2}s",
        normalizing_duration.as_secs_f64()
    );
    println!("Writing time:        {:.2}s", writing_duration.as_secs_f64());
    println!();
    println!("Genres processed:    {}", stats.categories());
    println!("Parse failures:      {}", stats.parse_failures());
    println!("Malformed records:   {}", stats.malformed_records());
    println!("Books seen:          {}", stats.books_seen());
    println!("Empty titles:        {}", stats.empty_titles());
    println!("Numeric titles:      {}", stats.numeric_titles());
    println!("Non-Latin titles:    {}", stats.non_latin_titles());
    println!("Non-English titles:  {}", stats.non_english_titles());
    println!("Titles rejected:     {}", stats.titles_rejected());
    println!("Duplicate books:     {}", stats.duplicate_books());
    println!("Books retained:      {}", stats.books_retained());
    println!("Series links:        {}", stats.series_links());
    println!("Authors seen:        {}", stats.authors_seen());
    println!("Duplicate authors:   {}", stats.duplicate_authors());
    println!("Orphan authors:      {}", stats.orphan_authors());
    println!("Authors retained:    {}", stats.authors_retained());
    println!("Tags seen:           {}", stats.tags_seen());
    println!("Tags excluded:       {}", stats.tags_excluded());
    if let Some(summary) = exported {
        println!("Files written:       {}", summary.files);
        println!("Rows written:        {}", summary.rows);
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ExitCode::FAILURE;
    }

    let result = match cli.command {
        Commands::Normalize(args) => run_normalize(args),
        Commands::MergeTables(args) => shelfclean::merge::merge_tables(&args.output),
    };

    match result {
        Ok(()) => {
            info!("Completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
