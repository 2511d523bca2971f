use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use dish_sheet_extract::{
    Category, CategoryRange, CategoryTable, CleaningRules, DictionarySegmenter, ExtractOptions,
    ExtractionReport, GridPages, GridSource, ImagePathOptions, LabelKind, OutputFormat, PageRange,
    PdfGridSource, Profile, Segmenter, extract_to_file,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "dish2json",
    version,
    about = "Rebuild dish records from watermarked recipe-sheet tables"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract dish records and write them as JSON or CSV.
    Extract(ExtractArgs),
}

#[derive(Debug, Args)]
struct ExtractArgs {
    /// Input PDF, or a grids JSON file with --grids.
    #[arg(short, long)]
    input: PathBuf,

    /// Output path.
    #[arg(short, long)]
    output: PathBuf,

    /// Treat the input as pre-extracted grids: [{"page": n, "rows": [[...]]}].
    #[arg(long)]
    grids: bool,

    /// Scan range like 14-210 or 14-.
    #[arg(long, default_value = "14-210")]
    pages: String,

    /// Category range in format start-end:display:machine. Repeatable;
    /// replaces the built-in table.
    #[arg(long = "category")]
    categories: Vec<String>,

    /// Category for pages outside every range, as display:machine.
    #[arg(long, default_value = "其他:other")]
    default_category: String,

    /// Directory prefix of generated image paths.
    #[arg(long, default_value = "./images")]
    image_dir: String,

    /// Extension of generated image paths.
    #[arg(long, default_value = "png")]
    image_ext: String,

    /// Name image files after the display label instead of the machine label.
    #[arg(long)]
    display_label_paths: bool,

    /// JSON file overriding the watermark, whitelist and label sets.
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Word list for dictionary segmentation, one word per line.
    #[arg(long)]
    dict: Option<PathBuf>,

    /// Use the first-generation cleaning rules.
    #[arg(long)]
    legacy: bool,

    /// Output format: json or csv.
    #[arg(long, default_value = "json")]
    format: String,

    /// Log every accepted record and list warnings.
    #[arg(short, long)]
    verbose: bool,
}

fn parse_categories(args: &ExtractArgs) -> Result<CategoryTable> {
    let default = Category::from_str(&args.default_category)
        .map_err(|error| anyhow!("invalid default category: {error}"))
        .context("failed to parse --default-category")?;

    if args.categories.is_empty() {
        let builtin = CategoryTable::default();
        return Ok(CategoryTable::new(builtin.ranges().to_vec(), default));
    }

    let ranges = args
        .categories
        .iter()
        .map(|value| {
            CategoryRange::from_str(value)
                .map_err(|error| anyhow!("invalid category range: {error}"))
                .with_context(|| format!("failed to parse --category '{value}'"))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(CategoryTable::new(ranges, default))
}

fn parse_options(args: &ExtractArgs) -> Result<ExtractOptions> {
    let pages = PageRange::from_str(&args.pages)
        .map_err(|error| anyhow!("invalid page range: {error}"))
        .context("failed to parse --pages")?;
    let format = OutputFormat::from_str(&args.format)
        .map_err(|error| anyhow!(error))
        .context("failed to parse --format")?;

    Ok(ExtractOptions {
        pages,
        categories: parse_categories(args)?,
        image_paths: ImagePathOptions {
            base_dir: args.image_dir.clone(),
            extension: args.image_ext.clone(),
            label: if args.display_label_paths {
                LabelKind::Display
            } else {
                LabelKind::Machine
            },
        },
        profile: if args.legacy {
            Profile::Legacy
        } else {
            Profile::Refined
        },
        format,
    })
}

fn load_segmenter(args: &ExtractArgs) -> Result<Box<dyn Segmenter>> {
    if let Some(path) = &args.dict {
        let segmenter = DictionarySegmenter::from_path(path)
            .with_context(|| format!("failed to read dictionary '{}'", path.display()))?;
        if segmenter.is_empty() {
            anyhow::bail!("dictionary '{}' has no multi-character words", path.display());
        }
        return Ok(Box::new(segmenter));
    }
    default_segmenter()
}

#[cfg(feature = "jieba")]
fn default_segmenter() -> Result<Box<dyn Segmenter>> {
    Ok(Box::new(dish_sheet_extract::JiebaSegmenter::new()))
}

#[cfg(not(feature = "jieba"))]
fn default_segmenter() -> Result<Box<dyn Segmenter>> {
    anyhow::bail!("built without the jieba feature; pass --dict <word list>")
}

fn load_source(args: &ExtractArgs) -> Result<Box<dyn GridSource>> {
    if args.grids {
        let pages = GridPages::from_json_path(&args.input)
            .with_context(|| format!("failed to read grids from '{}'", args.input.display()))?;
        return Ok(Box::new(pages));
    }
    let pdf = PdfGridSource::open(&args.input)
        .with_context(|| format!("failed to read PDF '{}'", args.input.display()))?;
    Ok(Box::new(pdf))
}

fn log_report(report: &ExtractionReport, verbose: bool) {
    eprintln!(
        "{} record(s) written, {} table(s) dropped of {}",
        report.accepted, report.dropped, report.table_count
    );
    if report.warnings.is_empty() {
        return;
    }

    eprintln!("warning: {} issue(s) detected", report.warnings.len());
    if verbose {
        for warning in &report.warnings {
            eprintln!(
                "  - {:?} page={:?} table={:?}: {}",
                warning.code, warning.page, warning.table_index, warning.message
            );
        }
    }
}

fn run_extract(args: &ExtractArgs) -> Result<ExtractionReport> {
    let options = parse_options(args)?;
    let rules = match &args.rules {
        Some(path) => CleaningRules::from_json_path(path)
            .with_context(|| format!("failed to load rules '{}'", path.display()))?,
        None => CleaningRules::default(),
    };
    let segmenter = load_segmenter(args)?;
    let source = load_source(args)?;

    extract_to_file(
        source.as_ref(),
        &args.output,
        &options,
        &rules,
        segmenter.as_ref(),
    )
    .with_context(|| format!("failed to extract dishes from '{}'", args.input.display()))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let Commands::Extract(args) = cli.command;

    let default_level = if args.verbose { "info" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("dish_sheet_extract={default_level}")));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    match run_extract(&args) {
        Ok(report) => {
            log_report(&report, args.verbose);
            if report.accepted > 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        }
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(1)
        }
    }
}
