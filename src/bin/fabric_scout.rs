use std::process::ExitCode;

use clap::{Args, CommandFactory, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use fabric_scout::app::{App, ReportOptions};
use fabric_scout::client::HttpCatalogClient;
use fabric_scout::config::ConfigLoader;
use fabric_scout::error::ScoutError;
use fabric_scout::output::{JsonOutput, OutputMode, TextOutput};
use fabric_scout::report::{ReportFilter, ReportFormat};

#[derive(Parser)]
#[command(name = "fabric-scout")]
#[command(about = "Crawl a fashion catalog and report on fabric composition")]
#[command(version)]
struct Cli {
    /// Config file (defaults to fabric-scout.json when present)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Crawl a listing into the store")]
    Generate(GenerateArgs),
    #[command(about = "Crawl a listing and print the articles found")]
    ListArticles(ListArticlesArgs),
    #[command(about = "Print the material info of one article page")]
    ArticleInfo(UrlArgs),
    #[command(about = "Fetch article pages and record their materials")]
    Collect(CollectArgs),
    #[command(about = "Download article images and use the local copies")]
    LocalizeMedia,
    #[command(about = "Count materials over enriched articles")]
    ListMaterials,
    #[command(about = "Count patterns over enriched articles")]
    ListPatterns,
    #[command(about = "Render a grouped report from the store")]
    Report(ReportArgs),
    #[command(about = "Show the embedded JSON blocks of a page")]
    Debug(DebugArgs),
}

#[derive(Args)]
struct GenerateArgs {
    url: String,

    /// Enrich new articles right away
    #[arg(long)]
    collect: bool,
}

#[derive(Args)]
struct ListArticlesArgs {
    url: String,

    #[arg(long)]
    print: bool,
}

#[derive(Args)]
struct UrlArgs {
    url: String,
}

#[derive(Args)]
struct CollectArgs {
    /// Re-enrich every article, not only new ones
    #[arg(long)]
    force: bool,
}

#[derive(Args)]
struct ReportArgs {
    /// Keep articles with this pattern (case-insensitive)
    #[arg(long)]
    pattern: Option<String>,

    /// Keep articles containing this material and group by its share
    #[arg(long)]
    material: Option<String>,

    /// Group by a different material than the filter
    #[arg(long)]
    group_by: Option<String>,

    #[arg(long, value_enum, default_value = "text")]
    format: ReportFormat,

    /// Write to a file instead of stdout
    #[arg(long)]
    output: Option<String>,
}

#[derive(Args)]
struct DebugArgs {
    url: String,

    /// Write each block to dump-<id>.json
    #[arg(long)]
    dump: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<ScoutError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &ScoutError) -> u8 {
    match error {
        ScoutError::StoreNotFound(_) | ScoutError::ConfigRead(_) => 2,
        ScoutError::Transport(_) | ScoutError::HttpStatus { .. } => 3,
        ScoutError::CorruptStore(_) => 4,
        ScoutError::MissingGroupAttribute { .. } | ScoutError::InvalidPercentage(_) => 5,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        Cli::command().print_help().into_diagnostic()?;
        return Ok(());
    };

    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    };
    let config = ConfigLoader::resolve(cli.config.as_deref())?;
    let client = HttpCatalogClient::new(&config)?;
    let app = App::new(config, client);

    run_command(command, &app, output_mode)
}

fn run_command(
    command: Commands,
    app: &App<HttpCatalogClient>,
    output_mode: OutputMode,
) -> miette::Result<()> {
    match command {
        Commands::Generate(args) => {
            let result = app.generate(&args.url, args.collect)?;
            match output_mode {
                OutputMode::Json => JsonOutput::print_generate(&result).into_diagnostic()?,
                OutputMode::Text => TextOutput::print_generate(&result),
            }
        }
        Commands::ListArticles(args) => {
            let result = app.list_articles(&args.url)?;
            match output_mode {
                OutputMode::Json => JsonOutput::print_list(&result).into_diagnostic()?,
                OutputMode::Text => TextOutput::print_list(&result, args.print),
            }
        }
        Commands::ArticleInfo(args) => {
            let info = app.article_info(&args.url)?;
            match output_mode {
                OutputMode::Json => JsonOutput::print_info(&info).into_diagnostic()?,
                OutputMode::Text => TextOutput::print_info(&info),
            }
        }
        Commands::Collect(args) => {
            let summary = app.collect(args.force)?;
            match output_mode {
                OutputMode::Json => JsonOutput::print_collect(&summary).into_diagnostic()?,
                OutputMode::Text => TextOutput::print_collect(&summary),
            }
        }
        Commands::LocalizeMedia => {
            let result = app.localize_media()?;
            match output_mode {
                OutputMode::Json => JsonOutput::print_localize(&result).into_diagnostic()?,
                OutputMode::Text => TextOutput::print_localize(&result),
            }
        }
        Commands::ListMaterials => print_counts(&app.material_counts()?, output_mode)?,
        Commands::ListPatterns => print_counts(&app.pattern_counts()?, output_mode)?,
        Commands::Report(args) => run_report(args, app)?,
        Commands::Debug(args) => {
            let result = app.debug_page(&args.url, args.dump)?;
            match output_mode {
                OutputMode::Json => JsonOutput::print_debug(&result).into_diagnostic()?,
                OutputMode::Text => TextOutput::print_debug(&result),
            }
        }
    }
    Ok(())
}

fn print_counts(
    counts: &[fabric_scout::app::CountEntry],
    output_mode: OutputMode,
) -> miette::Result<()> {
    match output_mode {
        OutputMode::Json => JsonOutput::print_counts(counts).into_diagnostic(),
        OutputMode::Text => {
            TextOutput::print_counts(counts);
            Ok(())
        }
    }
}

fn run_report(args: ReportArgs, app: &App<HttpCatalogClient>) -> miette::Result<()> {
    let options = ReportOptions {
        filter: ReportFilter {
            pattern: args.pattern,
            material: args.material,
        },
        group_by: args.group_by,
        format: Some(args.format),
    };
    let rendered = app.report(&options)?;
    match args.output {
        Some(path) => std::fs::write(&path, rendered).into_diagnostic()?,
        None => print!("{rendered}"),
    }
    Ok(())
}
