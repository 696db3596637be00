mod config;
mod error;
mod posts;
mod test_runner;

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use blocks::Document;
use blocks::parser::Converter;

use crate::config::Config;
use crate::error::CliError;

#[derive(Parser)]
#[command(name = "blocks", version, about = "Convert legacy HTML posts into portable blocks")]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// TOML configuration file (defaults to ./blocks.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output: -v for info, -vv for debug
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert an HTML fragment into a block document
    Convert(ConvertArgs),

    /// Link bare URLs in a serialized block document
    Linkify(LinkifyArgs),

    /// Convert a legacy post export into NDJSON post records
    Posts(PostsArgs),

    /// Run .test.html conversion fixtures
    Test(TestArgs),
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Markdown,
    Text,
}

#[derive(clap::Args)]
struct ConvertArgs {
    /// HTML file to convert
    file: PathBuf,

    /// Run the linkify pass on the result
    #[arg(long)]
    linkify: bool,

    #[arg(long, value_enum, default_value = "json")]
    format: Format,

    /// Do not print conversion warnings
    #[arg(short, long)]
    quiet_warnings: bool,
}

#[derive(clap::Args)]
struct LinkifyArgs {
    /// JSON document (array of block records)
    file: PathBuf,

    /// Overwrite the input instead of printing the result
    #[arg(long)]
    in_place: bool,
}

#[derive(clap::Args)]
struct PostsArgs {
    /// JSON export: an array of legacy posts
    export: PathBuf,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.html file or directory containing them
    path: PathBuf,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let color_choice = if cli.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    if let Command::Test(args) = &cli.command {
        if args.list_categories {
            test_runner::list_categories(&args.path);
            return;
        }
        process::exit(test_runner::run_tests(&args.path, cli.no_color, &args.category));
    }

    if let Err(error) = run(&cli, color_choice) {
        error.emit(color_choice);
        process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn run(cli: &Cli, color_choice: ColorChoice) -> Result<(), CliError> {
    let config = Config::load(cli.config.as_deref())?;
    match &cli.command {
        Command::Convert(args) => do_convert(args, &config, color_choice),
        Command::Linkify(args) => do_linkify(args),
        Command::Posts(args) => posts::run(&args.export, args.output.as_deref(), &config).map(|_| ()),
        Command::Test(_) => Ok(()),
    }
}

fn do_convert(args: &ConvertArgs, config: &Config, color_choice: ColorChoice) -> Result<(), CliError> {
    let source = fs::read_to_string(&args.file).map_err(|e| CliError::read(&args.file, e))?;

    // Warnings point into the normalized text, registered as file 0
    let conversion = Converter::new(source, 0)
        .with_options(config.convert_options())
        .convert_with_warnings();

    if !args.quiet_warnings && !conversion.warnings.is_empty() {
        let mut files = SimpleFiles::new();
        files.add(args.file.display().to_string(), conversion.normalized.as_str());
        let writer = StandardStream::stderr(color_choice);
        let term_config = term::Config::default();
        for warning in &conversion.warnings {
            let diagnostic = warning.to_diagnostic();
            let _ = term::emit_to_write_style(&mut writer.lock(), &term_config, &files, &diagnostic);
        }
    }

    let mut document = conversion.document;
    if args.linkify || config.convert.linkify {
        let (linked, report) = linkify::linkify_with_report(document);
        info!(%report, "linkify pass");
        document = linked;
    }

    print!("{}", render(&document, args.format)?);
    Ok(())
}

fn render(document: &Document, format: Format) -> Result<String, CliError> {
    Ok(match format {
        Format::Json => serde_json::to_string_pretty(document)? + "\n",
        Format::Markdown => document.to_string(),
        Format::Text => document.plain_text() + "\n",
    })
}

fn do_linkify(args: &LinkifyArgs) -> Result<(), CliError> {
    let document = read_document(&args.file)?;
    let (document, report) = linkify::linkify_with_report(document);
    info!(
        blocks_scanned = report.blocks_scanned,
        blocks_modified = report.blocks_modified,
        links_created = report.links_created,
        definitions_added = report.definitions_added,
        "linkify pass"
    );

    let json = render(&document, Format::Json)?;
    if args.in_place {
        fs::write(&args.file, json).map_err(|e| CliError::write(&args.file, e))?;
    } else {
        print!("{}", json);
    }
    Ok(())
}

fn read_document(path: &Path) -> Result<Document, CliError> {
    let text = fs::read_to_string(path).map_err(|e| CliError::read(path, e))?;
    match serde_json::from_str(&text) {
        Ok(document) => Ok(document),
        Err(source) => Err(CliError::Json {
            path: path.to_path_buf(),
            text,
            source,
        }),
    }
}
