//! stylegrade - grade an HTML/CSS submission against a rubric

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing::level_filters::LevelFilter;
use url::Url;

use stylegrade::report::EXIT_FATAL;
use stylegrade::util::read_text_file;
use stylegrade::{ResolveOptions, Result, Stylesheet, grade_files};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "stylegrade")]
#[command(version, about = "Grade HTML/CSS exercises against a rubric", long_about = None)]
#[command(after_help = "EXIT STATUS:
    0    every assertion passed
    1    at least one assertion failed
    2    grading could not complete (bad CSS, unsupported selector, ...)

EXAMPLES:
    stylegrade --html index.html --css css/style.css --rubric rubric.json
    stylegrade --html index.html --css style.css --rubric rubric.json --format json
    stylegrade --html index.html --css style.css --dump-rules")]
struct Cli {
    /// Submitted markup
    #[arg(long, value_name = "FILE")]
    html: PathBuf,

    /// Submitted stylesheet
    #[arg(long, value_name = "FILE")]
    css: PathBuf,

    /// Rubric JSON
    #[arg(long, value_name = "FILE", required_unless_present = "dump_rules")]
    rubric: Option<PathBuf>,

    /// Base URL for relative references (default: the markup file)
    #[arg(long, value_name = "URL")]
    base_url: Option<Url>,

    /// Load and apply <link rel="stylesheet"> targets
    #[arg(long)]
    link_tags: bool,

    /// Ignore <style> elements in the markup
    #[arg(long)]
    no_style_tags: bool,

    #[arg(long, value_enum, default_value = "text")]
    format: Format,

    /// Print the parsed rules of the stylesheet as JSON and exit
    #[arg(long)]
    dump_rules: bool,

    /// Only print failures and the summary
    #[arg(short, long)]
    quiet: bool,

    /// Log more (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    let result = if cli.dump_rules {
        dump_rules(&cli.css).map(|()| 0)
    } else {
        run(&cli)
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(EXIT_FATAL)
        }
    }
}

fn init_logging(quiet: bool, verbose: u8) {
    let level = match (quiet, verbose) {
        (true, _) => LevelFilter::ERROR,
        (false, 0) => LevelFilter::WARN,
        (false, 1) => LevelFilter::INFO,
        (false, 2) => LevelFilter::DEBUG,
        (false, _) => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<u8> {
    let Some(rubric) = &cli.rubric else {
        return Ok(0);
    };
    let mut options = ResolveOptions::default()
        .with_link_tags(cli.link_tags)
        .with_style_tags(!cli.no_style_tags);
    if let Some(url) = &cli.base_url {
        options = options.with_base_url(url.clone());
    }

    let report = grade_files(&cli.html, &cli.css, rubric, options)?;
    match cli.format {
        Format::Text => print!("{}", report.render_text(cli.quiet)),
        Format::Json => println!("{}", report.to_json()?),
    }
    Ok(report.exit_code())
}

fn dump_rules(css: &Path) -> Result<()> {
    let stylesheet = Stylesheet::parse(&read_text_file(css)?)
        .map_err(|e| e.in_source(&css.display().to_string()))?;
    println!("{}", serde_json::to_string_pretty(&stylesheet)?);
    Ok(())
}
