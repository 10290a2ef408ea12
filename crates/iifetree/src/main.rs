use std::{
    io::{self, Write},
    path::PathBuf,
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use log::{LevelFilter, error, info};

use iifetree::{
    bundler::Bundler, config::Config, discovery, file_record::SourceFile, namespace::HyphenMode,
};

/// Bundle import/export modules into IIFEs linked through a namespace tree.
#[derive(Parser, Debug)]
#[command(name = "iifetree", version, about)]
struct Cli {
    /// Directories or files to bundle, relative to the project root
    /// (overrides `src` from the configuration)
    src: Vec<PathBuf>,

    /// Project root; defaults to the current directory
    #[arg(long)]
    root: Option<PathBuf>,

    /// Output file name, written to the project root
    #[arg(short, long)]
    output: Option<String>,

    /// Print the bundle to stdout instead of writing the output file
    #[arg(long)]
    stdout: bool,

    /// File whose contents are prepended to the bundle
    #[arg(long)]
    header_file: Option<PathBuf>,

    /// File whose contents are appended to the bundle
    #[arg(long)]
    footer_file: Option<PathBuf>,

    /// Configuration file (defaults to iifetree.toml in the project root)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Strip only the first hyphen of each path segment
    #[arg(long)]
    legacy_hyphens: bool,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let root = cli.root.unwrap_or_else(|| PathBuf::from("."));
    let root = root
        .canonicalize()
        .with_context(|| format!("Failed to resolve project root {}", root.display()))?;

    let mut config = Config::load(cli.config.as_deref(), &root)?;
    if !cli.src.is_empty() {
        config.src = cli.src;
    }
    if let Some(output) = cli.output {
        config.output = output;
    }
    if let Some(header_file) = cli.header_file {
        config.header = None;
        config.header_file = Some(header_file);
    }
    if let Some(footer_file) = cli.footer_file {
        config.footer = None;
        config.footer_file = Some(footer_file);
    }
    if cli.legacy_hyphens {
        config.hyphens = HyphenMode::First;
    }

    let options = config.bundle_options(&root)?;
    let sources = discovery::collect_sources(&root, &config.src, &config.extensions)?;
    info!("Found {} source files in {}", sources.len(), root.display());

    let mut bundler = Bundler::with_root(options, &root);
    for path in &sources {
        bundler.add_file(SourceFile::read(&root, path)?)?;
    }
    let bundle = bundler.finish()?;

    if cli.stdout {
        let mut stdout = io::stdout().lock();
        stdout
            .write_all(bundle.contents().as_bytes())
            .and_then(|()| stdout.flush())
            .context("Failed to write the bundle to stdout")?;
    } else {
        bundle.write()?;
        info!("Wrote {}", bundle.output_path.display());
    }
    Ok(())
}
