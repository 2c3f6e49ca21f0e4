/*!
 * pkgstream CLI - Command Line Interface
 */

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use pkgstream::{
    config::{OutputFormat, RunConfig},
    error::{PkgstreamError, EXIT_FATAL, EXIT_SUCCESS},
    logging, DataStream, DataStreamReport, Package,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "pkgstream")]
#[command(version, about = "Load and validate the data streams of an integration package", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbose output (debug logging)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Write JSON logs to this file instead of stderr
    #[arg(long = "log-file", value_name = "FILE", global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate data streams, printing a pass/fail summary
    Check {
        /// Package root directory
        #[arg(value_name = "PACKAGE_DIR")]
        package: PathBuf,

        /// Only check these data streams (repeatable)
        #[arg(long = "data-stream", value_name = "NAME")]
        data_streams: Vec<String>,

        /// Load without validating
        #[arg(long)]
        skip_validation: bool,
    },

    /// Print a loaded data stream
    Show {
        /// Package root directory
        #[arg(value_name = "PACKAGE_DIR")]
        package: PathBuf,

        /// Data stream directory name
        #[arg(value_name = "DATA_STREAM")]
        data_stream: String,

        /// Output format
        #[arg(short = 'o', long, value_enum)]
        output: Option<OutputArg>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputArg {
    Text,
    Json,
    Yaml,
}

impl From<OutputArg> for OutputFormat {
    fn from(arg: OutputArg) -> Self {
        match arg {
            OutputArg::Text => OutputFormat::Text,
            OutputArg::Json => OutputFormat::Json,
            OutputArg::Yaml => OutputFormat::Yaml,
        }
    }
}

fn main() {
    let code = match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.downcast_ref::<PkgstreamError>()
                .map(PkgstreamError::exit_code)
                .unwrap_or(EXIT_FATAL)
        }
    };
    std::process::exit(code);
}

fn run() -> anyhow::Result<i32> {
    let cli = Cli::parse();

    let mut config = match cli.config {
        Some(ref path) => RunConfig::from_file(path)?,
        None => RunConfig::default(),
    };
    if cli.verbose {
        config.verbose = true;
    }
    if cli.log_file.is_some() {
        config.log_file = cli.log_file.clone();
    }

    match cli.command {
        Commands::Check {
            package,
            data_streams,
            skip_validation,
        } => {
            if skip_validation {
                config.validation_enabled = false;
            }
            logging::init_logging(&config)?;
            check(&package, &data_streams, &config)
        }
        Commands::Show {
            package,
            data_stream,
            output,
        } => {
            if let Some(output) = output {
                config.output = output.into();
            }
            logging::init_logging(&config)?;
            show(&package, &data_stream, &config)
        }
    }
}

fn check(root: &Path, only: &[String], config: &RunConfig) -> anyhow::Result<i32> {
    let package = Package::open(root)?;
    let validation = config.validation();

    let reports: Vec<DataStreamReport> = if only.is_empty() {
        package.load_data_streams(&validation)?
    } else {
        let mut reports = Vec::with_capacity(only.len());
        for name in only {
            let path = PathBuf::from(pkgstream::package::DATA_STREAM_DIR).join(name);
            let result = match package.load_data_stream(name, &validation) {
                Ok(ds) => Ok(ds),
                Err(PkgstreamError::Manifest(e)) => Err(e),
                Err(e) => return Err(e.into()),
            };
            reports.push(DataStreamReport { path, result });
        }
        reports
    };

    println!("{} {}", package.name(), package.manifest().version);
    for report in &reports {
        match &report.result {
            Ok(ds) => println!("  ok    {} ({})", report.name(), ds.dataset),
            Err(e) => println!("  FAIL  {}: {}", report.name(), e),
        }
    }

    let failed = reports.iter().filter(|r| !r.is_ok()).count();
    if failed > 0 {
        let err = PkgstreamError::ChecksFailed {
            failed,
            total: reports.len(),
        };
        eprintln!("{}", err);
        return Ok(err.exit_code());
    }
    Ok(EXIT_SUCCESS)
}

fn show(root: &Path, name: &str, config: &RunConfig) -> anyhow::Result<i32> {
    let package = Package::open(root)?;
    let ds = package.load_data_stream(name, &config.validation())?;

    match config.output {
        OutputFormat::Text => print_text(&ds),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&ds).context("serializing data stream to JSON")?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(&ds).context("serializing data stream to YAML")?;
            print!("{}", yaml);
        }
    }
    Ok(EXIT_SUCCESS)
}

fn print_text(ds: &DataStream) {
    println!("{} ({})", ds.title, ds.dataset);
    println!("  type:     {}", ds.kind);
    println!("  release:  {}", ds.release);
    let pipelines = ds.ingest_pipeline_names();
    if !pipelines.is_empty() {
        println!("  pipeline: {}", pipelines.join(", "));
    }
    for stream in &ds.streams {
        let state = if stream.is_enabled() { "enabled" } else { "disabled" };
        println!("  stream:   {} [{}] {}", stream.input, state, stream.template_path);
    }
}
