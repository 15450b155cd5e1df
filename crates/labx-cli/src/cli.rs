//! CLI argument definitions for the lab exchange engine.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use labx_model::SampleId;

#[derive(Parser)]
#[command(
    name = "labx",
    version,
    about = "Lab exchange - turn customer requests into lab work and deliver results",
    long_about = "Ingest external customer requests into jobs, samples and tests, then\n\
                  deliver authorised results back as customer transaction documents.\n\
                  Customer profiles are read from the profile directory named in labx.toml."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow result values and request fields in trace output.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,

    /// Settings file (missing file means defaults).
    #[arg(
        long = "settings",
        value_name = "PATH",
        default_value = "labx.toml",
        global = true
    )]
    pub settings: PathBuf,
}

#[derive(Subcommand)]
pub enum Command {
    /// Convert a request feed into jobs, samples and tests.
    Ingest(IngestArgs),

    /// Build result transactions for ingested jobs.
    Export(ExportArgs),

    /// Print a customer's output or inbound template.
    Template(TemplateArgs),

    /// Parse an acknowledgement document and print it as JSON.
    ReadAck(ReadAckArgs),

    /// List stored customer profiles.
    Customers,
}

#[derive(Parser)]
pub struct IngestArgs {
    /// Request feed (.json array or .csv, one row per requested item).
    #[arg(value_name = "REQUESTS")]
    pub requests: PathBuf,

    /// Customer id that marks requests logged on the lab's own behalf.
    #[arg(long = "house-customer", value_name = "ID")]
    pub house_customer: Option<String>,

    /// Assign house requests to this customer instead of asking.
    ///
    /// Without it the real customer is read from standard input; an empty
    /// answer leaves those requests unconverted.
    #[arg(long = "assign", value_name = "CUSTOMER")]
    pub assign: Option<String>,

    /// Write the ingested jobs to this JSON file.
    ///
    /// An existing file is extended: requests it lists as converted are
    /// skipped and new jobs are numbered after the ones it holds.
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Parser)]
pub struct ExportArgs {
    /// Jobs file written by `labx ingest --output`.
    #[arg(value_name = "JOBS")]
    pub jobs: PathBuf,

    /// Request feed the jobs were ingested from.
    #[arg(long = "requests", value_name = "REQUESTS")]
    pub requests: PathBuf,

    /// Only export this job.
    #[arg(long = "job", value_name = "NAME")]
    pub job: Option<String>,

    /// Only export these samples (repeatable).
    #[arg(long = "sample", value_name = "ID")]
    pub samples: Vec<SampleId>,

    /// Directory for the transaction documents.
    #[arg(long = "output", value_name = "DIR", default_value = "transactions")]
    pub output_dir: PathBuf,
}

#[derive(Parser)]
pub struct TemplateArgs {
    /// Customer whose profile drives the template.
    #[arg(value_name = "CUSTOMER")]
    pub customer: String,

    /// Print the inbound request template instead of the output template.
    #[arg(long = "inbound")]
    pub inbound: bool,
}

#[derive(Parser)]
pub struct ReadAckArgs {
    /// Acknowledgement document.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
