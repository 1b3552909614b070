use crate::manifest::OutputFormat;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kronjob")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Generate Kubernetes Job/CronJob specs without the boilerplate")]
#[command(long_about = "Expands a DRY, inheritance-based description of Kubernetes jobs into fully-formed Job and CronJob manifests. A schedule of `once` produces a Job; any other schedule produces a CronJob.")]
pub struct Cli {
    /// File containing an abstract definition of Kubernetes Job/CronJob specs. Defaults to stdin.
    #[arg(value_name = "ABSTRACT_JOB_SPEC")]
    pub input: Option<PathBuf>,

    /// File the Kubernetes Job/CronJob specs will be written to. Defaults to stdout.
    #[arg(value_name = "K8S_JOB_SPEC")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", env = "KRONJOB_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format (overrides the configuration file)
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Target Kubernetes version, e.g. 1.9; selects the CronJob apiVersion
    #[arg(long, value_name = "VERSION")]
    pub kube_version: Option<String>,

    /// Fail if any job would become a CronJob
    #[arg(long)]
    pub disable_cronjobs: bool,

    /// Join parent and child job names with `-`
    #[arg(long)]
    pub join_names: bool,

    /// Add the app.kubernetes.io recommended labels
    #[arg(long)]
    pub recommended_labels: bool,

    /// Enable verbose logging (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Initialize logging based on verbosity level
    pub fn init_logging(&self) {
        if self.quiet {
            return;
        }

        let level = match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };

        env_logger::Builder::from_default_env()
            .filter_level(level)
            .init();
    }
}
