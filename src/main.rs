use clap::Parser;
use kronjob::{GenerateOptions, KubernetesVersion, cli::Cli, config, handlers::handle_generate};
use std::process;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> kronjob::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    cli.init_logging();

    // Load configuration
    let search_dir = std::env::current_dir()?;
    let config = config::load_config(cli.config.as_deref(), &search_dir)?;
    let mut options = GenerateOptions::from_config(&config)?;

    // Command-line flags take precedence over the configuration file
    if let Some(format) = cli.format {
        options.format = format;
    }
    if let Some(version) = &cli.kube_version {
        options.kubernetes_version = Some(version.parse::<KubernetesVersion>()?);
    }
    options.disable_cronjobs |= cli.disable_cronjobs;
    options.join_names |= cli.join_names;
    options.recommended_labels |= cli.recommended_labels;

    handle_generate(cli.input, cli.output, &options)
}
