use anyhow::Context;
use clap::ArgMatches;
use colored::Colorize;
use stasis_core::config::MirrorConfig;
use stasis_core::mirror::{MirrorOutcome, execute_mirror};
use stasis_core::report::{
    ReportFormat, gather_report_data, generate_json_report, generate_text_report, save_report,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use url::Url;

// Helper functions for mirror handler

/// Expand `~` in a user supplied directory
pub fn expand_output_dir(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

/// Turn parsed `mirror` arguments into a checked configuration
pub fn build_config_from_args(sub_matches: &ArgMatches) -> anyhow::Result<MirrorConfig> {
    let upstream = sub_matches
        .get_one::<Url>("upstream")
        .context("--upstream is required")?;
    let origin = sub_matches
        .get_one::<Url>("origin")
        .context("--origin is required")?;

    let mut config = MirrorConfig::new(upstream.as_str(), origin.as_str());

    if let Some(host) = sub_matches.get_one::<String>("host") {
        config = config.with_host(host.clone());
    }
    if let Some(target) = sub_matches.get_one::<Url>("target") {
        config = config.with_target_base(target.as_str());
    }
    if let Some(dir) = sub_matches.get_one::<String>("output-dir") {
        config = config.with_output_dir(expand_output_dir(dir));
    }
    if let Some(threads) = sub_matches.get_one::<usize>("threads") {
        config = config.with_threads(*threads);
    }
    if let Some(timeout) = sub_matches.get_one::<u64>("timeout") {
        config = config.with_timeout(*timeout);
    }
    config = config.with_force(sub_matches.get_flag("force"));

    config.validate().context("Invalid mirror configuration")
}

pub fn report_format(sub_matches: &ArgMatches) -> ReportFormat {
    sub_matches
        .get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Text)
}

/// Render the run report in the requested format
pub fn render_report(
    config: &MirrorConfig,
    outcome: &MirrorOutcome,
    format: ReportFormat,
) -> anyhow::Result<String> {
    let data = gather_report_data(config, outcome);
    match format {
        ReportFormat::Text => Ok(generate_text_report(&data)),
        ReportFormat::Json => generate_json_report(&data).context("Failed to serialize report"),
    }
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

pub async fn handle_mirror(sub_matches: &ArgMatches, quiet: bool) {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    let config = match build_config_from_args(sub_matches) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {:#}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    };
    debug!("Mirror configuration: {:?}", config);

    if !quiet {
        print_divider();
        println!("{} {}", "Mirroring".bright_cyan().bold(), config.origin_base);
        println!("Upstream:   {}", config.upstream);
        println!("Target:     {}", config.target_base);
        println!("Output dir: {}", config.output_dir.display());
        println!("Workers:    {}", config.threads);
        print_divider();
        println!();
    }

    let progress_callback = if quiet {
        None
    } else {
        Some(Arc::new(|msg: String| {
            println!("{}", msg.dimmed());
        }) as stasis_core::MirrorProgressCallback)
    };

    let outcome = match execute_mirror(&config, progress_callback, !quiet).await {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("{} Mirror failed: {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    };

    if !quiet {
        println!("\n{}\n", "✓ Mirror complete!".green().bold());
    }

    let report = match render_report(&config, &outcome, report_format(sub_matches)) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("{} {:#}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    };

    match sub_matches.get_one::<PathBuf>("output") {
        Some(path) => {
            if let Err(e) = save_report(&report, path) {
                eprintln!("{} Failed to save report to {}: {}", "✗".red().bold(), path.display(), e);
                std::process::exit(1);
            }
            if !quiet {
                println!("Report saved to {}", path.display());
            }
        }
        None => print!("{}", report),
    }
}
