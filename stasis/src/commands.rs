use clap::{arg, command};
use stasis_core::config::{DEFAULT_OUTPUT_DIR, DEFAULT_TARGET_BASE};
use url::Url;

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("stasis")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("stasis")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("mirror")
                .about(
                    "Crawl a site through its upstream server and store a static, fingerprinted \
                copy that can be served from the target base URL.",
                )
                .arg(
                    arg!(-u --"upstream" <URL>)
                        .required(true)
                        .help("Server that actually answers requests, e.g. http://127.0.0.1:8000")
                        .value_parser(clap::value_parser!(Url)),
                )
                .arg(
                    arg!(--"origin" <URL>)
                        .required(true)
                        .help("Public base URL the site uses in its own links")
                        .value_parser(clap::value_parser!(Url)),
                )
                .arg(
                    arg!(--"host" <HOST>)
                        .required(false)
                        .help("Virtual host sent to the upstream (default: the origin's host)"),
                )
                .arg(
                    arg!(--"target" <URL>)
                        .required(false)
                        .help("Base URL the mirror will be served from")
                        .value_parser(clap::value_parser!(Url))
                        .default_value(DEFAULT_TARGET_BASE),
                )
                .arg(
                    arg!(-d --"output-dir" <PATH>)
                        .required(false)
                        .help("Directory the mirror is written to")
                        .default_value(DEFAULT_OUTPUT_DIR),
                )
                .arg(
                    arg!(-t --"threads" <NUM_WORKERS>)
                        .required(false)
                        .help("Number of fetches in flight at once")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("1"),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Request timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("30"),
                )
                .arg(
                    arg!(--"force")
                        .required(false)
                        .help("Wipe a non-empty output directory before mirroring")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                ),
        )
}
