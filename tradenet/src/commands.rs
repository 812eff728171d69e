use clap::{Arg, arg, command};
use std::path::PathBuf;

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

fn input_arg() -> Arg {
    arg!(-i --"input" <CSV>)
        .required(true)
        .help("Cleaned bilateral trade CSV (2019,2020,from_name,from_code,to_name,to_code)")
        .value_parser(clap::value_parser!(PathBuf))
}

fn output_arg() -> Arg {
    arg!(-o --"output" <PATH>)
        .required(false)
        .help("Save output to file (default: display to screen)")
        .value_parser(clap::value_parser!(PathBuf))
}

/// Flags shared by every command that needs PageRank scores.
fn rank_args() -> [Arg; 4] {
    [
        arg!(--"damping" <FACTOR>)
            .required(false)
            .help("Damping factor for the random surfer (config default: 0.9)")
            .value_parser(clap::value_parser!(f64)),
        arg!(--"trials" <STEPS>)
            .required(false)
            .help("Number of random-walk steps (config default: 10000000)")
            .value_parser(clap::value_parser!(u64)),
        arg!(--"seed" <SEED>)
            .required(false)
            .help("Seed for the random walk (config default: 1)")
            .value_parser(clap::value_parser!(u64)),
        arg!(--"no-cache")
            .required(false)
            .help("Always recompute ranks and do not store them")
            .action(clap::ArgAction::SetTrue),
    ]
}

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("tradenet")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("tradenet")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Suppress non-essential output")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(--"config" <PATH>)
                .required(false)
                .global(true)
                .help("Path to tradenet.toml (default: ~/.config/tradenet/tradenet.toml)")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .subcommand_required(true)
        .subcommand(
            command!("init")
                .about("Creates the tradenet config directory, default config and rank cache")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Location of the tradenet config directory (ignored when --config is given)")
                        .default_value("~/.config/tradenet/"),
                )
                .arg(
                    arg!(-f --"force")
                        .help("Overwrite any existing config and rank cache")
                        .required(false),
                ),
        )
        .subcommand(
            command!("rank")
                .about("Rank every exporting country with a Monte Carlo PageRank")
                .arg(input_arg())
                .args(rank_args())
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json, csv, markdown")
                        .value_parser(["text", "json", "csv", "markdown", "md"])
                        .default_value("text"),
                )
                .arg(output_arg()),
        )
        .subcommand(
            command!("network")
                .about("Best trading partner of every country, as graph elements (JSON)")
                .arg(input_arg())
                .args(rank_args())
                .arg(
                    arg!(-r --"role" <ROLE>)
                        .required(false)
                        .help("Which side of the trade to follow: exporter or importer")
                        .value_parser(["exporter", "importer"])
                        .default_value("exporter"),
                )
                .arg(
                    arg!(-k --"top" <K>)
                        .required(false)
                        .help("Partners per country (config default: 1)")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(output_arg()),
        )
        .subcommand(
            command!("sankey")
                .about("Top-10 partner flows of one country in both periods")
                .arg(input_arg())
                .arg(
                    arg!(-c --"country" <CODE>)
                        .required(true)
                        .help("Country code, e.g. USA"),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Output format: text or json")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                )
                .arg(output_arg()),
        )
        .subcommand(command!("runs").about("List cached PageRank runs"))
}
