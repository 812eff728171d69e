use colored::Colorize;
use tracing_subscriber::EnvFilter;
use tradenet::commands::command_argument_builder;
use tradenet::handlers::{handle_init, handle_network, handle_rank, handle_runs, handle_sankey};

fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();

    // Logs go to stderr so reports can be piped from stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match chosen_command.subcommand() {
        Some(("init", primary_command)) => handle_init(primary_command),
        Some(("rank", primary_command)) => handle_rank(primary_command),
        Some(("network", primary_command)) => handle_network(primary_command),
        Some(("sankey", primary_command)) => handle_sankey(primary_command),
        Some(("runs", primary_command)) => handle_runs(primary_command),
        _ => unreachable!("clap should ensure we don't get here"),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}
