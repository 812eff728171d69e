use anyhow::{Context, Result, anyhow, bail};
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};
use tradenet_core::config::{CONFIG_FILE_NAME, DATABASE_FILE_NAME, DEFAULT_CONFIG_DIR, EngineConfig};
use tradenet_core::data::{RankParams, RankStore};
use tradenet_core::graph::Role;
use tradenet_core::pagerank::PageRankEstimator;
use tradenet_core::record::TradeRecord;
use tradenet_core::report::{
    RankReport, ReportFormat, generate_sankey_text, network_elements_json, render_rank_report,
    sankey_json, save_report,
};
use tradenet_core::source::{CsvTradeSource, TradeRecordSource, fingerprint};
use tradenet_core::{best_partners, build_graph, sankey};

// Helper functions shared by the handlers

/// Expand `~` in a user-supplied path
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// Load config from an explicit path, else from the default location if it
/// exists, else fall back to defaults
pub fn load_config(explicit: Option<&PathBuf>) -> Result<EngineConfig> {
    if let Some(path) = explicit {
        let path = expand_path(&path.to_string_lossy());
        return EngineConfig::load(&path)
            .with_context(|| format!("Failed to load config {}", path.display()));
    }

    let default_path = expand_path(DEFAULT_CONFIG_DIR).join(CONFIG_FILE_NAME);
    if default_path.exists() {
        debug!("Using config at {}", default_path.display());
        return EngineConfig::load(&default_path)
            .with_context(|| format!("Failed to load config {}", default_path.display()));
    }

    Ok(EngineConfig::default())
}

/// Apply `--damping`, `--trials` and `--seed` on top of the loaded config
pub fn apply_rank_overrides(config: &mut EngineConfig, args: &ArgMatches) -> Result<()> {
    if let Some(damping) = args.get_one::<f64>("damping") {
        config.damping = *damping;
    }
    if let Some(trials) = args.get_one::<u64>("trials") {
        config.trials = *trials;
    }
    if let Some(seed) = args.get_one::<u64>("seed") {
        config.seed = *seed;
    }
    config.validate()?;
    Ok(())
}

pub fn parse_role(value: &str) -> Result<Role> {
    Role::from_str(value).ok_or_else(|| anyhow!("Unknown role '{}', expected exporter or importer", value))
}

/// Read trade records from a CSV using the configured period columns
pub fn load_records(input: &Path, config: &EngineConfig) -> Result<Vec<TradeRecord>> {
    let source = CsvTradeSource::new(input)
        .with_period_columns(&config.period_a_column, &config.period_b_column);
    let batch = source
        .load()
        .with_context(|| format!("Failed to load trade records from {}", input.display()))?;

    if batch.dropped > 0 {
        warn!(
            "Dropped {} incomplete row(s) from {}",
            batch.dropped,
            input.display()
        );
    }
    info!("Loaded {} trade records", batch.records.len());

    Ok(batch.records)
}

/// Fetch ranks from the store when this dataset and parameter set was ranked
/// before; otherwise run the estimator and store the result.
/// Returns the ranks and whether they came from the store.
pub fn resolve_ranks(
    records: &[TradeRecord],
    params: &RankParams,
    store: Option<&RankStore>,
    show_progress: bool,
) -> Result<(HashMap<String, f64>, bool)> {
    let dataset = fingerprint(records);

    if let Some(store) = store
        && let Some(run_id) = store.find_run(&dataset, params)?
    {
        info!("Using cached ranks from run {}", run_id);
        return Ok((store.load_ranks(&run_id)?, true));
    }

    let estimator = PageRankEstimator::from_records(records, params.damping)?;
    debug!(
        "Transition matrix ready for {} exporting countries",
        estimator.len()
    );

    let spinner = if show_progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message(format!(
            "Walking {} steps over {} countries...",
            params.trials,
            estimator.len()
        ));
        Some(pb)
    } else {
        None
    };

    let ranks = estimator.estimate(params.trials, params.seed)?.to_map();

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    if let Some(store) = store {
        let run_id = store.save_run(&dataset, params, &ranks)?;
        info!("Stored ranks as run {}", run_id);
    }

    Ok((ranks, false))
}

fn open_store(config: &EngineConfig, no_cache: bool) -> Result<Option<RankStore>> {
    if no_cache {
        return Ok(None);
    }

    let db_path = expand_path(&config.database);
    if !RankStore::exists(&db_path) {
        debug!(
            "No rank cache at {}, run `tradenet init` to create one",
            db_path.display()
        );
        return Ok(None);
    }

    Ok(Some(RankStore::new(&db_path).with_context(|| {
        format!("Failed to open rank cache {}", db_path.display())
    })?))
}

/// Write to the output file when given, otherwise to stdout
pub fn write_output(content: &str, output: Option<&PathBuf>) -> Result<()> {
    match output {
        Some(path) => {
            save_report(content, path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "{} Saved to {}",
                "✓".green().bold(),
                path.display().to_string().bright_white()
            );
        }
        None => print!("{}", content),
    }
    Ok(())
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn input_path(args: &ArgMatches) -> Result<&PathBuf> {
    args.get_one::<PathBuf>("input")
        .ok_or_else(|| anyhow!("--input is required"))
}

/// `--config` names the config file directly and its directory holds the
/// rank cache; otherwise both go in `[PATH]`.
fn init_locations(args: &ArgMatches) -> (PathBuf, PathBuf) {
    if let Some(config) = args.get_one::<PathBuf>("config") {
        let config_path = expand_path(&config.to_string_lossy());
        let config_dir = match config_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        return (config_dir, config_path);
    }

    let dir = args
        .get_one::<String>("PATH")
        .map(String::as_str)
        .unwrap_or(DEFAULT_CONFIG_DIR);
    let config_dir = expand_path(dir);
    let config_path = config_dir.join(CONFIG_FILE_NAME);
    (config_dir, config_path)
}

// Command handlers

pub fn handle_init(args: &ArgMatches) -> Result<()> {
    let quiet = args.get_flag("quiet");
    let force = args.get_flag("force");
    let (config_dir, config_path) = init_locations(args);
    let db_path = config_dir.join(DATABASE_FILE_NAME);

    if !quiet {
        print_divider();
        println!("{}", "  TRADENET INITIALIZATION".bright_white().bold());
        print_divider();
        println!();
    }

    if (config_path.exists() || RankStore::exists(&db_path)) && !force {
        bail!(
            "{} already contains a tradenet setup; pass --force to overwrite",
            config_dir.display()
        );
    }

    fs::create_dir_all(&config_dir)
        .with_context(|| format!("Failed to create {}", config_dir.display()))?;

    let config = EngineConfig {
        database: db_path.display().to_string(),
        ..EngineConfig::default()
    };
    fs::write(&config_path, config.to_toml_string()?)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    println!(
        "{} Config: {}",
        "✓".green().bold(),
        config_path.display().to_string().bright_white()
    );

    if force && RankStore::exists(&db_path) {
        RankStore::drop(&db_path)?;
        println!("{} Existing rank cache removed", "✓".green().bold());
    }
    RankStore::new(&db_path)?;
    println!(
        "{} Rank cache: {}",
        "✓".green().bold(),
        db_path.display().to_string().bright_white()
    );

    Ok(())
}

pub fn handle_rank(args: &ArgMatches) -> Result<()> {
    let quiet = args.get_flag("quiet");
    let mut config = load_config(args.get_one::<PathBuf>("config"))?;
    apply_rank_overrides(&mut config, args)?;

    let format = args
        .get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Text);

    let records = load_records(input_path(args)?, &config)?;
    let params = config.rank_params();
    let store = open_store(&config, args.get_flag("no-cache"))?;
    let (ranks, cached) = resolve_ranks(&records, &params, store.as_ref(), !quiet)?;

    if !quiet {
        let source = if cached { "cache" } else { "random walk" };
        eprintln!(
            "{} Ranked {} countries ({})",
            "✓".green().bold(),
            ranks.len().to_string().cyan(),
            source
        );
    }

    let graph = build_graph(&records, &ranks)?;
    let report = RankReport::from_graph(&graph, Some(params))?;
    let content = render_rank_report(&report, format)?;
    write_output(&content, args.get_one::<PathBuf>("output"))
}

pub fn handle_network(args: &ArgMatches) -> Result<()> {
    let quiet = args.get_flag("quiet");
    let mut config = load_config(args.get_one::<PathBuf>("config"))?;
    apply_rank_overrides(&mut config, args)?;

    let role = parse_role(
        args.get_one::<String>("role")
            .map(String::as_str)
            .unwrap_or("exporter"),
    )?;
    let k = args
        .get_one::<usize>("top")
        .copied()
        .unwrap_or(config.best_partner_count);

    let records = load_records(input_path(args)?, &config)?;
    let store = open_store(&config, args.get_flag("no-cache"))?;
    let (ranks, _) = resolve_ranks(&records, &config.rank_params(), store.as_ref(), !quiet)?;

    let graph = build_graph(&records, &ranks)?;
    let view = best_partners(&graph, k, role)?;
    info!(
        "Network view: {} nodes, {} {} edges",
        view.nodes.len(),
        view.edges.len(),
        role.as_str()
    );

    let content = network_elements_json(&view)?;
    write_output(&content, args.get_one::<PathBuf>("output"))
}

pub fn handle_sankey(args: &ArgMatches) -> Result<()> {
    let config = load_config(args.get_one::<PathBuf>("config"))?;
    let country = args
        .get_one::<String>("country")
        .ok_or_else(|| anyhow!("--country is required"))?;

    // Sankey needs no ranks, so the graph is built without any
    let records = load_records(input_path(args)?, &config)?;
    let graph = build_graph(&records, &HashMap::new())?;
    let diagram = sankey(&graph, country)?;

    let content = match args.get_one::<String>("format").map(String::as_str) {
        Some("json") => sankey_json(&diagram)?,
        _ => generate_sankey_text(&diagram),
    };
    write_output(&content, args.get_one::<PathBuf>("output"))
}

pub fn handle_runs(args: &ArgMatches) -> Result<()> {
    let config = load_config(args.get_one::<PathBuf>("config"))?;
    let db_path = expand_path(&config.database);
    if !RankStore::exists(&db_path) {
        bail!(
            "No rank cache at {}; run `tradenet init` first",
            db_path.display()
        );
    }

    let store = RankStore::new(&db_path)?;
    let runs = store.list_runs()?;
    if runs.is_empty() {
        println!("No cached runs");
        return Ok(());
    }

    for run in runs {
        println!(
            "{}  {}  d={} trials={} seed={}  {} countries  [{}]",
            run.id.bright_white(),
            format_timestamp(run.created_at),
            run.params.damping,
            run.params.trials,
            run.params.seed,
            run.country_count.to_string().cyan(),
            &run.fingerprint[..12.min(run.fingerprint.len())]
        );
    }
    Ok(())
}

fn format_timestamp(timestamp: i64) -> String {
    chrono::DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}
