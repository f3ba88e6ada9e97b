use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use course_finder::{catalog::load_catalog, Config, SearchEngine, SearchRequest, SkillLevel};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the course catalog (.json, .jsonl, .csv, or a directory of them)
    #[arg(long, env = "COURSE_FINDER_CATALOG")]
    catalog: PathBuf,

    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run a single query instead of the interactive prompt
    #[arg(short, long)]
    query: Option<String>,

    /// Beginner, Intermediate, Advanced or "No preference"
    #[arg(long)]
    skill_level: Option<SkillLevel>,

    /// Minimum course rating, 1.0 to 5.0
    #[arg(long)]
    min_rating: Option<f64>,

    /// Print the filtered results as JSON
    #[arg(long, default_value = "false")]
    json: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Disable logging
    #[arg(long, default_value = "false")]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args);

    let config = Config::load(args.config.as_deref()).context("failed to load config")?;
    let (catalog, _) = load_catalog(&args.catalog)
        .with_context(|| format!("failed to load catalog {}", args.catalog.display()))?;
    let engine = SearchEngine::new(catalog, &config)?;

    let skill_level = match args.skill_level {
        Some(level) => level,
        None => config
            .search
            .default_skill_level
            .parse()
            .context("invalid search.default_skill_level")?,
    };
    let min_rating = args.min_rating.unwrap_or(config.search.default_min_rating);

    if let Some(query) = &args.query {
        let request = SearchRequest::new(query.as_str(), skill_level, min_rating);
        return run_query(&engine, &request, args.json);
    }

    println!("Enter Search Query (\"exit\" to quit):");

    let stdin = io::stdin();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        if stdin.lock().read_line(&mut buffer)? == 0 {
            break;
        }

        let query = buffer.trim();
        if query == "exit" {
            break;
        }

        let request = SearchRequest::new(query, skill_level, min_rating);
        if let Err(e) = run_query(&engine, &request, args.json) {
            eprintln!("error: {e:#}");
        }
    }

    Ok(())
}

fn run_query(engine: &SearchEngine, request: &SearchRequest, json: bool) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if json {
        let results = engine.search_filtered(request)?;
        serde_json::to_writer_pretty(&mut out, &results)?;
        writeln!(out)?;
    } else {
        writeln!(out, "{}", engine.respond(request)?)?;
    }

    Ok(())
}

fn init_tracing(args: &Args) {
    if args.quiet {
        return;
    }

    let filter = match args.verbose {
        0 => "warn,course_finder=info",
        1 => "info,course_finder=debug",
        2 => "debug,course_finder=trace",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();
}
