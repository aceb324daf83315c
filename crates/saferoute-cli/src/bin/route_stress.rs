use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use reqwest::Client;

use saferoute_cli::{init_tracing, parse_point, random_scenario};
use saferoute_core::{is_path_safe, Point, RoadGraph};
use saferoute_server::osrm::OsrmClient;
use saferoute_server::{Config, SafeRoutePlanner, Strategy};

#[derive(Parser, Debug)]
#[command(author, version, about = "Run randomized zone layouts through the offline strategies", long_about = None)]
struct Args {
    /// Number of scenarios
    #[arg(long, default_value_t = 200)]
    trials: usize,

    /// RNG seed, so failures can be replayed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Scenario center as LAT,LON
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true, default_value = "40.7128,-74.0060")]
    center: Point,

    /// Start-to-end distance in meters
    #[arg(long, default_value_t = 1500.0)]
    span: f64,

    /// Zones per scenario
    #[arg(long, default_value_t = 6)]
    zones: usize,

    #[arg(long, default_value_t = 20.0)]
    min_radius: f64,

    #[arg(long, default_value_t = 120.0)]
    max_radius: f64,

    /// Optional GeoJSON road asset for the offline strategy
    #[arg(long)]
    graph: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("saferoute_server=warn")?;
    let args = Args::parse();

    let config = Config::default();
    let mut planner = SafeRoutePlanner::from_config(
        OsrmClient::from_config(Client::new(), &config),
        &config,
    )
    .with_strategies(vec![Strategy::Offline, Strategy::LocalDetour]);
    if let Some(path) = &args.graph {
        let graph = RoadGraph::load(path).context("loading road graph")?;
        planner = planner.with_graph(Arc::new(graph));
    }

    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut wins: BTreeMap<&'static str, usize> = BTreeMap::new();
    let mut failures = 0usize;
    let mut unsafe_routes = 0usize;
    let started = Instant::now();

    for trial in 0..args.trials {
        let scenario = random_scenario(
            &mut rng,
            args.center,
            args.span,
            args.zones,
            (args.min_radius, args.max_radius),
        );
        match planner.plan(scenario.start, scenario.end, &scenario.zones).await {
            Ok(planned) => {
                if !is_path_safe(planned.route.points(), &scenario.zones) {
                    unsafe_routes += 1;
                    eprintln!("trial {trial}: {} returned an unsafe route", planned.strategy);
                }
                *wins.entry(planned.strategy.as_str()).or_default() += 1;
            }
            Err(err) => {
                failures += 1;
                tracing::debug!("trial {}: {}", trial, err);
            }
        }
    }

    println!(
        "{} trials in {:.2?} (seed {})",
        args.trials,
        started.elapsed(),
        args.seed
    );
    for (strategy, count) in &wins {
        println!("  {strategy:<14} {count}");
    }
    println!("  {:<14} {}", "no route", failures);

    if unsafe_routes > 0 {
        bail!("{unsafe_routes} routes crossed a zone");
    }
    Ok(())
}
