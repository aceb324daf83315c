use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use reqwest::Client;

use saferoute_cli::{init_tracing, load_zones, parse_point};
use saferoute_core::{Point, RoadGraph};
use saferoute_server::ors::OrsClient;
use saferoute_server::osrm::OsrmClient;
use saferoute_server::route_planner::SafeRouteResponse;
use saferoute_server::{Config, SafeRoutePlanner, Strategy};

#[derive(Parser, Debug)]
#[command(author, version, about = "Plan one walking route around danger zones", long_about = None)]
struct Args {
    /// Start as LAT,LON
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    start: Point,

    /// End as LAT,LON
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    end: Point,

    /// JSON file with the danger zones
    #[arg(long)]
    zones: Option<PathBuf>,

    /// GeoJSON road asset (overrides SAFEROUTE_GRAPH_PATH)
    #[arg(long)]
    graph: Option<PathBuf>,

    /// Only use strategies that need no network
    #[arg(long, default_value_t = false)]
    offline_only: bool,

    /// Print the full response as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("saferoute_server=info")?;
    let args = Args::parse();

    let mut config = Config::from_env();
    if let Some(path) = args.graph {
        config.graph_path = Some(path);
    }

    let zones = match &args.zones {
        Some(path) => load_zones(path)?,
        None => Vec::new(),
    };

    let client = Client::new();
    let mut planner =
        SafeRoutePlanner::from_config(OsrmClient::from_config(client.clone(), &config), &config);
    if let Some(path) = &config.graph_path {
        // An explicit asset that fails to load is an error here, unlike in the server.
        let graph = RoadGraph::load(path).context("loading road graph")?;
        planner = planner.with_graph(Arc::new(graph));
    }
    if args.offline_only {
        planner = planner.with_strategies(vec![Strategy::Offline, Strategy::LocalDetour]);
    } else if let Some(ors) = OrsClient::from_config(client, &config) {
        planner = planner.with_polygon_avoidance(ors);
    }

    let strategies = planner.active_strategies();
    println!(
        "Planning {:.5},{:.5} -> {:.5},{:.5} around {} zones via {}",
        args.start.lat,
        args.start.lon,
        args.end.lat,
        args.end.lon,
        zones.len(),
        strategies
            .iter()
            .map(Strategy::as_str)
            .collect::<Vec<_>>()
            .join(" -> ")
    );

    let result = planner.plan(args.start, args.end, &zones).await;

    if args.json {
        let response = match &result {
            Ok(planned) => SafeRouteResponse::success(planned.clone()),
            Err(err) => SafeRouteResponse::failure(err),
        };
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        match &result {
            Ok(planned) => {
                println!(
                    "Route via {}: {} points, {:.0} m",
                    planned.strategy,
                    planned.route.len(),
                    planned.distance_m
                );
                for point in planned.route.points() {
                    println!("  {:.6},{:.6}", point.lat, point.lon);
                }
            }
            Err(err) if err.is_no_route() => {
                eprintln!("No safe route found; try a different destination")
            }
            Err(err) => eprintln!("No route: {}", err),
        }
    }

    if result.is_err() {
        std::process::exit(1);
    }
    Ok(())
}
