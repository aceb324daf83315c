use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use saferoute_cli::{init_tracing, load_zones, parse_point, summarize};
use saferoute_core::{find_path, Point, RoadGraph};

#[derive(Parser, Debug)]
#[command(author, version, about = "Summarize a GeoJSON road asset", long_about = None)]
struct Args {
    /// GeoJSON FeatureCollection of LineString streets
    path: PathBuf,

    /// Optional A* test route start as LAT,LON
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true, requires = "to")]
    from: Option<Point>,

    /// Optional A* test route end as LAT,LON
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true, requires = "from")]
    to: Option<Point>,

    /// Zones the test route must avoid
    #[arg(long)]
    zones: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_tracing("saferoute_core=debug")?;
    let args = Args::parse();

    let graph = RoadGraph::load(&args.path)
        .with_context(|| format!("loading {}", args.path.display()))?;
    let summary = summarize(&graph);
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if let (Some(from), Some(to)) = (args.from, args.to) {
        let zones = match &args.zones {
            Some(path) => load_zones(path)?,
            None => Vec::new(),
        };
        let Some(route) = find_path(&graph, from, to, &zones) else {
            bail!("no path between the requested points avoiding {} zones", zones.len());
        };
        println!(
            "Test route: {} nodes, {:.0} m",
            route.len(),
            route.distance_m()
        );
    }

    Ok(())
}
