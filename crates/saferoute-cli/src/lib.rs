//! SafeRoute CLI - command line tools for the safe walking route engine.
//!
//! Binaries:
//! - safe_route: plan one route against a graph asset and/or live services
//! - inspect_graph: summarize a GeoJSON road asset
//! - route_stress: randomized zone layouts through the offline strategies

pub mod input;
pub mod scenarios;
pub mod summary;

pub use input::{load_zones, parse_point};
pub use scenarios::{random_scenario, Scenario};
pub use summary::{summarize, GraphSummary};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the stderr tracing subscriber used by every binary.
pub fn init_tracing(default_directive: &str) -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default_directive.parse()?),
        )
        .try_init()?;
    Ok(())
}
