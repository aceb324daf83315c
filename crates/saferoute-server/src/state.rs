//! Shared application state.

use std::sync::Arc;

use reqwest::Client;

use saferoute_core::{RoadGraph, RouteError};

use crate::backend::RoutingBackend;
use crate::config::Config;
use crate::ors::OrsClient;
use crate::osrm::OsrmClient;
use crate::route_planner::SafeRoutePlanner;

/// Read-only after construction; handlers share it behind an `Arc`.
pub struct AppState<B = OsrmClient> {
    planner: SafeRoutePlanner<B>,
    config: Config,
}

impl<B: RoutingBackend> AppState<B> {
    pub fn new(planner: SafeRoutePlanner<B>, config: Config) -> Self {
        Self { planner, config }
    }

    pub fn planner(&self) -> &SafeRoutePlanner<B> {
        &self.planner
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl AppState<OsrmClient> {
    /// Wire the live OSRM/ORS clients and an optional preloaded graph.
    pub fn from_config(config: Config, graph: Option<Arc<RoadGraph>>) -> Self {
        let client = Client::new();
        let osrm = OsrmClient::from_config(client.clone(), &config);
        let mut planner = SafeRoutePlanner::from_config(osrm, &config);
        if let Some(graph) = graph {
            planner = planner.with_graph(graph);
        }
        if let Some(ors) = OrsClient::from_config(client, &config) {
            planner = planner.with_polygon_avoidance(ors);
        }
        Self::new(planner, config)
    }
}

/// Load the configured road graph once. A missing or broken asset only
/// disables the offline strategy.
pub fn load_graph(config: &Config) -> Option<Arc<RoadGraph>> {
    let path = config.graph_path.as_ref()?;
    match RoadGraph::load(path) {
        Ok(graph) => {
            tracing::info!(
                "Loaded road graph from {}: {} nodes, {} edges",
                path.display(),
                graph.node_count(),
                graph.edge_count()
            );
            Some(Arc::new(graph))
        }
        Err(err @ RouteError::AssetUnavailable(_)) => {
            tracing::warn!("Offline routing disabled: {}", err);
            None
        }
        Err(err) => {
            tracing::warn!("Unexpected error loading road graph: {}", err);
            None
        }
    }
}
