//! Shared library surface for the safe-route server, CLI tools and tests.

pub mod api;
pub mod backend;
pub mod config;
pub mod orchestrator;
pub mod ors;
pub mod osrm;
pub mod route_planner;
pub mod state;

pub use backend::RoutingBackend;
pub use config::Config;
pub use orchestrator::OnlineRouter;
pub use route_planner::{PlannedRoute, SafeRoutePlanner, Strategy};
