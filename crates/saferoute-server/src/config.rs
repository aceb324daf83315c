//! Server configuration from environment.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use saferoute_core::AvoidanceRules;

pub const DEFAULT_OSRM_URL: &str = "https://router.project-osrm.org";
pub const DEFAULT_ORS_URL: &str =
    "https://api.openrouteservice.org/v2/directions/foot-walking/geojson";

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub osrm_url: String,
    pub osrm_profile: String,
    pub ors_url: String,
    /// Polygon-avoidance routing is only attempted when a key is set.
    pub ors_api_key: Option<String>,
    pub graph_path: Option<PathBuf>,
    pub snap_timeout_ms: u64,
    pub directions_timeout_ms: u64,
    pub fast_path_timeout_ms: u64,
    /// Deadline for the whole recursive fallback of one request.
    pub fallback_timeout_ms: u64,
    pub local_detour_enabled: bool,
    pub max_fallback_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            osrm_url: DEFAULT_OSRM_URL.to_string(),
            osrm_profile: "foot".to_string(),
            ors_url: DEFAULT_ORS_URL.to_string(),
            ors_api_key: None,
            graph_path: None,
            snap_timeout_ms: 800,
            directions_timeout_ms: 6000,
            fast_path_timeout_ms: 1200,
            fallback_timeout_ms: 15_000,
            local_detour_enabled: true,
            max_fallback_depth: AvoidanceRules::default().max_fallback_depth,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env::var("SAFEROUTE_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.server_port),
            osrm_url: env::var("SAFEROUTE_OSRM_URL").unwrap_or(defaults.osrm_url),
            osrm_profile: env::var("SAFEROUTE_OSRM_PROFILE").unwrap_or(defaults.osrm_profile),
            ors_url: env::var("SAFEROUTE_ORS_URL").unwrap_or(defaults.ors_url),
            ors_api_key: env::var("SAFEROUTE_ORS_API_KEY")
                .ok()
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty()),
            graph_path: env::var("SAFEROUTE_GRAPH_PATH")
                .ok()
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
            snap_timeout_ms: env::var("SAFEROUTE_SNAP_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.snap_timeout_ms),
            directions_timeout_ms: env::var("SAFEROUTE_DIRECTIONS_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.directions_timeout_ms),
            fast_path_timeout_ms: env::var("SAFEROUTE_FAST_PATH_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.fast_path_timeout_ms),
            fallback_timeout_ms: env::var("SAFEROUTE_FALLBACK_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.fallback_timeout_ms),
            local_detour_enabled: env::var("SAFEROUTE_LOCAL_DETOUR")
                .ok()
                .and_then(|s| parse_flag(&s))
                .unwrap_or(defaults.local_detour_enabled),
            max_fallback_depth: env::var("SAFEROUTE_MAX_FALLBACK_DEPTH")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_fallback_depth),
        }
    }

    pub fn snap_timeout(&self) -> Duration {
        Duration::from_millis(self.snap_timeout_ms)
    }

    pub fn directions_timeout(&self) -> Duration {
        Duration::from_millis(self.directions_timeout_ms)
    }

    pub fn fast_path_timeout(&self) -> Duration {
        Duration::from_millis(self.fast_path_timeout_ms)
    }

    pub fn fallback_timeout(&self) -> Duration {
        Duration::from_millis(self.fallback_timeout_ms)
    }

    /// Default avoidance thresholds with the configured depth override applied.
    pub fn avoidance_rules(&self) -> AvoidanceRules {
        AvoidanceRules {
            max_fallback_depth: self.max_fallback_depth,
            ..AvoidanceRules::default()
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_timeouts() {
        let config = Config::default();
        assert_eq!(config.snap_timeout(), Duration::from_millis(800));
        assert_eq!(config.directions_timeout(), Duration::from_millis(6000));
        assert_eq!(config.fast_path_timeout(), Duration::from_millis(1200));
        assert_eq!(config.fallback_timeout(), Duration::from_secs(15));
        assert!(config.ors_api_key.is_none());
        assert_eq!(config.avoidance_rules(), AvoidanceRules::default());
    }

    #[test]
    fn depth_override_flows_into_rules() {
        let config = Config {
            max_fallback_depth: 2,
            ..Config::default()
        };
        assert_eq!(config.avoidance_rules().max_fallback_depth, 2);
    }

    #[test]
    fn flags_accept_common_spellings() {
        assert_eq!(parse_flag(" TRUE "), Some(true));
        assert_eq!(parse_flag("off"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
