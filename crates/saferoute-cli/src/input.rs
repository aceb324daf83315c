//! Command line input parsing.

use std::path::Path;

use anyhow::{bail, Context, Result};
use saferoute_core::{DangerZone, Point};

/// Parse `"lat,lon"` into a point.
pub fn parse_point(raw: &str) -> Result<Point, String> {
    let (lat, lon) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LON but got {raw:?}"))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|_| format!("invalid latitude in {raw:?}"))?;
    let lon: f64 = lon
        .trim()
        .parse()
        .map_err(|_| format!("invalid longitude in {raw:?}"))?;
    Ok(Point::new(lat, lon))
}

/// Read a JSON array of zones, or an object with a `zones` array.
pub fn load_zones(path: impl AsRef<Path>) -> Result<Vec<DangerZone>> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading zones from {}", path.display()))?;
    parse_zones(&raw).with_context(|| format!("parsing zones in {}", path.display()))
}

pub fn parse_zones(raw: &str) -> Result<Vec<DangerZone>> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    let zones = match value {
        serde_json::Value::Array(_) => value,
        serde_json::Value::Object(mut map) => match map.remove("zones") {
            Some(zones) => zones,
            None => bail!("object has no \"zones\" field"),
        },
        _ => bail!("expected an array of zones"),
    };
    Ok(serde_json::from_value(zones)?)
}
