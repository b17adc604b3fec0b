//! Storage locations and hubs

use serde::{Deserialize, Serialize};

use crate::workflow::ParseStatusError;

/// Location id of the virtual zone that holds in-flight transfer stock
pub const TRANSIT_LOCATION_ID: &str = "TRANSIT";

/// Site a location belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hub {
    Farm,
    Mke,
    Transit,
}

impl Hub {
    /// Hubs that carry par levels
    pub const PHYSICAL: [Hub; 2] = [Hub::Farm, Hub::Mke];

    pub fn as_str(&self) -> &'static str {
        match self {
            Hub::Farm => "farm",
            Hub::Mke => "mke",
            Hub::Transit => "transit",
        }
    }
}

impl std::fmt::Display for Hub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Hub::Farm => write!(f, "Farm"),
            Hub::Mke => write!(f, "MKE"),
            Hub::Transit => write!(f, "Transit"),
        }
    }
}

impl std::str::FromStr for Hub {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "farm" => Ok(Hub::Farm),
            "mke" => Ok(Hub::Mke),
            "transit" => Ok(Hub::Transit),
            _ => Err(ParseStatusError::new("hub", s)),
        }
    }
}

/// Physical storage or virtual bookkeeping zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneType {
    StorageZone,
    Virtual,
}

impl ZoneType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneType::StorageZone => "storage_zone",
            ZoneType::Virtual => "virtual",
        }
    }
}

impl std::fmt::Display for ZoneType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ZoneType::StorageZone => write!(f, "Storage Zone"),
            ZoneType::Virtual => write!(f, "Virtual"),
        }
    }
}

impl std::str::FromStr for ZoneType {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "storage_zone" => Ok(ZoneType::StorageZone),
            "virtual" => Ok(ZoneType::Virtual),
            _ => Err(ParseStatusError::new("zone type", s)),
        }
    }
}

/// A place stock can be held
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub location_id: String,
    pub name: String,
    pub hub: Hub,
    pub zone_type: ZoneType,
}

impl Location {
    pub fn new(location_id: &str, name: &str, hub: Hub, zone_type: ZoneType) -> Self {
        Self {
            location_id: location_id.to_string(),
            name: name.to_string(),
            hub,
            zone_type,
        }
    }

    /// Virtual zones never count toward par totals or allocation sources
    pub fn is_physical(&self) -> bool {
        self.zone_type == ZoneType::StorageZone && self.hub != Hub::Transit
    }
}

/// Reference locations seeded at startup
pub fn default_locations() -> Vec<Location> {
    vec![
        Location::new("FARM-WS", "Farm Wood Shed", Hub::Farm, ZoneType::StorageZone),
        Location::new("FARM-LOFT", "Farm Barn Loft", Hub::Farm, ZoneType::StorageZone),
        Location::new("MKE-SHOP", "MKE Shop Floor", Hub::Mke, ZoneType::StorageZone),
        Location::new("MKE-RACK", "MKE Lumber Rack", Hub::Mke, ZoneType::StorageZone),
        Location::new(TRANSIT_LOCATION_ID, "In Transit", Hub::Transit, ZoneType::Virtual),
    ]
}
