//! Defines the counting station type and the implementations needed to store
//! stations in an `rstar` R-tree.

use crate::types::records::Coordinate;
use rstar::{PointDistance, RTreeObject, AABB};
use serde::{Deserialize, Serialize};

/// A bicycle counting station from the station reference list.
///
/// A station is valid even if no count record ever mentions it; its aggregates are then `0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    /// The station identifier used in the count file paths (e.g. "100020113").
    pub id: String,
    /// Human readable name, if the reference list provides one.
    pub name: Option<String>,
    /// Position of the counter.
    pub location: Coordinate,
}

impl Station {
    pub fn new(id: impl Into<String>, name: Option<String>, location: Coordinate) -> Self {
        Self {
            id: id.into(),
            name,
            location,
        }
    }

    /// The name, or `"Station {id}"` when none is known.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => format!("Station {}", self.id),
        }
    }
}

// --- R-Tree Implementations ---

/// Stations are indexed as points in `[longitude, latitude]` degree space.
impl RTreeObject for Station {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.location.longitude, self.location.latitude])
    }
}

impl PointDistance for Station {
    /// Squared Euclidean distance in degree space, `point` is `[longitude, latitude]`.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.location.longitude - point[0];
        let dy = self.location.latitude - point[1];
        dx * dx + dy * dy
    }
}
