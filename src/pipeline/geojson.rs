//! GeoJSON (RFC 7946) output types and the record → feature mapping.
//!
//! Only the subset the registry needs is modelled: a `FeatureCollection` of
//! `Point` features. Field order in the structs is the field order in the
//! JSON, so the same records always serialise to the same bytes.

use crate::error::ConvertError;
use crate::pipeline::reassemble::Record;
use serde::{Deserialize, Serialize};

/// Descriptive properties attached to every point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToponymProperties {
    #[serde(rename = "ref")]
    pub reference: String,
    pub name: String,
    #[serde(rename = "type")]
    pub object_type: String,
    pub administrative_location: String,
    /// `null` when the registry row had no geographic location text.
    pub geo_location: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GeometryType {
    Point,
}

/// A GeoJSON `Point`; `coordinates` is `[longitude, latitude]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    #[serde(rename = "type")]
    pub kind: GeometryType,
    pub coordinates: [f64; 2],
}

impl Point {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            kind: GeometryType::Point,
            coordinates: [longitude, latitude],
        }
    }

    pub fn longitude(&self) -> f64 {
        self.coordinates[0]
    }

    pub fn latitude(&self) -> f64 {
        self.coordinates[1]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FeatureType {
    Feature,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: FeatureType,
    pub geometry: Point,
    pub properties: ToponymProperties,
}

impl From<Record> for Feature {
    fn from(r: Record) -> Self {
        Self {
            kind: FeatureType::Feature,
            geometry: Point::new(r.longitude, r.latitude),
            properties: ToponymProperties {
                reference: r.reference,
                name: r.name,
                object_type: r.object_type,
                administrative_location: r.administrative_location,
                geo_location: r.geo_location,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FeatureCollectionType {
    FeatureCollection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: FeatureCollectionType,
    pub features: Vec<Feature>,
}

impl Default for FeatureCollection {
    fn default() -> Self {
        Self {
            kind: FeatureCollectionType::FeatureCollection,
            features: Vec::new(),
        }
    }
}

impl FeatureCollection {
    /// One feature per record, in record order.
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        Self {
            features: records.into_iter().map(Feature::from).collect(),
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Serialise as compact or indented JSON.
    pub fn to_json(&self, pretty: bool) -> Result<String, ConvertError> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}
