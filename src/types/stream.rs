//! Decoded stream payloads produced by the XVIZ stream decoder

use serde::Serialize;

use crate::types::{Primitive, ValuesRaw};

/// A single variable value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Double(f64),
    Int(i32),
    Bool(bool),
    Text(String),
}

impl ValuesRaw {
    /// Values of the first non-empty typed array (doubles, int32s, bools, strings)
    pub fn scalars(&self) -> Vec<Scalar> {
        if let Some(v) = self.doubles.as_ref().filter(|v| !v.is_empty()) {
            return v.iter().copied().map(Scalar::Double).collect();
        }
        if let Some(v) = self.int32s.as_ref().filter(|v| !v.is_empty()) {
            return v.iter().copied().map(Scalar::Int).collect();
        }
        if let Some(v) = self.bools.as_ref().filter(|v| !v.is_empty()) {
            return v.iter().copied().map(Scalar::Bool).collect();
        }
        if let Some(v) = self.strings.as_ref().filter(|v| !v.is_empty()) {
            return v.iter().cloned().map(Scalar::Text).collect();
        }
        Vec::new()
    }
}

/// Normalized pose
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DecodedPose {
    pub timestamp: Option<f64>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub altitude: Option<f64>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    pub roll: Option<f64>,
    pub pitch: Option<f64>,
    pub yaw: Option<f64>,
}

/// Primitives of one stream, split by how they are rendered
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DecodedPrimitives {
    pub time: f64,
    /// Everything that is not a point cloud or an image
    pub features: Vec<Primitive>,
    pub point_cloud: Vec<Primitive>,
    pub images: Vec<Primitive>,
}

impl DecodedPrimitives {
    pub fn len(&self) -> usize {
        self.features.len() + self.point_cloud.len() + self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Values bound to an optional object
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableSeries {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    pub values: Vec<Scalar>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedVariable {
    pub time: f64,
    pub variables: Vec<VariableSeries>,
}

/// Latest time-series value of a stream
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedTimeSeries {
    pub time: f64,
    pub value: Scalar,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
}

/// One predicted frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookAhead {
    pub timestamp: f64,
    pub primitives: DecodedPrimitives,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedFutures {
    pub time: f64,
    pub look_aheads: Vec<LookAhead>,
}

/// Decoded payload of one stream
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecodedStream {
    Pose(DecodedPose),
    Primitives(DecodedPrimitives),
    Variable(DecodedVariable),
    TimeSeries(DecodedTimeSeries),
    Futures(DecodedFutures),
}

impl DecodedStream {
    /// Short label for terminal output
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pose(_) => "pose",
            Self::Primitives(_) => "primitives",
            Self::Variable(_) => "variable",
            Self::TimeSeries(_) => "time_series",
            Self::Futures(_) => "futures",
        }
    }
}
