//! Raw XVIZ v2 payloads, exactly as they arrive inside a state update
//!
//! Nothing here is interpreted; the stream decoders own that. Stream payloads
//! stay JSON (`Raw<T>`) until a decoder asks for the typed shape, so excluded
//! or never-dispatched streams are not validated.

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single primitive object (polygon, point cloud, image, ...)
pub type Primitive = serde_json::Value;

/// Undecoded JSON payload whose expected shape is `T`
#[derive(Serialize, Deserialize)]
#[serde(transparent, bound = "")]
pub struct Raw<T> {
    value: Value,
    #[serde(skip)]
    shape: PhantomData<fn() -> T>,
}

impl<T> Raw<T> {
    pub fn from_value(value: Value) -> Self {
        Self {
            value,
            shape: PhantomData,
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.value
    }

    /// Sub-field of an object payload; `null` when absent
    pub fn field<U>(&self, name: &str) -> Raw<U> {
        Raw::from_value(self.value.get(name).cloned().unwrap_or(Value::Null))
    }
}

impl<T: Serialize> Raw<T> {
    /// Wrap a typed payload (fixtures and builders)
    pub fn encode(payload: &T) -> Self {
        Self::from_value(serde_json::to_value(payload).unwrap_or_default())
    }
}

impl<T: DeserializeOwned> Raw<T> {
    pub fn decode(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.value)
    }
}

impl<T> Clone for Raw<T> {
    fn clone(&self) -> Self {
        Self::from_value(self.value.clone())
    }
}

impl<T> Default for Raw<T> {
    fn default() -> Self {
        Self::from_value(Value::Null)
    }
}

impl<T> PartialEq for Raw<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> fmt::Debug for Raw<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Raw({})", self.value)
    }
}

/// Geographic origin of a pose
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapOrigin {
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub altitude: Option<f64>,
}

/// Raw pose of a stream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseRaw {
    #[serde(default)]
    pub timestamp: Option<f64>,
    #[serde(default)]
    pub map_origin: Option<MapOrigin>,
    /// [x, y, z]
    #[serde(default)]
    pub position: Option<[f64; 3]>,
    /// [roll, pitch, yaw]
    #[serde(default)]
    pub orientation: Option<[f64; 3]>,
}

/// Primitives of one stream, keyed by primitive type (`polygons`, `points`, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrimitiveSet {
    pub by_type: BTreeMap<String, Vec<Primitive>>,
}

impl PrimitiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add primitives of a type (builder style, mostly for fixtures)
    pub fn with(mut self, primitive_type: &str, primitives: Vec<Primitive>) -> Self {
        self.by_type
            .entry(primitive_type.to_string())
            .or_default()
            .extend(primitives);
        self
    }
}

/// Typed value arrays; XVIZ fills exactly one of them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValuesRaw {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doubles: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub int32s: Option<Vec<i32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bools: Option<Vec<bool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strings: Option<Vec<String>>,
}

/// Object binding shared by variables and primitives
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectBase {
    #[serde(default)]
    pub object_id: Option<String>,
}

/// One variable entry of a stream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariableState {
    #[serde(default)]
    pub base: Option<ObjectBase>,
    #[serde(default)]
    pub values: ValuesRaw,
}

/// Variables container as found under `variables[stream]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariableSet {
    #[serde(default)]
    pub variables: Vec<VariableState>,
}

/// One time-series sample; it may feed several streams at once
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesSampleRaw {
    pub timestamp: f64,
    #[serde(default)]
    pub object_id: Option<String>,
    #[serde(default)]
    pub streams: Vec<String>,
    #[serde(default)]
    pub values: ValuesRaw,
}

/// Predicted primitives, one set per future timestamp
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FutureRaw {
    #[serde(default)]
    pub timestamps: Vec<f64>,
    #[serde(default)]
    pub primitives: Vec<PrimitiveSet>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_raw_defers_validation() {
        let raw: Raw<PoseRaw> = serde_json::from_value(json!({"position": [1, 2]})).unwrap();
        assert_eq!(raw.as_value()["position"], json!([1, 2]));
        assert!(raw.decode().is_err());
    }

    #[test]
    fn test_raw_encode_decode() {
        let pose = PoseRaw {
            timestamp: Some(4.0),
            position: Some([1.0, 2.0, 3.0]),
            ..Default::default()
        };
        let raw = Raw::encode(&pose);
        assert_eq!(raw.decode().unwrap(), pose);
        assert_eq!(serde_json::to_value(&raw).unwrap()["timestamp"], json!(4.0));
    }

    #[test]
    fn test_raw_field() {
        let raw: Raw<VariableSet> = Raw::from_value(json!({"variables": [{"values": {}}]}));
        let states: Raw<Vec<VariableState>> = raw.field("variables");
        assert_eq!(states.decode().unwrap().len(), 1);

        let missing: Raw<Vec<VariableState>> = Raw::<VariableSet>::default().field("variables");
        assert!(missing.as_value().is_null());
    }
}
