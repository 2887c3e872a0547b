//! Timeslice messages and the state updates they carry

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{FutureRaw, PoseRaw, PrimitiveSet, Raw, TimeSeriesSampleRaw, VariableSet};

/// One timeslice as received from the stream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimesliceMessage {
    pub update_type: String,
    #[serde(default)]
    pub updates: Vec<StateUpdate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
}

impl TimesliceMessage {
    /// Snapshot message with the given updates and no explicit timestamp
    pub fn snapshot(updates: Vec<StateUpdate>) -> Self {
        Self {
            update_type: crate::SNAPSHOT_UPDATE_TYPE.to_string(),
            updates,
            timestamp: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: f64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Decode a message from JSON text. Only the envelope and the category
    /// maps are checked here; stream payloads are left to the decoders.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Partial contribution to a timeslice. Every category is optional.
///
/// Stream payloads are kept as [`Raw`] JSON; the builders encode typed values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poses: Option<BTreeMap<String, Raw<PoseRaw>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primitives: Option<BTreeMap<String, Raw<PrimitiveSet>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<BTreeMap<String, Raw<VariableSet>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub future_instances: Option<BTreeMap<String, Raw<FutureRaw>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_series: Option<Vec<Raw<TimeSeriesSampleRaw>>>,
}

impl StateUpdate {
    pub fn at(timestamp: f64) -> Self {
        Self {
            timestamp: Some(timestamp),
            ..Self::default()
        }
    }

    pub fn with_pose(mut self, stream: &str, pose: PoseRaw) -> Self {
        self.poses
            .get_or_insert_with(BTreeMap::new)
            .insert(stream.to_string(), Raw::encode(&pose));
        self
    }

    pub fn with_primitives(mut self, stream: &str, primitives: PrimitiveSet) -> Self {
        self.primitives
            .get_or_insert_with(BTreeMap::new)
            .insert(stream.to_string(), Raw::encode(&primitives));
        self
    }

    pub fn with_variables(mut self, stream: &str, variables: VariableSet) -> Self {
        self.variables
            .get_or_insert_with(BTreeMap::new)
            .insert(stream.to_string(), Raw::encode(&variables));
        self
    }

    pub fn with_future(mut self, stream: &str, future: FutureRaw) -> Self {
        self.future_instances
            .get_or_insert_with(BTreeMap::new)
            .insert(stream.to_string(), Raw::encode(&future));
        self
    }

    pub fn with_time_series(mut self, sample: TimeSeriesSampleRaw) -> Self {
        self.time_series
            .get_or_insert_with(Vec::new)
            .push(Raw::encode(&sample));
        self
    }
}
