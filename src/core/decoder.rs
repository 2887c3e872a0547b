//! Stream decoders: one rule per stream category
//!
//! `StreamDecoder` is the seam between the timeslice aggregator and the
//! category payload formats. Payloads arrive undecoded; `XvizStreamDecoder`
//! checks their XVIZ v2 shape and applies the XVIZ v2 rules.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::StreamBlacklist;
use crate::error::DecodeError;
use crate::types::{
    DecodedFutures, DecodedPose, DecodedPrimitives, DecodedStream, DecodedTimeSeries,
    DecodedVariable, FutureRaw, LookAhead, PoseRaw, Primitive, PrimitiveSet, Raw,
    StreamCategory, TimeSeriesSampleRaw, VariableSeries, VariableState,
};

/// Caller supplied transform applied to every decoded primitive
pub type ConvertPrimitive = dyn Fn(Primitive) -> Primitive + Send + Sync;

/// Category decoders used by the aggregator
pub trait StreamDecoder {
    /// Decoded payload of one stream
    type Stream;

    fn decode_pose(&self, pose: &Raw<PoseRaw>) -> Result<Self::Stream, DecodeError>;

    fn decode_primitives(
        &self,
        primitives: &Raw<PrimitiveSet>,
        stream_name: &str,
        timestamp: f64,
        convert_primitive: Option<&ConvertPrimitive>,
    ) -> Result<Self::Stream, DecodeError>;

    /// `variables` is the `.variables` field of the stream entry, `null` when absent
    fn decode_variables(
        &self,
        variables: &Raw<Vec<VariableState>>,
        stream_name: &str,
        timestamp: f64,
    ) -> Result<Self::Stream, DecodeError>;

    /// Batched: samples are only keyed by stream once decoded, so the
    /// blacklist is applied here.
    fn decode_time_series(
        &self,
        samples: &[Raw<TimeSeriesSampleRaw>],
        blacklist: &StreamBlacklist,
    ) -> Result<BTreeMap<String, Self::Stream>, DecodeError>;

    fn decode_futures(
        &self,
        futures: &Raw<FutureRaw>,
        stream_name: &str,
        timestamp: f64,
        convert_primitive: Option<&ConvertPrimitive>,
    ) -> Result<Self::Stream, DecodeError>;
}

impl<T: StreamDecoder + ?Sized> StreamDecoder for &T {
    type Stream = T::Stream;

    fn decode_pose(&self, pose: &Raw<PoseRaw>) -> Result<Self::Stream, DecodeError> {
        (**self).decode_pose(pose)
    }

    fn decode_primitives(
        &self,
        primitives: &Raw<PrimitiveSet>,
        stream_name: &str,
        timestamp: f64,
        convert_primitive: Option<&ConvertPrimitive>,
    ) -> Result<Self::Stream, DecodeError> {
        (**self).decode_primitives(primitives, stream_name, timestamp, convert_primitive)
    }

    fn decode_variables(
        &self,
        variables: &Raw<Vec<VariableState>>,
        stream_name: &str,
        timestamp: f64,
    ) -> Result<Self::Stream, DecodeError> {
        (**self).decode_variables(variables, stream_name, timestamp)
    }

    fn decode_time_series(
        &self,
        samples: &[Raw<TimeSeriesSampleRaw>],
        blacklist: &StreamBlacklist,
    ) -> Result<BTreeMap<String, Self::Stream>, DecodeError> {
        (**self).decode_time_series(samples, blacklist)
    }

    fn decode_futures(
        &self,
        futures: &Raw<FutureRaw>,
        stream_name: &str,
        timestamp: f64,
        convert_primitive: Option<&ConvertPrimitive>,
    ) -> Result<Self::Stream, DecodeError> {
        (**self).decode_futures(futures, stream_name, timestamp, convert_primitive)
    }
}

/// Typed view of a payload, or `MalformedPayload`
fn payload<T: DeserializeOwned>(
    raw: &Raw<T>,
    category: StreamCategory,
    stream_name: Option<&str>,
) -> Result<T, DecodeError> {
    raw.decode().map_err(|err| DecodeError::MalformedPayload {
        category,
        stream: stream_name.map(str::to_string),
        message: err.to_string(),
    })
}

/// False only when every stream listed by the sample is blacklisted
fn feeds_any(sample: &Raw<TimeSeriesSampleRaw>, blacklist: &StreamBlacklist) -> bool {
    match sample.as_value().get("streams") {
        Some(Value::Array(names)) => names
            .iter()
            .any(|name| name.as_str().map_or(true, |name| !blacklist.contains(name))),
        _ => true,
    }
}

/// XVIZ v2 stream decoder
#[derive(Debug, Default, Clone, Copy)]
pub struct XvizStreamDecoder;

impl XvizStreamDecoder {
    pub fn new() -> Self {
        Self
    }

    fn primitives(
        &self,
        primitives: &PrimitiveSet,
        stream_name: &str,
        timestamp: f64,
        convert_primitive: Option<&ConvertPrimitive>,
    ) -> Result<DecodedPrimitives, DecodeError> {
        let mut decoded = DecodedPrimitives {
            time: timestamp,
            ..Default::default()
        };

        for (primitive_type, objects) in &primitives.by_type {
            let kind = PrimitiveKind::from_field(primitive_type).ok_or_else(|| {
                DecodeError::UnknownPrimitiveType {
                    stream: stream_name.to_string(),
                    primitive_type: primitive_type.clone(),
                }
            })?;

            for object in objects {
                let mut primitive = normalize_primitive(object, kind).ok_or_else(|| {
                    DecodeError::MalformedPrimitive {
                        stream: stream_name.to_string(),
                        primitive_type: primitive_type.clone(),
                    }
                })?;
                if let Some(convert) = convert_primitive {
                    primitive = convert(primitive);
                }

                match kind {
                    PrimitiveKind::Point => decoded.point_cloud.push(primitive),
                    PrimitiveKind::Image => decoded.images.push(primitive),
                    _ => decoded.features.push(primitive),
                }
            }
        }

        Ok(decoded)
    }
}

impl StreamDecoder for XvizStreamDecoder {
    type Stream = DecodedStream;

    fn decode_pose(&self, pose: &Raw<PoseRaw>) -> Result<DecodedStream, DecodeError> {
        let pose = payload(pose, StreamCategory::Pose, None)?;

        let mut decoded = DecodedPose {
            timestamp: pose.timestamp,
            ..Default::default()
        };
        if let Some(origin) = &pose.map_origin {
            decoded.longitude = origin.longitude;
            decoded.latitude = origin.latitude;
            decoded.altitude = origin.altitude;
        }
        if let Some([x, y, z]) = pose.position {
            decoded.x = Some(x);
            decoded.y = Some(y);
            decoded.z = Some(z);
        }
        if let Some([roll, pitch, yaw]) = pose.orientation {
            decoded.roll = Some(roll);
            decoded.pitch = Some(pitch);
            decoded.yaw = Some(yaw);
        }
        Ok(DecodedStream::Pose(decoded))
    }

    fn decode_primitives(
        &self,
        primitives: &Raw<PrimitiveSet>,
        stream_name: &str,
        timestamp: f64,
        convert_primitive: Option<&ConvertPrimitive>,
    ) -> Result<DecodedStream, DecodeError> {
        let primitives = payload(primitives, StreamCategory::Primitive, Some(stream_name))?;
        self.primitives(&primitives, stream_name, timestamp, convert_primitive)
            .map(DecodedStream::Primitives)
    }

    fn decode_variables(
        &self,
        variables: &Raw<Vec<VariableState>>,
        stream_name: &str,
        timestamp: f64,
    ) -> Result<DecodedStream, DecodeError> {
        let states = if variables.as_value().is_null() {
            Vec::new()
        } else {
            payload(variables, StreamCategory::Variable, Some(stream_name))?
        };

        let variables = states
            .iter()
            .map(|state| VariableSeries {
                object_id: state.base.as_ref().and_then(|b| b.object_id.clone()),
                values: state.values.scalars(),
            })
            .collect();

        Ok(DecodedStream::Variable(DecodedVariable {
            time: timestamp,
            variables,
        }))
    }

    fn decode_time_series(
        &self,
        samples: &[Raw<TimeSeriesSampleRaw>],
        blacklist: &StreamBlacklist,
    ) -> Result<BTreeMap<String, DecodedStream>, DecodeError> {
        let mut streams = BTreeMap::new();

        for sample in samples.iter().filter(|sample| feeds_any(sample, blacklist)) {
            let sample = payload(sample, StreamCategory::TimeSeries, None)?;
            let values = sample.values.scalars();
            for (index, stream_name) in sample.streams.iter().enumerate() {
                if blacklist.contains(stream_name) {
                    continue;
                }
                let value = values.get(index).cloned().ok_or_else(|| {
                    DecodeError::MissingTimeSeriesValue {
                        stream: stream_name.clone(),
                        index,
                    }
                })?;
                streams.insert(
                    stream_name.clone(),
                    DecodedStream::TimeSeries(DecodedTimeSeries {
                        time: sample.timestamp,
                        value,
                        object_id: sample.object_id.clone(),
                    }),
                );
            }
        }

        Ok(streams)
    }

    fn decode_futures(
        &self,
        futures: &Raw<FutureRaw>,
        stream_name: &str,
        timestamp: f64,
        convert_primitive: Option<&ConvertPrimitive>,
    ) -> Result<DecodedStream, DecodeError> {
        let futures = payload(futures, StreamCategory::Future, Some(stream_name))?;
        if futures.timestamps.len() != futures.primitives.len() {
            return Err(DecodeError::FutureLengthMismatch {
                stream: stream_name.to_string(),
                timestamps: futures.timestamps.len(),
                primitives: futures.primitives.len(),
            });
        }

        let look_aheads = futures
            .timestamps
            .iter()
            .zip(&futures.primitives)
            .map(|(&future_time, primitives)| {
                self.primitives(primitives, stream_name, future_time, convert_primitive)
                    .map(|primitives| LookAhead {
                        timestamp: future_time,
                        primitives,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DecodedStream::Futures(DecodedFutures {
            time: timestamp,
            look_aheads,
        }))
    }
}

/// XVIZ v2 primitive types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PrimitiveKind {
    Polygon,
    Polyline,
    Point,
    Circle,
    Text,
    Stadium,
    Image,
}

impl PrimitiveKind {
    fn from_field(field: &str) -> Option<Self> {
        Some(match field {
            "polygons" => Self::Polygon,
            "polylines" => Self::Polyline,
            "points" => Self::Point,
            "circles" => Self::Circle,
            "text" => Self::Text,
            "stadiums" => Self::Stadium,
            "images" => Self::Image,
            _ => return None,
        })
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Polygon => "polygon",
            Self::Polyline => "polyline",
            Self::Point => "point",
            Self::Circle => "circle",
            Self::Text => "text",
            Self::Stadium => "stadium",
            Self::Image => "image",
        }
    }
}

/// Lift `base.object_id` to `id`, drop `base`, set the singular `type`
fn normalize_primitive(object: &Value, kind: PrimitiveKind) -> Option<Primitive> {
    let mut fields = object.as_object()?.clone();

    if let Some(Value::Object(base)) = fields.remove("base") {
        if let Some(object_id) = base.get("object_id") {
            fields.insert("id".to_string(), object_id.clone());
        }
    }
    fields.insert("type".to_string(), Value::from(kind.name()));

    Some(Value::Object(fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MapOrigin, ObjectBase, Scalar, ValuesRaw};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_pose_fields() {
        let pose = PoseRaw {
            timestamp: Some(12.5),
            map_origin: Some(MapOrigin {
                longitude: Some(8.4),
                latitude: Some(49.0),
                altitude: Some(100.0),
            }),
            position: Some([1.0, 2.0, 3.0]),
            orientation: None,
        };

        let decoded = XvizStreamDecoder.decode_pose(&Raw::encode(&pose)).unwrap();
        assert_eq!(
            decoded,
            DecodedStream::Pose(DecodedPose {
                timestamp: Some(12.5),
                longitude: Some(8.4),
                latitude: Some(49.0),
                altitude: Some(100.0),
                x: Some(1.0),
                y: Some(2.0),
                z: Some(3.0),
                roll: None,
                pitch: None,
                yaw: None,
            })
        );
    }

    #[test]
    fn test_primitives_split_by_kind() {
        let set = PrimitiveSet::new()
            .with(
                "polygons",
                vec![json!({"vertices": [[0, 0, 0]], "base": {"object_id": "car-1"}})],
            )
            .with("points", vec![json!({"points": [[1, 1, 1]]})])
            .with("images", vec![json!({"data": "AA=="})]);

        let decoded = XvizStreamDecoder.primitives(&set, "/objects", 7.0, None).unwrap();

        assert_eq!(decoded.time, 7.0);
        assert_eq!(
            decoded.features,
            vec![json!({"vertices": [[0, 0, 0]], "id": "car-1", "type": "polygon"})]
        );
        assert_eq!(decoded.point_cloud.len(), 1);
        assert_eq!(decoded.point_cloud[0]["type"], "point");
        assert_eq!(decoded.images.len(), 1);
    }

    #[test]
    fn test_convert_primitive_applied() {
        let set = PrimitiveSet::new().with("circles", vec![json!({"center": [0, 0, 0], "radius": 1})]);
        let convert: &ConvertPrimitive = &|mut p: Primitive| {
            p["converted"] = json!(true);
            p
        };

        let decoded = XvizStreamDecoder
            .primitives(&set, "/c", 1.0, Some(convert))
            .unwrap();
        assert_eq!(decoded.features[0]["converted"], true);
    }

    #[test]
    fn test_unknown_primitive_type() {
        let set = PrimitiveSet::new().with("blobs", vec![json!({})]);
        let err = XvizStreamDecoder
            .decode_primitives(&Raw::encode(&set), "/x", 1.0, None)
            .unwrap_err();
        assert_eq!(
            err,
            DecodeError::UnknownPrimitiveType {
                stream: "/x".into(),
                primitive_type: "blobs".into(),
            }
        );
    }

    #[test]
    fn test_malformed_primitive() {
        let set = PrimitiveSet::new().with("polygons", vec![json!(42)]);
        let err = XvizStreamDecoder
            .decode_primitives(&Raw::encode(&set), "/x", 1.0, None)
            .unwrap_err();
        assert!(matches!(err, DecodeError::MalformedPrimitive { .. }));
    }

    #[test]
    fn test_variables() {
        let states = vec![
            VariableState {
                base: Some(ObjectBase {
                    object_id: Some("obj".into()),
                }),
                values: ValuesRaw {
                    strings: Some(vec!["go".into()]),
                    ..Default::default()
                },
            },
            VariableState {
                base: None,
                values: ValuesRaw {
                    doubles: Some(vec![1.0, 2.0]),
                    ..Default::default()
                },
            },
        ];

        let decoded = XvizStreamDecoder
            .decode_variables(&Raw::encode(&states), "/v", 3.0)
            .unwrap();
        assert_eq!(
            decoded,
            DecodedStream::Variable(DecodedVariable {
                time: 3.0,
                variables: vec![
                    VariableSeries {
                        object_id: Some("obj".into()),
                        values: vec![Scalar::Text("go".into())],
                    },
                    VariableSeries {
                        object_id: None,
                        values: vec![Scalar::Double(1.0), Scalar::Double(2.0)],
                    },
                ],
            })
        );
    }

    fn sample(timestamp: f64, streams: &[&str], doubles: Vec<f64>) -> Raw<TimeSeriesSampleRaw> {
        Raw::encode(&TimeSeriesSampleRaw {
            timestamp,
            object_id: None,
            streams: streams.iter().map(|s| s.to_string()).collect(),
            values: ValuesRaw {
                doubles: Some(doubles),
                ..Default::default()
            },
        })
    }

    #[test]
    fn test_time_series_fan_out_and_blacklist() {
        let samples = vec![
            sample(1.0, &["/speed", "/accel"], vec![10.0, 0.5]),
            sample(2.0, &["/speed"], vec![11.0]),
        ];
        let blacklist: StreamBlacklist = ["/accel"].into_iter().collect();

        let streams = XvizStreamDecoder.decode_time_series(&samples, &blacklist).unwrap();

        assert_eq!(streams.len(), 1);
        assert_eq!(
            streams["/speed"],
            DecodedStream::TimeSeries(DecodedTimeSeries {
                time: 2.0,
                value: Scalar::Double(11.0),
                object_id: None,
            })
        );
    }

    #[test]
    fn test_time_series_missing_value() {
        let samples = vec![sample(1.0, &["/a", "/b"], vec![1.0])];
        let err = XvizStreamDecoder
            .decode_time_series(&samples, &StreamBlacklist::new())
            .unwrap_err();
        assert_eq!(
            err,
            DecodeError::MissingTimeSeriesValue {
                stream: "/b".into(),
                index: 1,
            }
        );
    }

    #[test]
    fn test_futures() {
        let futures = FutureRaw {
            timestamps: vec![1.1, 1.2],
            primitives: vec![
                PrimitiveSet::new().with("polylines", vec![json!({"vertices": []})]),
                PrimitiveSet::new(),
            ],
        };

        let decoded = XvizStreamDecoder
            .decode_futures(&Raw::encode(&futures), "/plan", 1.0, None)
            .unwrap();
        let DecodedStream::Futures(decoded) = decoded else {
            panic!("expected futures");
        };
        assert_eq!(decoded.time, 1.0);
        assert_eq!(decoded.look_aheads.len(), 2);
        assert_eq!(decoded.look_aheads[0].timestamp, 1.1);
        assert_eq!(decoded.look_aheads[0].primitives.time, 1.1);
        assert_eq!(decoded.look_aheads[0].primitives.features[0]["type"], "polyline");
        assert!(decoded.look_aheads[1].primitives.is_empty());
    }

    #[test]
    fn test_futures_length_mismatch() {
        let futures = FutureRaw {
            timestamps: vec![1.1],
            primitives: vec![],
        };
        let err = XvizStreamDecoder
            .decode_futures(&Raw::encode(&futures), "/plan", 1.0, None)
            .unwrap_err();
        assert!(matches!(err, DecodeError::FutureLengthMismatch { timestamps: 1, primitives: 0, .. }));
    }

    #[test]
    fn test_malformed_pose_is_decode_error() {
        let pose: Raw<PoseRaw> = Raw::from_value(json!({"position": [1, 2]}));
        let err = XvizStreamDecoder.decode_pose(&pose).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::MalformedPayload { category: StreamCategory::Pose, stream: None, .. }
        ));
    }

    #[test]
    fn test_malformed_primitive_set_names_stream() {
        let set: Raw<PrimitiveSet> = Raw::from_value(json!("not a map"));
        let err = XvizStreamDecoder
            .decode_primitives(&set, "/objects", 1.0, None)
            .unwrap_err();
        assert!(matches!(
            err,
            DecodeError::MalformedPayload { category: StreamCategory::Primitive, stream: Some(ref s), .. }
                if s == "/objects"
        ));
    }

    #[test]
    fn test_missing_variables_field_is_empty() {
        let decoded = XvizStreamDecoder
            .decode_variables(&Raw::default(), "/v", 1.0)
            .unwrap();
        assert_eq!(
            decoded,
            DecodedStream::Variable(DecodedVariable {
                time: 1.0,
                variables: vec![],
            })
        );
    }

    #[test]
    fn test_blacklisted_time_series_sample_not_validated() {
        let samples = vec![
            Raw::from_value(json!({"streams": ["/hidden"], "values": {"doubles": "garbage"}})),
            sample(2.0, &["/speed"], vec![11.0]),
        ];
        let blacklist: StreamBlacklist = ["/hidden"].into_iter().collect();

        let streams = XvizStreamDecoder.decode_time_series(&samples, &blacklist).unwrap();

        assert_eq!(streams.keys().map(String::as_str).collect::<Vec<_>>(), vec!["/speed"]);
    }

    #[test]
    fn test_malformed_time_series_sample() {
        let samples: Vec<Raw<TimeSeriesSampleRaw>> =
            vec![Raw::from_value(json!({"streams": ["/speed"], "values": {"doubles": [1.0]}}))];
        let err = XvizStreamDecoder
            .decode_time_series(&samples, &StreamBlacklist::new())
            .unwrap_err();
        assert!(matches!(
            err,
            DecodeError::MalformedPayload { category: StreamCategory::TimeSeries, .. }
        ));
    }
}
