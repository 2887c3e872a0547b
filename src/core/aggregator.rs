//! State update aggregation: merge, filter, dispatch
//!
//! Keyed categories merge last-write-wins in update order. Time-series
//! samples concatenate. Excluded streams never reach a decoder.

use std::borrow::Cow;
use std::collections::BTreeMap;

use crate::config::StreamBlacklist;
use crate::core::decoder::{ConvertPrimitive, StreamDecoder};
use crate::error::TimesliceResult;
use crate::types::{
    FutureRaw, PoseRaw, PrimitiveSet, Raw, StateUpdate, StreamCategory, StreamEntry,
    TimeSeriesSampleRaw, VariableSet,
};

/// All updates of a timeslice folded into one map per category
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedUpdates<'a> {
    pub poses: BTreeMap<&'a str, &'a Raw<PoseRaw>>,
    pub primitives: BTreeMap<&'a str, &'a Raw<PrimitiveSet>>,
    pub variables: BTreeMap<&'a str, &'a Raw<VariableSet>>,
    pub futures: BTreeMap<&'a str, &'a Raw<FutureRaw>>,
    pub time_series: Cow<'a, [Raw<TimeSeriesSampleRaw>]>,
}

impl<'a> MergedUpdates<'a> {
    /// Fold updates in order
    pub fn merge(updates: &'a [StateUpdate]) -> Self {
        let mut merged = MergedUpdates::default();

        for update in updates {
            merge_into(&mut merged.poses, update.poses.as_ref());
            merge_into(&mut merged.primitives, update.primitives.as_ref());
            merge_into(&mut merged.variables, update.variables.as_ref());
            merge_into(&mut merged.futures, update.future_instances.as_ref());

            if let Some(samples) = update.time_series.as_deref() {
                if merged.time_series.is_empty() {
                    merged.time_series = Cow::Borrowed(samples);
                } else {
                    merged.time_series.to_mut().extend_from_slice(samples);
                }
            }
        }

        merged
    }

    /// Keyed streams surviving the blacklist, in category assembly order
    pub fn entries(&self, blacklist: &StreamBlacklist) -> Vec<(&'a str, StreamEntry<'a>)> {
        let poses = self.poses.iter().map(|(n, p)| (*n, StreamEntry::Pose(*p)));
        let primitives = self
            .primitives
            .iter()
            .map(|(n, p)| (*n, StreamEntry::Primitive(*p)));
        let variables = self
            .variables
            .iter()
            .map(|(n, v)| (*n, StreamEntry::Variable(*v)));
        let futures = self.futures.iter().map(|(n, f)| (*n, StreamEntry::Future(*f)));

        poses
            .chain(primitives)
            .chain(variables)
            .chain(futures)
            .filter(|(name, entry)| {
                let excluded = blacklist.contains(name);
                if excluded {
                    log::trace!("skipping blacklisted {} stream {}", entry.category(), name);
                }
                !excluded
            })
            .collect()
    }
}

fn merge_into<'a, T>(acc: &mut BTreeMap<&'a str, &'a T>, source: Option<&'a BTreeMap<String, T>>) {
    if let Some(source) = source {
        acc.extend(source.iter().map(|(name, value)| (name.as_str(), value)));
    }
}

/// Route one keyed stream to its category decoder
pub fn dispatch<D: StreamDecoder>(
    decoder: &D,
    stream_name: &str,
    entry: &StreamEntry<'_>,
    timestamp: f64,
    convert_primitive: Option<&ConvertPrimitive>,
) -> TimesliceResult<D::Stream> {
    let stream = match entry {
        StreamEntry::Pose(pose) => decoder.decode_pose(pose)?,
        StreamEntry::Primitive(primitives) => {
            decoder.decode_primitives(primitives, stream_name, timestamp, convert_primitive)?
        }
        StreamEntry::Variable(variables) => {
            decoder.decode_variables(&variables.field("variables"), stream_name, timestamp)?
        }
        StreamEntry::Future(futures) => {
            decoder.decode_futures(futures, stream_name, timestamp, convert_primitive)?
        }
    };
    Ok(stream)
}

/// Decodes merged state updates into the stream map of a snapshot
pub struct StateUpdateAggregator<'a, D> {
    decoder: &'a D,
    blacklist: &'a StreamBlacklist,
}

impl<'a, D: StreamDecoder> StateUpdateAggregator<'a, D> {
    pub fn new(decoder: &'a D, blacklist: &'a StreamBlacklist) -> Self {
        Self { decoder, blacklist }
    }

    pub fn aggregate(
        &self,
        updates: &[StateUpdate],
        timestamp: f64,
        convert_primitive: Option<&ConvertPrimitive>,
    ) -> TimesliceResult<BTreeMap<String, D::Stream>> {
        let merged = MergedUpdates::merge(updates);
        let mut output = StreamOutput::default();

        let (keyed_first, keyed_last): (Vec<_>, Vec<_>) = merged
            .entries(self.blacklist)
            .into_iter()
            .partition(|(_, entry)| entry.category() < StreamCategory::TimeSeries);

        for (name, entry) in keyed_first {
            let stream = dispatch(self.decoder, name, &entry, timestamp, convert_primitive)?;
            output.insert(name.to_string(), entry.category(), stream);
        }

        if !merged.time_series.is_empty() {
            let decoded = self
                .decoder
                .decode_time_series(&merged.time_series, self.blacklist)?;
            for (name, stream) in decoded {
                output.insert(name, StreamCategory::TimeSeries, stream);
            }
        }

        for (name, entry) in keyed_last {
            let stream = dispatch(self.decoder, name, &entry, timestamp, convert_primitive)?;
            output.insert(name.to_string(), entry.category(), stream);
        }

        Ok(output.streams)
    }
}

/// Output map that remembers which category produced each stream
struct StreamOutput<S> {
    streams: BTreeMap<String, S>,
    origins: BTreeMap<String, StreamCategory>,
}

impl<S> Default for StreamOutput<S> {
    fn default() -> Self {
        Self {
            streams: BTreeMap::new(),
            origins: BTreeMap::new(),
        }
    }
}

impl<S> StreamOutput<S> {
    fn insert(&mut self, name: String, category: StreamCategory, stream: S) {
        if let Some(previous) = self.origins.insert(name.clone(), category) {
            if previous != category {
                log::warn!(
                    "stream {} decoded as both {} and {}, keeping the {} payload",
                    name,
                    previous,
                    category,
                    category
                );
            }
        }
        self.streams.insert(name, stream);
    }
}
