//! Core modules for timeslice decoding

pub mod resolver;
pub mod aggregator;
pub mod decoder;
pub mod parser;

pub use resolver::{resolve, Resolution};
pub use aggregator::{dispatch, MergedUpdates, StateUpdateAggregator};
pub use decoder::{ConvertPrimitive, StreamDecoder, XvizStreamDecoder};
pub use parser::{parse_timeslice, TimesliceParser};
