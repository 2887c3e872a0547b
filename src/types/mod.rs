//! Core types for timeslice decoding

mod raw;
mod message;
mod category;
mod stream;
mod timeslice;

pub use raw::{
    Raw, Primitive, MapOrigin, PoseRaw, PrimitiveSet, ValuesRaw, ObjectBase, VariableState,
    VariableSet, TimeSeriesSampleRaw, FutureRaw,
};
pub use message::{TimesliceMessage, StateUpdate};
pub use category::{StreamCategory, StreamEntry};
pub use stream::{
    Scalar, DecodedPose, DecodedPrimitives, VariableSeries, DecodedVariable, DecodedTimeSeries,
    LookAhead, DecodedFutures, DecodedStream,
};
pub use timeslice::{MessageType, ParsedTimeslice};
