//! Stream categories and the per-stream dispatch unit

use crate::types::{FutureRaw, PoseRaw, PrimitiveSet, Raw, VariableSet};

/// The five stream categories of a state update, in output assembly order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StreamCategory {
    Pose,
    Primitive,
    Variable,
    TimeSeries,
    Future,
}

impl StreamCategory {
    /// Field name in the state update
    pub fn field(&self) -> &'static str {
        match self {
            Self::Pose => "poses",
            Self::Primitive => "primitives",
            Self::Variable => "variables",
            Self::TimeSeries => "time_series",
            Self::Future => "future_instances",
        }
    }
}

impl std::fmt::Display for StreamCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.field())
    }
}

/// One named stream of a merged update, carrying its undecoded category payload.
///
/// Time-series samples are not keyed by stream until decoded, so they are
/// decoded in one batch and never appear here.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEntry<'a> {
    Pose(&'a Raw<PoseRaw>),
    Primitive(&'a Raw<PrimitiveSet>),
    Variable(&'a Raw<VariableSet>),
    Future(&'a Raw<FutureRaw>),
}

impl StreamEntry<'_> {
    pub fn category(&self) -> StreamCategory {
        match self {
            Self::Pose(_) => StreamCategory::Pose,
            Self::Primitive(_) => StreamCategory::Primitive,
            Self::Variable(_) => StreamCategory::Variable,
            Self::Future(_) => StreamCategory::Future,
        }
    }
}
