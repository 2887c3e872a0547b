//! Timeslice parser: resolver + aggregator
//!
//! message → resolve (may short-circuit to INCOMPLETE) → aggregate → snapshot

use crate::config::{self, ParserConfig};
use crate::core::aggregator::StateUpdateAggregator;
use crate::core::decoder::{ConvertPrimitive, StreamDecoder, XvizStreamDecoder};
use crate::core::resolver::{resolve, Resolution};
use crate::error::TimesliceResult;
use crate::types::{ParsedTimeslice, TimesliceMessage};

/// Parses timeslice messages against a fixed config and decoder
#[derive(Debug, Clone, Copy)]
pub struct TimesliceParser<'a, D = XvizStreamDecoder> {
    config: &'a ParserConfig,
    decoder: D,
}

impl<'a> TimesliceParser<'a, XvizStreamDecoder> {
    /// Parser with the XVIZ v2 stream decoder
    pub fn new(config: &'a ParserConfig) -> Self {
        Self::with_decoder(config, XvizStreamDecoder::new())
    }
}

impl TimesliceParser<'static, XvizStreamDecoder> {
    /// Parser reading the process-wide config
    pub fn from_global() -> Self {
        Self::new(config::global())
    }
}

impl<'a, D: StreamDecoder> TimesliceParser<'a, D> {
    pub fn with_decoder(config: &'a ParserConfig, decoder: D) -> Self {
        Self { config, decoder }
    }

    pub fn config(&self) -> &ParserConfig {
        self.config
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    /// Parse one timeslice.
    ///
    /// Returns `ParsedTimeslice::Incomplete` when no timestamp can be
    /// resolved yet. Unsupported update types or counts and decoder failures
    /// are errors; nothing is returned partially.
    pub fn parse(
        &self,
        message: &TimesliceMessage,
        convert_primitive: Option<&ConvertPrimitive>,
    ) -> TimesliceResult<ParsedTimeslice<D::Stream>> {
        let (timestamp, updates) = match resolve(message)? {
            Resolution::Ready { timestamp, updates } => (timestamp, updates),
            Resolution::Incomplete => return Ok(ParsedTimeslice::Incomplete),
        };

        let streams = StateUpdateAggregator::new(&self.decoder, &self.config.stream_blacklist)
            .aggregate(updates, timestamp, convert_primitive)?;

        log::debug!("timeslice {} parsed: {} streams", timestamp, streams.len());

        Ok(ParsedTimeslice::Timeslice { timestamp, streams })
    }
}

/// Parse a timeslice with an explicit config and the XVIZ v2 decoder
pub fn parse_timeslice(
    message: &TimesliceMessage,
    config: &ParserConfig,
    convert_primitive: Option<&ConvertPrimitive>,
) -> TimesliceResult<ParsedTimeslice<crate::types::DecodedStream>> {
    TimesliceParser::new(config).parse(message, convert_primitive)
}
