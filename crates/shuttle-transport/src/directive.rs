//! Parsing of transport tokens from request metadata.
//!
//! Hosts prefix task metadata with an optional shared-memory clause:
//!
//! ```text
//! SHMEM <in_name> <in_size> [<out_name> <out_capacity>] <task tokens...>
//! ```
//!
//! The clause is parsed once into a [`TransportPlan`]; everything after it is
//! residual metadata handed to the task handler untouched.

use crate::error::TransportError;

/// Keyword that opens a shared-memory clause.
pub const SHMEM_KEYWORD: &str = "SHMEM";

/// Marker that identifies an output segment name.
pub const OUTPUT_SEGMENT_MARKER: &str = "_out_";

/// Placeholder hosts send when a task has no metadata.
pub const EMPTY_METADATA_PLACEHOLDER: &str = "NONE";

/// A named shared-memory segment and the byte count that applies to it.
///
/// For an input segment `size` is the exact payload length; for an output
/// segment it is the capacity the host reserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentRef {
    /// Segment name as sent by the host.
    pub name: String,
    /// Byte count.
    pub size: usize,
}

impl SegmentRef {
    /// Builds a segment description.
    #[must_use]
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }
}

/// Where a request's bulk data lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportDirective {
    /// Payloads travel through `input_<id>.dat` / `output_<id>.dat`.
    Inline,
    /// Input is read from a host-created segment; output goes to a second
    /// segment when one was offered.
    SharedSegment {
        /// Input segment and exact payload size.
        input: SegmentRef,
        /// Output segment and capacity, if offered.
        output: Option<SegmentRef>,
    },
}

/// Destination chosen for a handler's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Framed file in the working directory.
    File,
    /// Host-created output segment.
    Segment(SegmentRef),
}

/// A parsed transport directive plus the metadata left for the handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportPlan {
    directive: TransportDirective,
    metadata: Vec<String>,
}

impl TransportPlan {
    /// Splits `tokens` into a directive and residual metadata.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::IncompleteDirective`] when a `SHMEM` clause
    /// is missing a name or size and [`TransportError::InvalidInteger`] when
    /// a size or capacity does not parse.
    pub fn parse<S: AsRef<str>>(tokens: &[S]) -> Result<Self, TransportError> {
        let mut rest = tokens.iter().map(|token| token.as_ref());
        let mut lookahead = rest.clone();
        if lookahead.next() != Some(SHMEM_KEYWORD) {
            return Ok(Self {
                directive: TransportDirective::Inline,
                metadata: residual(rest),
            });
        }
        rest = lookahead;

        let input_name = rest.next().ok_or(TransportError::IncompleteDirective {
            missing: "input segment name",
        })?;
        let input_size = rest.next().ok_or(TransportError::IncompleteDirective {
            missing: "input segment size",
        })?;
        let input = SegmentRef::new(input_name, parse_size("input size", input_size)?);

        let mut lookahead = rest.clone();
        let output = match lookahead.next() {
            Some(name) if name.contains(OUTPUT_SEGMENT_MARKER) => {
                let capacity = lookahead.next().ok_or(TransportError::IncompleteDirective {
                    missing: "output segment capacity",
                })?;
                rest = lookahead;
                Some(SegmentRef::new(
                    name,
                    parse_size("output capacity", capacity)?,
                ))
            }
            _ => None,
        };

        Ok(Self {
            directive: TransportDirective::SharedSegment { input, output },
            metadata: residual(rest),
        })
    }

    /// How the input should be loaded.
    #[must_use]
    pub const fn directive(&self) -> &TransportDirective {
        &self.directive
    }

    /// Metadata tokens destined for the task handler.
    #[must_use]
    pub fn metadata(&self) -> &[String] {
        &self.metadata
    }

    /// Consumes the plan, returning the residual metadata.
    #[must_use]
    pub fn into_metadata(self) -> Vec<String> {
        self.metadata
    }

    /// Chooses the output destination. `force_file` applies the per-task
    /// policy that keeps small text results out of shared memory.
    #[must_use]
    pub fn output_target(&self, force_file: bool) -> OutputTarget {
        match &self.directive {
            TransportDirective::SharedSegment {
                output: Some(segment),
                ..
            } if !force_file => OutputTarget::Segment(segment.clone()),
            _ => OutputTarget::File,
        }
    }
}

fn parse_size(field: &'static str, token: &str) -> Result<usize, TransportError> {
    token
        .parse::<usize>()
        .map_err(|source| TransportError::invalid_integer(field, token, source))
}

fn residual<'a>(tokens: impl Iterator<Item = &'a str>) -> Vec<String> {
    let metadata: Vec<String> = tokens.map(str::to_owned).collect();
    if matches!(metadata.as_slice(), [only] if only == EMPTY_METADATA_PLACEHOLDER) {
        Vec::new()
    } else {
        metadata
    }
}
