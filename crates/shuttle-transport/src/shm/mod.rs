//! Attaching to host-created shared-memory segments.
//!
//! The worker never creates or destroys segments. It maps an existing one,
//! copies a bounded byte range in or out, and unmaps it again.

mod retry;

#[cfg(unix)]
mod posix;
#[cfg(not(unix))]
mod unsupported;

use std::fmt;
use std::thread;

use crate::error::TransportError;

pub use retry::RetryPolicy;

#[cfg(unix)]
pub use posix::{PosixAttacher, PosixSegment, normalise_name};
#[cfg(not(unix))]
pub use unsupported::UnsupportedAttacher;

/// Attacher used for the current platform.
#[cfg(unix)]
pub type PlatformAttacher = PosixAttacher;
/// Attacher used for the current platform.
#[cfg(not(unix))]
pub type PlatformAttacher = UnsupportedAttacher;

const SHM_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::shm");

/// A mapped segment. Dropping it detaches the mapping.
pub trait Segment {
    /// Mapped bytes.
    fn as_bytes(&self) -> &[u8];

    /// Mapped bytes, writable.
    fn as_bytes_mut(&mut self) -> &mut [u8];

    /// Size of the backing store.
    fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Whether the backing store is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Why a single attach attempt failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachError {
    /// No segment with that name exists yet.
    NotFound,
    /// The segment exists but has not been sized by the host.
    NotReady,
    /// The platform cannot map shared memory at all.
    Unsupported,
    /// Any other failure, described.
    Other(String),
}

impl fmt::Display for AttachError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => f.write_str("segment not found"),
            Self::NotReady => f.write_str("segment has zero length"),
            Self::Unsupported => f.write_str("shared memory unsupported"),
            Self::Other(reason) => f.write_str(reason),
        }
    }
}

/// Opens named segments. The seam lets tests substitute a scripted attacher
/// for the operating system.
pub trait SegmentAttacher {
    /// Mapping returned by a successful attach.
    type Segment: Segment;

    /// Makes one attempt to map the segment called `name`.
    ///
    /// # Errors
    ///
    /// Returns the [`AttachError`] describing why this attempt failed.
    fn attach(&self, name: &str) -> Result<Self::Segment, AttachError>;
}

/// Reads and writes host-created segments with bounded attach retries.
#[derive(Debug, Clone, Default)]
pub struct SharedMemoryAccessor<A = PlatformAttacher> {
    attacher: A,
    policy: RetryPolicy,
}

impl<A: SegmentAttacher> SharedMemoryAccessor<A> {
    /// Creates an accessor using `attacher` and `policy`.
    #[must_use]
    pub const fn new(attacher: A, policy: RetryPolicy) -> Self {
        Self { attacher, policy }
    }

    /// Retry schedule in effect.
    #[must_use]
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Copies the first `size` bytes out of segment `name`.
    ///
    /// # Errors
    ///
    /// Fails when every attach attempt fails or the segment is smaller than
    /// `size`.
    pub fn attach_and_read(&self, name: &str, size: usize) -> Result<Vec<u8>, TransportError> {
        let segment = self.attach_with_retry(name)?;
        let bytes = segment
            .as_bytes()
            .get(..size)
            .ok_or_else(|| TransportError::SegmentTooSmall {
                name: name.to_owned(),
                requested: size,
                available: segment.len(),
            })?;
        Ok(bytes.to_vec())
    }

    /// Copies `payload` into the start of segment `name` and returns the
    /// number of bytes written.
    ///
    /// Capacity is checked before any attach so an oversized payload never
    /// touches the segment.
    ///
    /// # Errors
    ///
    /// Fails when `payload` exceeds `capacity` or the segment's real size,
    /// or when every attach attempt fails.
    pub fn attach_and_write(
        &self,
        name: &str,
        capacity: usize,
        payload: &[u8],
    ) -> Result<usize, TransportError> {
        if payload.len() > capacity {
            return Err(TransportError::CapacityExceeded {
                name: name.to_owned(),
                len: payload.len(),
                capacity,
            });
        }

        let mut segment = self.attach_with_retry(name)?;
        let available = segment.len();
        let target = segment
            .as_bytes_mut()
            .get_mut(..payload.len())
            .ok_or_else(|| TransportError::SegmentTooSmall {
                name: name.to_owned(),
                requested: payload.len(),
                available,
            })?;
        target.copy_from_slice(payload);
        Ok(payload.len())
    }

    fn attach_with_retry(&self, name: &str) -> Result<A::Segment, TransportError> {
        let attempts = self.policy.attempts.max(1);
        let mut last = AttachError::NotFound;
        for attempt in 0..attempts {
            match self.attacher.attach(name) {
                Ok(segment) => {
                    tracing::debug!(
                        target: SHM_TARGET,
                        segment = name,
                        attempt = attempt + 1,
                        len = segment.len(),
                        "attached shared memory"
                    );
                    return Ok(segment);
                }
                Err(AttachError::Unsupported) => return Err(TransportError::Unsupported),
                Err(error) => {
                    tracing::debug!(
                        target: SHM_TARGET,
                        segment = name,
                        attempt = attempt + 1,
                        reason = %error,
                        "attach attempt failed"
                    );
                    last = error;
                }
            }
            if attempt + 1 < attempts {
                thread::sleep(self.policy.delay_for(attempt));
            }
        }

        tracing::warn!(
            target: SHM_TARGET,
            segment = name,
            attempts,
            reason = %last,
            "giving up on shared memory attach"
        );
        Err(TransportError::AttachExhausted {
            name: name.to_owned(),
            attempts,
            reason: last.to_string(),
        })
    }
}
