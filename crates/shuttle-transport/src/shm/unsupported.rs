use super::{AttachError, Segment, SegmentAttacher};

/// Attacher for platforms without POSIX shared memory. Every attach fails
/// with [`AttachError::Unsupported`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedAttacher;

/// Placeholder segment type; never constructed.
#[derive(Debug)]
pub enum NoSegment {}

impl Segment for NoSegment {
    fn as_bytes(&self) -> &[u8] {
        match *self {}
    }

    fn as_bytes_mut(&mut self) -> &mut [u8] {
        match *self {}
    }
}

impl SegmentAttacher for UnsupportedAttacher {
    type Segment = NoSegment;

    fn attach(&self, _name: &str) -> Result<NoSegment, AttachError> {
        Err(AttachError::Unsupported)
    }
}
