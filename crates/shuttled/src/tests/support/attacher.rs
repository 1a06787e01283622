//! In-memory stand-in for host-created shared-memory segments.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use shuttle_transport::{AttachError, Segment, SegmentAttacher};

type Store = Rc<RefCell<HashMap<String, Vec<u8>>>>;

/// Attacher backed by a map of named byte buffers. Clones share the map, so
/// a test can keep one handle and inspect what the worker wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryAttacher {
    segments: Store,
}

impl MemoryAttacher {
    /// Adds a segment, as the host would before sending the request.
    pub fn with_segment(self, name: &str, contents: Vec<u8>) -> Self {
        self.segments.borrow_mut().insert(name.to_owned(), contents);
        self
    }

    /// Current contents of the named segment.
    pub fn contents(&self, name: &str) -> Vec<u8> {
        self.segments
            .borrow()
            .get(name)
            .cloned()
            .expect("segment exists")
    }
}

impl SegmentAttacher for MemoryAttacher {
    type Segment = MemorySegment;

    fn attach(&self, name: &str) -> Result<MemorySegment, AttachError> {
        let bytes = self
            .segments
            .borrow()
            .get(name)
            .cloned()
            .ok_or(AttachError::NotFound)?;
        if bytes.is_empty() {
            return Err(AttachError::NotReady);
        }
        Ok(MemorySegment {
            name: name.to_owned(),
            bytes,
            store: Rc::clone(&self.segments),
        })
    }
}

/// Mapping that publishes its bytes back to the store when detached.
pub struct MemorySegment {
    name: String,
    bytes: Vec<u8>,
    store: Store,
}

impl Segment for MemorySegment {
    fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

impl Drop for MemorySegment {
    fn drop(&mut self) {
        self.store
            .borrow_mut()
            .insert(self.name.clone(), std::mem::take(&mut self.bytes));
    }
}
