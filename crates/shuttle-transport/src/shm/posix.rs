use std::fs::File;
use std::num::NonZeroUsize;
use std::ptr::NonNull;

use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::sys::mman::{MapFlags, ProtFlags, mmap, munmap, shm_open};
use nix::sys::stat::Mode;

use super::{AttachError, SHM_TARGET, Segment, SegmentAttacher};

/// Prefixes `/` to a segment name unless it already has one, matching the
/// POSIX naming the host runtime uses.
#[must_use]
pub fn normalise_name(name: &str) -> String {
    if name.starts_with('/') {
        name.to_owned()
    } else {
        format!("/{name}")
    }
}

/// Maps POSIX shared-memory objects with `shm_open` and `mmap`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PosixAttacher;

impl SegmentAttacher for PosixAttacher {
    type Segment = PosixSegment;

    fn attach(&self, name: &str) -> Result<PosixSegment, AttachError> {
        let path = normalise_name(name);
        let fd = shm_open(path.as_str(), OFlag::O_RDWR, Mode::empty()).map_err(|errno| {
            if errno == Errno::ENOENT {
                AttachError::NotFound
            } else {
                AttachError::Other(format!("shm_open: {errno}"))
            }
        })?;
        let file = File::from(fd);
        let raw_len = file
            .metadata()
            .map_err(|error| AttachError::Other(format!("fstat: {error}")))?
            .len();
        let len = usize::try_from(raw_len)
            .map_err(|_| AttachError::Other(format!("segment size {raw_len} overflows usize")))?;
        let Some(length) = NonZeroUsize::new(len) else {
            return Err(AttachError::NotReady);
        };

        // SAFETY: a fresh shared mapping of a descriptor we own; the kernel
        // chooses the address and the length matches the object's size.
        let ptr = unsafe {
            mmap(
                None,
                length,
                ProtFlags::PROT_READ | ProtFlags::PROT_WRITE,
                MapFlags::MAP_SHARED,
                &file,
                0,
            )
        }
        .map_err(|errno| AttachError::Other(format!("mmap: {errno}")))?;

        Ok(PosixSegment {
            ptr: ptr.cast::<u8>(),
            len,
        })
    }
}

/// A live `MAP_SHARED` mapping. The descriptor is closed as soon as the
/// mapping exists; dropping the segment unmaps it without unlinking.
#[derive(Debug)]
pub struct PosixSegment {
    ptr: NonNull<u8>,
    len: usize,
}

impl Segment for PosixSegment {
    fn as_bytes(&self) -> &[u8] {
        // SAFETY: `ptr` points at `len` mapped bytes that live until drop.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    fn as_bytes_mut(&mut self) -> &mut [u8] {
        // SAFETY: as above, and `&mut self` guarantees exclusive access
        // within this process.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    fn len(&self) -> usize {
        self.len
    }
}

impl Drop for PosixSegment {
    fn drop(&mut self) {
        // SAFETY: the mapping was created by `mmap` with this length and is
        // not referenced after drop.
        if let Err(errno) = unsafe { munmap(self.ptr.cast(), self.len) } {
            tracing::warn!(target: SHM_TARGET, %errno, "failed to unmap shared memory");
        }
    }
}
