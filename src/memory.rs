//! Guest Linear Memory
//!
//! The host obtains scratch space in guest memory through the exported
//! `malloc`, writes a host-call result there and hands the pointer back
//! through an out-parameter. [`HostBuffer`] takes ownership of such a region
//! and releases it exactly once when dropped.
//!
//! There is no `free` export: every region handed out by `malloc` is
//! reclaimed guest-side by the wrapper that received it.

use std::alloc::{self, Layout};
use std::fmt;
use std::mem::ManuallyDrop;
use std::ops::Deref;
use std::ptr::NonNull;
use std::slice;

use bytes::Bytes;

#[cfg(all(target_arch = "wasm32", not(target_os = "unknown")))]
compile_error!(
    "the guest `malloc` export needs wasm32-unknown-unknown; \
     wasi targets already export libc malloc"
);

/// Allocate `size` bytes in guest linear memory.
///
/// Called by the host to reserve space for out-buffers before a host call
/// returns. A zero-sized request returns a non-null dangling pointer that
/// must never be dereferenced; it is not an allocation and is never freed.
///
/// The symbol is only exported unmangled on `wasm32-unknown-unknown`.
/// Native test builds and wasi targets link a C `malloc` of their own.
#[cfg_attr(all(target_arch = "wasm32", target_os = "unknown"), no_mangle)]
pub extern "C" fn malloc(size: usize) -> *mut u8 {
    if size == 0 {
        return NonNull::<u8>::dangling().as_ptr();
    }
    let layout = match Layout::array::<u8>(size) {
        Ok(layout) => layout,
        Err(_) => return std::ptr::null_mut(),
    };
    // SAFETY: layout has a non-zero size
    let ptr = unsafe { alloc::alloc(layout) };
    if ptr.is_null() {
        alloc::handle_alloc_error(layout);
    }
    ptr
}

/// A region of guest memory filled in by the host.
///
/// The region was obtained from [`malloc`] with exactly `len` bytes.
pub struct HostBuffer {
    ptr: NonNull<u8>,
    len: usize,
}

impl HostBuffer {
    /// Take ownership of a host-written out-buffer.
    ///
    /// Returns `None` when the host left the pointer null.
    ///
    /// # Safety
    /// `ptr` must be null, or come from [`malloc`] called with `len`, and
    /// must not be owned by any other `HostBuffer`.
    pub unsafe fn from_raw(ptr: *mut u8, len: usize) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| HostBuffer { ptr, len })
    }

    /// Copy `data` into a fresh `malloc` region
    pub fn copy_from(data: &[u8]) -> Self {
        let ptr = malloc(data.len());
        if !data.is_empty() {
            // SAFETY: ptr is a fresh allocation of data.len() bytes
            unsafe { std::ptr::copy_nonoverlapping(data.as_ptr(), ptr, data.len()) };
        }
        HostBuffer {
            ptr: NonNull::new(ptr).unwrap_or(NonNull::dangling()),
            len: data.len(),
        }
    }

    /// Give up ownership, returning the raw pointer and length
    pub fn into_raw(self) -> (*mut u8, usize) {
        let this = ManuallyDrop::new(self);
        (this.ptr.as_ptr(), this.len)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Convert into a `Vec` without copying
    pub fn into_vec(self) -> Vec<u8> {
        let this = ManuallyDrop::new(self);
        if this.len == 0 {
            return Vec::new();
        }
        // SAFETY: the region was allocated with Layout::array::<u8>(len)
        unsafe { Vec::from_raw_parts(this.ptr.as_ptr(), this.len, this.len) }
    }

    pub fn into_bytes(self) -> Bytes {
        Bytes::from(self.into_vec())
    }

    pub fn into_string_lossy(self) -> String {
        match String::from_utf8(self.into_vec()) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        }
    }
}

impl Deref for HostBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        if self.len == 0 {
            return &[];
        }
        // SAFETY: ptr owns len initialized bytes written by the host
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl AsRef<[u8]> for HostBuffer {
    fn as_ref(&self) -> &[u8] {
        self
    }
}

impl Drop for HostBuffer {
    fn drop(&mut self) {
        if self.len == 0 {
            return;
        }
        if let Ok(layout) = Layout::array::<u8>(self.len) {
            // SAFETY: allocated by malloc with the same layout, dropped once
            unsafe { alloc::dealloc(self.ptr.as_ptr(), layout) };
        }
    }
}

impl fmt::Debug for HostBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostBuffer").field("len", &self.len).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malloc_zero_is_non_null() {
        let ptr = malloc(0);
        assert!(!ptr.is_null());
        let buf = unsafe { HostBuffer::from_raw(ptr, 0) }.unwrap();
        assert!(buf.is_empty());
        assert_eq!(&buf[..], b"");
    }

    #[test]
    fn test_null_pointer_is_none() {
        assert!(unsafe { HostBuffer::from_raw(std::ptr::null_mut(), 4) }.is_none());
    }

    #[test]
    fn test_host_written_region_round_trip() {
        let ptr = malloc(5);
        unsafe { std::ptr::copy_nonoverlapping(b"hello".as_ptr(), ptr, 5) };
        let buf = unsafe { HostBuffer::from_raw(ptr, 5) }.unwrap();
        assert_eq!(&buf[..], b"hello");
        assert_eq!(buf.into_vec(), b"hello".to_vec());
    }

    #[test]
    fn test_copy_from_and_into_raw() {
        let buf = HostBuffer::copy_from(b"abc");
        let (ptr, len) = buf.into_raw();
        let buf = unsafe { HostBuffer::from_raw(ptr, len) }.unwrap();
        assert_eq!(buf.into_bytes(), Bytes::from_static(b"abc"));
    }

    #[test]
    fn test_malloc_region_is_owned_by_rust_allocator() {
        let ptr = malloc(4);
        unsafe { std::ptr::copy_nonoverlapping(b"abcd".as_ptr(), ptr, 4) };
        let mut vec = unsafe { HostBuffer::from_raw(ptr, 4) }.unwrap().into_vec();
        assert_eq!(vec.capacity(), 4);
        // growing reallocates through the global allocator
        vec.extend_from_slice(b"efgh");
        assert_eq!(vec, b"abcdefgh");
    }

    #[test]
    fn test_into_string_lossy() {
        let buf = HostBuffer::copy_from(&[b'o', b'k', 0xff]);
        assert_eq!(buf.into_string_lossy(), "ok\u{fffd}");
    }
}
