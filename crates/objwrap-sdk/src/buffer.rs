//! Buffers and samples
//!
//! A `NativeBuffer` is an immutable, reference-counted chunk of bytes owned by
//! the native side. Buffers are built through `BufferBuilder` (allocate, then
//! fill) and frozen on `finish`. A `Sample` pairs a buffer with the caps that
//! describe its format.

use std::fmt;
use std::sync::Arc;

use crate::caps::Caps;
use crate::error::{NativeError, NativeResult};

// ============================================================================
// NativeBuffer
// ============================================================================

/// Immutable, reference-counted native byte buffer
#[derive(Clone, PartialEq, Eq)]
pub struct NativeBuffer {
    data: Arc<[u8]>,
    pts: Option<u64>,
    duration: Option<u64>,
}

impl NativeBuffer {
    /// Allocate a zero-filled writable buffer of `len` bytes
    pub fn allocate(len: usize) -> BufferBuilder {
        BufferBuilder {
            data: vec![0; len],
            pts: None,
            duration: None,
        }
    }

    /// Allocate and fill in one step
    pub fn copy_from_slice(bytes: &[u8]) -> Self {
        Self {
            data: Arc::from(bytes),
            pts: None,
            duration: None,
        }
    }

    /// Buffer contents
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Size in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer holds no bytes
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Presentation timestamp in nanoseconds
    pub fn pts(&self) -> Option<u64> {
        self.pts
    }

    /// Duration in nanoseconds
    pub fn duration(&self) -> Option<u64> {
        self.duration
    }

    /// Number of live references to the underlying bytes
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.data)
    }
}

impl fmt::Debug for NativeBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeBuffer")
            .field("len", &self.data.len())
            .field("pts", &self.pts)
            .field("duration", &self.duration)
            .finish()
    }
}

/// Writable buffer under construction
#[derive(Debug)]
pub struct BufferBuilder {
    data: Vec<u8>,
    pts: Option<u64>,
    duration: Option<u64>,
}

impl BufferBuilder {
    /// Copy `bytes` into the buffer starting at `offset`.
    ///
    /// Returns the number of bytes copied; fails if the range does not fit.
    pub fn fill(&mut self, offset: usize, bytes: &[u8]) -> NativeResult<usize> {
        let end = offset
            .checked_add(bytes.len())
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| {
                NativeError::Flow(format!(
                    "fill of {} bytes at offset {} overflows buffer of {}",
                    bytes.len(),
                    offset,
                    self.data.len()
                ))
            })?;
        self.data[offset..end].copy_from_slice(bytes);
        Ok(bytes.len())
    }

    /// Set the presentation timestamp
    pub fn pts(mut self, pts: u64) -> Self {
        self.pts = Some(pts);
        self
    }

    /// Set the duration
    pub fn duration(mut self, duration: u64) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Freeze the buffer
    pub fn finish(self) -> NativeBuffer {
        NativeBuffer {
            data: Arc::from(self.data),
            pts: self.pts,
            duration: self.duration,
        }
    }
}

// ============================================================================
// Sample
// ============================================================================

/// A buffer plus the caps describing its format
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Payload; a sample may legitimately carry no buffer
    pub buffer: Option<NativeBuffer>,
    /// Format description
    pub caps: Option<Caps>,
}

impl Sample {
    /// Sample with a buffer and caps
    pub fn new(buffer: NativeBuffer, caps: Option<Caps>) -> Self {
        Self {
            buffer: Some(buffer),
            caps,
        }
    }
}

/// Outcome of a blocking pull
#[derive(Debug, Clone, PartialEq)]
pub enum PullResult {
    /// A sample was produced
    Sample(Sample),
    /// The stream has ended; no further samples will follow
    EndOfStream,
    /// No sample right now (flushing, stopped, or timed out)
    Empty,
}

impl PullResult {
    /// Short label for the outcome
    pub fn status(&self) -> &'static str {
        match self {
            PullResult::Sample(_) => "sample",
            PullResult::EndOfStream => "eos",
            PullResult::Empty => "empty",
        }
    }
}

/// Result of pushing data into the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowReturn {
    /// Data accepted
    Ok,
    /// Pipeline is flushing
    Flushing,
    /// Pipeline already reached end of stream
    Eos,
    /// Format not negotiated
    NotNegotiated,
    /// Fatal error
    Error,
}

impl FlowReturn {
    /// Whether the data was accepted
    pub fn is_ok(self) -> bool {
        self == FlowReturn::Ok
    }
}

impl fmt::Display for FlowReturn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FlowReturn::Ok => "ok",
            FlowReturn::Flushing => "flushing",
            FlowReturn::Eos => "eos",
            FlowReturn::NotNegotiated => "not-negotiated",
            FlowReturn::Error => "error",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_and_fill() {
        let mut builder = NativeBuffer::allocate(6);
        assert_eq!(builder.fill(0, b"abc").unwrap(), 3);
        assert_eq!(builder.fill(3, b"def").unwrap(), 3);
        let buf = builder.finish();
        assert_eq!(buf.as_slice(), b"abcdef");
        assert_eq!(buf.len(), 6);
    }

    #[test]
    fn test_fill_out_of_range() {
        let mut builder = NativeBuffer::allocate(2);
        assert!(builder.fill(1, b"abc").is_err());
        assert!(builder.fill(usize::MAX, b"a").is_err());
    }

    #[test]
    fn test_zero_length_buffer() {
        let buf = NativeBuffer::allocate(0).finish();
        assert!(buf.is_empty());
    }

    #[test]
    fn test_timestamps() {
        let buf = NativeBuffer::allocate(1).pts(40).duration(20).finish();
        assert_eq!(buf.pts(), Some(40));
        assert_eq!(buf.duration(), Some(20));
    }

    #[test]
    fn test_ref_count_tracks_clones() {
        let buf = NativeBuffer::copy_from_slice(b"xy");
        assert_eq!(buf.ref_count(), 1);
        let other = buf.clone();
        assert_eq!(buf.ref_count(), 2);
        drop(other);
        assert_eq!(buf.ref_count(), 1);
    }

    #[test]
    fn test_pull_result_status() {
        assert_eq!(PullResult::EndOfStream.status(), "eos");
        assert_eq!(PullResult::Empty.status(), "empty");
    }
}
