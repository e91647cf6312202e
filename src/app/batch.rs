//! Batch window selection over the filtered descriptor sequence
//!
//! A run can be limited to a contiguous index range of the filtered document
//! list, either with explicit start/end indices or with a batch size. Out-of-
//! range starts are reported as errors rather than silently clamped; an end
//! beyond the sequence is clamped, matching how a fixed batch size walks off
//! the tail of the list.

use std::ops::Range;

use crate::errors::{BatchError, BatchResult};

/// A contiguous index range selected for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchWindow {
    /// First index to process
    pub start: usize,
    /// One past the last index to process, if bounded explicitly
    pub end: Option<usize>,
}

impl BatchWindow {
    /// Create a window from optional CLI-style start/end indices
    pub fn new(start: usize, end: Option<usize>) -> Self {
        Self { start, end }
    }

    /// Resolve this window against a sequence of `length` documents
    ///
    /// When `end` is unset and `batch_size` is non-zero, the window covers
    /// `batch_size` documents from `start`; with both unset it covers the
    /// whole sequence. Errors if `start` lies beyond the sequence or beyond
    /// an explicit `end`.
    pub fn resolve(&self, length: usize, batch_size: usize) -> BatchResult<Range<usize>> {
        if self.start > length {
            return Err(BatchError::StartBeyondLength {
                start: self.start,
                length,
            });
        }

        let end = match self.end {
            Some(end) => {
                if self.start > end {
                    return Err(BatchError::StartAfterEnd {
                        start: self.start,
                        end,
                    });
                }
                end.min(length)
            }
            None if batch_size > 0 => (self.start + batch_size).min(length),
            None => length,
        };

        Ok(self.start..end)
    }
}
