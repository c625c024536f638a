//! Two-phase region allocator.
//!
//! Archive loading always knows how much memory it needs before it touches
//! any payload bytes: the header declares the entry-table size, and a scan of
//! the table declares every payload size. The [`Arena`] exploits that with a
//! "measure, then carve" discipline:
//!
//! 1. Estimate phase: [`Arena::add_estimate`] accumulates sizes (with
//!    alignment padding) without allocating anything.
//! 2. [`Arena::end_estimate`] obtains one backing buffer of exactly the
//!    accumulated total.
//! 3. Committed phase: [`Arena::alloc`] carves sub-ranges off a bump cursor.
//!
//! There is no per-region free; the whole buffer is released in one step by
//! [`Arena::reset`] or by dropping the arena. Allocations are handed out as
//! [`ArenaSlot`] offsets rather than references, so callers can hold slots
//! across later allocations and resolve them through [`Arena::slice`] /
//! [`Arena::slice_mut`] when the bytes are actually needed.

use thiserror::Error;

/// Errors from misusing or exhausting the arena.
///
/// An `OutOfCapacity` is not a recoverable runtime condition: the estimate
/// pass scans the same data the allocation pass consumes, so exceeding the
/// committed buffer means the two passes disagreed and the operation must
/// abort. The arena never grows past its estimate.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArenaError {
    #[error("arena out of capacity: requested {requested} bytes, {available} remaining")]
    OutOfCapacity { requested: usize, available: usize },

    #[error("arena is not in the {required} state")]
    WrongState { required: &'static str },
}

/// A sub-range of the arena's backing buffer.
///
/// Slots are plain offset/length pairs and stay valid for the lifetime of
/// the committed buffer (until the next `reset`/`begin_estimate`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaSlot {
    offset: usize,
    len: usize,
}

impl ArenaSlot {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[derive(Debug, PartialEq, Eq)]
enum State {
    Estimating,
    Committed,
}

/// Region allocator with an estimate/commit lifecycle.
#[derive(Debug)]
pub struct Arena {
    state: State,
    planned: usize,
    cursor: usize,
    buf: Vec<u8>,
}

impl Arena {
    /// Create an empty arena in estimate mode.
    pub fn new() -> Self {
        Self {
            state: State::Estimating,
            planned: 0,
            cursor: 0,
            buf: Vec::new(),
        }
    }

    /// Reset all bookkeeping and release the backing buffer, returning the
    /// arena to estimate mode. Outstanding [`ArenaSlot`]s are invalidated.
    pub fn begin_estimate(&mut self) {
        self.state = State::Estimating;
        self.planned = 0;
        self.cursor = 0;
        self.buf = Vec::new();
    }

    /// Alias for [`Arena::begin_estimate`]; releases the whole region in one step.
    pub fn reset(&mut self) {
        self.begin_estimate();
    }

    /// Account for a future allocation of `size` bytes at the given
    /// alignment. Valid only in estimate mode; nothing is allocated.
    pub fn add_estimate(&mut self, size: usize, align: usize) -> Result<(), ArenaError> {
        if self.state != State::Estimating {
            return Err(ArenaError::WrongState {
                required: "estimating",
            });
        }
        self.planned = align_up(self.planned, align).saturating_add(size);
        Ok(())
    }

    /// Obtain the backing buffer sized to the accumulated estimate and enter
    /// committed mode.
    pub fn end_estimate(&mut self) -> Result<(), ArenaError> {
        if self.state != State::Estimating {
            return Err(ArenaError::WrongState {
                required: "estimating",
            });
        }
        self.buf = vec![0u8; self.planned];
        self.cursor = 0;
        self.state = State::Committed;
        Ok(())
    }

    /// Carve `size` bytes off the bump cursor, rounded up to `align`.
    ///
    /// Valid only in committed mode. Fails with
    /// [`ArenaError::OutOfCapacity`] if the cursor would pass the end of the
    /// committed buffer.
    pub fn alloc(&mut self, size: usize, align: usize) -> Result<ArenaSlot, ArenaError> {
        if self.state != State::Committed {
            return Err(ArenaError::WrongState {
                required: "committed",
            });
        }
        let offset = align_up(self.cursor, align);
        let end = offset.saturating_add(size);
        if end > self.buf.len() {
            return Err(ArenaError::OutOfCapacity {
                requested: size,
                available: self.buf.len().saturating_sub(offset),
            });
        }
        self.cursor = end;
        Ok(ArenaSlot { offset, len: size })
    }

    /// Resolve a slot to its bytes.
    pub fn slice(&self, slot: ArenaSlot) -> &[u8] {
        &self.buf[slot.offset..slot.offset + slot.len]
    }

    /// Resolve a slot to its bytes, mutably.
    pub fn slice_mut(&mut self, slot: ArenaSlot) -> &mut [u8] {
        &mut self.buf[slot.offset..slot.offset + slot.len]
    }

    /// Size of the committed buffer (0 while estimating).
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Bytes accounted for so far by the estimate pass.
    pub fn planned_bytes(&self) -> usize {
        self.planned
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

/// Round `n` up to the next multiple of `align` (a power of two).
fn align_up(n: usize, align: usize) -> usize {
    debug_assert!(align.is_power_of_two());
    (n.saturating_add(align - 1)) & !(align - 1)
}
