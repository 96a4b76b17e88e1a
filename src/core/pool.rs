//! Per-frame bump allocation.

/// Position in a pool returned by [`FramePool::mark`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolMark {
    cursor: usize,
    spill: usize,
}

/// Fixed-capacity bump allocator that is reset once per frame.
///
/// Each worker owns its own pool, so allocation needs no locking. When the
/// preallocated slots run out, values spill onto the heap and the overflow is
/// counted; nothing fails.
#[derive(Debug)]
pub struct FramePool<T> {
    slots: Vec<T>,
    cursor: usize,
    spill: Vec<T>,
    overflows: usize,
}

impl<T: Clone + Default> FramePool<T> {
    /// Create a pool with `capacity` preallocated slots.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![T::default(); capacity],
            cursor: 0,
            spill: Vec::new(),
            overflows: 0,
        }
    }

    /// Store a value and return its index.
    pub fn alloc(&mut self, value: T) -> usize {
        if let Some(slot) = self.slots.get_mut(self.cursor) {
            *slot = value;
            self.cursor += 1;
            self.cursor - 1
        } else {
            self.overflows += 1;
            self.spill.push(value);
            self.slots.len() + self.spill.len() - 1
        }
    }

    /// Value at an index returned by [`FramePool::alloc`].
    pub fn get(&self, index: usize) -> Option<&T> {
        if index < self.cursor {
            self.slots.get(index)
        } else {
            self.spill.get(index.checked_sub(self.slots.len())?)
        }
    }

    /// Current allocation position.
    #[inline]
    pub fn mark(&self) -> PoolMark {
        PoolMark {
            cursor: self.cursor,
            spill: self.spill.len(),
        }
    }

    /// Values allocated since `mark`, in allocation order.
    pub fn since(&self, mark: PoolMark) -> impl Iterator<Item = &T> {
        let slots = self.slots.get(mark.cursor..self.cursor).unwrap_or(&[]);
        let spill = self.spill.get(mark.spill..).unwrap_or(&[]);
        slots.iter().chain(spill.iter())
    }

    /// Release everything allocated after `mark`.
    pub fn rewind(&mut self, mark: PoolMark) {
        self.cursor = self.cursor.min(mark.cursor);
        self.spill.truncate(mark.spill);
    }

    /// Number of live values.
    #[inline]
    pub fn len(&self) -> usize {
        self.cursor + self.spill.len()
    }

    /// Whether the pool holds no values.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of preallocated slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Allocations that spilled to the heap since the last reset.
    #[inline]
    pub fn overflows(&self) -> usize {
        self.overflows
    }

    /// Start a new frame. Returns the overflow count of the frame that ended.
    pub fn reset(&mut self) -> usize {
        self.cursor = 0;
        self.spill.clear();
        std::mem::take(&mut self.overflows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_and_reset() {
        let mut pool = FramePool::<u32>::with_capacity(2);
        let a = pool.alloc(7);
        let b = pool.alloc(8);
        assert_eq!((pool.get(a), pool.get(b)), (Some(&7), Some(&8)));
        assert_eq!(pool.overflows(), 0);
        assert_eq!(pool.reset(), 0);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_overflow_spills_to_heap() {
        let mut pool = FramePool::<u32>::with_capacity(1);
        pool.alloc(1);
        let spilled = pool.alloc(2);
        assert_eq!(pool.get(spilled), Some(&2));
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.since(PoolMark { cursor: 0, spill: 0 }).copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(pool.reset(), 1);
        assert_eq!(pool.overflows(), 0);
    }

    #[test]
    fn test_rewind() {
        let mut pool = FramePool::<u32>::with_capacity(4);
        pool.alloc(1);
        let mark = pool.mark();
        pool.alloc(2);
        pool.alloc(3);
        assert_eq!(pool.since(mark).count(), 2);
        pool.rewind(mark);
        assert_eq!(pool.len(), 1);
    }
}
