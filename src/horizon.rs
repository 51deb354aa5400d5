// SPDX-License-Identifier: AGPL-3.0-or-later
//! [`Horizon`]: per-cell vertical sample arrays attached to a surface, packed
//! into one buffer with a precomputed prefix-sum of per-cell offsets. Built
//! fresh for each attribute request and dropped once the response is
//! assembled — it never outlives the request that created it.

/// `offsets[k+1] - offsets[k]` is the number of samples for output cell
/// `k`: `0` when the cell is fill or out of horizontal bounds, and
/// `window_size` otherwise.
#[derive(Debug, Clone)]
pub struct Horizon {
    buffer: Vec<f32>,
    offsets: Vec<usize>,
    nrows: usize,
    ncols: usize,
}

impl Horizon {
    /// Build the offsets table from a per-cell "is this cell populated"
    /// predicate, all populated cells sharing one `window_size` (the
    /// along-surface case). The backing buffer is allocated but left
    /// uninitialised (zero-filled) until the horizon fetch pass writes
    /// into it.
    pub fn with_offsets(nrows: usize, ncols: usize, window_size: usize, populated: &[bool]) -> Self {
        let sizes: Vec<usize> = populated
            .iter()
            .map(|&p| if p { window_size } else { 0 })
            .collect();
        Self::with_sizes(nrows, ncols, &sizes)
    }

    /// Build the offsets table from a per-cell window size (`0` for
    /// unpopulated); sizes may vary cell-to-cell, which the between-surfaces
    /// mode needs since each cell's top/bottom span is independent.
    pub fn with_sizes(nrows: usize, ncols: usize, sizes: &[usize]) -> Self {
        debug_assert_eq!(sizes.len(), nrows * ncols);
        let mut offsets = Vec::with_capacity(nrows * ncols + 1);
        offsets.push(0usize);
        let mut total = 0usize;
        for &size in sizes {
            total += size;
            offsets.push(total);
        }
        let alloc = total.max(1);
        Self {
            buffer: vec![0.0; alloc],
            offsets,
            nrows,
            ncols,
        }
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn hsize(&self) -> usize {
        self.nrows * self.ncols
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    pub fn buffer_mut(&mut self) -> &mut [f32] {
        &mut self.buffer
    }

    /// The packed window for output cell `k`; empty when the cell is
    /// unpopulated.
    pub fn cell_window(&self, k: usize) -> &[f32] {
        &self.buffer[self.offsets[k]..self.offsets[k + 1]]
    }

    pub fn is_populated(&self, k: usize) -> bool {
        self.offsets[k + 1] > self.offsets[k]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_skip_unpopulated_cells() {
        let populated = [true, false, true, true];
        let horizon = Horizon::with_offsets(2, 2, 5, &populated);
        assert_eq!(horizon.offsets(), &[0, 5, 5, 10, 15]);
        assert!(!horizon.is_populated(1));
        assert!(horizon.is_populated(2));
    }

    #[test]
    fn all_unpopulated_allocates_sentinel_element() {
        let populated = [false, false];
        let horizon = Horizon::with_offsets(1, 2, 3, &populated);
        assert_eq!(horizon.offsets(), &[0, 0, 0]);
        assert_eq!(horizon.buffer_mut().len(), 1);
    }
}
