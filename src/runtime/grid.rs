//! Grid-stride iteration and the index structs passed to indexed user
//! functions, mirroring what the device kernel computes.

/// Indices one worker visits: `id, id + workers, id + 2 * workers, ...`
/// while below `n`.
#[derive(Clone, Debug)]
pub struct GridStride {
    next: usize,
    stride: usize,
    n: usize,
}

impl GridStride {
    /// Worker `worker` of `workers`. A zero worker count yields nothing.
    pub fn new(worker: usize, workers: usize, n: usize) -> Self {
        let next = if workers == 0 { n } else { worker };
        Self {
            next,
            stride: workers,
            n,
        }
    }
}

impl Iterator for GridStride {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.next >= self.n {
            return None;
        }
        let i = self.next;
        self.next = self.next.saturating_add(self.stride);
        Some(i)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = if self.next >= self.n {
            0
        } else {
            (self.n - self.next - 1) / self.stride + 1
        };
        (left, Some(left))
    }
}

impl ExactSizeIterator for GridStride {}

/// Linear index: `{ i }`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Index1 {
    pub i: usize,
}

impl Index1 {
    pub fn at(base: usize, i: usize) -> Self {
        Self { i: base + i }
    }
}

/// Row/column index over rows of width `w`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Index2 {
    pub row: usize,
    pub col: usize,
}

impl Index2 {
    /// `None` when `w` is zero.
    pub fn at(base: usize, i: usize, w: usize) -> Option<Self> {
        let k = base + i;
        Some(Self {
            row: k.checked_div(w)?,
            col: k.checked_rem(w)?,
        })
    }
}
