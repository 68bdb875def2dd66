//! Sliding-window generation over 2D image grids
//!
//! Windows cover the full extent of the image even when the step does not
//! evenly divide it: the start sequence overshoots by the division
//! remainder and any start whose window would overrun is clamped back to
//! the last valid position, so the trailing edge is always covered.

use ndarray::{ArrayView3, s};

/// A window position: top-left corner plus extents.
///
/// `height` runs along rows, `width` along columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub row: usize,
    pub col: usize,
    pub height: usize,
    pub width: usize,
}

/// Start positions along one axis.
///
/// Positions advance by `step` up to `dim - win + offset` inclusive,
/// where `offset = (dim - win) % step`; the final overshooting start (if
/// any) is clamped to `dim - win`. A window larger than the axis, or a
/// zero step/extent, yields no positions.
fn axis_starts(dim: usize, win: usize, step: usize) -> Vec<usize> {
    if win == 0 || step == 0 || win > dim {
        return Vec::new();
    }
    let last = dim - win;
    let offset = last % step;
    let mut starts = Vec::with_capacity(last / step + 2);
    let mut x = 0;
    while x <= last + offset {
        starts.push(x.min(last));
        x += step;
    }
    starts
}

/// Iterator over every window position covering a `(rows, cols)` grid.
///
/// Row-major: the outer axis is rows, the inner is columns. Each call to
/// [`sliding_windows`] builds a fresh iterator, so the sequence is
/// restartable by recall.
#[derive(Debug, Clone)]
pub struct SlidingWindows {
    row_starts: Vec<usize>,
    col_starts: Vec<usize>,
    window: (usize, usize),
    index: usize,
}

impl Iterator for SlidingWindows {
    type Item = Window;

    fn next(&mut self) -> Option<Self::Item> {
        let total = self.row_starts.len() * self.col_starts.len();
        if self.index >= total {
            return None;
        }
        let r = self.index / self.col_starts.len();
        let c = self.index % self.col_starts.len();
        self.index += 1;
        Some(Window {
            row: self.row_starts[r],
            col: self.col_starts[c],
            height: self.window.0,
            width: self.window.1,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let total = self.row_starts.len() * self.col_starts.len();
        let remaining = total - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SlidingWindows {}

/// Generate window positions over a `(rows, cols)` grid.
///
/// `window` is `(height, width)` in the same `(rows, cols)` order as
/// `shape`.
pub fn sliding_windows(shape: (usize, usize), step: usize, window: (usize, usize)) -> SlidingWindows {
    SlidingWindows {
        row_starts: axis_starts(shape.0, window.0, step),
        col_starts: axis_starts(shape.1, window.1, step),
        window,
        index: 0,
    }
}

/// Generate windows over an image cube together with their data views.
///
/// The sub-views borrow from `image`; nothing is materialized until the
/// consumer copies a view out.
pub fn windows_of<'a, T>(
    image: ArrayView3<'a, T>,
    step: usize,
    window: (usize, usize),
) -> impl Iterator<Item = (ArrayView3<'a, T>, Window)> {
    let shape = (image.shape()[0], image.shape()[1]);
    sliding_windows(shape, step, window).map(move |w| {
        let view = image
            .clone()
            .slice_move(s![w.row..w.row + w.height, w.col..w.col + w.width, ..]);
        (view, w)
    })
}

/// Exact number of windows [`sliding_windows`] will yield.
pub fn count_sliding_window(shape: (usize, usize), step: usize, window: (usize, usize)) -> usize {
    sliding_windows(shape, step, window).len()
}

/// Batch an iterator into fixed-size chunks.
///
/// The final chunk may be shorter; no padding is ever added. A zero `n`
/// yields nothing.
pub fn grouper<I: IntoIterator>(n: usize, iterable: I) -> Grouper<I::IntoIter> {
    Grouper {
        inner: iterable.into_iter(),
        n,
    }
}

pub struct Grouper<I: Iterator> {
    inner: I,
    n: usize,
}

impl<I: Iterator> Iterator for Grouper<I> {
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        let chunk: Vec<I::Item> = self.inner.by_ref().take(self.n).collect();
        if chunk.is_empty() { None } else { Some(chunk) }
    }
}
