//! In-process MapPairs executor.
//!
//! Runs `W` logical workers on the rayon pool, each walking the same
//! grid-stride loop as the generated kernel. Output layout matches the
//! device: `out[i] = f(v[i / Hsize], h[i % Hsize])`.

use rayon::prelude::*;

use super::grid::{GridStride, Index2};

/// Apply `f` to every `(vertical, horizontal)` pair, row-major over the
/// vertical elements. A worker count of zero runs one worker; more workers
/// than elements run one per element.
pub fn map_pairs<V, H, R, F>(vertical: &[V], horizontal: &[H], workers: usize, f: F) -> Vec<R>
where
    V: Sync,
    H: Sync,
    R: Send,
    F: Fn(&V, &H) -> R + Sync,
{
    let hsize = horizontal.len();
    run(vertical.len() * hsize, workers, |i| {
        Some(f(&vertical[i / hsize], &horizontal[i % hsize]))
    })
}

/// Like `map_pairs`, but `f` also receives the row/column index of the
/// output element, with rows `Hsize` wide.
pub fn map_pairs_indexed<V, H, R, F>(
    vertical: &[V],
    horizontal: &[H],
    workers: usize,
    f: F,
) -> Vec<R>
where
    V: Sync,
    H: Sync,
    R: Send,
    F: Fn(Index2, &V, &H) -> R + Sync,
{
    let hsize = horizontal.len();
    run(vertical.len() * hsize, workers, |i| {
        let index = Index2::at(0, i, hsize)?;
        Some(f(index, &vertical[index.row], &horizontal[index.col]))
    })
}

fn run<R, F>(n: usize, workers: usize, element: F) -> Vec<R>
where
    R: Send,
    F: Fn(usize) -> Option<R> + Sync,
{
    // Workers at or past `n` would visit nothing.
    let workers = workers.clamp(1, n.max(1));
    let mut computed: Vec<(usize, R)> = (0..workers)
        .into_par_iter()
        .flat_map_iter(|worker| {
            GridStride::new(worker, workers, n).filter_map(|i| element(i).map(|r| (i, r)))
        })
        .collect();
    computed.par_sort_unstable_by_key(|(i, _)| *i);
    log::debug!("cpu map_pairs: {} elements on {} workers", n, workers);
    computed.into_iter().map(|(_, r)| r).collect()
}
