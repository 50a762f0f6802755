//! Per-worker scratch planes recycled between tiles.
//!
//! ROI masks, raw no-data flags and alpha weights need one value per pixel (or per pixel and
//! band) of the current tile. Tiles of one grid mostly share a size, so planes are kept by
//! `(width, height)` and handed out again instead of being reallocated.

use std::collections::HashMap;
use std::mem::size_of;

/// Limits on what a [`PlanePool`] keeps after release.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PlanePoolOpts {
    pub(crate) max_retained_bytes: usize,
    pub(crate) max_planes_per_size: usize,
}

impl Default for PlanePoolOpts {
    fn default() -> Self {
        Self {
            max_retained_bytes: 64 * 1024 * 1024,
            max_planes_per_size: 8,
        }
    }
}

/// Pool activity, reported at the end of a sequential render.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PoolCounters {
    /// Planes created because none of the right size was free.
    pub(crate) allocated: u64,
    /// Borrows served from a released plane.
    pub(crate) reused: u64,
    /// Released planes dropped by a limit or a length mismatch.
    pub(crate) discarded: u64,
    /// Bytes currently held for reuse.
    pub(crate) retained_bytes: usize,
}

impl PoolCounters {
    fn merged(self, other: Self) -> Self {
        Self {
            allocated: self.allocated + other.allocated,
            reused: self.reused + other.reused,
            discarded: self.discarded + other.discarded,
            retained_bytes: self.retained_bytes + other.retained_bytes,
        }
    }
}

/// Free planes of one value type, keyed by `(width, height)`.
#[derive(Debug)]
pub(crate) struct PlanePool<T> {
    opts: PlanePoolOpts,
    free: HashMap<(u32, u32), Vec<Vec<T>>>,
    counters: PoolCounters,
}

impl<T: Copy + Default> PlanePool<T> {
    pub(crate) fn new(opts: PlanePoolOpts) -> Self {
        Self {
            opts,
            free: HashMap::new(),
            counters: PoolCounters::default(),
        }
    }

    pub(crate) fn counters(&self) -> PoolCounters {
        self.counters
    }

    /// Plane of `w * h` values. Reused planes keep their previous contents.
    pub(crate) fn borrow(&mut self, w: u32, h: u32) -> Vec<T> {
        if let Some(plane) = self.free.get_mut(&(w, h)).and_then(Vec::pop) {
            self.counters.reused += 1;
            self.counters.retained_bytes -= plane_bytes::<T>(plane.len());
            return plane;
        }
        self.counters.allocated += 1;
        vec![T::default(); plane_len(w, h)]
    }

    /// Return a plane borrowed as `w * h`.
    pub(crate) fn release(&mut self, w: u32, h: u32, plane: Vec<T>) {
        let bytes = plane_bytes::<T>(plane.len());
        let over_budget =
            self.counters.retained_bytes.saturating_add(bytes) > self.opts.max_retained_bytes;
        let free = self.free.entry((w, h)).or_default();
        if plane.len() != plane_len(w, h)
            || over_budget
            || free.len() >= self.opts.max_planes_per_size
        {
            self.counters.discarded += 1;
            return;
        }
        free.push(plane);
        self.counters.retained_bytes += bytes;
    }
}

fn plane_len(w: u32, h: u32) -> usize {
    (w as usize).saturating_mul(h as usize)
}

fn plane_bytes<T>(len: usize) -> usize {
    len.saturating_mul(size_of::<T>())
}

/// Scratch state owned by one worker: byte planes for ROI masks and no-data flags, and weight
/// planes for alpha.
#[derive(Debug)]
pub struct TileScratch {
    pub(crate) masks: PlanePool<u8>,
    pub(crate) weights: PlanePool<f64>,
}

impl TileScratch {
    pub(crate) fn with_opts(opts: PlanePoolOpts) -> Self {
        Self {
            masks: PlanePool::new(opts),
            weights: PlanePool::new(opts),
        }
    }

    /// Combined activity of both pools.
    pub(crate) fn counters(&self) -> PoolCounters {
        self.masks.counters().merged(self.weights.counters())
    }
}

impl Default for TileScratch {
    fn default() -> Self {
        Self::with_opts(PlanePoolOpts::default())
    }
}
