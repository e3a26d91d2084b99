// Copyright @yucwang 2026

use crate::core::bsdf::BSDFFlags;
use crate::core::interaction::SurfaceIntersection;
use crate::math::constants::{Float, Vector3f};
use crate::math::spectrum::RGBSpectrum;

/// Everything the solve phase needs to know about one path vertex.
///
/// Directions are stored in the local shading frame of the vertex: `wi`
/// points toward the previous vertex (or the sensor), `wo` along the
/// sampled continuation. `throughput` is the accumulated path weight up to
/// and including this bounce, after the roulette correction; `bsdf_weight`
/// is only the local sampling weight (f * |cos| / pdf) applied here, which
/// is what the replay walk multiplies.
#[derive(Clone)]
pub struct BounceRecord {
    pub index: u32,
    pub interaction: SurfaceIntersection,
    pub wi: Vector3f,
    pub wo: Vector3f,
    pub flags: BSDFFlags,
    pub throughput: RGBSpectrum,
    pub bsdf_weight: RGBSpectrum,
    pub bsdf_pdf: Float,
    pub rr_correction: Float,
    pub last_nd_pdf: Float,
    pub is_emitter: bool,
    pub active: bool,
}

/// Fixed-capacity record of one sampled path, filled front to back by the
/// sample phase and then consumed read-only by the solve phase. Capacity
/// equals the integrator's maximum path depth; the buffer never grows.
pub struct BounceBuffer {
    records: Vec<BounceRecord>,
    capacity: usize,
}

impl BounceBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append a bounce. Writes past the capacity are dropped; the sampling
    /// loop is depth-bounded so this only guards against misuse.
    pub fn push(&mut self, record: BounceRecord) {
        if self.records.len() < self.capacity {
            self.records.push(record);
        }
    }

    /// Bounded read. Indices at or past `len()` yield `None` rather than
    /// a stale or invalid record.
    pub fn get(&self, index: usize) -> Option<&BounceRecord> {
        self.records.get(index)
    }

    /// Reset for the next path. Only valid between paths, never while a
    /// solve is in flight; each concurrent path owns its own buffer.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}
