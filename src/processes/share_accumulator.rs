/// Per-worker scratch for [`ShareAccumulator`]. A single `share[num_workers * num_targets]`
/// arena indexed by `(worker_id, target_ordinal)` is the canonical layout; each worker owns one
/// `ShareScratch` slice of it, allocated once at the top of the snapshot-pair loop and reused
/// across every source halo it processes.
///
/// Reset is lazy: only the indices actually touched while accumulating the last source are
/// zeroed, tracked in `touched`, rather than zeroing the whole (potentially 10^7-entry) vector
/// between every source halo.
pub struct ShareScratch {
    share: Vec<u32>,
    touched: Vec<u32>,
}

impl ShareScratch {
    pub fn new(num_targets: usize) -> Self {
        Self { share: vec![0; num_targets], touched: Vec::new() }
    }

    pub fn num_targets(&self) -> usize {
        self.share.len()
    }

    pub fn share(&self) -> &[u32] {
        &self.share
    }

    /// Zeroes every index touched since the last reset. Must be called before this scratch is
    /// reused for a different source halo; [`ShareAccumulator::accumulate`] does not do this
    /// for the caller since a caller may want to inspect `share()` first.
    pub fn reset(&mut self) {
        for &idx in &self.touched {
            self.share[idx as usize] = 0;
        }
        self.touched.clear();
    }
}

/// Computes `share[b] = |particles(A) ∩ particles(B_b)|` for a single source halo `A` against
/// a target labeling, by scattering through a dense scratch vector indexed by destination halo
/// ordinal.
pub struct ShareAccumulator;

impl ShareAccumulator {
    /// `source_particles` are `A`'s particle indices (into the target snapshot's particle
    /// space); `pfof_target[p]` is `0` for particles outside every target halo, otherwise the
    /// 1-based target halo ordinal.
    pub fn accumulate(scratch: &mut ShareScratch, source_particles: &[u32], pfof_target: &[u32]) {
        for &p in source_particles {
            let label = pfof_target[p as usize];
            if label > 0 {
                let idx = (label - 1) as usize;
                if scratch.share[idx] == 0 {
                    scratch.touched.push(idx as u32);
                }
                scratch.share[idx] += 1;
            }
        }
    }
}
