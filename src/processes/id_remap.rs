use crate::errors::{CoreError, CoreResult};

/// Rewrites every halo id in a snapshot's catalog so ids are globally unique across the whole
/// run: `halo_id += haloidval * (snapshot_idx + snapshotvaloffset) + haloidoffset`.
///
/// Called once per snapshot, after ingestion and before any matching. In sharded mode the
/// caller restricts this to the snapshot range it owns; sharding itself is not a concept this
/// function needs to know about, so it just takes whichever `snapshot_idx` the caller passes.
pub fn rewrite_halo_ids(
    halo_ids: &mut [u64],
    snapshot_idx: usize,
    haloidval: u64,
    snapshotvaloffset: i64,
    haloidoffset: u64,
) {
    let offset = haloidval.wrapping_mul((snapshot_idx as i64 + snapshotvaloffset) as u64).wrapping_add(haloidoffset);
    for id in halo_ids {
        *id = id.wrapping_add(offset);
    }
}

/// Applies a caller-supplied particle-id -> dense-index mapping function in place. The mapping
/// policy itself (hash table, sorted lookup, whatever the catalog format calls for) is entirely
/// the caller's concern; this only invokes it uniformly over every particle id in a snapshot.
pub fn remap_particle_ids<F: Fn(u64) -> u64>(particle_ids: &mut [u64], mapping_func: F) {
    for id in particle_ids {
        *id = mapping_func(*id);
    }
}

/// Checks that every (already remapped) particle index in `particle_indices` is a valid dense
/// index in `[0, num_part)`. Returns the first violation found, naming the offending snapshot
/// and id — the caller is expected to run this as part of a global reduction in sharded mode
/// (see [`GlobalErrorReducer`]) before treating the run as valid.
pub fn validate_particle_range(particle_indices: &[u64], snapshot: usize, num_part: u64) -> CoreResult<()> {
    for &particle_id in particle_indices {
        if particle_id >= num_part {
            let err = CoreError::InputRangeError { snapshot, particle_id, num_part };
            log::warn!("validate_particle_range: {err} (local shard result, pending global reduction)");
            return Err(err);
        }
    }
    Ok(())
}

/// Seam for combining per-shard validation outcomes into one run-wide decision, without this
/// crate depending on an actual MPI/message-passing implementation. A caller running under MPI
/// (or any other transport) implements this over its own all-reduce primitive; a single-process
/// caller can use the provided [`LocalReducer`].
pub trait GlobalErrorReducer {
    /// Combines this shard's local validation result with every other shard's, returning the
    /// first error seen across the whole run (in some deterministic, transport-defined order),
    /// or `Ok(())` if every shard validated cleanly.
    fn reduce(&self, local: CoreResult<()>) -> CoreResult<()>;
}

/// A [`GlobalErrorReducer`] for single-process (unsharded) runs: the local result already is
/// the global result.
pub struct LocalReducer;

impl GlobalErrorReducer for LocalReducer {
    fn reduce(&self, local: CoreResult<()>) -> CoreResult<()> {
        local
    }
}
