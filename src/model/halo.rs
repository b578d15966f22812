/// A self-bound structure at one snapshot: an opaque external id plus the set of particle
/// indices it owns. Immutable once ingested for a given snapshot.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Halo {
    pub halo_id: u64,
    /// Indices into the snapshot's particle-index space (not particle *ids*; the caller has
    /// already resolved ids to dense indices, see [`crate::processes::id_remap`]).
    pub particle_indices: Vec<u32>,
}

impl Halo {
    pub fn new(halo_id: u64, particle_indices: Vec<u32>) -> Self {
        Self { halo_id, particle_indices }
    }

    pub fn num_particles(&self) -> usize {
        self.particle_indices.len()
    }
}

/// A dense mapping `particle_index -> halo_ordinal + 1`, where `0` means "not in any halo".
/// One labeling is used per target snapshot; domain is `[0, total_particles)`.
pub type ParticleLabeling = [u32];

/// A halo catalog for one snapshot plus the flattened `pglist`/`noffset` arrays used by the
/// scatter phase of [`crate::processes::share_accumulator`].
///
/// Invariant: `noffset[h + 1] - noffset[h] == halos[h].num_particles()`.
pub struct PerSnapshotCatalog {
    halos: Vec<Halo>,
    pglist: Vec<u32>,
    noffset: Vec<usize>,
}

impl PerSnapshotCatalog {
    /// Builds the catalog and its flattened `pglist`/`noffset` arrays from a per-halo particle
    /// index list, as produced by [`crate::processes::index_builder::IndexBuilder`].
    pub fn new(halos: Vec<Halo>) -> Self {
        let mut pglist = Vec::with_capacity(halos.iter().map(Halo::num_particles).sum());
        let mut noffset = Vec::with_capacity(halos.len() + 1);
        noffset.push(0);
        for halo in &halos {
            pglist.extend_from_slice(&halo.particle_indices);
            noffset.push(pglist.len());
        }
        Self { halos, pglist, noffset }
    }

    pub fn num_halos(&self) -> usize {
        self.halos.len()
    }

    pub fn halos(&self) -> &[Halo] {
        &self.halos
    }

    pub fn halo(&self, ordinal: usize) -> &Halo {
        &self.halos[ordinal]
    }

    /// The particle indices belonging to halo `ordinal`, sliced out of the flattened `pglist`.
    pub fn particle_indices(&self, ordinal: usize) -> &[u32] {
        &self.pglist[self.noffset[ordinal]..self.noffset[ordinal + 1]]
    }

    pub fn pglist(&self) -> &[u32] {
        &self.pglist
    }

    pub fn noffset(&self) -> &[usize] {
        &self.noffset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattens_halos_in_order() {
        let catalog = PerSnapshotCatalog::new(vec![
            Halo::new(100, vec![1, 2, 3]),
            Halo::new(200, vec![4, 5]),
        ]);
        assert_eq!(catalog.num_halos(), 2);
        assert_eq!(catalog.particle_indices(0), &[1, 2, 3]);
        assert_eq!(catalog.particle_indices(1), &[4, 5]);
        assert_eq!(catalog.noffset(), &[0, 3, 5]);
    }
}
