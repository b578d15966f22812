use std::sync::Arc;

use crate::config::MatchOptions;
use crate::model::edge::{HaloIdEdgeList, OrdinalEdgeList};
use crate::model::halo::PerSnapshotCatalog;
use crate::processes::cross_matcher::{CrossMatcher, MatchDirection};
use crate::processes::exclusivity_filter::ExclusivityFilter;

/// Runs one full snapshot-pair step: cross-matching followed by exclusivity enforcement and
/// halo-id finalization. This is the seam a caller driving a multi-step run holds onto across
/// snapshot pairs, so the underlying thread pool is built once and reused rather than per call.
pub struct SnapshotPairProcessor {
    matcher: CrossMatcher,
}

impl SnapshotPairProcessor {
    pub fn new(num_threads: usize) -> Self {
        Self { matcher: CrossMatcher::with_num_threads(num_threads) }
    }

    pub fn with_thread_pool(thread_pool: Arc<rayon::ThreadPool>) -> Self {
        Self { matcher: CrossMatcher::new(thread_pool) }
    }

    /// Cross-matches `source` against `target`, enforces exclusivity, and finalizes to halo-id
    /// form in one call — the common case when a caller has no Δ-step reference list to merge
    /// against yet. Returns the finalized edge lists and whether any candidate was found.
    pub fn run(
        &self,
        direction: MatchDirection,
        source: &PerSnapshotCatalog,
        target: &PerSnapshotCatalog,
        pfof_target: &[u32],
        opts: &MatchOptions,
        istepval: u32,
    ) -> (Vec<HaloIdEdgeList>, bool) {
        let (edges, updated) = self.matcher.cross_match(direction, source, target, pfof_target, opts, istepval, None);

        log::info!(
            "snapshot pair [{direction:?}]: {} source halos, {} target halos, istep={istepval}",
            source.num_halos(),
            target.num_halos()
        );

        let source_sizes: Vec<usize> = source.halos().iter().map(crate::model::Halo::num_particles).collect();
        let target_halo_ids: Vec<u64> = target.halos().iter().map(|h| h.halo_id).collect();
        let target_sizes: Vec<usize> = target.halos().iter().map(crate::model::Halo::num_particles).collect();
        let finalized = ExclusivityFilter::enforce_and_finalize(
            &edges,
            target.num_halos(),
            &source_sizes,
            &target_halo_ids,
            &target_sizes,
        );

        (finalized, updated)
    }

    /// As [`Self::run`], but restricted to sources absent from `ref_list` — the Δ-step update
    /// path. `ref_list`, when `Some`, restricts work to sources with no existing candidate
    /// there, mirroring [`CrossMatcher::cross_match`]'s own contract exactly; pass `None` for
    /// the first Δ step, where there is no running reference yet (per spec §4.4: "If `refList
    /// == null`: build edges for every source halo"). Returns raw ordinal-form edges (not yet
    /// exclusivity-filtered) since the caller is expected to merge this against its running
    /// reference via [`crate::processes::multi_step_reconciler::merge_step`] before any
    /// filtering happens.
    pub fn run_step(
        &self,
        direction: MatchDirection,
        source: &PerSnapshotCatalog,
        target: &PerSnapshotCatalog,
        pfof_target: &[u32],
        opts: &MatchOptions,
        istepval: u32,
        ref_list: Option<&[OrdinalEdgeList]>,
    ) -> (Vec<OrdinalEdgeList>, bool) {
        self.matcher.cross_match(direction, source, target, pfof_target, opts, istepval, ref_list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchType;
    use crate::model::Halo;

    #[test]
    fn scenario_s1_end_to_end_one_to_one_match() {
        let processor = SnapshotPairProcessor::new(2);
        let source = PerSnapshotCatalog::new(vec![Halo::new(1, vec![0, 1, 2, 3]), Halo::new(2, vec![4, 5, 6, 7])]);
        let target = PerSnapshotCatalog::new(vec![Halo::new(100, vec![0, 1, 2, 3]), Halo::new(200, vec![4, 5, 6, 7])]);
        let pfof_target = vec![1, 1, 1, 1, 2, 2, 2, 2];
        let opts = MatchOptions::builder().matchtype(MatchType::NsharedN1N2).mlsig(0.0).num_part(8).num_snapshots(2).build().unwrap();

        let (edges, updated) = processor.run(MatchDirection::Progenitor, &source, &target, &pfof_target, &opts, 1);
        assert!(updated);
        assert_eq!(edges[0].edges[0].target, 100);
        assert_eq!(edges[1].edges[0].target, 200);
    }

    #[test]
    fn scenario_s2_end_to_end_exclusivity_resolves_the_tie() {
        let processor = SnapshotPairProcessor::new(2);
        let source = PerSnapshotCatalog::new(vec![Halo::new(1, vec![0, 1, 4, 5]), Halo::new(2, vec![2, 3, 6, 7])]);
        let target = PerSnapshotCatalog::new(vec![Halo::new(100, vec![0, 1, 2, 3]), Halo::new(200, vec![4, 5, 6, 7])]);
        let pfof_target = vec![1, 1, 1, 1, 2, 2, 2, 2];
        let opts = MatchOptions::builder().matchtype(MatchType::NsharedN1N2).mlsig(0.0).num_part(8).num_snapshots(2).build().unwrap();

        let (edges, _) = processor.run(MatchDirection::Progenitor, &source, &target, &pfof_target, &opts, 1);
        assert_eq!(edges[0].edges.len(), 2);
        assert!(edges[1].is_empty());
    }
}
