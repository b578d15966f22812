use rayon::prelude::*;

use crate::model::edge::{CandidateEdge, EdgeList, HaloIdEdgeList, OrdinalEdgeList};

/// Converts many-to-many candidate lists into a consistent bipartite matching: after
/// [`ExclusivityFilter::enforce`], any target ordinal appears in at most one source's list —
/// the source with the highest merit against it.
pub struct ExclusivityFilter;

impl ExclusivityFilter {
    /// Passes 1 and 2 over ordinal-form edge lists, in place. `num_targets` is the size of the
    /// target universe all ordinals in `edges` are drawn from.
    ///
    /// Pass 1 scans every source in ascending order, tracking the best (highest-merit) source
    /// seen so far per target; only a strictly greater merit replaces the incumbent, so on a
    /// tie the lowest source ordinal wins. Pass 1 is an inherently sequential reduction over the
    /// shared `bestSource`/`claimCount` tables, so it stays serial; Pass 2 then drops, from every
    /// source's list, any target claimed by two or more sources where this source isn't the
    /// winner, which only reads those now-frozen tables and only ever touches its own source's
    /// list, so it runs as a `par_iter_mut` pass over sources.
    ///
    /// Idempotent: a target surviving pass 2 is claimed by exactly one source, so a second call
    /// observes claim counts of 1 everywhere and removes nothing further.
    pub fn enforce(edges: &mut [OrdinalEdgeList], num_targets: usize) {
        let (best_source, claim_count) = Self::build_claim_tables(edges, num_targets);

        edges.par_iter_mut().enumerate().for_each(|(i, list)| {
            list.edges.retain(|edge| {
                let b = edge.target as usize;
                claim_count[b] < 2 || best_source[b] == i as i64
            });
        });
    }

    /// Pass 3: remaps surviving target ordinals to their external halo ids and computes
    /// `nshared_frac = sqrt(merit * |B| * |A|) / |A|` for each. `source_sizes[i]` is `|A|` for
    /// source `i`; `target_halo_ids`/`target_sizes` are indexed by target ordinal.
    ///
    /// The `nshared_frac` produced here is only the true shared-particle fraction when the
    /// edges were ranked under `NsharedN1N2`; for other merit kinds it is still a
    /// merit-dependent derived quantity, stored as-is to match the originating system's output
    /// byte-for-byte rather than silently diverging per merit kind.
    ///
    /// Assumes `edges` has already been through [`Self::enforce`] — unlike
    /// [`Self::enforce_and_finalize`], this does not itself drop non-exclusive claims.
    pub fn finalize(
        edges: &[OrdinalEdgeList],
        source_sizes: &[usize],
        target_halo_ids: &[u64],
        target_sizes: &[usize],
    ) -> Vec<HaloIdEdgeList> {
        edges
            .par_iter()
            .enumerate()
            .map(|(i, list)| Self::finalize_one(list, i, source_sizes, target_halo_ids, target_sizes))
            .collect()
    }

    /// Pass 2 and Pass 3 fused into a single `par_iter` pass over sources: each source reads the
    /// frozen `bestSource`/`claimCount` tables built by Pass 1, drops its non-exclusive claims,
    /// and remaps the survivors straight to halo-id form, without ever materialising the
    /// intermediate ordinal-filtered list. This is the entry point a snapshot-pair run reaches
    /// for; [`Self::enforce`]/[`Self::finalize`] stay available separately for callers that need
    /// the ordinal-form intermediate (and for exercising each pass in isolation in tests).
    pub fn enforce_and_finalize(
        edges: &[OrdinalEdgeList],
        num_targets: usize,
        source_sizes: &[usize],
        target_halo_ids: &[u64],
        target_sizes: &[usize],
    ) -> Vec<HaloIdEdgeList> {
        let (best_source, claim_count) = Self::build_claim_tables(edges, num_targets);

        edges
            .par_iter()
            .enumerate()
            .map(|(i, list)| {
                let exclusive: Vec<CandidateEdge<u32>> = list
                    .edges
                    .iter()
                    .filter(|edge| {
                        let b = edge.target as usize;
                        claim_count[b] < 2 || best_source[b] == i as i64
                    })
                    .copied()
                    .collect();
                let exclusive_list = OrdinalEdgeList { edges: exclusive, istep: list.istep };
                Self::finalize_one(&exclusive_list, i, source_sizes, target_halo_ids, target_sizes)
            })
            .collect()
    }

    /// Pass 1: builds the per-target `bestSource`/`claimCount` tables by scanning every source's
    /// list once, in ascending source order. Shared by [`Self::enforce`] and
    /// [`Self::enforce_and_finalize`] so both pay for exactly one sequential reduction.
    fn build_claim_tables(edges: &[OrdinalEdgeList], num_targets: usize) -> (Vec<i64>, Vec<u32>) {
        let mut best_source = vec![-1i64; num_targets];
        let mut best_merit = vec![f64::NEG_INFINITY; num_targets];
        let mut claim_count = vec![0u32; num_targets];

        for (i, list) in edges.iter().enumerate() {
            for edge in &list.edges {
                let b = edge.target as usize;
                claim_count[b] += 1;
                if edge.merit > best_merit[b] {
                    best_merit[b] = edge.merit;
                    best_source[b] = i as i64;
                }
            }
        }

        (best_source, claim_count)
    }

    fn finalize_one(
        list: &OrdinalEdgeList,
        source_ordinal: usize,
        source_sizes: &[usize],
        target_halo_ids: &[u64],
        target_sizes: &[usize],
    ) -> HaloIdEdgeList {
        let source_size = source_sizes[source_ordinal] as f64;
        let mapped: Vec<CandidateEdge<u64>> = list
            .edges
            .iter()
            .map(|edge| {
                let b = edge.target as usize;
                let nshared_frac = (edge.merit * target_sizes[b] as f64 * source_size).sqrt() / source_size;
                CandidateEdge::new(target_halo_ids[b], edge.merit, nshared_frac)
            })
            .collect();
        EdgeList { edges: mapped, istep: list.istep }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CandidateEdge;

    fn list(entries: &[(u32, f64)]) -> OrdinalEdgeList {
        OrdinalEdgeList {
            edges: entries.iter().map(|&(t, m)| CandidateEdge::new(t, m, 0.0)).collect(),
            istep: 1,
        }
    }

    #[test]
    fn scenario_s2_tiebreak_keeps_the_lowest_ordinal_source() {
        let mut edges = vec![list(&[(0, 0.25), (1, 0.25)]), list(&[(0, 0.25), (1, 0.25)])];
        ExclusivityFilter::enforce(&mut edges, 2);
        assert_eq!(edges[0].edges.len(), 2);
        assert!(edges[1].is_empty());
    }

    #[test]
    fn strictly_higher_merit_wins_regardless_of_ordinal() {
        let mut edges = vec![list(&[(0, 0.1)]), list(&[(0, 0.9)])];
        ExclusivityFilter::enforce(&mut edges, 1);
        assert!(edges[0].is_empty());
        assert_eq!(edges[1].edges.len(), 1);
    }

    #[test]
    fn unclaimed_targets_survive_untouched() {
        let mut edges = vec![list(&[(0, 0.5)]), list(&[(1, 0.5)])];
        ExclusivityFilter::enforce(&mut edges, 2);
        assert_eq!(edges[0].edges.len(), 1);
        assert_eq!(edges[1].edges.len(), 1);
    }

    #[test]
    fn enforce_is_idempotent() {
        let mut edges = vec![list(&[(0, 0.25), (1, 0.25)]), list(&[(0, 0.25), (1, 0.25)])];
        ExclusivityFilter::enforce(&mut edges, 2);
        let once = edges.clone();
        ExclusivityFilter::enforce(&mut edges, 2);
        assert_eq!(edges[0].edges.len(), once[0].edges.len());
        assert_eq!(edges[1].edges.len(), once[1].edges.len());
    }

    #[test]
    fn finalize_remaps_ordinals_and_computes_nshared_frac() {
        let edges = vec![list(&[(0, 0.25)])];
        let finalized = ExclusivityFilter::finalize(&edges, &[4], &[100, 200], &[4, 4]);
        assert_eq!(finalized[0].edges[0].target, 100);
        assert!((finalized[0].edges[0].nshared_frac - 0.5).abs() < 1e-12);
    }

    #[test]
    fn enforce_and_finalize_matches_the_two_step_path() {
        let raw = vec![list(&[(0, 0.1), (1, 0.25)]), list(&[(0, 0.9)])];
        let source_sizes = [4, 4];
        let target_halo_ids = [100, 200];
        let target_sizes = [4, 4];

        let mut staged = raw.clone();
        ExclusivityFilter::enforce(&mut staged, 2);
        let staged_result = ExclusivityFilter::finalize(&staged, &source_sizes, &target_halo_ids, &target_sizes);

        let fused = ExclusivityFilter::enforce_and_finalize(&raw, 2, &source_sizes, &target_halo_ids, &target_sizes);

        assert_eq!(fused.len(), staged_result.len());
        for (a, b) in fused.iter().zip(&staged_result) {
            assert_eq!(a.edges.len(), b.edges.len());
            for (ea, eb) in a.edges.iter().zip(&b.edges) {
                assert_eq!(ea.target, eb.target);
                assert!((ea.merit - eb.merit).abs() < 1e-12);
                assert!((ea.nshared_frac - eb.nshared_frac).abs() < 1e-12);
            }
        }
        // target 0 is claimed by both sources; source 1's strictly higher merit (0.9) wins,
        // so only source 1's claim on target 0 and source 0's unclaimed target 1 survive.
        assert!(fused[0].edges.iter().all(|e| e.target != 100));
        assert_eq!(fused[1].edges[0].target, 100);
    }
}
