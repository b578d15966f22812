use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use rayon::ThreadPool;

use crate::config::MatchOptions;
use crate::model::edge::OrdinalEdgeList;
use crate::model::{Halo, PerSnapshotCatalog};
use crate::processes::merit_ranker::MeritRanker;
use crate::processes::share_accumulator::{ShareAccumulator, ShareScratch};

/// Which temporal direction a [`CrossMatcher::cross_match`] call is running in. The kernel
/// itself is direction-agnostic (merit semantics are identical either way); this only exists so
/// callers and logs can say which relation a given call is producing — the caller picks
/// direction by choosing which snapshot plays `source` and which plays `target`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchDirection {
    /// `source` is the later snapshot, `target` is the earlier one: candidates are progenitors.
    Progenitor,
    /// `source` is the earlier snapshot, `target` is the later one: candidates are descendants.
    Descendant,
}

/// The top-level bipartite matcher: produces one ranked candidate list per source halo against
/// a target universe, either from scratch or as an update restricted to sources that have no
/// prior candidate (the `ref_list` path used when stitching together multiple Δ steps, see
/// [`crate::processes::multi_step_reconciler`]).
pub struct CrossMatcher {
    thread_pool: Arc<ThreadPool>,
}

impl CrossMatcher {
    pub fn new(thread_pool: Arc<ThreadPool>) -> Self {
        Self { thread_pool }
    }

    /// Builds a dedicated thread pool sized as requested, giving the data-parallel kernel its
    /// own pool rather than sharing rayon's global one.
    pub fn with_num_threads(num_threads: usize) -> Self {
        let thread_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|i| format!("cross-match-{i}"))
            .build()
            .expect("thread pool construction with a valid thread count cannot fail");
        Self::new(Arc::new(thread_pool))
    }

    /// Runs one snapshot-pair cross-match.
    ///
    /// * `direction` is informational only, see [`MatchDirection`].
    /// * `istepval` is Δ, the look-back/look-forward distance in snapshots; values `> 1` are
    ///   stamped onto every produced edge list's `istep` field, matching every source
    ///   (including sources left empty by the significance cut or the `ref_list` skip path).
    /// * `ref_list`, when present, restricts work to sources with no existing candidates: a
    ///   source whose `ref_list` entry is already non-empty is left empty in the output rather
    ///   than recomputed.
    ///
    /// Returns the per-source edge lists plus whether any new candidate was found relative to
    /// `ref_list` (a monotone OR across all sources, not a count — see REDESIGN FLAGS).
    #[allow(clippy::too_many_arguments)]
    pub fn cross_match(
        &self,
        direction: MatchDirection,
        source: &PerSnapshotCatalog,
        target: &PerSnapshotCatalog,
        pfof_target: &[u32],
        opts: &MatchOptions,
        istepval: u32,
        ref_list: Option<&[OrdinalEdgeList]>,
    ) -> (Vec<OrdinalEdgeList>, bool) {
        let num_source = source.num_halos();
        let num_target = target.num_halos();
        let istep = if istepval > 1 { istepval } else { 1 };

        if let Some(refs) = ref_list {
            assert_eq!(
                refs.len(),
                num_source,
                "ref_list has {} entries but source catalog has {num_source} halos",
                refs.len()
            );
        }

        log::debug!(
            "cross_match[{direction:?}]: {num_source} source halos against {num_target} target halos, istep={istep}, ref_list={}",
            ref_list.is_some()
        );

        if num_target == 0 {
            let edges = (0..num_source).map(|_| OrdinalEdgeList { edges: Vec::new(), istep }).collect();
            return (edges, ref_list.is_none());
        }

        let target_sizes: Vec<usize> = target.halos().iter().map(Halo::num_particles).collect();
        let list_updated = AtomicBool::new(ref_list.is_none());
        let significance_rejections = AtomicUsize::new(0);

        let edges: Vec<OrdinalEdgeList> = self.thread_pool.install(|| {
            (0..num_source)
                .into_par_iter()
                .with_min_len(1)
                .map_init(
                    || ShareScratch::new(num_target),
                    |scratch, i| {
                        if let Some(refs) = ref_list {
                            if !refs[i].is_empty() {
                                return OrdinalEdgeList { edges: Vec::new(), istep };
                            }
                        }
                        let source_halo = source.halo(i);
                        ShareAccumulator::accumulate(scratch, source.particle_indices(i), pfof_target);
                        let (edges, rejected) = MeritRanker::rank(
                            scratch.share(),
                            source_halo.num_particles(),
                            &target_sizes,
                            opts.matchtype,
                            opts.mlsig,
                        );
                        scratch.reset();
                        if rejected > 0 {
                            significance_rejections.fetch_add(rejected, Ordering::Relaxed);
                        }
                        if !edges.is_empty() && ref_list.is_some() {
                            list_updated.store(true, Ordering::Relaxed);
                        }
                        OrdinalEdgeList { edges, istep }
                    },
                )
                .collect()
        });

        log::info!(
            "cross_match[{direction:?}]: {} candidates rejected by the significance cut across {num_source} source halos",
            significance_rejections.load(Ordering::Relaxed)
        );

        (edges, list_updated.load(Ordering::Relaxed))
    }
}
