use itertools::Itertools;
use parking_lot::Mutex;
use rayon::prelude::*;

use crate::config::LinkPolicy;
use crate::model::edge::OrdinalEdgeList;
use crate::model::evidence::{EvidenceEntry, ShardTag};

/// Folds a newly produced Δ≥2 candidate list into a running reference list, one source at a
/// time, under one of the two [`LinkPolicy`] rules. Replacement is wholesale — the entire edge
/// list is swapped, including `istep` — never a merge of individual edges.
///
/// Returns whether anything changed, mirroring [`crate::processes::cross_matcher::CrossMatcher`]'s
/// `list_updated` contract: a monotone OR across sources, not a count.
pub fn merge_step(reference: &mut [OrdinalEdgeList], temporary: &[OrdinalEdgeList], policy: LinkPolicy) -> bool {
    let mut replaced = 0usize;
    for (r, t) in reference.iter_mut().zip(temporary) {
        let replace = match policy {
            LinkPolicy::Missing => r.is_empty() && !t.is_empty(),
            LinkPolicy::Merit => {
                (r.is_empty() && !t.is_empty())
                    || (!r.is_empty() && !t.is_empty() && t.best_merit().unwrap() > r.best_merit().unwrap())
            }
        };
        if replace {
            *r = t.clone();
            replaced += 1;
        }
    }
    log::debug!("merge_step[{policy:?}]: replaced {replaced} of {} reference lists", reference.len());
    replaced > 0
}

/// The inverse index built from a snapshot's progenitor edges: `evidence[t]` lists every
/// `(sourceSnapshotIdx, sourceHaloOrdinal, merit, Δ)` nomination of target ordinal `t`.
pub struct EvidenceIndex {
    evidence: Vec<Vec<EvidenceEntry>>,
}

impl EvidenceIndex {
    /// `progenitor_edges[snapshot_idx]` is that snapshot's per-source progenitor edge lists,
    /// each edge's `target` an ordinal into the single target universe this index covers.
    pub fn build(progenitor_edges: &[Vec<OrdinalEdgeList>], shard: ShardTag, num_targets: usize) -> Self {
        let mut evidence: Vec<Vec<EvidenceEntry>> = vec![Vec::new(); num_targets];
        for (snapshot_idx, sources) in progenitor_edges.iter().enumerate() {
            for (source_halo_ordinal, list) in sources.iter().enumerate() {
                for edge in &list.edges {
                    evidence[edge.target as usize].push(EvidenceEntry {
                        source_snapshot_idx: snapshot_idx,
                        source_halo_ordinal: source_halo_ordinal as u32,
                        merit: edge.merit,
                        delta: list.istep,
                        shard,
                    });
                }
            }
        }
        Self { evidence }
    }

    pub fn targets_with_contested_evidence(&self) -> impl Iterator<Item = usize> + '_ {
        self.evidence.iter().enumerate().filter(|(_, v)| v.len() > 1).map(|(t, _)| t)
    }

    pub fn entries(&self, target: usize) -> &[EvidenceEntry] {
        &self.evidence[target]
    }
}

/// Orders evidence entries by descending temporal merit (ties broken by snapshot then source
/// ordinal), so `ranked[0]` is the unique optimum and `ranked[1..]` are the losers to remove.
fn rank_evidence(entries: &[EvidenceEntry]) -> Vec<&EvidenceEntry> {
    entries
        .iter()
        .sorted_by(|a, b| {
            b.temporal_merit()
                .total_cmp(&a.temporal_merit())
                .then_with(|| a.source_snapshot_idx.cmp(&b.source_snapshot_idx))
                .then_with(|| a.source_halo_ordinal.cmp(&b.source_halo_ordinal))
        })
        .collect()
}

/// For a target with contested evidence, selects the unique optimal nomination and surgically
/// removes every losing nomination from its source's progenitor edge list, so the target ends
/// up claimed by exactly one progenitor-relation source.
///
/// Optimality is by descending [`EvidenceEntry::temporal_merit`] (`merit / Δ`, penalising
/// larger Δ), ties broken by smaller `source_snapshot_idx` then smaller `source_halo_ordinal`
/// for determinism. Losers whose shard tag is not `local_shard` are left untouched — a remote
/// shard owns that mutation.
pub fn select_optimal_descendant(
    entries: &[EvidenceEntry],
    target: u32,
    progenitor_edges: &mut [Vec<OrdinalEdgeList>],
    local_shard: ShardTag,
) {
    let ranked = rank_evidence(entries);

    for loser in &ranked[1..] {
        if loser.shard != local_shard {
            continue;
        }
        let list = &mut progenitor_edges[loser.source_snapshot_idx][loser.source_halo_ordinal as usize];
        if let Some(pos) = list.edges.iter().position(|e| e.target == target) {
            list.edges.remove(pos);
        }
    }
}

/// Runs [`select_optimal_descendant`] over every contested target in `index`, grouping the
/// removal work per `(source_snapshot_idx, source_halo_ordinal)` so that no progenitor edge
/// list is mutated concurrently — a target's evidence can name the same source halo as another
/// target's, so this phase is intentionally serial after the parallel evidence-collection and
/// per-target ranking that precede it.
pub fn reconcile(index: &EvidenceIndex, progenitor_edges: &mut [Vec<OrdinalEdgeList>], local_shard: ShardTag) {
    let contested: Vec<usize> = index.targets_with_contested_evidence().collect();
    let num_contested = contested.len();
    for target in contested {
        select_optimal_descendant(index.entries(target), target as u32, progenitor_edges, local_shard);
    }
    log::info!("reconcile: disambiguated {num_contested} contested progenitor targets on shard {local_shard:?}");
}

/// Per-source-halo edge list, guarded by its own mutex so that [`reconcile_parallel`] can
/// process multiple contested targets at once without requiring the caller to pre-partition
/// targets by source ordinal.
pub type GuardedProgenitorEdges = Vec<Vec<Mutex<OrdinalEdgeList>>>;

pub fn wrap_for_parallel_reconcile(progenitor_edges: Vec<Vec<OrdinalEdgeList>>) -> GuardedProgenitorEdges {
    progenitor_edges.into_iter().map(|snapshot| snapshot.into_iter().map(Mutex::new).collect()).collect()
}

pub fn unwrap_after_parallel_reconcile(guarded: GuardedProgenitorEdges) -> Vec<Vec<OrdinalEdgeList>> {
    guarded.into_iter().map(|snapshot| snapshot.into_iter().map(Mutex::into_inner).collect()).collect()
}

/// As [`reconcile`], but contested targets are resolved concurrently: a per-source mutex
/// (rather than a serial pass partitioned by source ordinal) is what the multi-step
/// reconciliation's concurrency notes call out as the alternative to a fully serial removal
/// phase, so this is the variant a caller reaches for once the evidence index is large enough
/// that the serial walk dominates wall-clock.
pub fn reconcile_parallel(index: &EvidenceIndex, progenitor_edges: &GuardedProgenitorEdges, local_shard: ShardTag) {
    let contested: Vec<usize> = index.targets_with_contested_evidence().collect();
    let num_contested = contested.len();
    contested.into_par_iter().for_each(|target| {
        select_optimal_descendant_locked(index.entries(target), target as u32, progenitor_edges, local_shard);
    });
    log::info!("reconcile_parallel: disambiguated {num_contested} contested progenitor targets on shard {local_shard:?}");
}

fn select_optimal_descendant_locked(
    entries: &[EvidenceEntry],
    target: u32,
    progenitor_edges: &GuardedProgenitorEdges,
    local_shard: ShardTag,
) {
    let ranked = rank_evidence(entries);
    for loser in &ranked[1..] {
        if loser.shard != local_shard {
            continue;
        }
        let mut list = progenitor_edges[loser.source_snapshot_idx][loser.source_halo_ordinal as usize].lock();
        if let Some(pos) = list.edges.iter().position(|e| e.target == target) {
            list.edges.remove(pos);
        }
    }
}
