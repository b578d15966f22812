use smallvec::SmallVec;

use crate::config::MatchType;
use crate::model::edge::{CandidateEdge, SortableCandidate};

/// Converts a dense `share` vector into a ranked, significance-filtered candidate list.
///
/// Candidates are ranked through a bounded priority queue sized to the number of significant
/// targets in the originating implementation; here a priority queue is only ever used as a sort
/// primitive, so this is an in-place sort over a reusable buffer instead — equivalent output,
/// one fewer allocation shape to manage per source halo.
pub struct MeritRanker;

impl MeritRanker {
    /// `share[b]` is the shared-particle count against target ordinal `b`; `target_sizes[b]`
    /// is `|B_b|`. A target survives the significance cut only if `share[b] > mlsig *
    /// sqrt(target_sizes[b])`. `nshared_frac` is left at `0.0` here — it is a finalization-time
    /// quantity computed by [`crate::processes::exclusivity_filter::ExclusivityFilter`] once a
    /// source's winning candidates are known.
    ///
    /// Returns the ranked candidates alongside how many overlapping targets were rejected by
    /// the significance cut, so a caller can aggregate the count across every source halo in a
    /// snapshot pair and log one summary at the pair boundary — this function itself never
    /// logs, since it runs once per source halo and a universe of up to 10^7 halos cannot afford
    /// a log call in that loop.
    pub fn rank(
        share: &[u32],
        source_size: usize,
        target_sizes: &[usize],
        matchtype: MatchType,
        mlsig: f64,
    ) -> (Vec<CandidateEdge<u32>>, usize) {
        // Most halos clear the significance cut against only a handful of targets; a small
        // inline buffer avoids a heap allocation for the common case before the final
        // `Vec<CandidateEdge<_>>` is materialised below.
        let mut candidates: SmallVec<[SortableCandidate; 8]> = SmallVec::new();
        let mut rejected = 0usize;
        for (b, &n) in share.iter().enumerate() {
            if n == 0 {
                continue;
            }
            let target_size = target_sizes[b];
            let threshold = mlsig * (target_size as f64).sqrt();
            if (n as f64) <= threshold {
                rejected += 1;
                continue;
            }
            let merit = Self::compute_merit(matchtype, n as f64, source_size as f64, target_size as f64);
            candidates.push(SortableCandidate { target: b as u32, merit });
        }
        candidates.sort();
        let edges = candidates.into_iter().map(|c| CandidateEdge::new(c.target, c.merit, 0.0)).collect();
        (edges, rejected)
    }

    fn compute_merit(matchtype: MatchType, n: f64, size_a: f64, size_b: f64) -> f64 {
        match matchtype {
            MatchType::Nshared => n,
            MatchType::NsharedN1 => n / size_a,
            MatchType::NsharedN1N2 => (n * n) / (size_a * size_b),
            MatchType::Nsharedcombo => n / size_a + (n * n) / (size_a * size_b),
        }
    }
}
