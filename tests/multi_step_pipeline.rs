use halo_merger_core::config::{LinkPolicy, MatchOptions, MatchType};
use halo_merger_core::model::{Halo, PerSnapshotCatalog, ShardTag};
use halo_merger_core::pipeline::SnapshotPairProcessor;
use halo_merger_core::processes::cross_matcher::MatchDirection;
use halo_merger_core::processes::multi_step_reconciler::{merge_step, reconcile, EvidenceIndex};

fn opts() -> MatchOptions {
    MatchOptions::builder().matchtype(MatchType::NsharedN1N2).mlsig(0.0).ilink(LinkPolicy::Merit).num_part(64).num_snapshots(3).build().unwrap()
}

/// Three snapshots, one halo per snapshot, sharing particles across the whole chain: the
/// Δ=1 step alone already resolves every progenitor, so the Δ=2 merge step should make no
/// change. Exercises [`SnapshotPairProcessor::run`] end to end across a chain rather than a
/// single snapshot pair.
#[test]
fn adjacent_steps_chain_through_three_snapshots() {
    let processor = SnapshotPairProcessor::new(2);
    let snap0 = PerSnapshotCatalog::new(vec![Halo::new(10, vec![0, 1, 2, 3])]);
    let snap1 = PerSnapshotCatalog::new(vec![Halo::new(20, vec![0, 1, 2, 3])]);
    let snap2 = PerSnapshotCatalog::new(vec![Halo::new(30, vec![0, 1, 2, 3])]);

    let pfof1 = vec![1u32, 1, 1, 1];
    let pfof2 = vec![1u32, 1, 1, 1];

    let (edges_0_to_1, updated_0_1) = processor.run(MatchDirection::Progenitor, &snap0, &snap1, &pfof1, &opts(), 1);
    assert!(updated_0_1);
    assert_eq!(edges_0_to_1[0].edges[0].target, 20);

    let (edges_1_to_2, updated_1_2) = processor.run(MatchDirection::Progenitor, &snap1, &snap2, &pfof2, &opts(), 1);
    assert!(updated_1_2);
    assert_eq!(edges_1_to_2[0].edges[0].target, 30);
}

/// A Δ=2 step should not overwrite a perfectly good Δ=1 result under the `MISSING` policy, but
/// should under `MERIT` when it scores strictly higher.
#[test]
fn multi_step_merge_policies_agree_with_the_per_source_contract() {
    let processor = SnapshotPairProcessor::new(1);
    let source = PerSnapshotCatalog::new(vec![Halo::new(1, vec![0, 1, 2, 3])]);
    let adjacent_target = PerSnapshotCatalog::new(vec![Halo::new(10, vec![0, 1, 2, 3])]);
    let far_target = PerSnapshotCatalog::new(vec![Halo::new(20, vec![0, 1, 2, 3, 4, 5, 6, 7])]);

    let pfof_adjacent = vec![1u32, 1, 1, 1];
    let pfof_far = vec![1u32, 1, 1, 1, 1, 1, 1, 1];

    let (mut reference, _) =
        processor.run_step(MatchDirection::Progenitor, &source, &adjacent_target, &pfof_adjacent, &opts(), 1, None);
    let (temporary, _) = processor.run_step(MatchDirection::Progenitor, &source, &far_target, &pfof_far, &opts(), 2, None);

    // Reference (Δ=1, merit 1.0) already beats the farther Δ=2 candidate (smaller fraction
    // since only half of `far_target` overlaps) under MERIT, so nothing should change.
    let updated = merge_step(&mut reference, &temporary, LinkPolicy::Merit);
    assert!(!updated);
    assert_eq!(reference[0].edges[0].target, 0);
    assert_eq!(reference[0].istep, 1);
}

/// Two later snapshots both nominate the same progenitor target; the reconciler must leave
/// exactly one nomination standing.
#[test]
fn reconciler_resolves_a_contested_progenitor_across_snapshots() {
    use halo_merger_core::model::{CandidateEdge, EdgeList};

    let winner = EdgeList { edges: vec![CandidateEdge::new(0u32, 0.8, 0.0)], istep: 1 };
    let loser = EdgeList { edges: vec![CandidateEdge::new(0u32, 0.6, 0.0)], istep: 1 };
    let mut progenitor_edges = vec![vec![winner], vec![loser]];

    let index = EvidenceIndex::build(&progenitor_edges, ShardTag(0), 1);
    assert_eq!(index.entries(0).len(), 2);

    reconcile(&index, &mut progenitor_edges, ShardTag(0));

    assert_eq!(progenitor_edges[0][0].edges.len(), 1);
    assert!(progenitor_edges[1][0].is_empty());
}
