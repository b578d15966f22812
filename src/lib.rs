//! # Halo Merger-Tree Construction Core
//!
//! Given particle memberships of self-bound structures ("halos") at successive snapshots of a
//! cosmological N-body simulation, this crate computes for each halo at snapshot `S` the most
//! likely progenitor(s) at snapshot `S - Δ` (and, symmetrically, the most likely descendant(s)
//! at `S + Δ`), ranked by particle-ID set overlap under a configurable merit function. It then
//! prunes the resulting many-to-many relation so each candidate is claimed by at most one
//! counterpart, and stitches together partial results across multiple Δ steps.
//!
//! ## Pipeline
//!
//! ```text
//! IndexBuilder -> ShareAccumulator -> MeritRanker -> CrossMatcher -> ExclusivityFilter
//!                                                                  -> MultiStepReconciler
//! ```
//!
//! [`pipeline::SnapshotPairProcessor`] drives one snapshot-pair step end to end; callers
//! stitching together multiple Δ values compose [`processes::multi_step_reconciler`] on top of
//! that.
//!
//! ## What this crate does not do
//!
//! Snapshot I/O, halo-catalog parsing, and particle-id -> dense-index mapping *policy* are the
//! caller's concern — this crate only invokes the caller's mapping function and validates its
//! domain ([`processes::id_remap`]). Distributed (sharded) execution is modeled structurally
//! via [`model::ShardTag`] and the [`processes::id_remap::GlobalErrorReducer`] seam; no MPI or
//! other transport is implemented here.

pub mod config;
pub mod errors;
pub mod model;
pub mod pipeline;
pub mod processes;

/// Test-only support shared across this crate's `#[cfg(test)]` modules.
#[cfg(test)]
pub(crate) mod test_support {
    use once_cell::sync::Lazy;

    /// Forces `env_logger` to initialize at most once across the whole test binary, regardless
    /// of how many test threads call [`init_logger`] concurrently.
    static LOGGER: Lazy<()> = Lazy::new(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });

    pub fn init_logger() {
        Lazy::force(&LOGGER);
    }
}
