pub mod snapshot_pair_processor;

pub use snapshot_pair_processor::SnapshotPairProcessor;
