pub mod edge;
pub mod evidence;
pub mod halo;

pub use edge::{CandidateEdge, EdgeList, HaloIdEdgeList, OrdinalEdgeList};
pub use evidence::{EvidenceEntry, ShardTag};
pub use halo::{Halo, ParticleLabeling, PerSnapshotCatalog};
