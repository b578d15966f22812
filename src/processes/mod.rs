pub mod cross_matcher;
pub mod exclusivity_filter;
pub mod id_remap;
pub mod index_builder;
pub mod merit_ranker;
pub mod multi_step_reconciler;
pub mod share_accumulator;
