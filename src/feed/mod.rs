//! Feed derivation: merge policy, ordering, and read/dismiss state.

pub mod aggregator;
pub mod idset;

pub use aggregator::FeedAggregator;
pub use idset::RETAINED_IDS;
