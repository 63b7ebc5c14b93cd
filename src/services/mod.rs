pub mod cache;
pub mod dashboard;
pub mod filter;
pub mod grouping;
pub mod inat;
pub mod markers;
pub mod normalize;
pub mod source;
pub mod stats;
