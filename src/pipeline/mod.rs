pub mod aggregator;
pub mod drag;
pub mod stages;
pub mod summary;
