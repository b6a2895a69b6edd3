pub mod docker;
pub mod stats;
