pub mod geo;
pub mod probe;
pub mod registration;
pub mod stats;
