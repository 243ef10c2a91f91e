pub mod catalog;
pub mod server;
pub mod stats;

/// Widths of the `VARCHAR` columns reports are written into.
pub const TEXT_COLUMN: usize = 100;
pub const SHORT_COLUMN: usize = 60;
