pub mod cli;
pub mod scenario;

// Re-exported so callers of the demo see the same container type.
pub use fsarray;
