#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// image basic reductions module.
pub mod core;

/// image cropping module.
pub mod crop;

/// image filtering module.
pub mod filter;

/// image flipping module.
pub mod flip;

/// border padding module.
pub mod padding;

/// module containing parallization utilities.
pub mod parallel;

/// utility functions for resizing images.
pub mod resize;

/// total variation regularization module.
pub mod total_variation;
