//! Filter operations
//!
//! This module provides the 2D convolution used by the deconvolution engine.

/// True 2D convolution with full and valid output semantics.
mod convolution;
pub use convolution::*;
