// SPDX-License-Identifier: GPL-2.0

//! Value lattices.
//!
//! - [`lattice`]: the capability shared by every domain (join, meet,
//!   bottom test, induced order).
//! - [`numset`]: small finite sets of 64-bit values with explicit top and
//!   bottom; the same structure serves as numbers and as byte offsets.
//! - [`rcp`]: the per-value product domain with one independent component
//!   per region.

pub mod lattice;
pub mod numset;
pub mod rcp;

pub use lattice::*;
pub use numset::*;
pub use rcp::*;
