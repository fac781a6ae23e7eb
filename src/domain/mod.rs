//! Domain modules organized as vertical slices.
//!
//! Each sub-module contains its wire-faithful types in `mod.rs` and, where
//! the data is stream-driven, a `state.rs` container with update methods.
//! The matcher serializes its internal types directly, so no separate
//! wire/convert layer is needed here.

pub mod market;
pub mod order;
pub mod orderbook;
pub mod trade;
