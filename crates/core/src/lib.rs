//! Pure types and functions for the feedcache service.
//!
//! Nothing in this crate performs I/O. The binary crate supplies the cache
//! and storage backends and wires them together behind the traits defined
//! here.

pub mod cache;
pub mod post;
pub mod serde;
pub mod storage;
