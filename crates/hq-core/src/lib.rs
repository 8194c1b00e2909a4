//! hoyo-hq/crates/hq-core/src/lib.rs
//!
//! The central domain logic and interface definitions for HOYO HQ.

pub mod document;
pub mod error;
pub mod merge;
pub mod models;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use merge::*;
pub use models::*;
pub use traits::*;
