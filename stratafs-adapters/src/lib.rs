//! Storage backends for StrataFS
//!
//! Concrete implementations of the `stratafs_core::Adapter` capability
//! trait, plus content conveniences (hashing, MIME sniffing) layered on
//! top of the virtual tree.

mod local;
mod memory;

pub mod digest;
pub mod sniff;

pub use local::LocalAdapter;
pub use memory::MemoryAdapter;
