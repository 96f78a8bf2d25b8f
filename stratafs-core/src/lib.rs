//! StrataFS Core
//!
//! Core traits and types for the virtual filesystem layer: the virtual
//! path model, the adapter capability trait, mount-table resolution, and
//! the cross-adapter transfer engine.

pub mod adapter;
pub mod config;
pub mod error;
pub mod flags;
pub mod mount;
pub mod path;

mod engine;

pub use adapter::{read_to_bytes, Adapter, ByteStream, SpaceInfo};
pub use config::{AdapterConfig, AdapterConfigBuilder};
pub use error::{StrataError, StrataResult};
pub use flags::OperationFlags;
pub use mount::{Pathname, Vfs};
pub use path::VirtualPath;
