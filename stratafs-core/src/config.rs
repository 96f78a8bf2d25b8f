//! Adapter configuration
//!
//! Built through [`AdapterConfigBuilder`] and immutable afterwards.
//! Adapters receive the finished value at construction and never see a
//! mutable reference.

use crate::error::{StrataError, StrataResult};

/// Immutable configuration bound to an adapter instance
#[derive(Debug, Clone)]
pub struct AdapterConfig {
    root: String,
    create_root: bool,
}

impl AdapterConfig {
    pub fn builder() -> AdapterConfigBuilder {
        AdapterConfigBuilder::default()
    }

    /// The backend's base path or connection root.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Create the base path at adapter construction when it is missing.
    pub fn create_root(&self) -> bool {
        self.create_root
    }
}

#[derive(Debug, Default)]
pub struct AdapterConfigBuilder {
    root: Option<String>,
    create_root: bool,
}

impl AdapterConfigBuilder {
    pub fn root(mut self, root: impl Into<String>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn create_root(mut self, create: bool) -> Self {
        self.create_root = create;
        self
    }

    pub fn build(self) -> StrataResult<AdapterConfig> {
        let root = self
            .root
            .filter(|r| !r.is_empty())
            .ok_or_else(|| StrataError::Configuration("adapter root is not configured".into()))?;
        Ok(AdapterConfig {
            root,
            create_root: self.create_root,
        })
    }
}
