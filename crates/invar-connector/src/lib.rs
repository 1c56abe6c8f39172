//! invar Connector Framework
//!
//! The Source Adapter contract consumed by the synchronization engine.
//! Concrete adapters (cloud discovery API, legacy inventory database) are
//! implemented outside this workspace against [`InventorySource`].

pub mod error;
pub mod traits;

pub use error::{ConnectorError, ConnectorResult};
pub use traits::{InventorySource, SourceRegistry};
