//! Platform model: targets, curated groups, the toolchain catalog and the
//! resolver that combines them.

pub mod catalog;
pub mod groups;
mod resolve;
mod target;

pub use catalog::{Catalog, CatalogSource, PlatformDiscovery};
pub use resolve::{resolve, Resolution, ResolutionWarning, ResolveOptions};
pub use target::BuildTarget;
