//! Advertisement manifest: data model, archive loading, caching and asset URLs.

pub mod archive;
pub mod model;
pub mod provider;
pub mod resolve;

pub use archive::{LoadedManifest, ManifestError};
pub use model::{AdKind, AdvertisementItem, Asset, FlatEntry, Manifest};
pub use provider::{ManifestProvider, ManifestSnapshot, ZipManifestSource};
pub use resolve::AssetResolver;
