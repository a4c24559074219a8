//! Batch pipeline components.
//!
//! - **discovery**: Find input TIFFs in the source directory
//! - **validate**: Pre-decode checks (size, magic bytes)
//! - **decode**: Decode TIFFs and capture embedded ICC profiles
//! - **lens**: Barrel distortion correction
//! - **color**: ICC transform or profile embedding
//! - **export**: Output naming and TIFF encoding
//! - **metadata**: Attribute extraction and the JSON sidecar
//! - **processor**: Runs the stages for one file
//! - **dispatch**: Bounded concurrent fan-out over a batch

pub mod color;
pub mod decode;
pub mod discovery;
pub mod dispatch;
pub mod export;
pub mod lens;
pub mod metadata;
pub mod processor;
pub mod validate;

// Re-exports for convenient access
pub use color::{apply_profile, AppliedColor};
pub use decode::{DecodedImage, ImageDecoder};
pub use discovery::{DiscoveredFile, FileDiscovery};
pub use dispatch::Dispatcher;
pub use export::{write_tiff, OutputPaths};
pub use lens::{BarrelMapping, LensCorrection};
pub use metadata::MetadataExtractor;
pub use processor::{FilePipeline, FileTask};
pub use validate::Validator;
