pub mod log;
pub mod metadata;

pub use metadata::MetadataResolver;
