// s3-rewind/src/versions/mod.rs
pub(crate) mod history; // Version entries and canonical ordering
pub(crate) mod selector; // Depth / as-of selection over an ordered history

pub use history::{VersionEntry, VersionHistory};
pub use selector::{SelectionMode, SelectionPolicy, parse_as_of_timestamp};
