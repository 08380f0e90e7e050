// Adapters layer: decoding of external tabular sources into domain records.

pub mod source;

pub use source::{decode, FieldResolver, SourceFormat};
