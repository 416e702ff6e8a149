//! Field declarations, line-protocol records, and errors shared across `fieldcrypt` crates.

pub mod error;
pub mod protocol;

pub use error::CodecError;
pub use protocol::{BlockMode, FieldKind, FieldSpec, SubType};
