//! File-format registry: extension/MIME metadata layered above the
//! network-decoder registry, plus JSON-driven bulk registration.

mod descriptor;
mod error;
mod json;
mod store;
mod utf8;

pub use descriptor::{desc_from_path, PathDescriptor};
pub use error::FileFormatError;
pub use json::register_from_json_path;
pub use store::{FileFormatParameter, Registry};
pub use utf8::utf8_validate;
