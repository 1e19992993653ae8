//! Media asset management
//!
//! Asset records, variant caching, keyword derivation, file import and data URI helpers.

pub mod data_uri;
mod import;
mod keywords;
mod models;

pub use import::*;
pub use keywords::*;
pub use models::*;
