//! Types library for the live game event feed
//!
//! This library provides the core type definitions shared by the feed
//! pipeline, keeping untrusted payload handling and markup safety in one
//! place.
//!
//! # Modules
//! - `envelope`: Event envelope, player metadata, payload scalars
//! - `markup`: Sanitizer, `SafeText`, typed render segments
//! - `entry`: Formatted entries and their identifiers
//! - `icon`: Symbolic icon keys
//! - `empire`: Empire tags and marker colours
//! - `numeric`: Display formatting for payload numbers
//! - `errors`: Error taxonomy

// Public modules
pub mod empire;
pub mod entry;
pub mod envelope;
pub mod errors;
pub mod icon;
pub mod markup;
pub mod numeric;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::empire::*;
    pub use crate::entry::*;
    pub use crate::envelope::*;
    pub use crate::errors::*;
    pub use crate::icon::*;
    pub use crate::markup::*;
    pub use crate::numeric::*;
}
