//! Corrupted-fixture generation.
//!
//! [`shatter`] walks a JSON object and yields every variant that is missing
//! exactly one field, either at the top level or inside a nested object,
//! subject to an `affected` / `unaffected` pair of [`ShatterFilter`]s.

pub mod filter;
pub mod shatter;

pub use filter::{FilterEntry, FilterError, ShatterFilter};
pub use shatter::{shatter, Depth, Shatter, ShatterOptions, Variant};
