//! Extraction engine.
//!
//! A run goes through four stages:
//! 1. **Scan** ([`scan`]): parse each file and collect hardcoded text as candidates
//! 2. **Prepare** ([`transform`]): generate keys, resolve collisions and duplicates
//! 3. **Apply** ([`transform::writers`]): rewrite sources in place
//! 4. **Persist** ([`locale`]): update and flush the locale files

pub mod adapter;
pub mod candidate;
pub mod diff;
pub mod error;
pub mod file_scanner;
pub mod keygen;
pub mod locale;
pub mod parsers;
pub mod reconcile;
pub mod scan;
pub mod transform;
