//! Keysmith - hardcoded text extraction for i18n projects
//!
//! Keysmith finds user-visible text hardcoded in JSX/TSX components and Vue
//! templates, generates stable translation keys for it, rewrites the source
//! to translation calls and keeps the JSON locale files in sync.
//!
//! ## Module Structure
//!
//! - `cli`: Command-line interface (`extract`, `reshape`, `init`, `serve`)
//! - `config`: Configuration file loading and validation
//! - `core`: Scanner, key generator, locale store and apply pipeline
//! - `mcp`: Model Context Protocol server exposing the pipeline as tools
//! - `utils`: Shared text and path helpers

pub mod cli;
pub mod config;
pub mod core;
pub mod mcp;
pub mod utils;
