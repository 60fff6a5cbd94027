//! Locale files: shapes on disk and the in-memory store.

pub mod shape;
pub mod store;

pub use shape::Shape;
pub use store::{
    LocaleDiffEntry, LocaleFileStats, LocalePreview, LocaleStore, RenameOutcome, RenameReport,
    StoreOptions,
};
