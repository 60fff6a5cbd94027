//! Per-locale key/value store backed by `<dir>/<locale>.json` files.
//!
//! Records are loaded lazily and kept as flat `key -> value` maps. Nothing
//! touches the disk until [`LocaleStore::flush`], which writes every dirty
//! locale to a temp file first and only then renames them into place.

use std::{
    collections::{BTreeMap, BTreeSet, btree_map::Entry},
    fs, io,
    path::{Path, PathBuf},
};

use serde::Serialize;
use serde_json::{Map, Value};

use super::shape::{Shape, detect_shape, flatten, hierarchy_collision, sort_recursive, unflatten};
use crate::config::{Config, LocaleFormat};
use crate::core::diff::unified_diff;
use crate::core::error::{Collision, StoreError};

#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub format: LocaleFormat,
    pub delimiter: String,
    pub sort_keys: bool,
    pub source_locale: String,
}

impl StoreOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            format: config.locales.format,
            delimiter: config.locales.delimiter.clone(),
            sort_keys: config.locales.sort_keys,
            source_locale: config.source_locale.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocaleFileStats {
    pub locale: String,
    pub path: String,
    pub added: Vec<String>,
    pub updated: Vec<String>,
    pub removed: Vec<String>,
    pub total_keys: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocaleDiffEntry {
    pub locale: String,
    pub path: String,
    pub diff: String,
    pub added: Vec<String>,
    pub updated: Vec<String>,
    pub removed: Vec<String>,
}

/// Pending locale changes, as they would be written by a flush.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalePreview {
    pub stats: Vec<LocaleFileStats>,
    pub diffs: Vec<LocaleDiffEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RenameOutcome {
    Renamed,
    Duplicate,
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameReport {
    pub locale: String,
    pub from: String,
    pub to: String,
    pub outcome: RenameOutcome,
}

#[derive(Debug, Clone)]
struct LocaleRecord {
    path: PathBuf,
    entries: Map<String, Value>,
    original: Map<String, Value>,
    /// File content at load time, `None` when the file did not exist.
    original_text: Option<String>,
    shape: Option<Shape>,
    dirty: bool,
}

impl LocaleRecord {
    fn load(path: PathBuf, delimiter: &str) -> Result<Self, StoreError> {
        let text = match fs::read_to_string(&path) {
            Ok(text) => Some(text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(source) => return Err(StoreError::Read { path, source }),
        };

        let (entries, shape) = match text.as_deref() {
            Some(content) if !content.trim().is_empty() => {
                let value: Value = serde_json::from_str(content).map_err(|source| {
                    StoreError::Parse {
                        path: path.clone(),
                        source,
                    }
                })?;
                let Value::Object(map) = value else {
                    return Err(StoreError::NotAnObject { path });
                };
                (flatten(&map, delimiter), detect_shape(&map, delimiter))
            }
            _ => (Map::new(), None),
        };

        Ok(Self {
            path,
            original: entries.clone(),
            entries,
            original_text: text,
            shape,
            dirty: false,
        })
    }

    fn stats(&self, locale: &str) -> LocaleFileStats {
        let mut added = Vec::new();
        let mut updated = Vec::new();
        for (key, value) in &self.entries {
            match self.original.get(key) {
                None => added.push(key.clone()),
                Some(old) if old != value => updated.push(key.clone()),
                Some(_) => {}
            }
        }
        let mut removed: Vec<String> = self
            .original
            .keys()
            .filter(|k| !self.entries.contains_key(*k))
            .cloned()
            .collect();
        added.sort();
        updated.sort();
        removed.sort();

        LocaleFileStats {
            locale: locale.to_string(),
            path: self.path.to_string_lossy().to_string(),
            added,
            updated,
            removed,
            total_keys: self.entries.len(),
        }
    }
}

/// One locale serialized and ready to be committed.
#[derive(Debug)]
struct StagedLocale {
    locale: String,
    path: PathBuf,
    content: String,
    shape: Shape,
    original_text: Option<String>,
    stats: LocaleFileStats,
}

#[derive(Debug)]
pub struct LocaleStore {
    dir: PathBuf,
    options: StoreOptions,
    records: BTreeMap<String, LocaleRecord>,
    shape_override: Option<Shape>,
}

impl LocaleStore {
    pub fn open(dir: impl Into<PathBuf>, options: StoreOptions) -> Self {
        Self {
            dir: dir.into(),
            options,
            records: BTreeMap::new(),
            shape_override: None,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn delimiter(&self) -> &str {
        &self.options.delimiter
    }

    pub fn source_locale(&self) -> &str {
        &self.options.source_locale
    }

    pub fn locale_path(&self, locale: &str) -> PathBuf {
        self.dir.join(format!("{}.json", locale))
    }

    fn record(&mut self, locale: &str) -> Result<&mut LocaleRecord, StoreError> {
        let path = self.locale_path(locale);
        match self.records.entry(locale.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let record = LocaleRecord::load(path, &self.options.delimiter)?;
                tracing::debug!(
                    event = "locale_loaded",
                    locale,
                    keys = record.entries.len(),
                    shape = ?record.shape
                );
                Ok(entry.insert(record))
            }
        }
    }

    /// Flat view of a locale; an absent file is an empty locale.
    pub fn get(&mut self, locale: &str) -> Result<&Map<String, Value>, StoreError> {
        Ok(&self.record(locale)?.entries)
    }

    pub fn get_value(&mut self, locale: &str, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .record(locale)?
            .entries
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    pub fn contains_key(&mut self, locale: &str, key: &str) -> Result<bool, StoreError> {
        Ok(self.record(locale)?.entries.contains_key(key))
    }

    /// Insert or replace a string value in memory.
    pub fn upsert(&mut self, locale: &str, key: &str, value: &str) -> Result<(), StoreError> {
        let record = self.record(locale)?;
        let value = Value::String(value.to_string());
        if record.entries.get(key) != Some(&value) {
            record.entries.insert(key.to_string(), value);
            record.dirty = true;
        }
        Ok(())
    }

    pub fn remove(&mut self, locale: &str, key: &str) -> Result<bool, StoreError> {
        let record = self.record(locale)?;
        let removed = record.entries.shift_remove(key).is_some();
        record.dirty |= removed;
        Ok(removed)
    }

    pub fn rename_key(&mut self, locale: &str, from: &str, to: &str) -> Result<RenameOutcome, StoreError> {
        let record = self.record(locale)?;
        if !record.entries.contains_key(from) {
            return Ok(RenameOutcome::Missing);
        }
        if from != to && record.entries.contains_key(to) {
            return Ok(RenameOutcome::Duplicate);
        }
        if let Some(value) = record.entries.shift_remove(from) {
            record.entries.insert(to.to_string(), value);
            record.dirty = true;
        }
        Ok(RenameOutcome::Renamed)
    }

    /// Rename many keys across every known locale.
    ///
    /// Without `allow_conflicts`, a target that already exists anywhere aborts
    /// the whole batch before any locale is touched. With it, conflicting pairs
    /// are reported as duplicates and left alone.
    pub fn rename_keys(
        &mut self,
        pairs: &[(String, String)],
        allow_conflicts: bool,
    ) -> Result<Vec<RenameReport>, StoreError> {
        let locales = self.known_locales()?;

        if !allow_conflicts {
            for locale in &locales {
                let entries = &self.record(locale)?.entries;
                if let Some((from, to)) = pairs
                    .iter()
                    .find(|(from, to)| from != to && entries.contains_key(from) && entries.contains_key(to))
                {
                    return Err(StoreError::RenameDuplicateTarget {
                        locale: locale.clone(),
                        from: from.clone(),
                        to: to.clone(),
                    });
                }
            }
        }

        let mut reports = Vec::with_capacity(locales.len() * pairs.len());
        for locale in &locales {
            for (from, to) in pairs {
                let outcome = self.rename_key(locale, from, to)?;
                reports.push(RenameReport {
                    locale: locale.clone(),
                    from: from.clone(),
                    to: to.clone(),
                    outcome,
                });
            }
        }
        Ok(reports)
    }

    /// Hierarchy clash between `key` and the keys already in `locale`.
    pub fn check_key_collision(&mut self, locale: &str, key: &str) -> Result<Option<Collision>, StoreError> {
        let delimiter = self.options.delimiter.clone();
        let record = self.record(locale)?;
        Ok(hierarchy_collision(record.entries.keys(), key, &delimiter))
    }

    /// Locale names with a `<locale>.json` file on disk, sorted.
    pub fn get_stored_locales(&self) -> Result<Vec<String>, StoreError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::ListLocales {
                    path: self.dir.clone(),
                    source,
                });
            }
        };

        let mut locales: Vec<String> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().to_string()))
            .collect();
        locales.sort();
        Ok(locales)
    }

    /// Source locale, every locale on disk and every locale touched in memory.
    pub fn known_locales(&self) -> Result<Vec<String>, StoreError> {
        let mut locales: BTreeSet<String> = self.get_stored_locales()?.into_iter().collect();
        locales.extend(self.records.keys().cloned());
        locales.insert(self.options.source_locale.clone());
        Ok(locales.into_iter().collect())
    }

    pub fn is_dirty(&self) -> bool {
        self.records.values().any(|r| r.dirty)
    }

    fn output_shape(&self, record: &LocaleRecord) -> Shape {
        if let Some(shape) = self.shape_override {
            return shape;
        }
        match self.options.format {
            LocaleFormat::Flat => Shape::Flat,
            LocaleFormat::Nested => Shape::Nested,
            LocaleFormat::Auto => record
                .shape
                .or_else(|| {
                    self.records
                        .get(&self.options.source_locale)
                        .and_then(|source| source.shape)
                })
                .unwrap_or(Shape::Nested),
        }
    }

    fn render(&self, locale: &str, record: &LocaleRecord) -> Result<(String, Shape), StoreError> {
        let shape = self.output_shape(record);
        let mut document = match shape {
            Shape::Flat => record.entries.clone(),
            Shape::Nested => unflatten(&record.entries, &self.options.delimiter)?,
        };
        if self.options.sort_keys {
            sort_recursive(&mut document);
        }
        let content = serde_json::to_string_pretty(&Value::Object(document)).map_err(|source| {
            StoreError::Serialize {
                locale: locale.to_string(),
                source,
            }
        })?;
        Ok((format!("{}\n", content), shape))
    }

    fn stage(&self) -> Result<Vec<StagedLocale>, StoreError> {
        let mut staged = Vec::new();
        for (locale, record) in self.records.iter().filter(|(_, r)| r.dirty) {
            let (content, shape) = self.render(locale, record)?;
            if record.original_text.as_deref() == Some(content.as_str()) {
                continue;
            }
            staged.push(StagedLocale {
                locale: locale.clone(),
                path: record.path.clone(),
                content,
                shape,
                original_text: record.original_text.clone(),
                stats: record.stats(locale),
            });
        }
        Ok(staged)
    }

    /// Stats and diffs of everything a flush would write.
    pub fn preview(&self) -> Result<LocalePreview, StoreError> {
        let mut preview = LocalePreview::default();
        for staged in self.stage()? {
            let label = staged
                .path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| format!("{}.json", staged.locale));
            let old = staged.original_text.as_deref().unwrap_or("");
            preview.diffs.push(LocaleDiffEntry {
                locale: staged.locale.clone(),
                path: staged.stats.path.clone(),
                diff: unified_diff(old, &staged.content, &label),
                added: staged.stats.added.clone(),
                updated: staged.stats.updated.clone(),
                removed: staged.stats.removed.clone(),
            });
            preview.stats.push(staged.stats);
        }
        Ok(preview)
    }

    /// Write every dirty locale.
    ///
    /// Either all touched files are replaced or, on failure, all of them keep
    /// their previous content.
    pub fn flush(&mut self) -> Result<Vec<LocaleFileStats>, StoreError> {
        let staged = self.stage()?;
        if staged.is_empty() {
            for record in self.records.values_mut() {
                record.dirty = false;
            }
            return Ok(Vec::new());
        }

        commit(&self.dir, &staged)?;

        let mut stats = Vec::with_capacity(staged.len());
        for staged in staged {
            if let Some(record) = self.records.get_mut(&staged.locale) {
                record.original = record.entries.clone();
                record.original_text = Some(staged.content);
                record.shape = Some(staged.shape);
                record.dirty = false;
            }
            tracing::info!(
                event = "locale_flushed",
                locale = %staged.locale,
                added = staged.stats.added.len(),
                updated = staged.stats.updated.len(),
                removed = staged.stats.removed.len()
            );
            stats.push(staged.stats);
        }
        for record in self.records.values_mut() {
            record.dirty = false;
        }
        Ok(stats)
    }

    /// Rewrite every stored locale into `target` shape.
    ///
    /// Reloads from disk, so in-memory changes must be flushed first. A new
    /// `delimiter` applies to both reading nested files and writing the result.
    pub fn rewrite_shape(
        &mut self,
        target: Shape,
        delimiter: Option<&str>,
    ) -> Result<Vec<LocaleFileStats>, StoreError> {
        if let Some((locale, _)) = self.records.iter().find(|(_, r)| r.dirty) {
            return Err(StoreError::UnflushedChanges(locale.clone()));
        }
        if let Some(delimiter) = delimiter {
            self.options.delimiter = delimiter.to_string();
        }
        self.records.clear();

        for locale in self.get_stored_locales()? {
            self.record(&locale)?.dirty = true;
        }

        self.shape_override = Some(target);
        let result = self.flush();
        self.shape_override = None;
        self.options.format = match target {
            Shape::Flat => LocaleFormat::Flat,
            Shape::Nested => LocaleFormat::Nested,
        };
        result
    }
}

fn temp_path(path: &Path) -> PathBuf {
    path.with_extension("json.tmp")
}

/// Two-phase write: every temp file first, then the renames.
fn commit(dir: &Path, staged: &[StagedLocale]) -> Result<(), StoreError> {
    fs::create_dir_all(dir).map_err(|source| StoreError::LocaleWrite {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut temps: Vec<PathBuf> = Vec::with_capacity(staged.len());
    for locale in staged {
        let temp = temp_path(&locale.path);
        if let Err(source) = fs::write(&temp, &locale.content) {
            // The failed temp may be a directory or partially written; only
            // remove what we created.
            for created in &temps {
                let _ = fs::remove_file(created);
            }
            if temp.is_file() {
                let _ = fs::remove_file(&temp);
            }
            tracing::warn!(event = "locale_write_failed", path = %locale.path.display(), error = %source);
            return Err(StoreError::LocaleWrite {
                path: locale.path.clone(),
                source,
            });
        }
        temps.push(temp);
    }

    for (index, locale) in staged.iter().enumerate() {
        if let Err(source) = fs::rename(&temps[index], &locale.path) {
            for temp in &temps[index..] {
                let _ = fs::remove_file(temp);
            }
            for done in &staged[..index] {
                restore(done);
            }
            tracing::warn!(event = "locale_rename_failed", path = %locale.path.display(), error = %source);
            return Err(StoreError::LocaleWrite {
                path: locale.path.clone(),
                source,
            });
        }
    }
    Ok(())
}

/// Put back the pre-flush content of an already renamed locale.
fn restore(locale: &StagedLocale) {
    let result = match &locale.original_text {
        Some(text) => fs::write(&locale.path, text),
        None => fs::remove_file(&locale.path),
    };
    if let Err(error) = result {
        tracing::error!(event = "locale_restore_failed", path = %locale.path.display(), %error);
    }
}
