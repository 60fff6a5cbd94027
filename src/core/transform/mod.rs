//! Apply pipeline: scan, prepare keys, rewrite files, update locales.
//!
//! One [`Transformer::run`] is one run. Prepare walks the candidates in scan
//! order and assigns every one a key and a status. Apply then rewrites one
//! file at a time and records locale entries for what was rewritten. The
//! locale store is flushed once at the end, and only that flush can fail the
//! whole run.

pub mod splice;
pub mod writers;

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
    process::Command,
};

use anyhow::{Context, Result};
use serde::Serialize;

use self::writers::{FileRewrite, SourceWriter, WriteContext, Writer, registry, writer_for};
use crate::config::Config;
use crate::core::candidate::{Candidate, CandidateKind, CandidateStatus, TransformCandidate};
use crate::core::diff::{count_changes, unified_diff};
use crate::core::error::{Collision, SkipReason};
use crate::core::file_scanner::{FileScan, scan_files};
use crate::core::keygen::{KeyContext, KeyGenerator, is_suspicious_key, key_variants, looks_like_key};
use crate::core::locale::shape::hierarchy_collision;
use crate::core::locale::{LocaleDiffEntry, LocaleFileStats, LocaleStore, StoreOptions};
use crate::core::scan::{self, ScanOptions};
use crate::utils::relative_path;

/// Key variants tried after a collision before giving up.
pub const MAX_KEY_ATTEMPTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFileDiffEntry {
    pub path: String,
    pub relative_path: String,
    pub diff: String,
    pub changes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateStats {
    pub total: usize,
    pub pending: usize,
    pub existing: usize,
    pub duplicate: usize,
    pub applied: usize,
    pub skipped: usize,
}

impl CandidateStats {
    fn from_candidates(candidates: &[TransformCandidate]) -> Self {
        let mut stats = Self {
            total: candidates.len(),
            ..Default::default()
        };
        for candidate in candidates {
            match candidate.status {
                CandidateStatus::Pending => stats.pending += 1,
                CandidateStatus::Existing => stats.existing += 1,
                CandidateStatus::Duplicate => stats.duplicate += 1,
                CandidateStatus::Applied => stats.applied += 1,
                CandidateStatus::Skipped => stats.skipped += 1,
            }
        }
        stats
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformSummary {
    pub files_scanned: usize,
    pub files_changed: Vec<String>,
    pub candidates: Vec<TransformCandidate>,
    pub candidate_stats: CandidateStats,
    /// Skip counts by reason category.
    pub skipped_reasons: BTreeMap<String, usize>,
    pub locale_stats: Vec<LocaleFileStats>,
    pub diffs: Vec<LocaleDiffEntry>,
    pub source_diffs: Vec<SourceFileDiffEntry>,
    pub skipped_files: Vec<SkippedFile>,
    /// Whether files were written; `false` for a dry run.
    pub write: bool,
}

impl TransformSummary {
    /// A dry run found something an applying run would change.
    pub fn has_pending_work(&self) -> bool {
        !self.write && (!self.files_changed.is_empty() || !self.locale_stats.is_empty())
    }
}

/// Value recorded in the source locale for a rewritten candidate.
#[derive(Debug, Clone)]
struct LocaleValue {
    value: String,
    /// Key the text was stored under before migration.
    legacy_key: Option<String>,
}

/// State of a single run. Created by [`Transformer::run_files`] and dropped
/// when the run ends.
pub struct RunContext {
    store: LocaleStore,
    /// Content hash -> key of the candidate that owns it.
    hash_owners: HashMap<String, String>,
    /// Keys handed out in this run -> content hash.
    claimed_keys: HashMap<String, String>,
    /// Candidate id -> value to store.
    values: HashMap<String, LocaleValue>,
    files_changed: Vec<String>,
    source_diffs: Vec<SourceFileDiffEntry>,
    skipped_files: Vec<SkippedFile>,
}

impl RunContext {
    pub fn new(store: LocaleStore) -> Self {
        Self {
            store,
            hash_owners: HashMap::new(),
            claimed_keys: HashMap::new(),
            values: HashMap::new(),
            files_changed: Vec::new(),
            source_diffs: Vec::new(),
            skipped_files: Vec::new(),
        }
    }

    fn skip_file(&mut self, path: &str, reason: String) {
        tracing::warn!(event = "file_skipped", file = %path, reason = %reason);
        self.skipped_files.push(SkippedFile {
            path: path.to_string(),
            reason,
        });
    }
}

pub struct Transformer {
    config: Config,
    root: PathBuf,
    options: ScanOptions,
    keygen: KeyGenerator,
    writers: Vec<SourceWriter>,
}

impl Transformer {
    pub fn new(config: &Config, root: &Path) -> Self {
        Self {
            config: config.clone(),
            root: root.to_path_buf(),
            options: ScanOptions::from_config(config, root),
            keygen: KeyGenerator::new(&config.key_generation, &config.locales.delimiter),
            writers: registry(),
        }
    }

    pub fn open_store(&self) -> LocaleStore {
        LocaleStore::open(
            self.root.join(&self.config.locales_dir),
            StoreOptions::from_config(&self.config),
        )
    }

    /// Files selected by the include/ignore configuration.
    pub fn discover(&self) -> FileScan {
        scan_files(
            &self.root,
            &self.config.includes,
            &self.config.ignores,
            self.config.ignore_test_files,
        )
    }

    /// Discover, scan and transform the whole project.
    pub fn run(&self, write: bool) -> Result<TransformSummary> {
        let files = self.discover().files;
        self.run_files(&files, write, |_| {})
    }

    /// Transform the given files. `progress` is called after each candidate
    /// of the apply phase.
    pub fn run_files(
        &self,
        files: &[String],
        write: bool,
        mut progress: impl FnMut(&TransformCandidate),
    ) -> Result<TransformSummary> {
        let mut run = RunContext::new(self.open_store());

        let scanned = scan::scan(files, &self.options);
        for error in &scanned.errors {
            run.skip_file(&error.file_path, error.message.clone());
        }

        let mut candidates = self.prepare(scanned.candidates, &mut run)?;
        self.apply(&mut candidates, &mut run, write, &mut progress);

        let (locale_stats, diffs) = if write {
            let preview = run.store.preview().context("Failed to render locale files")?;
            let stats = run.store.flush().context("Failed to write locale files")?;
            (stats, preview.diffs)
        } else {
            let preview = run.store.preview().context("Failed to render locale files")?;
            (preview.stats, preview.diffs)
        };

        let mut skipped_reasons = BTreeMap::new();
        for reason in candidates.iter().filter_map(|c| c.reason.as_ref()) {
            *skipped_reasons.entry(reason.category().to_string()).or_insert(0) += 1;
        }

        let summary = TransformSummary {
            files_scanned: scanned.files_scanned,
            files_changed: run.files_changed,
            candidate_stats: CandidateStats::from_candidates(&candidates),
            candidates,
            skipped_reasons,
            locale_stats,
            diffs,
            source_diffs: run.source_diffs,
            skipped_files: run.skipped_files,
            write,
        };
        tracing::info!(
            event = "transform_completed",
            write,
            files = summary.files_scanned,
            changed = summary.files_changed.len(),
            applied = summary.candidate_stats.applied,
            skipped = summary.candidate_stats.skipped
        );
        Ok(summary)
    }

    // ---- prepare ----

    /// Assign keys and statuses in scan order.
    pub fn prepare(
        &self,
        candidates: Vec<Candidate>,
        run: &mut RunContext,
    ) -> Result<Vec<TransformCandidate>> {
        let mut prepared = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let tc = self.prepare_one(candidate, run)?;
            tracing::debug!(
                event = "candidate_prepared",
                id = %tc.candidate.id,
                key = %tc.suggested_key,
                status = %tc.status
            );
            prepared.push(tc);
        }
        Ok(prepared)
    }

    fn prepare_one(&self, candidate: Candidate, run: &mut RunContext) -> Result<TransformCandidate> {
        let source = self.config.source_locale.as_str();
        let delimiter = self.keygen.delimiter().to_string();
        let generated = self.keygen.generate(
            &candidate.text,
            &KeyContext {
                file_path: &candidate.file_path,
                kind: candidate.kind,
                path_hint: candidate.context.path_hint.as_deref(),
            },
        );
        let mut tc = TransformCandidate::new(candidate, generated.key, generated.content_hash);

        if let Some(pattern) = tc.candidate.context.rejection {
            tc.skip(SkipReason::UnsafeExpression(pattern))?;
            return Ok(tc);
        }

        let mut value = LocaleValue {
            value: tc.candidate.text.clone(),
            legacy_key: None,
        };
        if tc.candidate.kind == CandidateKind::CallArgument {
            if looks_like_key(&tc.candidate.text, &delimiter) {
                tc.suggested_key = tc.candidate.text.clone();
                tc.keyed = true;
                tc.transition(CandidateStatus::Existing)?;
                return Ok(tc);
            }
            let legacy = tc.candidate.text.clone();
            if let Some(stored) = run.store.get_value(source, &legacy)? {
                value.value = stored;
            }
            value.legacy_key = Some(legacy);
        }

        let key = match self.resolve_key(&tc.suggested_key, &tc.hash, run)? {
            Ok(key) => key,
            Err(collision) => {
                let key = tc.suggested_key.clone();
                tc.skip(SkipReason::CollisionUnresolved { key, collision })?;
                return Ok(tc);
            }
        };
        tc.suggested_key = key;

        if is_suspicious_key(&tc.suggested_key, &delimiter) {
            let key = tc.suggested_key.clone();
            tc.skip(SkipReason::SuspiciousKey(key))?;
            return Ok(tc);
        }

        if let Some(owner) = run.hash_owners.get(&tc.hash) {
            tc.suggested_key = owner.clone();
            tc.transition(CandidateStatus::Duplicate)?;
            run.values.insert(tc.candidate.id.clone(), value);
            return Ok(tc);
        }

        // A key the source locale already holds as a string is reused as is.
        if run.store.get_value(source, &tc.suggested_key)?.is_some() {
            tc.transition(CandidateStatus::Existing)?;
        }
        run.hash_owners.insert(tc.hash.clone(), tc.suggested_key.clone());
        run.claimed_keys.insert(tc.suggested_key.clone(), tc.hash.clone());
        run.values.insert(tc.candidate.id.clone(), value);
        Ok(tc)
    }

    /// First key among `key` and its variants that clashes with nothing.
    fn resolve_key(
        &self,
        key: &str,
        hash: &str,
        run: &mut RunContext,
    ) -> Result<std::result::Result<String, Collision>> {
        let Some(first) = self.collision(key, hash, run)? else {
            return Ok(Ok(key.to_string()));
        };
        let mut last = first;
        for variant in key_variants(key, first, self.keygen.delimiter(), MAX_KEY_ATTEMPTS) {
            match self.collision(&variant, hash, run)? {
                None => {
                    tracing::debug!(event = "key_mutated", from = %key, to = %variant, collision = %first);
                    return Ok(Ok(variant));
                }
                Some(collision) => last = collision,
            }
        }
        tracing::debug!(event = "key_collision_unresolved", key = %key, collision = %last);
        Ok(Err(last))
    }

    /// Hierarchy clashes with the store or this run, and keys claimed by
    /// other text in this run. A key the store already holds as a string is
    /// not a collision: the candidate reuses it.
    fn collision(&self, key: &str, hash: &str, run: &mut RunContext) -> Result<Option<Collision>> {
        let source = self.config.source_locale.as_str();
        if let Some(collision) = run.store.check_key_collision(source, key)? {
            return Ok(Some(collision));
        }
        if let Some(collision) = hierarchy_collision(run.claimed_keys.keys(), key, self.keygen.delimiter()) {
            return Ok(Some(collision));
        }
        if run.claimed_keys.get(key).is_some_and(|owner| owner != hash) {
            return Ok(Some(Collision::KeyTaken));
        }
        // Non-string leaves are never rewritten to.
        let non_string = run.store.get_value(source, key)?.is_none() && run.store.contains_key(source, key)?;
        Ok(non_string.then_some(Collision::KeyTaken))
    }

    // ---- apply ----

    fn apply(
        &self,
        candidates: &mut [TransformCandidate],
        run: &mut RunContext,
        write: bool,
        progress: &mut impl FnMut(&TransformCandidate),
    ) {
        let mut by_file: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (idx, tc) in candidates.iter().enumerate() {
            if needs_rewrite(tc) {
                by_file.entry(tc.candidate.file_path.clone()).or_default().push(idx);
            }
        }

        let targets = self.target_locales(run);
        for (file, indices) in by_file {
            let outcome = self.rewrite_file(&file, &indices, candidates, write);
            match outcome {
                Ok((skipped, diff)) => {
                    let skipped: HashMap<usize, SkipReason> = skipped.into_iter().collect();
                    for (pos, &idx) in indices.iter().enumerate() {
                        let tc = &mut candidates[idx];
                        match skipped.get(&pos) {
                            Some(reason) => skip_if_live(tc, reason.clone()),
                            None => self.record_applied(tc, run, &targets),
                        }
                        progress(tc);
                    }
                    self.record_file_change(&file, &diff, run);
                }
                Err(err) => {
                    let message = format!("{:#}", err);
                    for &idx in &indices {
                        skip_if_live(&mut candidates[idx], SkipReason::FileError(message.clone()));
                        progress(&candidates[idx]);
                    }
                    run.skip_file(&file, message);
                }
            }
        }
    }

    /// Rewrite one file and write it back when `write` is set. Returns the
    /// writer's skips and the source diff.
    fn rewrite_file(
        &self,
        file: &str,
        indices: &[usize],
        candidates: &[TransformCandidate],
        write: bool,
    ) -> Result<(Vec<(usize, SkipReason)>, String)> {
        let path = self.root.join(file);
        let source = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let writer = writer_for(&self.writers, file)
            .with_context(|| format!("No writer handles {}", file))?;
        let batch: Vec<&TransformCandidate> = indices.iter().map(|&i| &candidates[i]).collect();
        let ctx = WriteContext {
            file_path: &path,
            options: &self.options,
        };
        let FileRewrite { content, skipped } = writer.apply(&source, &batch, &ctx)?;

        if content == source {
            return Ok((skipped, String::new()));
        }
        if write {
            fs::write(&path, &content).with_context(|| format!("Failed to write {}", path.display()))?;
            self.format_file(&path);
        }
        Ok((skipped, unified_diff(&source, &content, file)))
    }

    fn record_file_change(&self, file: &str, diff: &str, run: &mut RunContext) {
        if diff.is_empty() {
            return;
        }
        run.files_changed.push(file.to_string());
        run.source_diffs.push(SourceFileDiffEntry {
            path: self.root.join(file).to_string_lossy().into_owned(),
            relative_path: file.to_string(),
            diff: diff.to_string(),
            changes: count_changes(diff),
        });
    }

    fn record_applied(&self, tc: &mut TransformCandidate, run: &mut RunContext, targets: &[String]) {
        if tc.status != CandidateStatus::Duplicate && tc.transition(CandidateStatus::Applied).is_err() {
            return;
        }
        let Some(value) = run.values.get(&tc.candidate.id).cloned() else {
            return;
        };
        if let Err(err) = self.store_value(&tc.suggested_key, &value, run, targets) {
            tracing::warn!(event = "locale_update_failed", key = %tc.suggested_key, error = %err);
        }
    }

    fn store_value(
        &self,
        key: &str,
        value: &LocaleValue,
        run: &mut RunContext,
        targets: &[String],
    ) -> Result<()> {
        let source = self.config.source_locale.as_str();
        // Stored values are never overwritten.
        if !run.store.contains_key(source, key)? {
            run.store.upsert(source, key, &value.value)?;
        }
        if !self.config.seed_target_locales {
            return Ok(());
        }
        for target in targets {
            if run.store.contains_key(target, key)? {
                continue;
            }
            let legacy = match &value.legacy_key {
                Some(legacy) => run.store.get_value(target, legacy)?,
                None => None,
            };
            let seeded = legacy.unwrap_or_else(|| self.config.target_placeholder.clone());
            run.store.upsert(target, key, &seeded)?;
        }
        Ok(())
    }

    /// Configured and stored locales other than the source.
    fn target_locales(&self, run: &RunContext) -> Vec<String> {
        let mut targets: Vec<String> = self.config.target_locales.clone();
        match run.store.get_stored_locales() {
            Ok(stored) => targets.extend(stored),
            Err(err) => tracing::warn!(error = %err, "cannot list stored locales"),
        }
        targets.sort();
        targets.dedup();
        targets.retain(|locale| *locale != self.config.source_locale);
        targets
    }

    /// Run the configured formatter on a written file. Failures are ignored.
    fn format_file(&self, path: &Path) {
        let Some((program, args)) = self.config.formatter.split_first() else {
            return;
        };
        match Command::new(program).args(args).arg(path).current_dir(&self.root).output() {
            Ok(output) if output.status.success() => {
                tracing::debug!(event = "file_formatted", file = %relative_path(&self.root, path));
            }
            Ok(output) => tracing::debug!(
                event = "formatter_failed",
                status = %output.status,
                stderr = %String::from_utf8_lossy(&output.stderr)
            ),
            Err(err) => tracing::debug!(event = "formatter_unavailable", program = %program, error = %err),
        }
    }
}

/// Candidates the apply phase rewrites. Duplicates are rewritten to their
/// owner's key.
fn needs_rewrite(tc: &TransformCandidate) -> bool {
    tc.awaiting_apply() || tc.status == CandidateStatus::Duplicate
}

fn skip_if_live(tc: &mut TransformCandidate, reason: SkipReason) {
    if !tc.status.is_terminal() && tc.skip(reason).is_err() {
        tracing::debug!(id = %tc.candidate.id, "candidate already settled");
    }
}
