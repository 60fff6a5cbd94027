use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use glob::Pattern;
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = ".keysmithrc.json";

/// Upper bound for `keyGeneration.hashLength`; a blake3 prefix longer than
/// this adds nothing to key legibility.
pub const MAX_HASH_LENGTH: usize = 16;

pub const TEST_FILE_PATTERNS: &[&str] = &[
    "**/*.test.tsx",
    "**/*.test.ts",
    "**/*.test.jsx",
    "**/*.test.js",
    "**/*.spec.tsx",
    "**/*.spec.ts",
    "**/*.spec.jsx",
    "**/*.spec.js",
    "**/__tests__/**",
];

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_source_locale")]
    pub source_locale: String,
    #[serde(default)]
    pub target_locales: Vec<String>,
    #[serde(default)]
    pub ignores: Vec<String>,
    #[serde(default = "default_includes")]
    pub includes: Vec<String>,
    #[serde(default = "default_ignore_test_files")]
    pub ignore_test_files: bool,
    #[serde(default = "default_translatable_attributes", alias = "checkedAttributes")]
    pub translatable_attributes: Vec<String>,
    #[serde(default)]
    pub ignore_texts: Vec<String>,
    #[serde(default = "default_locales_dir")]
    pub locales_dir: String,
    #[serde(default = "default_source_root")]
    pub source_root: String,
    #[serde(default)]
    pub translation_adapter: TranslationAdapter,
    #[serde(default)]
    pub key_generation: KeyGeneration,
    #[serde(default)]
    pub locales: LocaleSettings,
    #[serde(default)]
    pub seed_target_locales: bool,
    #[serde(default)]
    pub target_placeholder: String,
    #[serde(default)]
    pub migrate_legacy_keys: bool,
    #[serde(default = "default_scan_translation_calls")]
    pub scan_translation_calls: bool,
    /// Command run on every rewritten source file, the file path is appended
    /// as the last argument. Empty disables formatting.
    #[serde(default)]
    pub formatter: Vec<String>,
}

/// Where the translation hook comes from and how it is called.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationAdapter {
    #[serde(default = "default_adapter_module")]
    pub module: String,
    #[serde(default = "default_hook_name")]
    pub hook_name: String,
    #[serde(default = "default_call_name")]
    pub call_name: String,
    #[serde(default = "default_template_call_name")]
    pub template_call_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyGeneration {
    #[serde(default)]
    pub namespace: String,
    /// Length of the content-hash suffix appended to every key, 0 disables it.
    #[serde(default)]
    pub hash_length: usize,
    #[serde(default = "default_max_words")]
    pub max_words: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LocaleFormat {
    Flat,
    Nested,
    #[default]
    Auto,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocaleSettings {
    #[serde(default)]
    pub format: LocaleFormat,
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    #[serde(default = "default_sort_keys")]
    pub sort_keys: bool,
}

fn default_source_locale() -> String {
    "en".to_string()
}

fn default_includes() -> Vec<String> {
    let root_dirs = ["src", ""];
    let sub_dirs = ["app", "components", "pages"];

    root_dirs
        .iter()
        .flat_map(|root| {
            sub_dirs.iter().map(move |sub| {
                if root.is_empty() {
                    sub.to_string()
                } else {
                    format!("{}/{}", root, sub)
                }
            })
        })
        .collect()
}

fn default_translatable_attributes() -> Vec<String> {
    [
        "placeholder",
        "title",
        "alt",
        "label",
        "aria-label",
        "aria-description",
        "aria-placeholder",
        "aria-roledescription",
        "aria-valuetext",
    ]
    .map(String::from)
    .to_vec()
}

fn default_locales_dir() -> String {
    "./messages".to_string()
}

fn default_source_root() -> String {
    "./".to_string()
}

fn default_ignore_test_files() -> bool {
    true
}

fn default_scan_translation_calls() -> bool {
    true
}

fn default_adapter_module() -> String {
    "next-intl".to_string()
}

fn default_hook_name() -> String {
    "useTranslations".to_string()
}

fn default_call_name() -> String {
    "t".to_string()
}

fn default_template_call_name() -> String {
    "$t".to_string()
}

fn default_max_words() -> usize {
    5
}

fn default_delimiter() -> String {
    ".".to_string()
}

fn default_sort_keys() -> bool {
    true
}

impl Default for TranslationAdapter {
    fn default() -> Self {
        Self {
            module: default_adapter_module(),
            hook_name: default_hook_name(),
            call_name: default_call_name(),
            template_call_name: default_template_call_name(),
        }
    }
}

impl Default for KeyGeneration {
    fn default() -> Self {
        Self {
            namespace: String::new(),
            hash_length: 0,
            max_words: default_max_words(),
        }
    }
}

impl Default for LocaleSettings {
    fn default() -> Self {
        Self {
            format: LocaleFormat::default(),
            delimiter: default_delimiter(),
            sort_keys: default_sort_keys(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_locale: default_source_locale(),
            target_locales: Vec::new(),
            ignores: Vec::new(),
            includes: default_includes(),
            ignore_test_files: default_ignore_test_files(),
            translatable_attributes: default_translatable_attributes(),
            ignore_texts: Vec::new(),
            locales_dir: default_locales_dir(),
            source_root: default_source_root(),
            translation_adapter: TranslationAdapter::default(),
            key_generation: KeyGeneration::default(),
            locales: LocaleSettings::default(),
            seed_target_locales: false,
            target_placeholder: String::new(),
            migrate_legacy_keys: false,
            scan_translation_calls: default_scan_translation_calls(),
            formatter: Vec::new(),
        }
    }
}

impl Config {
    /// Validate configuration values.
    ///
    /// Returns an error for invalid glob patterns, an empty key delimiter,
    /// an oversized hash length, or a source locale listed as a target.
    pub fn validate(&self) -> Result<()> {
        for pattern in &self.ignores {
            Pattern::new(pattern)
                .with_context(|| format!("Invalid glob pattern in 'ignores': \"{}\"", pattern))?;
        }

        // Patterns without wildcards are literal directory paths, so
        // `app/[locale]` is valid without escaping.
        for pattern in &self.includes {
            if pattern.contains('*') || pattern.contains('?') {
                Pattern::new(pattern).with_context(|| {
                    format!("Invalid glob pattern in 'includes': \"{}\"", pattern)
                })?;
            }
        }

        if self.locales.delimiter.is_empty() {
            bail!("'locales.delimiter' must not be empty");
        }

        if self.key_generation.hash_length > MAX_HASH_LENGTH {
            bail!(
                "'keyGeneration.hashLength' must be at most {}, got {}",
                MAX_HASH_LENGTH,
                self.key_generation.hash_length
            );
        }

        if self.key_generation.max_words == 0 {
            bail!("'keyGeneration.maxWords' must be at least 1");
        }

        if self.target_locales.contains(&self.source_locale) {
            bail!(
                "'targetLocales' must not contain the source locale \"{}\"",
                self.source_locale
            );
        }

        Ok(())
    }
}

pub fn default_config_json() -> Result<String> {
    let config = Config::default();
    serde_json::to_string_pretty(&config).context("Failed to generate default config.")
}

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }
        if current.join(".git").exists() {
            return None;
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Result of loading configuration.
pub struct ConfigLoadResult {
    pub config: Config,
    /// True if config was loaded from a file, false if using defaults.
    pub from_file: bool,
    /// Directory holding the config file, or the start directory for defaults.
    pub root_dir: PathBuf,
}

pub fn load_config(start_dir: &Path) -> Result<ConfigLoadResult> {
    match find_config_file(start_dir) {
        Some(path) => {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            config.validate()?;
            let root_dir = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| start_dir.to_path_buf());
            tracing::debug!(event = "config_loaded", path = %path.display());
            Ok(ConfigLoadResult {
                config,
                from_file: true,
                root_dir,
            })
        }
        None => Ok(ConfigLoadResult {
            config: Config::default(),
            from_file: false,
            root_dir: start_dir.to_path_buf(),
        }),
    }
}
