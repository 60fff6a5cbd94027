use std::path::PathBuf;

use anyhow::{Context, Result};

use super::super::args::CommonArgs;
use crate::config::{CONFIG_FILE_NAME, Config, load_config};

/// Loaded configuration and the project root it applies to.
pub struct ProjectContext {
    pub config: Config,
    pub root: PathBuf,
    pub from_file: bool,
}

impl ProjectContext {
    /// Load the config found from `--path` and apply CLI overrides
    /// (CLI > config file > defaults).
    pub fn load(common_args: &CommonArgs) -> Result<Self> {
        let start = common_args
            .path
            .canonicalize()
            .with_context(|| format!("Invalid path: {}", common_args.path.display()))?;
        let loaded = load_config(&start)?;

        if common_args.verbose && !loaded.from_file {
            eprintln!("Note: No {} found, using default configuration", CONFIG_FILE_NAME);
        }

        let mut config = loaded.config;
        if let Some(source_locale) = &common_args.source_locale {
            config.source_locale = source_locale.clone();
        }
        if let Some(source_root) = &common_args.source_root {
            config.source_root = source_root.to_string_lossy().to_string();
        }
        if let Some(locales_dir) = &common_args.locales_dir {
            config.locales_dir = locales_dir.to_string_lossy().to_string();
        }
        config.validate()?;

        Ok(Self {
            config,
            root: loaded.root_dir,
            from_file: loaded.from_file,
        })
    }

    pub fn locales_dir(&self) -> PathBuf {
        self.root.join(&self.config.locales_dir)
    }
}
