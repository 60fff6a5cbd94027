//! CLI argument definitions using clap.
//!
//! ## Commands
//!
//! - `extract`: Find hardcoded text, rewrite it to translation calls, update locale files
//! - `reshape`: Rewrite every locale file as flat or nested JSON
//! - `init`: Initialize keysmith configuration file
//! - `serve`: Start MCP server for AI integration

use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};

use crate::core::locale::Shape;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Arguments {
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Arguments {
    /// Check if a command was provided, otherwise print help and return None.
    pub fn with_command_or_help(self) -> Option<Self> {
        if self.command.is_none() {
            Self::command().print_help().ok();
            None
        } else {
            Some(self)
        }
    }

    /// Get the verbose flag from the command's common args.
    pub fn verbose(&self) -> bool {
        match &self.command {
            Some(Command::Extract(cmd)) => cmd.args.common.verbose,
            Some(Command::Reshape(cmd)) => cmd.common.verbose,
            Some(Command::Init) | Some(Command::Serve) | None => false,
        }
    }
}

/// Common arguments shared by all commands.
#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// Project directory (config discovery starts here)
    #[arg(long, default_value = ".")]
    pub path: PathBuf,

    /// Source locale (overrides config file)
    #[arg(long)]
    pub source_locale: Option<String>,

    /// Source code root directory (overrides config file)
    #[arg(long)]
    pub source_root: Option<PathBuf>,

    /// Locale files directory (overrides config file)
    #[arg(long)]
    pub locales_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Parser)]
pub struct ExtractArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Actually rewrite files (default is dry-run)
    #[arg(long)]
    pub apply: bool,

    /// Print the full summary as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ExtractCommand {
    #[command(flatten)]
    pub args: ExtractArgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ShapeArg {
    Flat,
    Nested,
}

impl From<ShapeArg> for Shape {
    fn from(arg: ShapeArg) -> Self {
        match arg {
            ShapeArg::Flat => Shape::Flat,
            ShapeArg::Nested => Shape::Nested,
        }
    }
}

#[derive(Debug, Args)]
pub struct ReshapeCommand {
    /// Target shape
    #[arg(value_enum)]
    pub format: ShapeArg,

    /// Key delimiter for reading and writing nested files
    #[arg(long)]
    pub delimiter: Option<String>,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract hardcoded text into translation keys (dry-run unless --apply)
    Extract(ExtractCommand),
    /// Convert every locale file to flat or nested JSON
    Reshape(ReshapeCommand),
    /// Initialize a new .keysmithrc.json configuration file
    Init,
    /// Start MCP server for AI coding agents
    Serve,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extract() {
        let args = Arguments::parse_from(["keysmith", "extract", "--apply", "--locales-dir", "i18n"]);
        let Some(Command::Extract(cmd)) = args.command else {
            panic!("expected extract");
        };
        assert!(cmd.args.apply);
        assert!(!cmd.args.json);
        assert_eq!(cmd.args.common.locales_dir, Some(PathBuf::from("i18n")));
    }

    #[test]
    fn test_parse_reshape() {
        let args = Arguments::parse_from(["keysmith", "reshape", "nested", "--delimiter", "/", "-v"]);
        assert!(args.verbose());
        let Some(Command::Reshape(cmd)) = args.command else {
            panic!("expected reshape");
        };
        assert_eq!(cmd.format, ShapeArg::Nested);
        assert_eq!(cmd.delimiter.as_deref(), Some("/"));
    }
}
