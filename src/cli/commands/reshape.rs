use anyhow::{Context, Result};

use super::super::args::ReshapeCommand;
use super::helper::ProjectContext;
use super::{CommandResult, CommandSummary, ReshapeSummary};
use crate::core::locale::{LocaleStore, Shape, StoreOptions};

pub fn reshape(cmd: ReshapeCommand) -> Result<CommandResult> {
    let ctx = ProjectContext::load(&cmd.common)?;
    let shape = Shape::from(cmd.format);
    let mut store = LocaleStore::open(ctx.locales_dir(), StoreOptions::from_config(&ctx.config));
    let stats = store
        .rewrite_shape(shape, cmd.delimiter.as_deref())
        .context("Failed to reshape locale files")?;

    Ok(CommandResult {
        summary: CommandSummary::Reshape(ReshapeSummary {
            shape,
            locale_count: store.get_stored_locales()?.len(),
            stats,
        }),
        json: false,
    })
}
