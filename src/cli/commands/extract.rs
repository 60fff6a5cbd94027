use anyhow::Result;

use super::super::args::ExtractCommand;
use super::helper::ProjectContext;
use super::{CommandResult, CommandSummary, ExtractSummary};
use crate::core::transform::Transformer;

pub fn extract(cmd: ExtractCommand) -> Result<CommandResult> {
    let args = &cmd.args;
    let ctx = ProjectContext::load(&args.common)?;
    let transformer = Transformer::new(&ctx.config, &ctx.root);
    let summary = transformer.run(args.apply)?;

    Ok(CommandResult {
        summary: CommandSummary::Extract(Box::new(ExtractSummary {
            root: ctx.root,
            summary,
        })),
        json: args.json,
    })
}
