use crate::ir::{TacticColumn, find_match};
use crate::scene::Group;

use super::technique::build_technique;
use super::types::ExportContext;

pub(crate) struct ColumnOutput {
    pub group: Group,
    /// Offset after the last block, i.e. the height of all placed rows.
    pub offset: f32,
    pub shown: usize,
    pub excluded: usize,
    pub expanded: usize,
}

/// Lays out one tactic's techniques top to bottom. `tactic_key` is the
/// normalized tactic id the match rules are written against.
pub(crate) fn build_column(column: &TacticColumn, tactic_key: &str, ctx: &ExportContext<'_>) -> ColumnOutput {
    let mut group = Group::at(0.0, ctx.config.column_offset_y).with_class("techniques");
    let mut offset = 0.0;
    let (mut shown, mut excluded, mut expanded) = (0, 0, 0);

    for technique in &column.techniques {
        if find_match(ctx.excluded, &technique.id, tactic_key).is_some() {
            excluded += 1;
            continue;
        }
        let subtechniques = if find_match(ctx.visible_subtechniques, &technique.id, tactic_key).is_some() {
            technique.subtechniques.as_slice()
        } else {
            &[]
        };
        if !subtechniques.is_empty() {
            expanded += 1;
        }
        let (block, next) = build_technique(offset, technique, subtechniques, tactic_key, ctx);
        group.append(block);
        offset = next;
        shown += 1;
    }

    ColumnOutput {
        group,
        offset,
        shown,
        excluded,
        expanded,
    }
}
