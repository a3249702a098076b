use crate::ir::Domain;
use crate::layout::{ColumnSummary, ExportLayout, HeaderBlock};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub domain: String,
    pub width: f32,
    pub height: f32,
    pub header_width: f32,
    pub header: Vec<HeaderBlock>,
    pub columns: Vec<ColumnDump>,
}

#[derive(Debug, Serialize)]
pub struct ColumnDump {
    pub tactic: String,
    pub name: String,
    pub key: String,
    pub label: String,
    pub x: f32,
    pub y: f32,
    pub techniques: usize,
    pub excluded: usize,
    pub expanded: usize,
    pub height: f32,
}

impl From<&ColumnSummary> for ColumnDump {
    fn from(column: &ColumnSummary) -> Self {
        Self {
            tactic: column.tactic_id.clone(),
            name: column.tactic_name.clone(),
            key: column.tactic_key.clone(),
            label: column.label.clone(),
            x: column.x,
            y: column.y,
            techniques: column.techniques,
            excluded: column.excluded,
            expanded: column.expanded,
            height: column.height,
        }
    }
}

impl LayoutDump {
    pub fn from_layout(layout: &ExportLayout, domain: Domain) -> Self {
        LayoutDump {
            domain: domain.to_string(),
            width: layout.width,
            height: layout.height,
            header_width: layout.header.available_width,
            header: layout.header.blocks.clone(),
            columns: layout.columns.iter().map(ColumnDump::from).collect(),
        }
    }
}

pub fn write_layout_dump(path: &Path, layout: &ExportLayout, domain: Domain) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout, domain);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
