use anyhow::{Context, Result};
use colored::*;
use scanfusion_core::Format;
use serde::{Deserialize, Serialize};

/// One catalog entry with its engine-native identifiers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatRow {
    pub name: String,
    /// Whole-frame engine code; `None` when that engine lacks the symbology
    pub detector_code: Option<i32>,
    pub reader_id: String,
}

/// The full catalog in declaration order
pub fn rows() -> Vec<FormatRow> {
    Format::all()
        .iter()
        .map(|format| FormatRow {
            name: format.name().to_string(),
            detector_code: format.to_detector_format().map(|d| d.code()),
            reader_id: format!("{:?}", format.to_reader_format()),
        })
        .collect()
}

pub fn execute(json: bool) -> Result<()> {
    let rows = rows();

    if json {
        let out = serde_json::to_string_pretty(&rows)
            .with_context(|| "Failed to serialize format catalog")?;
        println!("{}", out);
        return Ok(());
    }

    println!("{:<20} {:>14} {:<16}", "FORMAT", "DETECTOR CODE", "READER ID");
    for row in &rows {
        let code = match row.detector_code {
            Some(code) => code.to_string().normal(),
            None => "unsupported".yellow(),
        };
        println!("{:<20} {:>14} {:<16}", row.name, code, row.reader_id);
    }
    Ok(())
}
