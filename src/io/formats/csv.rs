//! Tabular export: one CSV row per person.
//!
//! Columns are fixed: `firstName,lastName,birthDate,deathDate,gender`. Fields
//! containing commas, quotes or line breaks are quoted by the CSV writer.

use crate::Result;
use crate::io::formats::ExportFormat;
use crate::io::traits::{SnapshotEncoder, write_failed};
use crate::models::GraphSnapshot;
use std::io::Write;

/// Header row of the table export.
pub const HEADER: [&str; 5] = ["firstName", "lastName", "birthDate", "deathDate", "gender"];

/// CSV table encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvEncoder;

impl SnapshotEncoder for CsvEncoder {
    fn format(&self) -> ExportFormat {
        ExportFormat::Table
    }

    fn encode(&self, snapshot: &GraphSnapshot, out: &mut dyn Write) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false) // Header is written explicitly so empty exports keep it
            .from_writer(out);

        writer
            .write_record(HEADER)
            .map_err(|e| write_failed("write_csv_header", e))?;

        for person in &snapshot.people {
            let data = &person.data;
            writer
                .write_record([
                    data.first_name.as_str(),
                    data.last_name.as_str(),
                    data.birth_date.as_deref().unwrap_or(""),
                    data.death_date.as_deref().unwrap_or(""),
                    data.gender.as_str(),
                ])
                .map_err(|e| write_failed("write_csv", e))?;
        }

        writer.flush().map_err(|e| write_failed("flush_csv", e))?;
        Ok(())
    }
}
