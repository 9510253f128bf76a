use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use super::calendar::CalendarZone;
use super::domain::AdherenceHistoryEntry;

#[derive(Debug, thiserror::Error)]
pub enum HistoryImportError {
    #[error("failed to read adherence export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid adherence CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: {detail}")]
    InvalidRow { row: usize, detail: String },
}

/// Loads prior adherence history from a CSV export.
///
/// Expected headers: `Date,Adherent,Duration,Appliance Type,Photo URL,Notes`. Only `Date` and
/// `Adherent` are required. Imported entries carry no score.
pub struct HistoryImporter;

impl HistoryImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        calendar: CalendarZone,
    ) -> Result<Vec<AdherenceHistoryEntry>, HistoryImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, calendar)
    }

    pub fn from_reader<R: Read>(
        reader: R,
        calendar: CalendarZone,
    ) -> Result<Vec<AdherenceHistoryEntry>, HistoryImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut entries = Vec::new();

        for (index, record) in csv_reader.deserialize::<HistoryRow>().enumerate() {
            // header is line 1
            let row = index + 2;
            let parsed = record?;
            entries.push(parsed.into_entry(row, calendar)?);
        }

        entries.sort_by_key(|entry| entry.date);
        Ok(entries)
    }
}

#[derive(Debug, Deserialize)]
struct HistoryRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Adherent")]
    adherent: String,
    #[serde(rename = "Duration", default, deserialize_with = "empty_string_as_none")]
    duration: Option<String>,
    #[serde(
        rename = "Appliance Type",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    appliance_type: Option<String>,
    #[serde(rename = "Photo URL", default, deserialize_with = "empty_string_as_none")]
    photo_url: Option<String>,
    #[serde(rename = "Notes", default, deserialize_with = "empty_string_as_none")]
    notes: Option<String>,
}

impl HistoryRow {
    fn into_entry(
        self,
        row: usize,
        calendar: CalendarZone,
    ) -> Result<AdherenceHistoryEntry, HistoryImportError> {
        let date = calendar.parse_timestamp(&self.date).ok_or_else(|| {
            HistoryImportError::InvalidRow {
                row,
                detail: format!("unrecognized date '{}'", self.date),
            }
        })?;
        let adherent = parse_flag(&self.adherent).ok_or_else(|| {
            HistoryImportError::InvalidRow {
                row,
                detail: format!("unrecognized adherent value '{}'", self.adherent),
            }
        })?;

        let mut entry = AdherenceHistoryEntry::unscored(date, adherent);
        entry.duration_label = self.duration;
        entry.appliance_type = self.appliance_type;
        entry.photo_url = self.photo_url;
        entry.notes = self.notes.unwrap_or_default();
        Ok(entry)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Some(true),
        "false" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
