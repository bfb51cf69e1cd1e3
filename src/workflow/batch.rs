// Batch upload - one document per CSV cell
//
// The header row names each column. Two columns are special:
// - access_type:   tier for every document in the row (defaults to Unset)
// - trusted_party: space-separated names each document is shared with
// Every other non-empty cell becomes a document named after its column.

use crate::ledger::AccessTier;
use crate::workflow::error::{BatchItemError, WorkflowError};
use crate::workflow::patient::PatientClient;
use std::io;
use tracing::{debug, info};

pub const ACCESS_TYPE_COLUMN: &str = "access_type";
pub const TRUSTED_PARTY_COLUMN: &str = "trusted_party";

/// A parsed sheet: header plus data rows, rows not yet validated
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchSheet {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl BatchSheet {
    fn column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|c| c == name)
    }
}

/// Read a header row and data rows. Ragged rows are kept and reported
/// per row by `batch_upload`.
pub fn rows_from_csv<R: io::Read>(reader: R) -> Result<BatchSheet, WorkflowError> {
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut records = Vec::new();
    for record in csv.records() {
        let record = record.map_err(|e| WorkflowError::InvalidInput(format!("unable to parse csv: {}", e)))?;
        records.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }

    let mut records = records.into_iter();
    let header = records
        .next()
        .ok_or_else(|| WorkflowError::InvalidInput("csv has no header row".to_string()))?;
    Ok(BatchSheet {
        header,
        rows: records.collect(),
    })
}

impl PatientClient {
    /// Create (and optionally share) one document per cell.
    ///
    /// Per-row and per-cell failures are collected and the upload carries
    /// on. Only a sheet without data rows fails outright.
    pub async fn batch_upload(&self, sheet: &BatchSheet) -> Result<Vec<BatchItemError>, WorkflowError> {
        if sheet.rows.is_empty() {
            return Err(WorkflowError::InvalidInput("no data in csv".to_string()));
        }

        let access_col = sheet.column(ACCESS_TYPE_COLUMN);
        let trusted_col = sheet.column(TRUSTED_PARTY_COLUMN);
        let mut errors = Vec::new();
        let mut created = 0usize;

        for (i, row) in sheet.rows.iter().enumerate() {
            let row_no = i + 2;
            if row.len() != sheet.header.len() {
                errors.push(BatchItemError {
                    row: row_no,
                    col: None,
                    message: format!("has {} columns, header has {}", row.len(), sheet.header.len()),
                });
                continue;
            }

            let tier = match access_col {
                Some(col) => match row[col].parse::<AccessTier>() {
                    Ok(tier) => tier,
                    Err(e) => {
                        errors.push(BatchItemError {
                            row: row_no,
                            col: Some(col + 1),
                            message: e,
                        });
                        continue;
                    }
                },
                None => AccessTier::Unset,
            };

            let trusted: Vec<&str> = trusted_col
                .map(|col| row[col].split_whitespace().collect())
                .unwrap_or_default();

            for (col, cell) in row.iter().enumerate() {
                if Some(col) == access_col || Some(col) == trusted_col {
                    continue;
                }
                if cell.is_empty() {
                    errors.push(BatchItemError {
                        row: row_no,
                        col: Some(col + 1),
                        message: "is empty".to_string(),
                    });
                    continue;
                }

                let pointer = match self.create_patient_data(&sheet.header[col], cell.as_bytes(), tier).await {
                    Ok(pointer) => pointer,
                    Err(e) => {
                        errors.push(BatchItemError {
                            row: row_no,
                            col: Some(col + 1),
                            message: format!("failed to save data: {}", e),
                        });
                        continue;
                    }
                };
                created += 1;

                for party in &trusted {
                    match self.share_data(&pointer.hash, party).await {
                        Ok(_) => debug!(hash = %pointer.hash, recipient = %party, "shared with trusted party"),
                        Err(e) => errors.push(BatchItemError {
                            row: row_no,
                            col: Some(col + 1),
                            message: format!("failed to share with trusted party {}: {}", party, e),
                        }),
                    }
                }
            }
        }

        info!(created, failed = errors.len(), "batch upload finished");
        Ok(errors)
    }
}
