//! Raw Google Sheets API surface.
//!
//! Thin typed wrapper over the REST endpoints the reconciler needs:
//! spreadsheet metadata, `batchUpdate` tab management, and cell I/O.
//! No pacing here — callers sequence and rate-limit.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::SheetsError;

const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// One tab in the destination spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabInfo {
    pub title: String,
    /// Opaque identifier assigned by the destination on creation.
    pub sheet_id: i64,
}

/// Authenticated handle to one spreadsheet.
#[derive(Debug)]
pub struct SheetsApi {
    client: reqwest::Client,
    spreadsheet_id: String,
    access_token: String,
}

// ---------------------------------------------------------------------------
// Boundary structs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SpreadsheetResponse {
    #[serde(default)]
    sheets: Vec<SheetNode>,
}

#[derive(Debug, Deserialize)]
struct SheetNode {
    properties: Option<SheetProperties>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    title: Option<String>,
    sheet_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Option<Vec<Vec<Value>>>,
}

// ---------------------------------------------------------------------------
// Implementation
// ---------------------------------------------------------------------------

impl SheetsApi {
    pub fn new(spreadsheet_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            spreadsheet_id: spreadsheet_id.into(),
            access_token: access_token.into(),
        }
    }

    /// List all tabs with their external identifiers.
    pub async fn list_tabs(&self) -> Result<Vec<TabInfo>, SheetsError> {
        let url = format!(
            "{SHEETS_BASE_URL}/{}?fields=sheets.properties",
            self.spreadsheet_id
        );
        let response = self.get(&url, "list tabs").await?;
        let spreadsheet: SpreadsheetResponse = response.json().await?;

        let tabs = spreadsheet
            .sheets
            .into_iter()
            .filter_map(|sheet| {
                let properties = sheet.properties?;
                Some(TabInfo {
                    title: properties.title?,
                    sheet_id: properties.sheet_id?,
                })
            })
            .collect();
        Ok(tabs)
    }

    /// Create a tab. The destination assigns its identifier.
    pub async fn add_tab(&self, title: &str) -> Result<(), SheetsError> {
        let request = json!({ "addSheet": { "properties": { "title": title } } });
        self.batch_update(vec![request], &format!("create tab \"{title}\""))
            .await
    }

    /// Delete a tab by its identifier.
    pub async fn delete_tab(&self, sheet_id: i64) -> Result<(), SheetsError> {
        let request = json!({ "deleteSheet": { "sheetId": sheet_id } });
        self.batch_update(vec![request], &format!("delete tab {sheet_id}"))
            .await
    }

    /// Reposition tabs in one batched call: `(sheet_id, index)` pairs.
    pub async fn reorder_tabs(&self, positions: &[(i64, usize)]) -> Result<(), SheetsError> {
        let requests = positions
            .iter()
            .map(|(sheet_id, index)| {
                json!({
                    "updateSheetProperties": {
                        "properties": { "sheetId": sheet_id, "index": index },
                        "fields": "index"
                    }
                })
            })
            .collect();
        self.batch_update(requests, "reorder tabs").await
    }

    /// Read a cell range. Absent values come back as an empty grid.
    pub async fn values_get(&self, range: &str) -> Result<Vec<Vec<String>>, SheetsError> {
        let url = format!(
            "{SHEETS_BASE_URL}/{}/values/{range}",
            self.spreadsheet_id
        );
        let response = self.get(&url, &format!("read range {range}")).await?;
        let value_range: ValueRange = response.json().await?;

        let rows = value_range
            .values
            .unwrap_or_default()
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect();
        Ok(rows)
    }

    /// Overwrite a range with raw (unparsed-by-destination) values.
    pub async fn values_update(&self, range: &str, rows: &[Vec<Value>]) -> Result<(), SheetsError> {
        let url = format!(
            "{SHEETS_BASE_URL}/{}/values/{range}?valueInputOption=RAW",
            self.spreadsheet_id
        );
        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.access_token)
            .json(&json!({ "values": rows }))
            .send()
            .await?;
        check_status(response, &format!("write range {range}")).await?;
        Ok(())
    }

    /// Clear a range's contents (the tab itself survives).
    pub async fn values_clear(&self, range: &str) -> Result<(), SheetsError> {
        let url = format!(
            "{SHEETS_BASE_URL}/{}/values/{range}:clear",
            self.spreadsheet_id
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        check_status(response, &format!("clear range {range}")).await?;
        Ok(())
    }

    /// Append rows below the existing content of a range.
    pub async fn values_append(&self, range: &str, rows: &[Vec<Value>]) -> Result<(), SheetsError> {
        let url = format!(
            "{SHEETS_BASE_URL}/{}/values/{range}:append?valueInputOption=RAW",
            self.spreadsheet_id
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&json!({ "values": rows }))
            .send()
            .await?;
        check_status(response, &format!("append to range {range}")).await?;
        Ok(())
    }

    async fn batch_update(
        &self,
        requests: Vec<Value>,
        operation: &str,
    ) -> Result<(), SheetsError> {
        let url = format!("{SHEETS_BASE_URL}/{}:batchUpdate", self.spreadsheet_id);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&json!({ "requests": requests }))
            .send()
            .await?;
        check_status(response, operation).await?;
        Ok(())
    }

    async fn get(&self, url: &str, operation: &str) -> Result<reqwest::Response, SheetsError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        check_status(response, operation).await
    }
}

/// `'<tab>'!<cells>` — tab names are quoted so spaces survive.
pub fn range(tab: &str, cells: &str) -> String {
    format!("'{tab}'!{cells}")
}

fn cell_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

async fn check_status(
    response: reqwest::Response,
    operation: &str,
) -> Result<reqwest::Response, SheetsError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(SheetsError::Http {
        operation: operation.to_string(),
        status,
        body,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_quotes_tab_names() {
        assert_eq!(range("Utah Jazz", "A2:A2"), "'Utah Jazz'!A2:A2");
        assert_eq!(range("Heat", "A:Z"), "'Heat'!A:Z");
    }

    #[test]
    fn spreadsheet_response_skips_incomplete_properties() {
        let json = r#"{
            "sheets": [
                { "properties": { "title": "Utah Jazz", "sheetId": 7 } },
                { "properties": { "title": "No Id" } },
                {}
            ]
        }"#;
        let parsed: SpreadsheetResponse = serde_json::from_str(json).expect("deserialize");
        let tabs: Vec<TabInfo> = parsed
            .sheets
            .into_iter()
            .filter_map(|sheet| {
                let properties = sheet.properties?;
                Some(TabInfo {
                    title: properties.title?,
                    sheet_id: properties.sheet_id?,
                })
            })
            .collect();
        assert_eq!(
            tabs,
            vec![TabInfo {
                title: "Utah Jazz".to_string(),
                sheet_id: 7
            }]
        );
    }

    #[test]
    fn value_range_numbers_become_strings() {
        let json = r#"{ "values": [["123456", 5, "green"]] }"#;
        let parsed: ValueRange = serde_json::from_str(json).expect("deserialize");
        let rows: Vec<Vec<String>> = parsed
            .values
            .unwrap()
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect();
        assert_eq!(rows, vec![vec!["123456", "5", "green"]]);
    }

    #[test]
    fn empty_value_range_is_empty_grid() {
        let parsed: ValueRange = serde_json::from_str("{}").expect("deserialize");
        assert!(parsed.values.is_none());
    }
}
