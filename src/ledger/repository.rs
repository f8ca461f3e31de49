use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};

use super::{
    join_seq, parse_ids, parse_numbers, ExecutedLogEntry, Ledger, LedgerRecord, LOG_FILE_NAME,
    LOG_HEADERS, TRACKER_HEADERS,
};
use crate::config::LedgerConfig;
use crate::csvio::{self, Row};
use crate::models::{LeadKey, Result};

/// Persistence seam for the campaign ledger. Constructed once per invocation
/// and passed through the pipeline — never global path state.
///
/// Writes are whole-file replacements with no locking or transaction
/// boundary: two concurrent campaign runs against the same ledger are
/// last-writer-wins. Callers must serialize campaign operations.
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Load the ledger, treating a missing tracker file as empty.
    async fn load(&self) -> Result<Ledger>;

    /// Replace the tracker file with the given ledger.
    async fn save(&self, ledger: &Ledger) -> Result<()>;

    /// Read a campaign folder's executed log; missing file means no rows.
    async fn read_log(&self, campaign_dir: &Path) -> Result<Vec<ExecutedLogEntry>>;

    /// Append entries to a campaign folder's executed log. Existing rows are
    /// preserved as-is, including columns this crate does not model.
    async fn append_log(&self, campaign_dir: &Path, entries: &[ExecutedLogEntry]) -> Result<()>;

    /// Replace the ZIP5 letter tally beside the tracker.
    async fn save_tally(&self, tally: &BTreeMap<String, usize>) -> Result<()>;
}

pub struct CsvLedgerRepository {
    tracker_path: PathBuf,
    tally_path: PathBuf,
}

impl CsvLedgerRepository {
    pub fn new(config: &LedgerConfig) -> Self {
        Self {
            tracker_path: config.tracker_path(),
            tally_path: config.tally_path(),
        }
    }

    pub fn with_paths(tracker_path: PathBuf, tally_path: PathBuf) -> Self {
        Self {
            tracker_path,
            tally_path,
        }
    }

    pub fn tracker_path(&self) -> &Path {
        &self.tracker_path
    }
}

fn field<'a>(row: &'a Row, names: &[&str]) -> &'a str {
    names
        .iter()
        .filter_map(|n| row.get(*n))
        .map(String::as_str)
        .find(|v| !v.is_empty())
        .unwrap_or("")
}

fn entry_from_row(row: &Row) -> Option<ExecutedLogEntry> {
    let address = field(row, &["PropertyAddress", "property_address", "Address"]);
    let owner = field(row, &["OwnerName", "Owner", "owner"]);
    if address.is_empty() || owner.is_empty() {
        return None;
    }
    let number_raw = field(row, &["CampaignNumber"]);
    let campaign_number = number_raw
        .chars()
        .filter(char::is_ascii_digit)
        .collect::<String>()
        .parse()
        .unwrap_or(0);
    Some(ExecutedLogEntry {
        executed_dt: field(row, &["ExecutedDt", "ExecutedDate"]).to_string(),
        campaign_name: field(row, &["CampaignName"]).to_string(),
        campaign_number,
        owner_name: owner.to_string(),
        property_address: address.to_string(),
        template_id: field(row, &["TemplateId", "template_id", "template_ref"]).to_string(),
        ref_code: field(row, &["RefCode", "ref_code"]).to_string(),
        zip5: field(row, &["ZIP5"]).to_string(),
    })
}

fn entry_to_row(entry: &ExecutedLogEntry) -> Row {
    let mut row = Row::new();
    row.insert("ExecutedDt".into(), entry.executed_dt.clone());
    row.insert("CampaignName".into(), entry.campaign_name.clone());
    row.insert("CampaignNumber".into(), entry.campaign_number.to_string());
    row.insert("OwnerName".into(), entry.owner_name.clone());
    row.insert("PropertyAddress".into(), entry.property_address.clone());
    row.insert("TemplateId".into(), entry.template_id.clone());
    row.insert("RefCode".into(), entry.ref_code.clone());
    row.insert("ZIP5".into(), entry.zip5.clone());
    row
}

#[async_trait]
impl LedgerRepository for CsvLedgerRepository {
    async fn load(&self) -> Result<Ledger> {
        let mut ledger = Ledger::default();
        if !self.tracker_path.is_file() {
            debug!("No tracker file at {:?}; starting empty", self.tracker_path);
            return Ok(ledger);
        }
        for row in csvio::read_rows(&self.tracker_path)? {
            let address = field(&row, &["PropertyAddress"]);
            let owner = field(&row, &["OwnerName"]);
            if address.is_empty() || owner.is_empty() {
                continue;
            }
            let mut numbers = parse_numbers(field(&row, &["CampaignNumbers"]));
            numbers.sort_unstable();
            numbers.dedup();
            let record = LedgerRecord {
                property_address: address.to_string(),
                owner_name: owner.to_string(),
                zip5: field(&row, &["ZIP5"]).to_string(),
                campaign_numbers: numbers,
                template_ids: parse_ids(field(&row, &["TemplateIds"])),
                first_sent: field(&row, &["FirstSentDt"]).to_string(),
                last_sent: field(&row, &["LastSentDt"]).to_string(),
            };
            ledger.insert(LeadKey::new(address, owner), record);
        }
        info!("Loaded {} ledger records", ledger.len());
        Ok(ledger)
    }

    async fn save(&self, ledger: &Ledger) -> Result<()> {
        let mut rows: Vec<Row> = ledger
            .iter()
            .map(|(_, rec)| {
                let mut row = Row::new();
                row.insert("PropertyAddress".into(), rec.property_address.clone());
                row.insert("OwnerName".into(), rec.owner_name.clone());
                row.insert("ZIP5".into(), rec.zip5.clone());
                row.insert("CampaignCount".into(), rec.campaign_count().to_string());
                row.insert("FirstSentDt".into(), rec.first_sent.clone());
                row.insert("LastSentDt".into(), rec.last_sent.clone());
                row.insert("CampaignNumbers".into(), join_seq(&rec.campaign_numbers));
                row.insert("TemplateIds".into(), join_seq(&rec.template_ids));
                row
            })
            .collect();
        rows.sort_by(|a, b| {
            (a.get("PropertyAddress"), a.get("OwnerName"))
                .cmp(&(b.get("PropertyAddress"), b.get("OwnerName")))
        });
        let headers: Vec<String> = TRACKER_HEADERS.iter().map(|h| h.to_string()).collect();
        csvio::write_rows(&self.tracker_path, &rows, &headers)?;
        info!("Saved {} ledger records to {:?}", rows.len(), self.tracker_path);
        Ok(())
    }

    async fn read_log(&self, campaign_dir: &Path) -> Result<Vec<ExecutedLogEntry>> {
        let path = campaign_dir.join(LOG_FILE_NAME);
        if !path.is_file() {
            return Ok(Vec::new());
        }
        Ok(csvio::read_rows(&path)?
            .iter()
            .filter_map(entry_from_row)
            .collect())
    }

    async fn append_log(&self, campaign_dir: &Path, entries: &[ExecutedLogEntry]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let path = campaign_dir.join(LOG_FILE_NAME);
        let (mut rows, mut headers) = if path.is_file() {
            csvio::read_rows_with_headers(&path)?
        } else {
            (Vec::new(), Vec::new())
        };
        rows.extend(entries.iter().map(entry_to_row));

        // Canonical columns first, then any extra columns older tooling wrote.
        let mut ordered: Vec<String> = LOG_HEADERS.iter().map(|h| h.to_string()).collect();
        for h in headers.drain(..) {
            if !ordered.contains(&h) {
                ordered.push(h);
            }
        }
        csvio::write_rows(&path, &rows, &ordered)?;
        info!("Appended {} rows to {:?}", entries.len(), path);
        Ok(())
    }

    async fn save_tally(&self, tally: &BTreeMap<String, usize>) -> Result<()> {
        let rows: Vec<Row> = tally
            .iter()
            .map(|(zip, count)| {
                let mut row = Row::new();
                row.insert("ZIP5".into(), zip.clone());
                row.insert("Count".into(), count.to_string());
                row
            })
            .collect();
        csvio::write_rows(&self.tally_path, &rows, &["ZIP5".into(), "Count".into()])?;
        Ok(())
    }
}
