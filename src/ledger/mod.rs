pub mod finalize;
pub mod rebuild;
pub mod repository;

pub use repository::{CsvLedgerRepository, LedgerRepository};

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::models::LeadKey;

pub const TRACKER_HEADERS: [&str; 8] = [
    "PropertyAddress",
    "OwnerName",
    "ZIP5",
    "CampaignCount",
    "FirstSentDt",
    "LastSentDt",
    "CampaignNumbers",
    "TemplateIds",
];

pub const LOG_HEADERS: [&str; 8] = [
    "ExecutedDt",
    "CampaignName",
    "CampaignNumber",
    "OwnerName",
    "PropertyAddress",
    "TemplateId",
    "RefCode",
    "ZIP5",
];

pub const LOG_FILE_NAME: &str = "executed_campaign_log.csv";

/// One row of the executed log: a single piece actually mailed. Rows are
/// append-only and never mutated; `(key, campaign_number)` plus the ref code
/// are the idempotency source of truth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutedLogEntry {
    pub executed_dt: String,
    pub campaign_name: String,
    pub campaign_number: u32,
    pub owner_name: String,
    pub property_address: String,
    pub template_id: String,
    pub ref_code: String,
    pub zip5: String,
}

impl ExecutedLogEntry {
    pub fn key(&self) -> LeadKey {
        LeadKey::new(&self.property_address, &self.owner_name)
    }
}

/// Per-lead cross-campaign summary. `campaign_numbers` is kept unique and
/// numerically sorted; `template_ids` is a sequence that allows repeats —
/// the same template may be reused across different campaigns, and template
/// usage is not the same thing as campaign count.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LedgerRecord {
    pub property_address: String,
    pub owner_name: String,
    pub zip5: String,
    pub campaign_numbers: Vec<u32>,
    pub template_ids: Vec<String>,
    pub first_sent: String,
    pub last_sent: String,
}

impl LedgerRecord {
    /// Always derived from the unique campaign numbers, never incremented.
    pub fn campaign_count(&self) -> usize {
        self.campaign_numbers.len()
    }

    pub fn last_campaign_number(&self) -> u32 {
        self.campaign_numbers.iter().copied().max().unwrap_or(0)
    }

    /// Fold one executed-log entry into the record. Caller guarantees the
    /// entry passed the idempotency check.
    pub fn record_send(&mut self, entry: &ExecutedLogEntry, sent_dt: &str) {
        if !self.campaign_numbers.contains(&entry.campaign_number) {
            self.campaign_numbers.push(entry.campaign_number);
            self.campaign_numbers.sort_unstable();
        }
        if !entry.template_id.is_empty() {
            self.template_ids.push(entry.template_id.clone());
        }
        if self.zip5.is_empty() && !entry.zip5.is_empty() {
            self.zip5 = entry.zip5.clone();
        }
        if self.first_sent.is_empty() {
            self.first_sent = sent_dt.to_string();
        }
        self.last_sent = sent_dt.to_string();
    }
}

/// The persisted source of truth for cross-campaign history. Builds read it,
/// finalize is the sole writer.
#[derive(Debug, Default)]
pub struct Ledger {
    records: HashMap<LeadKey, LedgerRecord>,
}

impl Ledger {
    pub fn get(&self, key: &LeadKey) -> Option<&LedgerRecord> {
        self.records.get(key)
    }

    pub fn entry_for(&mut self, key: LeadKey) -> &mut LedgerRecord {
        self.records.entry(key).or_default()
    }

    pub fn insert(&mut self, key: LeadKey, record: LedgerRecord) {
        self.records.insert(key, record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LeadKey, &LedgerRecord)> {
        self.records.iter()
    }
}

/// Join a sequence field the tracker way: pipe-delimited in a single cell.
pub fn join_seq<T: ToString>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("|")
}

/// Parse a pipe-joined (or legacy comma-joined) number sequence, dropping
/// anything non-numeric.
pub fn parse_numbers(field: &str) -> Vec<u32> {
    field
        .split(['|', ','])
        .filter_map(|p| p.trim().parse::<u32>().ok())
        .collect()
}

pub fn parse_ids(field: &str) -> Vec<String> {
    field
        .split(['|', ','])
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Ledger date format is M/D/YYYY with no zero padding.
pub fn fmt_mdy(date: NaiveDate) -> String {
    use chrono::Datelike;
    format!("{}/{}/{}", date.month(), date.day(), date.year())
}

pub fn try_parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%m/%d/%Y")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(campaign: u32, template: &str) -> ExecutedLogEntry {
        ExecutedLogEntry {
            executed_dt: "8/30/2026".into(),
            campaign_name: "Campaign".into(),
            campaign_number: campaign,
            owner_name: "Jane Doe".into(),
            property_address: "1 Main St".into(),
            template_id: template.into(),
            ref_code: String::new(),
            zip5: "95835".into(),
        }
    }

    #[test]
    fn campaign_count_tracks_unique_numbers_only() {
        let mut rec = LedgerRecord::default();
        rec.record_send(&entry(3, "101"), "8/30/2026");
        rec.record_send(&entry(3, "101"), "8/30/2026");
        rec.record_send(&entry(1, "101"), "9/1/2026");
        assert_eq!(rec.campaign_numbers, vec![1, 3]);
        assert_eq!(rec.campaign_count(), 2);
        // templates are a sequence with duplicates allowed
        assert_eq!(rec.template_ids, vec!["101", "101", "101"]);
    }

    #[test]
    fn first_sent_is_sticky_last_sent_moves() {
        let mut rec = LedgerRecord::default();
        rec.record_send(&entry(1, "101"), "8/30/2026");
        rec.record_send(&entry(2, "102"), "9/15/2026");
        assert_eq!(rec.first_sent, "8/30/2026");
        assert_eq!(rec.last_sent, "9/15/2026");
    }

    #[test]
    fn zip_backfills_only_when_empty() {
        let mut rec = LedgerRecord {
            zip5: "90001".into(),
            ..LedgerRecord::default()
        };
        rec.record_send(&entry(1, "101"), "8/30/2026");
        assert_eq!(rec.zip5, "90001");
    }

    #[test]
    fn sequence_fields_round_trip_with_legacy_commas() {
        assert_eq!(parse_numbers("1|3|12"), vec![1, 3, 12]);
        assert_eq!(parse_numbers("1, 3, 12"), vec![1, 3, 12]);
        assert_eq!(parse_numbers(""), Vec::<u32>::new());
        assert_eq!(join_seq(&[1u32, 3, 12]), "1|3|12");
        assert_eq!(parse_ids("101|101|205"), vec!["101", "101", "205"]);
    }

    #[test]
    fn dates_parse_both_formats_and_format_unpadded() {
        let d = NaiveDate::from_ymd_opt(2026, 8, 5).unwrap();
        assert_eq!(fmt_mdy(d), "8/5/2026");
        assert_eq!(try_parse_date("8/5/2026"), Some(d));
        assert_eq!(try_parse_date("2026-08-05"), Some(d));
        assert_eq!(try_parse_date("bogus"), None);
    }
}
