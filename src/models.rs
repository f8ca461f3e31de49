use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{config::Config, ledger::repository::CsvLedgerRepository};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Collapse internal whitespace and trim the ends.
pub fn norm_space(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonical identity of a lead across sources, campaigns, and the ledger.
///
/// Whitespace/case normalization only — no street-type abbreviation folding.
/// Every part of the pipeline that needs lead identity must go through this
/// type so that dedup, history filtering, and ledger lookups agree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LeadKey {
    pub address: String,
    pub owner: String,
}

impl LeadKey {
    pub fn new(address: &str, owner: &str) -> Self {
        Self {
            address: norm_space(address).to_uppercase(),
            owner: norm_space(owner).to_uppercase(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub address: String,
    pub owner: String,
    pub zip5: String,
}

impl Lead {
    pub fn key(&self) -> LeadKey {
        LeadKey::new(&self.address, &self.owner)
    }

    pub fn zip3(&self) -> String {
        self.zip5.chars().take(3).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceBucket {
    Mandatory,
    Pool,
}

impl std::fmt::Display for SourceBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceBucket::Mandatory => write!(f, "MAND"),
            SourceBucket::Pool => write!(f, "POOL"),
        }
    }
}

/// A lead that survived ingestion, plus the raw source row it came from so
/// the master list can mirror the source schema later.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub lead: Lead,
    pub bucket: SourceBucket,
    pub source_row: HashMap<String, String>,
}

/// Per-bucket row accounting for one build run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub kept: usize,
    pub deduped: usize,
    pub dropped_prior: usize,
    pub missing_addr: usize,
    pub missing_owner: usize,
}

pub struct CliApp {
    pub config: Config,
    pub ledger_repo: CsvLedgerRepository,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn norm_space_collapses_and_trims() {
        assert_eq!(norm_space("  123   Main  St  "), "123 Main St");
        assert_eq!(norm_space(""), "");
        assert_eq!(norm_space("\tJane\n Doe"), "Jane Doe");
    }

    #[test]
    fn lead_key_is_case_and_space_insensitive() {
        let a = LeadKey::new("1 Main  St", "jane doe");
        let b = LeadKey::new(" 1 MAIN ST ", "Jane  DOE");
        assert_eq!(a, b);
        assert_eq!(a.address, "1 MAIN ST");
        assert_eq!(a.owner, "JANE DOE");
    }

    #[test]
    fn zip3_handles_short_and_empty_zips() {
        let lead = Lead {
            address: "1 Main St".into(),
            owner: "Jane Doe".into(),
            zip5: "95835".into(),
        };
        assert_eq!(lead.zip3(), "958");
        let blank = Lead { zip5: String::new(), ..lead };
        assert_eq!(blank.zip3(), "");
    }
}
