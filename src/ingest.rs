use std::collections::HashSet;

use crate::csvio::Row;
use crate::history::{self, PriorPolicy};
use crate::ledger::Ledger;
use crate::models::{norm_space, Candidate, IngestStats, Lead, LeadKey, SourceBucket};
use crate::resolver::FieldResolver;

/// Turns raw source rows into deduplicated, history-filtered candidates.
/// The seen-key set spans all sources in the run (mandatory before pool);
/// a later duplicate is dropped and counted, never merged.
pub struct Ingestor<'a> {
    resolver: &'a FieldResolver,
    ledger: &'a Ledger,
    policy: PriorPolicy,
    current_campaign_number: u32,
    seen: HashSet<LeadKey>,
    candidates: Vec<Candidate>,
    pub mandatory_stats: IngestStats,
    pub pool_stats: IngestStats,
}

impl<'a> Ingestor<'a> {
    pub fn new(
        resolver: &'a FieldResolver,
        ledger: &'a Ledger,
        policy: PriorPolicy,
        current_campaign_number: u32,
    ) -> Self {
        Self {
            resolver,
            ledger,
            policy,
            current_campaign_number,
            seen: HashSet::new(),
            candidates: Vec::new(),
            mandatory_stats: IngestStats::default(),
            pool_stats: IngestStats::default(),
        }
    }

    pub fn process_rows(&mut self, rows: Vec<Row>, bucket: SourceBucket) {
        for row in rows {
            let (addr, owner) = self.resolver.address_owner(&row);
            let stats = match bucket {
                SourceBucket::Mandatory => &mut self.mandatory_stats,
                SourceBucket::Pool => &mut self.pool_stats,
            };
            if addr.is_empty() {
                stats.missing_addr += 1;
                continue;
            }
            if owner.is_empty() {
                stats.missing_owner += 1;
                continue;
            }
            let key = LeadKey::new(&addr, &owner);
            if self.seen.contains(&key) {
                stats.deduped += 1;
                continue;
            }
            if !history::passes(
                self.ledger.get(&key),
                &self.policy,
                self.current_campaign_number,
            ) {
                stats.dropped_prior += 1;
                continue;
            }
            let zip5 = self.resolver.zip5(&row, &addr);
            self.candidates.push(Candidate {
                lead: Lead {
                    address: norm_space(&addr),
                    owner: norm_space(&owner),
                    zip5,
                },
                bucket,
                source_row: row,
            });
            self.seen.insert(key);
            stats.kept += 1;
        }
    }

    pub fn into_candidates(self) -> Vec<Candidate> {
        self.candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LedgerRecord;

    fn row(addr: &str, owner: &str) -> Row {
        let mut row = Row::new();
        row.insert("Address".into(), addr.into());
        row.insert("OwnerName".into(), owner.into());
        row
    }

    #[test]
    fn same_lead_across_three_sources_keeps_first_only() {
        let resolver = FieldResolver::new();
        let ledger = Ledger::default();
        let mut ingestor = Ingestor::new(&resolver, &ledger, PriorPolicy::default(), 1);

        ingestor.process_rows(vec![row("1 Main St", "Jane Doe")], SourceBucket::Mandatory);
        ingestor.process_rows(vec![row("1  Main St ", "JANE DOE")], SourceBucket::Mandatory);
        ingestor.process_rows(vec![row("1 Main St", "jane doe")], SourceBucket::Pool);

        assert_eq!(ingestor.mandatory_stats.kept, 1);
        assert_eq!(
            ingestor.mandatory_stats.deduped + ingestor.pool_stats.deduped,
            2
        );
        assert_eq!(ingestor.into_candidates().len(), 1);
    }

    #[test]
    fn unresolvable_rows_are_counted_not_fatal() {
        let resolver = FieldResolver::new();
        let ledger = Ledger::default();
        let mut ingestor = Ingestor::new(&resolver, &ledger, PriorPolicy::default(), 1);

        ingestor.process_rows(
            vec![row("", "Jane Doe"), row("1 Main St", "")],
            SourceBucket::Mandatory,
        );
        assert_eq!(ingestor.mandatory_stats.missing_addr, 1);
        assert_eq!(ingestor.mandatory_stats.missing_owner, 1);
        assert_eq!(ingestor.mandatory_stats.kept, 0);
    }

    #[test]
    fn prior_filter_drops_already_mailed_leads() {
        let resolver = FieldResolver::new();
        let mut ledger = Ledger::default();
        ledger.insert(
            LeadKey::new("1 Main St", "Jane Doe"),
            LedgerRecord {
                campaign_numbers: vec![1],
                ..LedgerRecord::default()
            },
        );
        let policy = PriorPolicy {
            prior_exact: Some(0),
            ..PriorPolicy::default()
        };
        let mut ingestor = Ingestor::new(&resolver, &ledger, policy, 2);
        ingestor.process_rows(vec![row("1 Main St", "Jane Doe")], SourceBucket::Mandatory);
        assert_eq!(ingestor.mandatory_stats.dropped_prior, 1);
        assert_eq!(ingestor.mandatory_stats.kept, 0);
    }

    #[test]
    fn lead_fields_are_whitespace_normalized() {
        let resolver = FieldResolver::new();
        let ledger = Ledger::default();
        let mut ingestor = Ingestor::new(&resolver, &ledger, PriorPolicy::default(), 1);
        ingestor.process_rows(
            vec![row("1  Main   St", "Jane   Doe")],
            SourceBucket::Mandatory,
        );
        let candidates = ingestor.into_candidates();
        assert_eq!(candidates[0].lead.address, "1 Main St");
        assert_eq!(candidates[0].lead.owner, "Jane Doe");
    }
}
