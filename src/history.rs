use serde::{Deserialize, Serialize};

use crate::ledger::LedgerRecord;

/// Prior-contact policy for one build. `prior_exact` and `prior_max` are
/// mutually exclusive; that is enforced at configuration validation, not
/// here.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
pub struct PriorPolicy {
    /// Only admit leads with exactly N prior campaigns (0 = never mailed).
    pub prior_exact: Option<u32>,
    /// Only admit leads with at most M prior campaigns.
    pub prior_max: Option<u32>,
    /// Require the last campaign number to trail the current one by at
    /// least this much.
    pub min_gap: u32,
}

/// Decide whether a lead qualifies under the prior-contact policy. A lead
/// with no ledger record counts as zero prior campaigns.
pub fn passes(
    record: Option<&LedgerRecord>,
    policy: &PriorPolicy,
    current_campaign_number: u32,
) -> bool {
    let record = match record {
        Some(record) => record,
        None => {
            if let Some(exact) = policy.prior_exact {
                return exact == 0;
            }
            // any max >= 0 admits a never-mailed lead
            return true;
        }
    };

    let count = record.campaign_count() as u32;
    let last = record.last_campaign_number();

    if let Some(exact) = policy.prior_exact {
        if count != exact {
            return false;
        }
    }
    if let Some(max) = policy.prior_max {
        if count > max {
            return false;
        }
    }
    if policy.min_gap > 0 && last > 0 && last > current_campaign_number.saturating_sub(policy.min_gap)
    {
        return false;
    }
    true
}
