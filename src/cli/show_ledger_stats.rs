use std::collections::{BTreeSet, HashMap};

use crate::ledger::LedgerRepository;
use crate::models::{CliApp, Result};

impl CliApp {
    pub async fn show_ledger_stats(&self) -> Result<()> {
        let ledger = self.ledger_repo.load().await?;

        println!("\n📊 Ledger Statistics:");
        println!("━━━━━━━━━━━━━━━━━━━━━");
        println!("   🏠 Leads tracked: {}", ledger.len());

        if ledger.is_empty() {
            println!("   (no campaigns finalized yet)");
            return Ok(());
        }

        let mut campaigns: BTreeSet<u32> = BTreeSet::new();
        let mut pieces = 0usize;
        let mut by_zip: HashMap<&str, usize> = HashMap::new();
        for (_, record) in ledger.iter() {
            campaigns.extend(record.campaign_numbers.iter().copied());
            pieces += record.template_ids.len();
            if !record.zip5.is_empty() {
                *by_zip.entry(record.zip5.as_str()).or_insert(0) += 1;
            }
        }

        println!("   📮 Campaigns seen: {}", campaigns.len());
        if let (Some(first), Some(last)) = (campaigns.first(), campaigns.last()) {
            println!("   🔢 Campaign numbers: {}..{}", first, last);
        }
        println!("   ✉️  Pieces recorded: {}", pieces);

        let mut top: Vec<(&str, usize)> = by_zip.into_iter().collect();
        top.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        println!("   🗺️  Top ZIPs:");
        for (zip, count) in top.iter().take(5) {
            println!("      {}: {}", zip, count);
        }
        Ok(())
    }
}
