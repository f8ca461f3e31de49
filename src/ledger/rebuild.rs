use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::{
    finalize::build_zip_index_from_master, fmt_mdy, try_parse_date, ExecutedLogEntry, Ledger,
    LedgerRepository, LOG_FILE_NAME,
};
use crate::models::Result;
use crate::resolver::FieldResolver;

/// Find campaign folders by walking for executed logs. With
/// `marker_required`, only folders that also carry the marker file count.
pub fn discover_campaign_folders(
    root: &Path,
    marker_required: bool,
    marker_name: &str,
) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Skipping unreadable directory {:?}: {}", dir, e);
                continue;
            }
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                pending.push(path);
            }
        }
        if dir.join(LOG_FILE_NAME).is_file()
            && (!marker_required || dir.join(marker_name).is_file())
        {
            found.push(dir);
        }
    }
    found.sort();
    found
}

/// Re-derive a whole ledger from executed-log rows. Rows are deduplicated by
/// the same idempotency key finalize uses — `(key, campaign_number)` plus
/// ref-code uniqueness — so the result matches incremental maintenance even
/// if a log was ever force-appended.
pub fn aggregate_entries(entries: &[ExecutedLogEntry]) -> Ledger {
    let mut ledger = Ledger::default();
    let mut seen_pairs = HashSet::new();
    let mut seen_refs: HashSet<&str> = HashSet::new();

    for entry in entries {
        if entry.campaign_number == 0 {
            continue;
        }
        if !seen_pairs.insert((entry.key(), entry.campaign_number)) {
            continue;
        }
        if !entry.ref_code.is_empty() && !seen_refs.insert(&entry.ref_code) {
            continue;
        }

        let record = ledger.entry_for(entry.key());
        if record.property_address.is_empty() {
            record.property_address = entry.property_address.clone();
        }
        if record.owner_name.is_empty() {
            record.owner_name = entry.owner_name.clone();
        }
        if record.zip5.is_empty() && !entry.zip5.is_empty() {
            record.zip5 = entry.zip5.clone();
        }
        if !record.campaign_numbers.contains(&entry.campaign_number) {
            record.campaign_numbers.push(entry.campaign_number);
            record.campaign_numbers.sort_unstable();
        }
        if !entry.template_id.is_empty() {
            record.template_ids.push(entry.template_id.clone());
        }
        if let Some(date) = try_parse_date(&entry.executed_dt) {
            let first = try_parse_date(&record.first_sent);
            if first.is_none() || first > Some(date) {
                record.first_sent = fmt_mdy(date);
            }
            let last = try_parse_date(&record.last_sent);
            if last.is_none() || last < Some(date) {
                record.last_sent = fmt_mdy(date);
            }
        }
    }
    ledger
}

/// Disaster-recovery path: rebuild the entire ledger and ZIP tally by
/// scanning every campaign folder under `root`. Returns the number of
/// folders scanned.
pub async fn rebuild_ledger(
    repo: &dyn LedgerRepository,
    resolver: &FieldResolver,
    root: &Path,
    marker_required: bool,
    marker_name: &str,
) -> Result<usize> {
    let folders = discover_campaign_folders(root, marker_required, marker_name);
    if folders.is_empty() {
        warn!("No campaign folders found under {:?}", root);
        return Ok(0);
    }
    info!("Found {} campaign folders under {:?}", folders.len(), root);

    let mut all_entries = Vec::new();
    for folder in &folders {
        let zip_index = build_zip_index_from_master(folder, resolver);
        let mut entries = repo.read_log(folder).await?;
        for entry in &mut entries {
            if entry.zip5.is_empty() {
                if let Some(zip) = zip_index.get(&entry.key()) {
                    entry.zip5 = zip.clone();
                }
            }
        }
        all_entries.extend(entries);
    }

    let ledger = aggregate_entries(&all_entries);
    repo.save(&ledger).await?;
    info!("Rebuilt ledger from scratch: {} records", ledger.len());

    rebuild_zip_tally(repo, root).await?;
    Ok(folders.len())
}

/// Tally mailed pieces per ZIP5 across every executed log under `root`.
pub async fn rebuild_zip_tally(repo: &dyn LedgerRepository, root: &Path) -> Result<()> {
    let mut tally: BTreeMap<String, usize> = BTreeMap::new();
    for folder in discover_campaign_folders(root, false, "") {
        for entry in repo.read_log(&folder).await? {
            if !entry.zip5.is_empty() {
                *tally.entry(entry.zip5).or_insert(0) += 1;
            }
        }
    }
    repo.save_tally(&tally).await?;
    info!("ZIP5 tally rebuilt ({} ZIPs)", tally.len());
    Ok(())
}
