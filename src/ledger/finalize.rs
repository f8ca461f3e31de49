use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use regex::Regex;
use tracing::{info, warn};

use super::{fmt_mdy, ExecutedLogEntry, Ledger, LedgerRepository};
use crate::csvio::{self, Row};
use crate::models::{LeadKey, Result};
use crate::resolver::FieldResolver;

pub const MASTER_FILE_NAME: &str = "campaign_master.csv";

#[derive(Debug, Clone, Default)]
pub struct FinalizeOptions {
    pub campaign_name: Option<String>,
    pub campaign_number: Option<u32>,
    pub mapping_path: Option<PathBuf>,
    pub dry_run: bool,
    pub write_marker: bool,
    pub marker_name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FinalizeSummary {
    pub mapping_rows: usize,
    pub already_logged: usize,
    pub appended: usize,
}

/// Infer (name, number) from a campaign folder named `{name}_{number}_{tag}`.
pub fn infer_campaign_from_dir(campaign_dir: &Path) -> (String, Option<u32>) {
    let base = campaign_dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let re = Regex::new(r"^(.+?)_(\d+)_").unwrap();
    match re.captures(&base) {
        Some(caps) => (caps[1].to_string(), caps[2].parse().ok()),
        None => (base, None),
    }
}

/// The per-mailing mapping lives in RefFiles/ by convention, with a legacy
/// fallback at the folder root.
pub fn find_mapping(campaign_dir: &Path) -> Option<PathBuf> {
    [
        campaign_dir.join("RefFiles").join("letters_mapping.csv"),
        campaign_dir.join("letters_mapping.csv"),
    ]
    .into_iter()
    .find(|p| p.is_file())
}

/// (key -> ZIP5) index over the campaign's master list, used to backfill
/// mapping rows that carry no ZIP of their own.
pub fn build_zip_index_from_master(
    campaign_dir: &Path,
    resolver: &FieldResolver,
) -> HashMap<LeadKey, String> {
    let mut index = HashMap::new();
    let master = campaign_dir.join(MASTER_FILE_NAME);
    if !master.is_file() {
        return index;
    }
    let rows = match csvio::read_rows(&master) {
        Ok(rows) => rows,
        Err(e) => {
            warn!("Could not read {:?} for ZIP backfill: {}", master, e);
            return index;
        }
    };
    for row in &rows {
        let zip = resolver.zip5_from_row(row);
        let addr = resolver.master_address(row);
        let owner = resolver.master_owner(row);
        if !zip.is_empty() && !addr.is_empty() && !owner.is_empty() {
            index.entry(LeadKey::new(&addr, &owner)).or_insert(zip);
        }
    }
    index
}

fn mapping_field<'a>(row: &'a Row, names: &[&str]) -> &'a str {
    names
        .iter()
        .filter_map(|n| row.get(*n))
        .map(String::as_str)
        .find(|v| !v.is_empty())
        .unwrap_or("")
}

/// Decide which mapping rows still need a log row. A row is skipped when its
/// `(key, campaign_number)` pair or its ref code is already logged — re-runs
/// must never re-append or re-count.
pub fn plan_additions(
    mapping_rows: &[Row],
    existing_log: &[ExecutedLogEntry],
    campaign_name: &str,
    campaign_number: u32,
    zip_index: &HashMap<LeadKey, String>,
    resolver: &FieldResolver,
    today: NaiveDate,
) -> Vec<ExecutedLogEntry> {
    let mut logged_pairs: HashSet<(LeadKey, u32)> = HashSet::new();
    let mut logged_refs: HashSet<&str> = HashSet::new();
    for entry in existing_log {
        logged_pairs.insert((entry.key(), entry.campaign_number));
        if !entry.ref_code.is_empty() {
            logged_refs.insert(&entry.ref_code);
        }
    }

    let today_str = fmt_mdy(today);
    let mut additions = Vec::new();
    let mut seen_refs: HashSet<String> = HashSet::new();
    for row in mapping_rows {
        let owner = mapping_field(row, &["owner", "Owner", "OwnerName"]);
        let addr = mapping_field(
            row,
            &["property_address", "Property Address", "PropertyAddress", "Address"],
        );
        if owner.is_empty() || addr.is_empty() {
            continue;
        }
        let ref_code = mapping_field(row, &["ref_code", "RefCode"]).to_string();
        let template_id =
            mapping_field(row, &["template_ref", "template_id", "TemplateId", "Template"]);

        let key = LeadKey::new(addr, owner);
        let mut zip5 = mapping_field(row, &["ZIP5"]).to_string();
        if zip5.is_empty() {
            zip5 = resolver.zip5_from_row(row);
        }
        if zip5.is_empty() {
            zip5 = zip_index.get(&key).cloned().unwrap_or_default();
        }

        if logged_pairs.contains(&(key, campaign_number))
            || (!ref_code.is_empty()
                && (logged_refs.contains(ref_code.as_str()) || seen_refs.contains(&ref_code)))
        {
            continue;
        }
        if !ref_code.is_empty() {
            seen_refs.insert(ref_code.clone());
        }

        additions.push(ExecutedLogEntry {
            executed_dt: today_str.clone(),
            campaign_name: campaign_name.to_string(),
            campaign_number,
            owner_name: owner.to_string(),
            property_address: addr.to_string(),
            template_id: template_id.to_string(),
            ref_code,
            zip5,
        });
    }
    additions
}

/// Fold appended entries into the ledger. Ledger state mirrors exactly what
/// the executed logs say; counts are re-derived inside each record.
pub fn apply_entries(ledger: &mut Ledger, entries: &[ExecutedLogEntry], today: NaiveDate) {
    let today_str = fmt_mdy(today);
    for entry in entries {
        let record = ledger.entry_for(entry.key());
        if record.property_address.is_empty() {
            record.property_address = entry.property_address.clone();
        }
        if record.owner_name.is_empty() {
            record.owner_name = entry.owner_name.clone();
        }
        record.record_send(entry, &today_str);
    }
}

/// Finalize one campaign: idempotently append to its executed log and fold
/// the new rows into the ledger. Safe to re-run; a second run with the same
/// mapping appends nothing.
pub async fn finalize_campaign(
    repo: &dyn LedgerRepository,
    resolver: &FieldResolver,
    campaign_dir: &Path,
    opts: &FinalizeOptions,
    today: NaiveDate,
) -> Result<FinalizeSummary> {
    let mapping_path = opts
        .mapping_path
        .clone()
        .or_else(|| find_mapping(campaign_dir))
        .ok_or_else(|| {
            format!(
                "mapping file not found in {:?} (looked for RefFiles/letters_mapping.csv and letters_mapping.csv)",
                campaign_dir
            )
        })?;

    let (inferred_name, inferred_number) = infer_campaign_from_dir(campaign_dir);
    let campaign_name = opts.campaign_name.clone().unwrap_or(inferred_name);
    let campaign_number = opts
        .campaign_number
        .or(inferred_number)
        .ok_or_else(|| {
            format!(
                "could not infer campaign number from {:?}; pass it explicitly",
                campaign_dir
            )
        })?;

    let mapping_rows = csvio::read_rows(&mapping_path)?;
    if mapping_rows.is_empty() {
        return Err(format!("mapping file has no rows: {:?}", mapping_path).into());
    }

    let zip_index = build_zip_index_from_master(campaign_dir, resolver);
    let existing_log = repo.read_log(campaign_dir).await?;
    let additions = plan_additions(
        &mapping_rows,
        &existing_log,
        &campaign_name,
        campaign_number,
        &zip_index,
        resolver,
        today,
    );

    let summary = FinalizeSummary {
        mapping_rows: mapping_rows.len(),
        already_logged: mapping_rows.len() - additions.len(),
        appended: additions.len(),
    };
    info!(
        "Finalize {:?}: {} mapping rows, {} already logged, {} to add",
        campaign_dir, summary.mapping_rows, summary.already_logged, summary.appended
    );

    if opts.dry_run {
        return Ok(summary);
    }

    if !additions.is_empty() {
        repo.append_log(campaign_dir, &additions).await?;
        let mut ledger = repo.load().await?;
        apply_entries(&mut ledger, &additions, today);
        repo.save(&ledger).await?;
    }

    if opts.write_marker && !opts.marker_name.is_empty() {
        let marker = campaign_dir.join(&opts.marker_name);
        if let Err(e) = std::fs::write(&marker, "") {
            warn!("Could not write marker {:?}: {}", marker, e);
        } else {
            info!("Marker written: {:?}", marker);
        }
    }

    Ok(summary)
}
