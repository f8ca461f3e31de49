use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::Local;
use dialoguer::{theme::ColorfulTheme, Input};
use tracing::{info, warn};

use crate::campaign::{load_campaign_from_yaml, CampaignSpec};
use crate::csvio::{self, Row};
use crate::ingest::Ingestor;
use crate::ledger::LedgerRepository;
use crate::models::{Candidate, CliApp, IngestStats, Result, SourceBucket};
use crate::resolver::FieldResolver;
use crate::selection::{estimate_postage, plan_bins, select, Bin};

const MINIMAL_HEADERS: [&str; 2] = ["Address", "Primary Name"];

impl CliApp {
    pub async fn run_build(&self) -> Result<()> {
        println!("\n📬 Build Campaign Master List");
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        let spec_path: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("Campaign build YAML")
            .default("campaign.yml".to_string())
            .interact_text()?;

        let spec = load_campaign_from_yaml(&spec_path).await?;
        spec.validate(&self.config.sources)?;

        let resolver = FieldResolver::new();
        let ledger = self.ledger_repo.load().await?;
        let mut ingestor = Ingestor::new(&resolver, &ledger, spec.policy(), spec.campaign_number);

        for path in &spec.mandatory {
            let path = Path::new(path);
            if !path.is_file() {
                return Err(format!("mandatory source missing: {:?}", path).into());
            }
            let rows = csvio::read_rows(path)?;
            info!("Reading mandatory {:?} ({} rows)", path, rows.len());
            ingestor.process_rows(rows, SourceBucket::Mandatory);
        }

        // Optional pools cannot be trimmed out of a target already
        // oversubscribed by required sources.
        if ingestor.mandatory_stats.kept > spec.target_size {
            return Err(format!(
                "mandatory lists exceed target after filtering ({} > {}); refine inputs",
                ingestor.mandatory_stats.kept, spec.target_size
            )
            .into());
        }

        for path in &spec.optional {
            let path = Path::new(path);
            if !path.is_file() {
                warn!("Optional source missing, skipping: {:?}", path);
                continue;
            }
            let rows = csvio::read_rows(path)?;
            info!("Reading optional {:?} ({} rows)", path, rows.len());
            ingestor.process_rows(rows, SourceBucket::Pool);
        }

        print_ingest_stats("MAND", &ingestor.mandatory_stats);
        print_ingest_stats("POOL", &ingestor.pool_stats);
        let candidates = ingestor.into_candidates();
        println!("   Candidates total: {}", candidates.len());

        let mut rng = match spec.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        let mut chosen = select(&candidates, spec.target_size, spec.strict_150, &mut rng);

        // USPS-friendly order: mailing ZIP, empty bucket last.
        chosen.sort_by(|a, b| {
            let za = if a.lead.zip5.is_empty() { "ZZZZZ" } else { a.lead.zip5.as_str() };
            let zb = if b.lead.zip5.is_empty() { "ZZZZZ" } else { b.lead.zip5.as_str() };
            (za, &a.lead.address, &a.lead.owner).cmp(&(zb, &b.lead.address, &b.lead.owner))
        });

        let campaign_dir =
            PathBuf::from(&self.config.output.directory).join(spec.folder_name(Local::now().date_naive()));
        self.write_outputs(&spec, &chosen, &campaign_dir)?;

        println!("✅ Campaign folder: {:?}", campaign_dir);
        println!("   Master list rows: {}", chosen.len());
        Ok(())
    }

    fn write_outputs(
        &self,
        spec: &CampaignSpec,
        chosen: &[Candidate],
        campaign_dir: &Path,
    ) -> Result<()> {
        let zips: Vec<String> = chosen.iter().map(|c| c.lead.zip5.clone()).collect();

        write_presort_reports(campaign_dir, &zips)?;

        let estimate = estimate_postage(&zips, &self.config.postage);
        write_postage_estimate(campaign_dir, &estimate, &self.config.postage, zips.len())?;
        println!(
            "   Postage estimate: ${:.2} total, ${:.4}/piece ({} 5digit / {} 3digit / {} AADC)",
            estimate.total_cost,
            estimate.avg_per_piece,
            estimate.five_digit,
            estimate.three_digit,
            estimate.aadc
        );

        let bins = plan_bins(&zips);
        write_bin_manifest(campaign_dir, &bins)?;
        println!("   Tray bins planned: {}", bins.len());

        let (master_rows, headers) = build_master_rows(spec, chosen);
        csvio::write_rows(&campaign_dir.join("campaign_master.csv"), &master_rows, &headers)?;
        info!(
            "Master list written with {} columns mirrored from source schema",
            headers.len()
        );
        Ok(())
    }
}

fn print_ingest_stats(label: &str, stats: &IngestStats) {
    println!(
        "   {} kept={} deduped={} dropped_prior={} missing_addr={} missing_owner={}",
        label, stats.kept, stats.deduped, stats.dropped_prior, stats.missing_addr, stats.missing_owner
    );
}

fn write_presort_reports(campaign_dir: &Path, zips: &[String]) -> Result<()> {
    let mut by_zip5: HashMap<&str, usize> = HashMap::new();
    for zip in zips {
        *by_zip5.entry(zip.as_str()).or_insert(0) += 1;
    }

    let mut zip5_rows: Vec<(&str, usize)> = by_zip5.iter().map(|(z, c)| (*z, *c)).collect();
    zip5_rows.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    let rows: Vec<Row> = zip5_rows
        .iter()
        .map(|(zip, count)| {
            let mut row = Row::new();
            row.insert("ZIP5".into(), display_zip(zip));
            row.insert("Count".into(), count.to_string());
            row
        })
        .collect();
    csvio::write_rows(
        &campaign_dir.join("presort_report.csv"),
        &rows,
        &["ZIP5".into(), "Count".into()],
    )?;

    let mut by_zip3: HashMap<String, (usize, usize)> = HashMap::new();
    for (zip, count) in &by_zip5 {
        let z3: String = zip.chars().take(3).collect();
        let entry = by_zip3.entry(z3).or_insert((0, 0));
        entry.0 += 1; // distinct ZIP5 buckets
        entry.1 += count; // pieces
    }
    let mut zip3_rows: Vec<(String, (usize, usize))> = by_zip3.into_iter().collect();
    zip3_rows.sort_by(|a, b| a.0.cmp(&b.0));
    let rows: Vec<Row> = zip3_rows
        .iter()
        .map(|(z3, (buckets, pieces))| {
            let mut row = Row::new();
            row.insert("ZIP3".into(), display_zip(z3));
            row.insert("EstZIP5Buckets".into(), buckets.to_string());
            row.insert("TotalPieces".into(), pieces.to_string());
            row
        })
        .collect();
    csvio::write_rows(
        &campaign_dir.join("presort_zip3_summary.csv"),
        &rows,
        &["ZIP3".into(), "EstZIP5Buckets".into(), "TotalPieces".into()],
    )?;
    Ok(())
}

fn display_zip(zip: &str) -> String {
    if zip.is_empty() {
        "(none)".to_string()
    } else {
        zip.to_string()
    }
}

fn write_postage_estimate(
    campaign_dir: &Path,
    estimate: &crate::selection::PostageEstimate,
    rates: &crate::config::PostageConfig,
    total_pieces: usize,
) -> Result<()> {
    let tier_row = |tier: &str, pieces: String, rate: String, cost: String| {
        let mut row = Row::new();
        row.insert("Tier".into(), tier.into());
        row.insert("Pieces".into(), pieces);
        row.insert("Rate".into(), rate);
        row.insert("Cost".into(), cost);
        row
    };
    let rows = vec![
        tier_row(
            "5digit",
            estimate.five_digit.to_string(),
            rates.rate_5digit.to_string(),
            format!("{:.2}", estimate.cost_5),
        ),
        tier_row(
            "3digit",
            estimate.three_digit.to_string(),
            rates.rate_3digit.to_string(),
            format!("{:.2}", estimate.cost_3),
        ),
        tier_row(
            "AADC",
            estimate.aadc.to_string(),
            rates.rate_aadc.to_string(),
            format!("{:.2}", estimate.cost_a),
        ),
        tier_row(
            "total",
            total_pieces.to_string(),
            String::new(),
            format!("{:.2}", estimate.total_cost),
        ),
        tier_row(
            "AveragePerPiece",
            String::new(),
            String::new(),
            format!("{:.4}", estimate.avg_per_piece),
        ),
    ];
    csvio::write_rows(
        &campaign_dir.join("postage_estimate.csv"),
        &rows,
        &["Tier".into(), "Pieces".into(), "Rate".into(), "Cost".into()],
    )
}

fn write_bin_manifest(campaign_dir: &Path, bins: &[Bin]) -> Result<()> {
    let rows: Vec<Row> = bins
        .iter()
        .map(|bin| {
            let mut row = Row::new();
            row.insert("BinId".into(), bin.id.to_string());
            row.insert("Type".into(), bin.kind.label().into());
            row.insert("Group".into(), bin.group.clone());
            row.insert("Start".into(), bin.start.to_string());
            row.insert("End".into(), bin.end.to_string());
            row.insert("Count".into(), bin.count.to_string());
            row
        })
        .collect();
    csvio::write_rows(
        &campaign_dir.join("bin_manifest.csv"),
        &rows,
        &[
            "BinId".into(),
            "Type".into(),
            "Group".into(),
            "Start".into(),
            "End".into(),
            "Count".into(),
        ],
    )
}

/// Mirror the first readable source's header schema onto the selection so
/// downstream rendering sees the columns it already knows. Falls back to a
/// minimal Address/Primary Name schema when no source header is available.
fn build_master_rows(spec: &CampaignSpec, chosen: &[Candidate]) -> (Vec<Row>, Vec<String>) {
    let headers = template_headers(spec);
    let rows = match &headers {
        Some(headers) => chosen
            .iter()
            .map(|candidate| {
                let mut row = Row::new();
                for col in headers {
                    let value = candidate
                        .source_row
                        .get(col)
                        .cloned()
                        .unwrap_or_default();
                    row.insert(col.clone(), value);
                }
                backfill_identity(&mut row, candidate);
                row
            })
            .collect(),
        None => chosen
            .iter()
            .map(|candidate| {
                let mut row = Row::new();
                row.insert("Address".into(), candidate.lead.address.clone());
                row.insert("Primary Name".into(), candidate.lead.owner.clone());
                row
            })
            .collect(),
    };
    let headers =
        headers.unwrap_or_else(|| MINIMAL_HEADERS.iter().map(|h| h.to_string()).collect());
    (rows, headers)
}

fn template_headers(spec: &CampaignSpec) -> Option<Vec<String>> {
    for path in spec.mandatory.iter().chain(spec.optional.iter()) {
        match csvio::read_rows_with_headers(Path::new(path)) {
            Ok((_, headers)) if !headers.is_empty() => {
                info!("Master schema mirrored from {:?}", path);
                return Some(headers);
            }
            _ => continue,
        }
    }
    None
}

/// Address/owner-like columns present in the mirrored schema but empty for
/// this row get the resolved values, so every master row is mailable.
fn backfill_identity(row: &mut Row, candidate: &Candidate) {
    const ADDR_LIKE: [&str; 8] = [
        "Address",
        "ADDRESS",
        "Property Address",
        "PROPERTY ADDRESS",
        "Situs Address",
        "SITUS ADDRESS",
        "Mailing Address",
        "MAILING ADDRESS",
    ];
    const OWNER_LIKE: [&str; 6] = [
        "Primary Name",
        "PRIMARY NAME",
        "OwnerName",
        "OWNER NAME",
        "OWNER",
        "OWNER(S)",
    ];
    for col in ADDR_LIKE {
        if let Some(value) = row.get_mut(col) {
            if value.trim().is_empty() {
                *value = candidate.lead.address.clone();
            }
        }
    }
    for col in OWNER_LIKE {
        if let Some(value) = row.get_mut(col) {
            if value.trim().is_empty() {
                *value = candidate.lead.owner.clone();
            }
        }
    }
}
