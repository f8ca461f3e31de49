use std::path::Path;

use chrono::Local;
use dialoguer::{theme::ColorfulTheme, Confirm, Input};

use crate::ledger::finalize::{finalize_campaign, FinalizeOptions};
use crate::ledger::rebuild::rebuild_zip_tally;
use crate::models::{CliApp, Result};
use crate::resolver::FieldResolver;

impl CliApp {
    pub async fn run_finalize(&self) -> Result<()> {
        println!("\n✅ Finalize Campaign");
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        let campaign_dir: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("Campaign folder (e.g. campaigns/Campaign_3_Aug2026)")
            .interact_text()?;
        let campaign_dir = Path::new(&campaign_dir);
        if !campaign_dir.is_dir() {
            return Err(format!("campaign folder not found: {:?}", campaign_dir).into());
        }

        let dry_run = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Dry run (show changes without writing)?")
            .default(false)
            .interact()?;
        let write_marker = !dry_run
            && Confirm::with_theme(&ColorfulTheme::default())
                .with_prompt("Write campaign marker after finalize?")
                .default(true)
                .interact()?;

        let opts = FinalizeOptions {
            dry_run,
            write_marker,
            marker_name: self.config.ledger.marker_name.clone(),
            ..FinalizeOptions::default()
        };
        let resolver = FieldResolver::new();
        let summary = finalize_campaign(
            &self.ledger_repo,
            &resolver,
            campaign_dir,
            &opts,
            Local::now().date_naive(),
        )
        .await?;

        println!(
            "   Mapping rows: {} | Already logged (skipped): {} | Appended: {}",
            summary.mapping_rows, summary.already_logged, summary.appended
        );
        if dry_run {
            println!("🔎 Dry run — no changes written.");
            return Ok(());
        }

        rebuild_zip_tally(&self.ledger_repo, Path::new(&self.config.output.directory)).await?;
        println!("✅ Ledger and ZIP5 tally updated.");
        Ok(())
    }
}
