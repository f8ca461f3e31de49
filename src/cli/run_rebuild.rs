use std::path::Path;

use dialoguer::{theme::ColorfulTheme, Confirm, Input};

use crate::ledger::rebuild::rebuild_ledger;
use crate::models::{CliApp, Result};
use crate::resolver::FieldResolver;

impl CliApp {
    /// Disaster recovery: throw the tracker away and re-derive it from every
    /// executed log on disk.
    pub async fn run_rebuild(&self) -> Result<()> {
        println!("\n🛠️  Rebuild Ledger From Executed Logs");
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        let root: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("Root folder to scan")
            .default(self.config.output.directory.clone())
            .interact_text()?;

        let marker_required = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Only treat folders with a campaign marker as campaigns?")
            .default(false)
            .interact()?;

        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("This replaces the tracker file wholesale. Continue?")
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }

        let resolver = FieldResolver::new();
        let folders = rebuild_ledger(
            &self.ledger_repo,
            &resolver,
            Path::new(&root),
            marker_required,
            &self.config.ledger.marker_name,
        )
        .await?;

        println!("✅ Rebuilt ledger from {} campaign folders.", folders);
        Ok(())
    }
}
