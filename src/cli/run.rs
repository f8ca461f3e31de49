use dialoguer::{theme::ColorfulTheme, Select};
use tracing::error;

use crate::{
    cli::cli::MenuAction,
    models::{CliApp, Result},
};

impl CliApp {
    pub async fn run(&self) -> Result<()> {
        println!("\n📮 Welcome to mailtray!");
        println!("═══════════════════════════════════════");

        self.show_ledger_stats().await?;

        loop {
            let actions = vec![
                MenuAction::BuildCampaign,
                MenuAction::FinalizeCampaign,
                MenuAction::RebuildLedger,
                MenuAction::ShowLedgerStats,
                MenuAction::Exit,
            ];

            let selection = Select::with_theme(&ColorfulTheme::default())
                .with_prompt("\nSelect an action")
                .default(0)
                .items(&actions)
                .interact()?;

            match &actions[selection] {
                MenuAction::BuildCampaign => {
                    if let Err(e) = self.run_build().await {
                        error!("Build failed: {}", e);
                        println!("❌ Build failed: {}", e);
                    }
                }
                MenuAction::FinalizeCampaign => {
                    if let Err(e) = self.run_finalize().await {
                        error!("Finalize failed: {}", e);
                        println!("❌ Finalize failed: {}", e);
                    }
                }
                MenuAction::RebuildLedger => {
                    if let Err(e) = self.run_rebuild().await {
                        error!("Rebuild failed: {}", e);
                        println!("❌ Rebuild failed: {}", e);
                    }
                }
                MenuAction::ShowLedgerStats => {
                    if let Err(e) = self.show_ledger_stats().await {
                        error!("Failed to show stats: {}", e);
                    }
                }
                MenuAction::Exit => {
                    println!("👋 Goodbye!");
                    break;
                }
            }
        }

        Ok(())
    }
}
