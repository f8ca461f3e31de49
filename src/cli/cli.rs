use crate::config::Config;
use crate::ledger::CsvLedgerRepository;
use crate::models::{CliApp, Result};

#[derive(Debug, Clone)]
pub enum MenuAction {
    BuildCampaign,
    FinalizeCampaign,
    RebuildLedger,
    ShowLedgerStats,
    Exit,
}

impl std::fmt::Display for MenuAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MenuAction::BuildCampaign => {
                write!(f, "📬 Build campaign master list (presort-optimized)")
            }
            MenuAction::FinalizeCampaign => {
                write!(f, "✅ Finalize campaign (append executed log, update ledger)")
            }
            MenuAction::RebuildLedger => {
                write!(f, "🛠️  Rebuild ledger from all executed logs (disaster recovery)")
            }
            MenuAction::ShowLedgerStats => write!(f, "📊 Show ledger statistics"),
            MenuAction::Exit => write!(f, "🚪 Exit"),
        }
    }
}

impl CliApp {
    pub async fn new(config: Config) -> Result<Self> {
        let ledger_repo = CsvLedgerRepository::new(&config.ledger);
        Ok(Self {
            config,
            ledger_repo,
        })
    }
}
