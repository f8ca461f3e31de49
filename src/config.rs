use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub logging: LoggingConfig,
    pub output: OutputConfig,
    pub postage: PostageConfig,
    pub sources: SourceLimitsConfig,
    pub ledger: LedgerConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Root directory campaign folders are created under.
    pub directory: String,
}

/// Per-piece USPS rates for each presort tier.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct PostageConfig {
    pub rate_5digit: f64,
    pub rate_3digit: f64,
    pub rate_aadc: f64,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct SourceLimitsConfig {
    pub max_mandatory: usize,
    pub max_optional: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LedgerConfig {
    pub directory: String,
    pub tracker_file: String,
    pub tally_file: String,
    pub marker_name: String,
}

impl LedgerConfig {
    pub fn tracker_path(&self) -> PathBuf {
        PathBuf::from(&self.directory).join(&self.tracker_file)
    }

    pub fn tally_path(&self) -> PathBuf {
        PathBuf::from(&self.directory).join(&self.tally_file)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            output: OutputConfig {
                directory: "campaigns".to_string(),
            },
            postage: PostageConfig {
                rate_5digit: 0.244,
                rate_3digit: 0.275,
                rate_aadc: 0.330,
            },
            sources: SourceLimitsConfig {
                max_mandatory: 4,
                max_optional: 2,
            },
            ledger: LedgerConfig {
                directory: "MasterCampaignTracker".to_string(),
                tracker_file: "MasterPropertyCampaignTracker.csv".to_string(),
                tally_file: "Zip5_LetterTally.csv".to_string(),
                marker_name: "CAMPAIGN.TAG".to_string(),
            },
        }
    }
}

pub async fn load_config(
    path: &str,
) -> std::result::Result<Config, Box<dyn std::error::Error + Send + Sync>> {
    let content = tokio::fs::read_to_string(path).await?;
    let config: Config = serde_yaml::from_str(&content)?;
    Ok(config)
}
