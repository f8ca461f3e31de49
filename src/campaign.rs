use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::SourceLimitsConfig;
use crate::history::PriorPolicy;

/// One campaign build request, loaded from its own YAML file the same way
/// source definitions are.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CampaignSpec {
    pub campaign_name: String,
    pub campaign_number: u32,
    pub target_size: usize,
    /// 1..=4 source lists that must all be ingested.
    pub mandatory: Vec<String>,
    /// 0..=2 optional pool lists; a missing file is a warning, not an error.
    #[serde(default)]
    pub optional: Vec<String>,
    pub prior_exact: Option<u32>,
    pub prior_max: Option<u32>,
    #[serde(default)]
    pub min_gap: u32,
    #[serde(default)]
    pub strict_150: bool,
    /// Seed for the selection shuffle; omit for a fresh seed per run.
    pub seed: Option<u64>,
}

impl CampaignSpec {
    /// Fatal configuration checks, run before any file is touched.
    pub fn validate(
        &self,
        limits: &SourceLimitsConfig,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.prior_exact.is_some() && self.prior_max.is_some() {
            return Err("use either prior_exact or prior_max, not both".into());
        }
        if self.mandatory.is_empty() {
            return Err("at least one mandatory source list is required".into());
        }
        if self.mandatory.len() > limits.max_mandatory {
            return Err(format!(
                "max {} mandatory lists allowed (got {})",
                limits.max_mandatory,
                self.mandatory.len()
            )
            .into());
        }
        if self.optional.len() > limits.max_optional {
            return Err(format!(
                "max {} optional lists allowed (got {})",
                limits.max_optional,
                self.optional.len()
            )
            .into());
        }
        Ok(())
    }

    pub fn policy(&self) -> PriorPolicy {
        PriorPolicy {
            prior_exact: self.prior_exact,
            prior_max: self.prior_max,
            min_gap: self.min_gap,
        }
    }

    /// Campaign folder name, e.g. `Campaign_3_Aug2026`.
    pub fn folder_name(&self, date: NaiveDate) -> String {
        format!(
            "{}_{}_{}",
            self.campaign_name,
            self.campaign_number,
            date.format("%b%Y")
        )
    }
}

pub async fn load_campaign_from_yaml(
    path: &str,
) -> std::result::Result<CampaignSpec, Box<dyn std::error::Error + Send + Sync>> {
    let content = tokio::fs::read_to_string(path).await?;
    let spec: CampaignSpec = serde_yaml::from_str(&content)?;
    Ok(spec)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> CampaignSpec {
        CampaignSpec {
            campaign_name: "Campaign".into(),
            campaign_number: 3,
            target_size: 5000,
            mandatory: vec!["leads.csv".into()],
            optional: vec![],
            prior_exact: None,
            prior_max: None,
            min_gap: 0,
            strict_150: true,
            seed: None,
        }
    }

    fn limits() -> SourceLimitsConfig {
        SourceLimitsConfig {
            max_mandatory: 4,
            max_optional: 2,
        }
    }

    #[test]
    fn exclusive_prior_flags_are_rejected() {
        let mut s = spec();
        s.prior_exact = Some(0);
        s.prior_max = Some(2);
        assert!(s.validate(&limits()).is_err());
    }

    #[test]
    fn source_count_limits_are_enforced() {
        let mut s = spec();
        s.mandatory = vec!["a".into(); 5];
        assert!(s.validate(&limits()).is_err());

        let mut s = spec();
        s.optional = vec!["a".into(); 3];
        assert!(s.validate(&limits()).is_err());

        let mut s = spec();
        s.mandatory = vec![];
        assert!(s.validate(&limits()).is_err());

        assert!(spec().validate(&limits()).is_ok());
    }

    #[test]
    fn folder_name_carries_month_tag() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
        assert_eq!(spec().folder_name(date), "Campaign_3_Aug2026");
    }

    #[test]
    fn yaml_round_trip_with_defaults() {
        let yaml = "campaign_name: Campaign\ncampaign_number: 1\ntarget_size: 100\nmandatory:\n  - leads.csv\n";
        let s: CampaignSpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(s.min_gap, 0);
        assert!(!s.strict_150);
        assert!(s.optional.is_empty());
        assert!(s.seed.is_none());
    }
}
