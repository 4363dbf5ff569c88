use crate::{
    customer::PaymentMethod,
    error::{SimError, SimResult},
    ids::IdBases,
    types::Seed,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Upper bound on any tenure or billing cycle, in days (about a century).
pub const MAX_SPAN_DAYS: i64 = 36_500;

/// One pool of mailing addresses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionPool {
    pub region_id: String,
    pub city: String,
    pub state: String,
    /// First three digits of generated ZIP codes.
    pub zip_prefix: String,
    pub weight: f64,
}

/// Internal file shape for identity/regions.json
#[derive(Debug, Clone, Deserialize)]
struct RegionsFile {
    regions: Vec<RegionPool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub seed: Seed,
    pub horizon_start: NaiveDate,
    pub horizon_end: NaiveDate,
    pub customer_count: usize,
    pub email_domain: String,
    /// Probability that an initial subscription switches plan.
    pub upgrade_probability: f64,
    #[serde(default = "default_half")]
    pub cancel_probability: f64,
    /// Share of subscriptions sampled as discount candidates.
    #[serde(default = "default_half")]
    pub discount_attach_fraction: f64,
    #[serde(default = "default_payment_success")]
    pub payment_success_probability: f64,
    #[serde(default = "default_tenure_min")]
    pub tenure_days_min: i64,
    #[serde(default = "default_tenure_max")]
    pub tenure_days_max: i64,
    #[serde(default = "default_monthly_cycle")]
    pub monthly_cycle_days: i64,
    #[serde(default = "default_yearly_cycle")]
    pub yearly_cycle_days: i64,
    #[serde(default = "default_payment_mix")]
    pub customer_payment_mix: Vec<(PaymentMethod, f64)>,
    #[serde(default)]
    pub id_bases: IdBases,
    /// Filled from identity/regions.json by `load`.
    #[serde(default)]
    pub regions: Vec<RegionPool>,
}

fn default_half() -> f64 {
    0.5
}
fn default_payment_success() -> f64 {
    0.7
}
fn default_tenure_min() -> i64 {
    60
}
fn default_tenure_max() -> i64 {
    720
}
fn default_monthly_cycle() -> i64 {
    30
}
fn default_yearly_cycle() -> i64 {
    365
}
fn default_payment_mix() -> Vec<(PaymentMethod, f64)> {
    vec![
        (PaymentMethod::Credit, 0.5),
        (PaymentMethod::Debit, 0.3),
        (PaymentMethod::Paypal, 0.2),
    ]
}

impl GeneratorConfig {
    /// Load from the data/ directory.
    /// In tests, use GeneratorConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/generator.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let mut config: GeneratorConfig = serde_json::from_str(&content)?;

        let regions_path = format!("{data_dir}/identity/regions.json");
        let regions_content = std::fs::read_to_string(&regions_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {regions_path}: {e}"))?;
        let regions_file: RegionsFile = serde_json::from_str(&regions_content)?;
        config.regions = regions_file.regions;

        Ok(config)
    }

    /// Number of whole days in the simulation horizon.
    pub fn horizon_days(&self) -> i64 {
        (self.horizon_end - self.horizon_start).num_days()
    }

    /// Reject configurations that would produce empty or nonsensical
    /// tables. Called before any stage runs.
    pub fn validate(&self) -> SimResult<()> {
        if self.horizon_end < self.horizon_start {
            return Err(SimError::invalid_config(format!(
                "horizon_end {} is before horizon_start {}",
                self.horizon_end, self.horizon_start
            )));
        }
        if self.customer_count == 0 {
            return Err(SimError::invalid_config("customer_count must be > 0"));
        }
        if self.email_domain.trim().is_empty() {
            return Err(SimError::invalid_config("email_domain is empty"));
        }
        let probabilities = [
            ("upgrade_probability", self.upgrade_probability),
            ("cancel_probability", self.cancel_probability),
            ("discount_attach_fraction", self.discount_attach_fraction),
            ("payment_success_probability", self.payment_success_probability),
        ];
        for (name, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                return Err(SimError::invalid_config(format!(
                    "{name} must be within [0, 1], got {p}"
                )));
            }
        }
        if self.tenure_days_min < 0 || self.tenure_days_min > self.tenure_days_max {
            return Err(SimError::invalid_config(format!(
                "tenure range {}..={} is invalid",
                self.tenure_days_min, self.tenure_days_max
            )));
        }
        if self.tenure_days_max > MAX_SPAN_DAYS {
            return Err(SimError::invalid_config(format!(
                "tenure_days_max {} exceeds {MAX_SPAN_DAYS} days",
                self.tenure_days_max
            )));
        }
        if self.monthly_cycle_days <= 0 || self.yearly_cycle_days <= 0 {
            return Err(SimError::invalid_config("billing cycle lengths must be > 0"));
        }
        if self.monthly_cycle_days > MAX_SPAN_DAYS || self.yearly_cycle_days > MAX_SPAN_DAYS {
            return Err(SimError::invalid_config(format!(
                "billing cycle lengths must be at most {MAX_SPAN_DAYS} days"
            )));
        }

        if self.customer_payment_mix.iter().any(|(_, w)| *w < 0.0) {
            return Err(SimError::invalid_config("negative payment method weight"));
        }
        if self
            .customer_payment_mix
            .iter()
            .any(|(m, _)| *m == PaymentMethod::NotApplicable)
        {
            return Err(SimError::invalid_config(
                "N/A is reserved for free-plan payments",
            ));
        }
        let mix_total: f64 = self.customer_payment_mix.iter().map(|(_, w)| w).sum();
        if (mix_total - 1.0).abs() > 1e-6 {
            return Err(SimError::invalid_config(format!(
                "customer_payment_mix weights sum to {mix_total}, expected 1.0"
            )));
        }

        if self.regions.is_empty() {
            return Err(SimError::invalid_config("no address regions configured"));
        }
        if self.regions.iter().any(|r| r.weight < 0.0)
            || self.regions.iter().map(|r| r.weight).sum::<f64>() <= 0.0
        {
            return Err(SimError::invalid_config("region weights must be >= 0 and not all zero"));
        }

        self.id_bases.validate()
    }

    /// Config with hardcoded defaults for use in unit tests.
    pub fn default_test() -> Self {
        Self {
            seed: 44,
            horizon_start: NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date"),
            horizon_end: NaiveDate::from_ymd_opt(2025, 12, 31).expect("valid date"),
            customer_count: 10,
            email_domain: "srcanalytics.com".into(),
            upgrade_probability: 0.40,
            cancel_probability: default_half(),
            discount_attach_fraction: default_half(),
            payment_success_probability: default_payment_success(),
            tenure_days_min: default_tenure_min(),
            tenure_days_max: default_tenure_max(),
            monthly_cycle_days: default_monthly_cycle(),
            yearly_cycle_days: default_yearly_cycle(),
            customer_payment_mix: default_payment_mix(),
            id_bases: IdBases::default(),
            regions: vec![
                RegionPool {
                    region_id: "test_nyc".into(),
                    city: "New York".into(),
                    state: "NY".into(),
                    zip_prefix: "100".into(),
                    weight: 0.6,
                },
                RegionPool {
                    region_id: "test_austin".into(),
                    city: "Austin".into(),
                    state: "TX".into(),
                    zip_prefix: "787".into(),
                    weight: 0.4,
                },
            ],
        }
    }
}
