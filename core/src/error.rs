use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Plan {plan_id} not found in catalog")]
    UnknownPlan { plan_id: u64 },

    #[error("Table '{name}' not found")]
    UnknownTable { name: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SimError {
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        SimError::InvalidConfig { reason: reason.into() }
    }
}

pub type SimResult<T> = Result<T, SimError>;
