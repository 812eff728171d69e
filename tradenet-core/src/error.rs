use thiserror::Error;

#[derive(Error, Debug)]
pub enum TradeError {
    #[error("Schema error at row {row}: {reason}")]
    Schema { row: usize, reason: String },

    #[error("Country {code} has no qualifying outbound trade; its transition row is undefined")]
    ZeroOutDegree { code: String },

    #[error("Unknown country code: {0}")]
    UnknownCountry(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Ranks have already been assigned to this graph")]
    RanksAlreadyAssigned,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl TradeError {
    pub(crate) fn schema(row: usize, reason: impl Into<String>) -> Self {
        TradeError::Schema {
            row,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TradeError>;
