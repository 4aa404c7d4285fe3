use thiserror::Error;

#[derive(Error, Debug)]
pub enum NodeError {
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance { available: f64, requested: f64 },

    #[error("Wallet error: {0}")]
    WalletFailure(String),

    #[error("Schema version {found} is newer than supported version {supported}")]
    SchemaVersion { found: u32, supported: u32 },
}

pub type Result<T> = std::result::Result<T, NodeError>;

impl From<std::io::Error> for NodeError {
    fn from(err: std::io::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for NodeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}
