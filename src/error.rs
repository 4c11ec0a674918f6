use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("Please set SUPABASE_URL and SUPABASE_KEY environment variables")]
    MissingStoreConfig,
    #[error("config invalid or unreadable: {0}")]
    InvalidConfig(String),
    #[error("vault directory unavailable: {0}")]
    VaultUnavailable(String),
    #[error("unparsable date `{0}`: expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("unexpected metadata shape: {0}")]
    MetadataShape(String),
    #[error("store rejected upsert with status {status}: {message}")]
    StoreRejected { status: u16, message: String },
}

impl MigrateError {
    /// Short stable code used in `JOURNAL_WARN` records.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingStoreConfig => "E001_STORE_CONFIG_MISSING",
            Self::InvalidConfig(_) => "E002_CONFIG_INVALID",
            Self::VaultUnavailable(_) => "E003_VAULT_UNAVAILABLE",
            Self::InvalidDate(_) => "E004_INVALID_DATE",
            Self::MetadataShape(_) => "E005_METADATA_SHAPE",
            Self::StoreRejected { .. } => "E006_STORE_REJECTED",
        }
    }
}

/// Best-effort code for an arbitrary error chain.
pub fn code_for(err: &anyhow::Error, fallback: &'static str) -> &'static str {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<MigrateError>())
        .map(MigrateError::code)
        .unwrap_or(fallback)
}
