#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("invalid {field}: {constraint}")]
    InvalidField {
        field: &'static str,
        constraint: String,
    },
    #[error("patient not found: {0}")]
    NotFound(String),
    #[error("patient already exists: {0}")]
    DuplicateId(String),
    #[error("invalid query: {0}")]
    InvalidQuery(String),
    #[error("failed to read patient store: {0}")]
    StoreRead(std::io::Error),
    #[error("failed to write patient store: {0}")]
    StoreWrite(std::io::Error),
    #[error("failed to parse patient store: {0}")]
    StoreParse(serde_json::Error),
    #[error("failed to serialise patient store: {0}")]
    StoreEncode(serde_json::Error),
}

impl RegistryError {
    /// True for the store-unavailable family of errors (I/O or encoding
    /// failures on the backing resource, as opposed to caller mistakes).
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self,
            RegistryError::StoreRead(_)
                | RegistryError::StoreWrite(_)
                | RegistryError::StoreParse(_)
                | RegistryError::StoreEncode(_)
        )
    }
}

pub type RegistryResult<T> = std::result::Result<T, RegistryError>;
