use thiserror::Error;

/// Reasons a single line of range input could not be turned into an [`AddressRange`].
///
/// [`AddressRange`]: crate::network::range::AddressRange
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("empty range")]
    Empty,
    #[error("invalid address '{0}'")]
    InvalidAddress(String),
    #[error("invalid prefix length '{0}'")]
    InvalidPrefix(String),
    #[error("prefix /{prefix} is too long for {family}")]
    PrefixOutOfBounds { prefix: u8, family: &'static str },
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog payload is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("catalog contains no locations")]
    Empty,
}

