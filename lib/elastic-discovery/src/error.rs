use elastic_core::PrefixError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DiscoveryError>;

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("invalid literal prefix: {0}")]
    InvalidLiteral(#[from] PrefixError),

    #[error("no literal prefixes configured")]
    NoLiterals,

    #[error("no loopback interface found")]
    NoLoopbackInterface,
}
