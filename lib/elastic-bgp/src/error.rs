use thiserror::Error;

pub type Result<T> = std::result::Result<T, BgpError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BgpError {
    #[error("BGP speaker not started")]
    NotStarted,

    #[error("BGP speaker already started")]
    AlreadyStarted,

    #[error("failed adding neighbor {0}: already configured")]
    DuplicatePeer(String),

    #[error("next hop {next_hop} does not match family of {prefix}")]
    NextHopFamily { prefix: String, next_hop: String },

    #[error("failed adding route {prefix}: {reason}")]
    AddPath { prefix: String, reason: String },

    #[error("BGP engine error: {0}")]
    Engine(String),
}
