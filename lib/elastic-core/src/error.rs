use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

/// Failure to turn text into a [`crate::Prefix`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PrefixError {
    #[error("missing prefix length in {0:?}, expected address/length")]
    MissingLength(String),

    #[error("invalid prefix {input:?}: {reason}")]
    Invalid { input: String, reason: String },

    #[error("prefix length {len} exceeds {max} bits")]
    LengthOutOfRange { len: u8, max: u8 },
}

/// Failure while placing an index into a prefix.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubnetError {
    #[error("cannot subnet /{current} to /{target}: target must be between {current} and {max}")]
    InvalidLength { current: u8, target: u8, max: u8 },

    #[error("index {index} out of range for /{target} (byte offset {offset})")]
    IndexOutOfRange { index: u32, target: u8, offset: i32 },

    #[error("index {0} has more than eight decimal digits and cannot be lifted to hex")]
    LiftOverflow(u32),
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Prefix(#[from] PrefixError),

    #[error(transparent)]
    Subnet(#[from] SubnetError),

    #[error("invalid community {input:?}: {reason}")]
    InvalidCommunity { input: String, reason: String },

    #[error("didn't find any configured elastic IPs")]
    NoEligibleAddresses,

    #[error(
        "community map does not match the host: requested [{}], observed [{}]",
        requested.join(", "),
        observed.join(", ")
    )]
    CommunityMismatch {
        requested: Vec<String>,
        observed: Vec<String>,
    },

    #[error("invalid datacenter id {0}: must be greater than 1")]
    InvalidDatacenter(u32),

    #[error("invalid aggregation width /{0}: only /56 and /64 are supported")]
    InvalidWidth(u8),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}
