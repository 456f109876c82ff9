use thiserror::Error;

/// Validation failures surfaced by the user/channel registries (§4.4/§4.5).
/// Callers map these onto a numeric reply; the registries themselves never
/// pick a reply format.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no such user")]
    NoSuchUser,
    #[error("no such channel")]
    NoSuchChannel,
    #[error("not on channel")]
    NotOnChannel,
    #[error("nickname in use")]
    NickInUse,
    #[error("erroneous nickname")]
    ErroneousNick,
    #[error("need more params")]
    NeedMoreParams,
    #[error("already registered")]
    AlreadyRegistered,
    #[error("invalid sink for user type")]
    InvalidSink,
    #[error("key already in use")]
    KeyInUse,
}

/// Protocol-level mistakes a client makes. These are always client-visible
/// and always mapped to a numeric reply; they never tear down the
/// connection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Startup-fatal configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}
