use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Symbol must not be empty")]
    EmptySymbol,

    #[error("Unknown time-frame '{0}'. Expected: 1d, 4h, 1h")]
    UnknownTimeFrame(String),
}
