/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by queue construction.
///
/// Submission and query operations are total and never fail; the only
/// fallible surface is building the queue itself.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid configuration value.
    #[error("config error: {0}")]
    Config(String),

    /// An OS thread for a worker or the scheduler could not be spawned.
    #[error("spawn error: {0}")]
    Spawn(String),
}

impl Error {
    pub(crate) fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    pub(crate) fn spawn<S: Into<String>>(msg: S) -> Self {
        Error::Spawn(msg.into())
    }
}
