use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The builder was handed no rows.
    #[error("cannot build a similarity index from an empty catalog")]
    EmptyCorpus,

    /// The persisted artifact is missing, unreadable, or does not match this build.
    #[error("failed to load similarity index: {0}")]
    IndexLoad(String),

    #[error("failed to save similarity index: {0}")]
    IndexSave(String),

    /// No catalog title met the resolver's acceptance threshold.
    #[error("movie '{0}' not found in catalog")]
    TitleNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
