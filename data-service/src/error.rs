use thiserror::Error;

/// Bootstrap-time errors: everything that can go wrong before the
/// long-lived components exist to report through `data_core::Error`.
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to read config file {path}: {source}")]
    ReadConfig {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    ParseConfig {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error(transparent)]
    Core(#[from] data_core::Error),
}
