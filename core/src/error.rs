use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ContextError>;

#[derive(Error, Debug)]
pub enum ContextError {
    /// None of the supplied locations resolved to a loadable `.json` document.
    #[error("no .json documents found in the given locations: {}", display_locations(.locations))]
    Configuration { locations: Vec<PathBuf> },

    /// A resolved document could not be read or is not valid JSON.
    #[error("failed to load {}: {}", .path.display(), .source)]
    Load {
        path: PathBuf,
        #[source]
        source: LoadCause,
    },
}

#[derive(Error, Debug)]
pub enum LoadCause {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

fn display_locations(locations: &[PathBuf]) -> String {
    locations
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
