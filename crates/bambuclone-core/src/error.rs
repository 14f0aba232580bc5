//! Error taxonomy for catalog loading, resolution and clone output.

use std::path::PathBuf;

use crate::profile::ProfileType;

pub type Result<T> = std::result::Result<T, ProfileError>;

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed profile JSON in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("profile {} has no string `{field}` field", path.display())]
    MissingField { path: PathBuf, field: &'static str },

    #[error("profile {} has a non-string `inherits` field", path.display())]
    InvalidInherits { path: PathBuf },

    #[error("could not find {profile_type} profile \"{ancestor}\" inherited by \"{name}\"")]
    MissingAncestor {
        profile_type: ProfileType,
        name: String,
        ancestor: String,
    },

    #[error("inheritance cycle detected: {}", chain.join(" -> "))]
    InheritanceCycle { chain: Vec<String> },

    #[error("invalid profile name \"{name}\": {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid job configuration {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("refusing to clean {}: it contains the profile catalog", path.display())]
    UnsafeClean { path: PathBuf },
}

impl ProfileError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}
