use std::error::Error;
use std::fmt;

/// Navigation requests the navigator refuses. Shown to the user as warnings;
/// the navigator state is left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavError {
    NoChildFolder,
    UnknownChildFolder(String),
    AtRoot,
    InvalidSampleSize(i64),
    NotASampleSize(String),
}

impl fmt::Display for NavError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavError::NoChildFolder => f.write_str("no folder to descend to"),
            NavError::UnknownChildFolder(sel) => {
                write!(f, "no child folder matches {sel:?}")
            }
            NavError::AtRoot => f.write_str("cannot go up from root"),
            NavError::InvalidSampleSize(n) => {
                write!(f, "sample size must be between 1 and 50 (got {n})")
            }
            NavError::NotASampleSize(raw) => {
                write!(f, "sample size must be a number between 1 and 50 (got {raw:?})")
            }
        }
    }
}

impl Error for NavError {}

/// Lookup and mutation failures of a bookmark store. During validation any of
/// these sends the navigator back to the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    NotFound(String),
    NotAFolder(String),
    NotAUrl(String),
    Protected(String),
    InvalidMove { id: String, target: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound(id) => write!(f, "can't find bookmark node {id}"),
            StoreError::NotAFolder(id) => write!(f, "bookmark node {id} is not a folder"),
            StoreError::NotAUrl(id) => write!(f, "bookmark node {id} is not a URL"),
            StoreError::Protected(id) => write!(f, "can't modify the root bookmark folder {id}"),
            StoreError::InvalidMove { id, target } => {
                write!(f, "cannot move node {id} under {target}")
            }
        }
    }
}

impl Error for StoreError {}
