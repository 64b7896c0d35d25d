use std::fmt;

use ndnfw_dsa::{FaceId, Name};

#[derive(Debug)]
pub enum FwError {
    Io(std::io::Error),
    Config(String),
    InvalidName(String),
    UnknownFace(FaceId),
    NoRoute(Name),
    /// A face limit below the number of interests already in flight on it.
    LimitBelowOutstanding { face: FaceId, outstanding: usize, requested: usize },
}

impl fmt::Display for FwError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FwError::Io(e) => write!(f, "io error: {}", e),
            FwError::Config(msg) => write!(f, "invalid configuration: {}", msg),
            FwError::InvalidName(uri) => write!(f, "invalid name: {}", uri),
            FwError::UnknownFace(face) => write!(f, "unknown face: {}", face),
            FwError::NoRoute(name) => write!(f, "no route for {}", name),
            FwError::LimitBelowOutstanding { face, outstanding, requested } => write!(
                f,
                "{} has {} interests outstanding, cannot lower its limit to {}",
                face, outstanding, requested
            ),
        }
    }
}

impl std::error::Error for FwError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FwError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for FwError {
    fn from(e: std::io::Error) -> Self {
        FwError::Io(e)
    }
}

impl From<toml::de::Error> for FwError {
    fn from(e: toml::de::Error) -> Self {
        FwError::Config(e.to_string())
    }
}
