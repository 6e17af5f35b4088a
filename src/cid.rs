// Content identifier value type

use std::fmt;

use serde::{Deserialize, Serialize};

/// An opaque, content-derived identifier naming immutable data in the
/// storage network.
///
/// The full string (including any trailing path segments like
/// `cid/subdir/file`) is what goes on the wire; [`Cid::display_name`] is
/// only used for progress labels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cid(String);

impl Cid {
    pub fn new(cid: impl Into<String>) -> Self {
        Self(cid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment, used when reporting progress for a fetch.
    pub fn display_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Cid {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Cid {
    fn from(s: String) -> Self {
        Self(s)
    }
}
