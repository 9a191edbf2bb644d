//! Tool release versions with relaxed patch comparison
//!
//! `"N.N"` and `"N.N.N"` forms both occur in directive conditions. When
//! either side omits the patch component, comparison stops at the minor
//! component and the versions count as equal there. That rule is local to
//! this type: it is not transitive across differently-specified versions,
//! so no total order is derived.

use crate::logging::codes;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("Invalid tools version '{text}': expected N.N or N.N.N")]
pub struct ToolsVersionError {
    pub text: String,
}

impl ToolsVersionError {
    pub fn error_code(&self) -> crate::logging::Code {
        codes::directive::INVALID_TOOLS_VERSION
    }
}

/// A tool release version of the form `N.N` or `N.N.N`.
///
/// Equality is the relaxed comparison, which is not transitive
/// (`8.54.01 == 8.54 == 8.54.03`, yet `8.54.01 != 8.54.03`), so the type
/// deliberately implements neither `Eq` nor the ordering traits.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ToolsVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: Option<u32>,
}

impl ToolsVersion {
    pub fn new(major: u32, minor: u32, patch: Option<u32>) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Relaxed ordering: major, then minor, then patch only when both
    /// sides carry one.
    pub fn relaxed_cmp(&self, other: &Self) -> Ordering {
        match self.major.cmp(&other.major) {
            Ordering::Equal => {}
            ordering => return ordering,
        }
        match self.minor.cmp(&other.minor) {
            Ordering::Equal => {}
            ordering => return ordering,
        }
        match (self.patch, other.patch) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => Ordering::Equal,
        }
    }
}

impl PartialEq for ToolsVersion {
    fn eq(&self, other: &Self) -> bool {
        self.relaxed_cmp(other) == Ordering::Equal
    }
}

impl FromStr for ToolsVersion {
    type Err = ToolsVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fail = || ToolsVersionError {
            text: s.to_string(),
        };

        let mut parts = s.split('.');
        let major = parts
            .next()
            .filter(|p| !p.is_empty())
            .and_then(|p| p.parse::<u32>().ok())
            .ok_or_else(fail)?;
        let minor = parts
            .next()
            .filter(|p| !p.is_empty())
            .and_then(|p| p.parse::<u32>().ok())
            .ok_or_else(fail)?;
        let patch = match parts.next() {
            Some(p) => Some(p.parse::<u32>().map_err(|_| fail())?),
            None => None,
        };
        if parts.next().is_some() {
            return Err(fail());
        }

        Ok(Self {
            major,
            minor,
            patch,
        })
    }
}

impl fmt::Display for ToolsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.patch {
            Some(patch) => write!(f, "{}.{}.{}", self.major, self.minor, patch),
            None => write!(f, "{}.{}", self.major, self.minor),
        }
    }
}
