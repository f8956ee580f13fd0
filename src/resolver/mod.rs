//! Resolver Client
//!
//! Asynchronous lookups of the bases and aircraft available to a squadron.
//! Implementations return normalized [`Base`] / [`Aircraft`] lists or a typed
//! [`ResolverError`]; they never retry.

mod http;

pub use http::HttpResolver;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::warn;

use crate::context::BaseDirectory;
pub use crate::error::ResolverError;
use crate::selection::Choice;

/// A base a squadron may depart from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Base {
    pub id: String,
    pub name: String,
    pub location: String,
}

impl Base {
    pub fn choice(&self) -> Choice {
        Choice::new(self.id.clone(), self.name.clone())
    }
}

/// An airframe as reported by the aircraft resolver
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Aircraft {
    pub tail: String,
    #[serde(rename = "type")]
    pub aircraft_type: String,
    /// Base id the airframe currently sits at
    pub location: String,
}

impl Aircraft {
    pub fn new(tail: impl Into<String>, aircraft_type: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            tail: tail.into(),
            aircraft_type: aircraft_type.into(),
            location: location.into(),
        }
    }

    /// e.g. `F-16C (88-0412) - KXYZ`
    pub fn label(&self) -> String {
        format!("{} ({}) - {}", self.aircraft_type, self.tail, self.location)
    }

    pub fn choice(&self) -> Choice {
        Choice::new(self.tail.clone(), self.label())
    }
}

/// Query variant: leads pick from one base's inventory, wingmen from the
/// whole squadron.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Lead,
    Wingman,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Lead => "lead",
            Mode::Wingman => "wingman",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source of base and aircraft options
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Bases the squadron can depart from. An empty list is a valid answer.
    async fn resolve_bases(
        &self,
        squadron: &str,
        persistent: bool,
        campaign_id: &str,
    ) -> Result<Vec<Base>, ResolverError>;

    /// Aircraft of the squadron. `base` filters by location in lead mode and
    /// is ignored in wingman mode.
    async fn resolve_aircraft(
        &self,
        squadron: &str,
        base: Option<&str>,
        campaign_id: &str,
        mode: Mode,
    ) -> Result<Vec<Aircraft>, ResolverError>;
}

/// Turn resolver base ids into named bases, preserving order.
pub fn normalize_bases(ids: &[String], directory: &BaseDirectory) -> Vec<Base> {
    ids.iter().map(|id| directory.base(id)).collect()
}

/// Reject duplicate tails; flag locations that are not known bases.
pub fn normalize_aircraft(
    aircraft: Vec<Aircraft>,
    directory: &BaseDirectory,
) -> Result<Vec<Aircraft>, ResolverError> {
    let mut seen = HashSet::new();
    for ac in &aircraft {
        if !seen.insert(ac.tail.as_str()) {
            return Err(ResolverError::MalformedResponse(format!(
                "duplicate aircraft tail '{}'",
                ac.tail
            )));
        }
        if !ac.location.is_empty() && !directory.is_empty() && !directory.contains(&ac.location) {
            warn!("Aircraft {} reports unknown location '{}'", ac.tail, ac.location);
        }
    }
    Ok(aircraft)
}
