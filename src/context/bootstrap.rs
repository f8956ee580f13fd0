//! Page bootstrap payload
//!
//! The page hands the engine one JSON document describing the campaign, the
//! lookup tables, and which form fields are present.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{BaseDirectory, BaseInfo, CampaignContext, CampaignType, Catalog};
use crate::error::BootstrapError;
use crate::selection::Field;

/// Top-level anchors the page cannot work without
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAnchor {
    SignupRoot,
    CampaignId,
}

impl PageAnchor {
    /// Persistent notice shown when the anchor is missing
    pub fn notice(self) -> String {
        let what = match self {
            PageAnchor::SignupRoot => "signup-root element is missing",
            PageAnchor::CampaignId => "campaign ID is missing",
        };
        format!("Critical error: {}. Please reload or contact an admin.", what)
    }
}

impl fmt::Display for PageAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageAnchor::SignupRoot => write!(f, "signup-root"),
            PageAnchor::CampaignId => write!(f, "campaign-id"),
        }
    }
}

/// Which secondary form elements exist. A missing one turns its part of the
/// cascade into a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormAnchors {
    fields: [bool; 6],
    remarks: bool,
}

impl FormAnchors {
    pub fn all() -> Self {
        Self {
            fields: [true; 6],
            remarks: true,
        }
    }

    /// Build from element ids (`"departure_base"`, `"remarks"`, ...)
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut anchors = Self {
            fields: [false; 6],
            remarks: false,
        };
        for name in names {
            let name = name.as_ref();
            if name == "remarks" {
                anchors.remarks = true;
                continue;
            }
            match Field::ALL.into_iter().find(|f| f.anchor_id() == name) {
                Some(field) => anchors.fields[field.index()] = true,
                None => warn!("Ignoring unknown form anchor '{}'", name),
            }
        }
        anchors
    }

    pub fn without(mut self, field: Field) -> Self {
        self.fields[field.index()] = false;
        self
    }

    pub fn has(&self, field: Field) -> bool {
        self.fields[field.index()]
    }

    pub fn has_remarks(&self) -> bool {
        self.remarks
    }
}

impl Default for FormAnchors {
    fn default() -> Self {
        Self::all()
    }
}

/// Data attributes of the signup root element
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignupRoot {
    #[serde(default)]
    pub campaign_id: Option<String>,
    #[serde(default)]
    pub persistent_ac_location: bool,
    #[serde(default)]
    pub campaign_type: Option<String>,
}

/// Raw bootstrap document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageBootstrap {
    #[serde(default)]
    pub signup_root: Option<SignupRoot>,
    /// Ordered `id -> { name, location }` map
    #[serde(default)]
    pub bases: Map<String, Value>,
    #[serde(default)]
    pub squadrons: Value,
    #[serde(default)]
    pub operations_areas: Value,
    #[serde(default)]
    pub mission_types: Value,
    /// Element ids present in the form; absent means all of them
    #[serde(default)]
    pub anchors: Option<Vec<String>>,
}

impl PageBootstrap {
    pub fn from_json(json: &str) -> Result<Self, BootstrapError> {
        Ok(serde_json::from_str(json)?)
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, BootstrapError> {
        let json = tokio::fs::read_to_string(path.as_ref()).await?;
        debug!("Loaded bootstrap from {}", path.as_ref().display());
        Self::from_json(&json)
    }

    /// Validate the top-level anchors and freeze everything into a context.
    pub fn into_context(self) -> Result<(Arc<CampaignContext>, FormAnchors), BootstrapError> {
        let root = self
            .signup_root
            .ok_or(BootstrapError::MissingAnchor(PageAnchor::SignupRoot))?;
        let campaign_id = root
            .campaign_id
            .filter(|id| !id.trim().is_empty())
            .ok_or(BootstrapError::MissingAnchor(PageAnchor::CampaignId))?;

        let bases = BaseDirectory::new(self.bases.into_iter().map(|(id, entry)| {
            let info = match entry {
                Value::Object(_) => serde_json::from_value::<BaseInfo>(entry).unwrap_or_else(|e| {
                    warn!("Base '{}' has an unreadable entry ({}); using its id", id, e);
                    BaseInfo::default()
                }),
                Value::String(name) => BaseInfo {
                    name: Some(name),
                    location: None,
                },
                _ => BaseInfo::default(),
            };
            (id, info)
        }));

        let catalog = Catalog {
            bases,
            squadrons: Catalog::choices_from_json(&self.squadrons),
            operations_areas: Catalog::choices_from_json(&self.operations_areas),
            mission_types: Catalog::choices_from_json(&self.mission_types),
        };
        let campaign_type = root
            .campaign_type
            .as_deref()
            .map(CampaignType::from)
            .unwrap_or(CampaignType::Other);

        let anchors = match self.anchors {
            Some(names) => FormAnchors::from_names(names),
            None => FormAnchors::all(),
        };

        let context = CampaignContext::new(
            campaign_id,
            root.persistent_ac_location,
            campaign_type,
            catalog,
        );
        Ok((Arc::new(context), anchors))
    }
}
