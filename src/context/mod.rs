//! Campaign Context
//!
//! Immutable, page-lifetime data handed to the cascade at construction: the
//! campaign rules and the read-only lookup tables the options are built from.

mod bootstrap;

pub use bootstrap::{FormAnchors, PageAnchor, PageBootstrap, SignupRoot};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

use crate::resolver::Base;
use crate::selection::Choice;

/// Campaign category. Decides whether an operations area precedes the
/// mission type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CampaignType {
    Tr,
    Op,
    Other,
}

impl CampaignType {
    pub fn uses_operations_areas(self) -> bool {
        self == CampaignType::Tr
    }
}

impl From<&str> for CampaignType {
    fn from(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "TR" => CampaignType::Tr,
            "OP" => CampaignType::Op,
            _ => CampaignType::Other,
        }
    }
}

impl From<String> for CampaignType {
    fn from(s: String) -> Self {
        CampaignType::from(s.as_str())
    }
}

impl From<CampaignType> for String {
    fn from(t: CampaignType) -> Self {
        t.to_string()
    }
}

impl fmt::Display for CampaignType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CampaignType::Tr => write!(f, "TR"),
            CampaignType::Op => write!(f, "OP"),
            CampaignType::Other => write!(f, "other"),
        }
    }
}

/// Directory entry for one base
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

/// Ordered base-id lookup table. Read-only after load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaseDirectory {
    entries: Vec<(String, BaseInfo)>,
    index: HashMap<String, usize>,
}

impl BaseDirectory {
    pub fn new(entries: impl IntoIterator<Item = (String, BaseInfo)>) -> Self {
        let mut directory = Self::default();
        for (id, info) in entries {
            match directory.index.get(&id) {
                Some(&pos) => directory.entries[pos].1 = info,
                None => {
                    directory.index.insert(id.clone(), directory.entries.len());
                    directory.entries.push((id, info));
                }
            }
        }
        directory
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&BaseInfo> {
        self.index.get(id).map(|&pos| &self.entries[pos].1)
    }

    /// Human-readable name, falling back to the id
    pub fn display_name(&self, id: &str) -> String {
        self.get(id)
            .and_then(|info| info.name.clone())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| id.to_string())
    }

    /// Normalize a resolver-supplied id into a full [`Base`]
    pub fn base(&self, id: &str) -> Base {
        let location = self
            .get(id)
            .and_then(|info| info.location.clone())
            .filter(|loc| !loc.is_empty())
            .unwrap_or_else(|| id.to_string());
        Base {
            id: id.to_string(),
            name: self.display_name(id),
            location,
        }
    }

    /// Every base, in directory order
    pub fn choices(&self) -> Vec<Choice> {
        self.entries
            .iter()
            .map(|(id, _)| Choice::new(id.clone(), self.display_name(id)))
            .collect()
    }
}

/// Read-only tables the cascade builds its static option lists from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    pub bases: BaseDirectory,
    pub squadrons: Vec<Choice>,
    pub operations_areas: Vec<Choice>,
    pub mission_types: Vec<Choice>,
}

impl Catalog {
    /// Accepts either `["A", "B"]` or `{"A": {"name": ...}, "B": "Label"}`.
    pub fn choices_from_json(value: &Value) -> Vec<Choice> {
        match value {
            Value::Array(items) => items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(Choice::new(s.clone(), s.clone())),
                    Value::Object(obj) => {
                        let id = obj.get("id").and_then(Value::as_str)?;
                        let name = obj.get("name").and_then(Value::as_str).unwrap_or(id);
                        Some(Choice::new(id, name))
                    }
                    _ => None,
                })
                .collect(),
            Value::Object(map) => map
                .iter()
                .map(|(key, entry)| {
                    let label = match entry {
                        Value::String(s) if !s.is_empty() => s.clone(),
                        Value::Object(obj) => obj
                            .get("name")
                            .and_then(Value::as_str)
                            .filter(|s| !s.is_empty())
                            .unwrap_or(key.as_str())
                            .to_string(),
                        _ => key.clone(),
                    };
                    Choice::new(key.clone(), label)
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Campaign rules plus lookup tables, fixed for the page lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignContext {
    campaign_id: String,
    persistent_ac_location: bool,
    campaign_type: CampaignType,
    catalog: Catalog,
}

impl CampaignContext {
    pub fn new(
        campaign_id: impl Into<String>,
        persistent_ac_location: bool,
        campaign_type: CampaignType,
        catalog: Catalog,
    ) -> Self {
        Self {
            campaign_id: campaign_id.into(),
            persistent_ac_location,
            campaign_type,
            catalog,
        }
    }

    pub fn campaign_id(&self) -> &str {
        &self.campaign_id
    }

    pub fn persistent_ac_location(&self) -> bool {
        self.persistent_ac_location
    }

    pub fn campaign_type(&self) -> CampaignType {
        self.campaign_type
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn bases(&self) -> &BaseDirectory {
        &self.catalog.bases
    }
}
