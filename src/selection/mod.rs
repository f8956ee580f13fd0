//! Selection State
//!
//! Holds the value, option list and visibility of every field in the signup
//! chain. All mutation goes through [`SelectionChain`], which re-checks the
//! chain invariants after every change.

mod field;

pub use field::{Choice, FieldState};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::error::CascadeError;

/// The fields of the signup chain, in dependency order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Squadron,
    DepartureBase,
    RecoveryBase,
    Area,
    MissionType,
    Aircraft,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Squadron,
        Field::DepartureBase,
        Field::RecoveryBase,
        Field::Area,
        Field::MissionType,
        Field::Aircraft,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Field> {
        Self::ALL.get(index).copied()
    }

    /// Form element id the field is anchored to
    pub fn anchor_id(self) -> &'static str {
        match self {
            Field::Squadron => "squadron",
            Field::DepartureBase => "departure_base",
            Field::RecoveryBase => "recovery_base",
            Field::Area => "operations_area",
            Field::MissionType => "mission_type",
            Field::Aircraft => "aircraft_id",
        }
    }

    /// Every field after this one
    pub fn downstream(self) -> impl Iterator<Item = Field> {
        Self::ALL.into_iter().skip(self.index() + 1)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Squadron => write!(f, "squadron"),
            Field::DepartureBase => write!(f, "departure base"),
            Field::RecoveryBase => write!(f, "recovery base"),
            Field::Area => write!(f, "operations area"),
            Field::MissionType => write!(f, "mission type"),
            Field::Aircraft => write!(f, "aircraft"),
        }
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "squadron" => Ok(Field::Squadron),
            "departure_base" | "departure" => Ok(Field::DepartureBase),
            "recovery_base" | "recovery" => Ok(Field::RecoveryBase),
            "operations_area" | "area" => Ok(Field::Area),
            "mission_type" | "mission" => Ok(Field::MissionType),
            "aircraft_id" | "aircraft" => Ok(Field::Aircraft),
            other => Err(format!("unknown field '{}'", other)),
        }
    }
}

/// A broken chain invariant. Always a programming error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct InvariantViolation {
    pub field: Field,
    pub reason: String,
}

/// Ordered field states for one signup form plus the remarks visibility flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionChain {
    fields: [FieldState; 6],
    remarks_visible: bool,
    /// Whether the operations area sits between recovery base and mission type
    area_applies: bool,
}

impl SelectionChain {
    pub fn new(area_applies: bool) -> Self {
        Self {
            fields: Default::default(),
            remarks_visible: false,
            area_applies,
        }
    }

    pub fn field(&self, field: Field) -> &FieldState {
        &self.fields[field.index()]
    }

    /// Current value of a field, as its option key
    pub fn value(&self, field: Field) -> Option<&str> {
        self.field(field).value().map(|c| c.value.as_str())
    }

    pub fn is_active(&self, field: Field) -> bool {
        self.field(field).is_active()
    }

    pub fn remarks_visible(&self) -> bool {
        self.remarks_visible
    }

    pub fn area_applies(&self) -> bool {
        self.area_applies
    }

    /// Upstream fields that must hold a value for `field` to be active
    pub fn gates(&self, field: Field) -> &'static [Field] {
        match field {
            Field::Squadron => &[],
            Field::DepartureBase | Field::RecoveryBase => &[Field::Squadron],
            Field::Area => &[Field::RecoveryBase],
            Field::MissionType if self.area_applies => &[Field::RecoveryBase, Field::Area],
            Field::MissionType => &[Field::RecoveryBase],
            Field::Aircraft => &[Field::MissionType],
        }
    }

    /// Clear every field at or after `from` back to inactive and empty.
    pub fn reset(&mut self, from: Field) {
        for field in Field::ALL.into_iter().skip(from.index()) {
            self.fields[field.index()].clear();
        }
        if from <= Field::MissionType {
            self.remarks_visible = false;
        }
        self.assert_consistent();
    }

    /// Replace the options of `field` and make it active. With `forced_single`
    /// the field is pinned to that one option and disabled.
    pub fn set_options(&mut self, field: Field, options: Vec<Choice>, forced_single: Option<Choice>) {
        self.fields[field.index()].populate(options, forced_single);
        self.assert_consistent();
    }

    /// Set or clear the value of an active field. Every later field goes back
    /// to inactive and empty.
    pub fn select(&mut self, field: Field, value: Option<&str>) -> Result<(), CascadeError> {
        self.fields[field.index()].select(field, value)?;
        for later in field.downstream() {
            self.fields[later.index()].clear();
        }
        if field <= Field::MissionType {
            self.remarks_visible = false;
        }
        self.assert_consistent();
        Ok(())
    }

    pub fn set_remarks_visible(&mut self, visible: bool) {
        self.remarks_visible = visible;
        self.assert_consistent();
    }

    /// Check every chain invariant.
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        for field in Field::ALL {
            let state = self.field(field);
            state
                .check()
                .map_err(|reason| InvariantViolation { field, reason })?;

            if !state.is_active() {
                continue;
            }
            if field == Field::Area && !self.area_applies {
                return Err(InvariantViolation {
                    field,
                    reason: "operations area is not used by this campaign".to_string(),
                });
            }
            if let Some(gate) = self.gates(field).iter().find(|g| self.value(**g).is_none()) {
                return Err(InvariantViolation {
                    field,
                    reason: format!("active while {} is empty", gate),
                });
            }
        }

        if self.remarks_visible && self.value(Field::MissionType).is_none() {
            return Err(InvariantViolation {
                field: Field::MissionType,
                reason: "remarks visible without a mission type".to_string(),
            });
        }
        Ok(())
    }

    fn assert_consistent(&self) {
        if let Err(violation) = self.validate() {
            panic!("selection chain invariant violated: {}", violation);
        }
    }
}
