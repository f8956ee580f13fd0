use serde::{Deserialize, Serialize};

use super::Field;
use crate::error::CascadeError;

/// One entry of a field's option list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Choice {
    /// Submitted key (base id, tail number, squadron id, ...)
    pub value: String,
    /// Human-readable text
    pub label: String,
    /// Sentinels are listed but not selectable
    pub enabled: bool,
}

impl Choice {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            enabled: true,
        }
    }

    /// Disabled placeholder telling the user a lookup came back empty
    pub fn sentinel(label: impl Into<String>) -> Self {
        Self {
            value: String::new(),
            label: label.into(),
            enabled: false,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        !self.enabled && self.value.is_empty()
    }
}

/// Value, options and visibility of a single choice field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldState<T = Choice> {
    value: Option<T>,
    options: Vec<T>,
    active: bool,
    disabled: bool,
}

impl<T> Default for FieldState<T> {
    fn default() -> Self {
        Self {
            value: None,
            options: Vec::new(),
            active: false,
            disabled: false,
        }
    }
}

impl<T: Clone + PartialEq> FieldState<T> {
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn options(&self) -> &[T] {
        &self.options
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }

    /// Replace the option list and activate. The current value survives only
    /// if it is still offered.
    pub(crate) fn populate(&mut self, options: Vec<T>, forced_single: Option<T>) {
        match forced_single {
            Some(forced) => {
                self.options = vec![forced.clone()];
                self.value = Some(forced);
                self.disabled = true;
            }
            None => {
                if let Some(current) = &self.value {
                    if !options.contains(current) {
                        self.value = None;
                    }
                }
                self.options = options;
                self.disabled = false;
            }
        }
        self.active = true;
    }

    pub(crate) fn check(&self) -> Result<(), String> {
        if !self.active {
            if self.value.is_some() || !self.options.is_empty() || self.disabled {
                return Err("inactive field must be empty".to_string());
            }
            return Ok(());
        }
        if self.disabled && (self.options.len() != 1 || self.value.as_ref() != self.options.first()) {
            return Err("disabled field must hold exactly its single forced option".to_string());
        }
        if let Some(value) = &self.value {
            if !self.options.contains(value) {
                return Err("value is not among the options".to_string());
            }
        }
        Ok(())
    }
}

impl FieldState<Choice> {
    /// Whether the list holds at least one selectable option
    pub fn has_available_options(&self) -> bool {
        self.options.iter().any(|c| c.enabled)
    }

    pub fn find(&self, value: &str) -> Option<&Choice> {
        self.options.iter().find(|c| c.enabled && c.value == value)
    }

    /// Set (`Some`) or clear (`None` / empty string) the value.
    pub(crate) fn select(&mut self, field: Field, value: Option<&str>) -> Result<(), CascadeError> {
        if !self.active {
            return Err(CascadeError::FieldInactive(field));
        }
        let value = value.filter(|v| !v.is_empty());

        if self.disabled {
            return match (value, &self.value) {
                (Some(v), Some(current)) if current.value == v => Ok(()),
                _ => Err(CascadeError::FieldLocked(field)),
            };
        }

        self.value = match value {
            None => None,
            Some(v) => Some(self.find(v).cloned().ok_or_else(|| CascadeError::UnknownOption {
                field,
                value: v.to_string(),
            })?),
        };
        Ok(())
    }
}
