//! Observable cascade state for the view layer.

use serde::Serialize;
use std::fmt;

use crate::selection::{Choice, Field, SelectionChain};

/// Coarse progress through the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum CascadeState {
    Idle,
    SquadronChosen,
    BaseChosen,
    AreaOrMissionChosen,
    FullyConfigured,
}

impl CascadeState {
    pub fn of(chain: &SelectionChain) -> Self {
        let aircraft = chain.field(Field::Aircraft);
        if aircraft.is_active() && aircraft.has_available_options() {
            CascadeState::FullyConfigured
        } else if chain.value(Field::Area).is_some() || chain.value(Field::MissionType).is_some() {
            CascadeState::AreaOrMissionChosen
        } else if chain.value(Field::DepartureBase).is_some() || chain.value(Field::RecoveryBase).is_some() {
            CascadeState::BaseChosen
        } else if chain.value(Field::Squadron).is_some() {
            CascadeState::SquadronChosen
        } else {
            CascadeState::Idle
        }
    }
}

impl fmt::Display for CascadeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CascadeState::Idle => "idle",
            CascadeState::SquadronChosen => "squadron chosen",
            CascadeState::BaseChosen => "base chosen",
            CascadeState::AreaOrMissionChosen => "area/mission chosen",
            CascadeState::FullyConfigured => "fully configured",
        };
        f.write_str(name)
    }
}

/// What the view needs to render one field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldView {
    pub field: Field,
    pub visible: bool,
    pub enabled: bool,
    pub value: Option<String>,
    pub options: Vec<Choice>,
}

/// Render-ready copy of the whole form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CascadeSnapshot {
    pub state: CascadeState,
    pub fields: Vec<FieldView>,
    pub remarks_visible: bool,
}

impl CascadeSnapshot {
    pub fn of(chain: &SelectionChain) -> Self {
        let fields = Field::ALL
            .into_iter()
            .map(|field| {
                let state = chain.field(field);
                FieldView {
                    field,
                    visible: state.is_active(),
                    enabled: state.is_active() && !state.is_disabled(),
                    value: chain.value(field).map(str::to_string),
                    options: state.options().to_vec(),
                }
            })
            .collect();
        Self {
            state: CascadeState::of(chain),
            fields,
            remarks_visible: chain.remarks_visible(),
        }
    }

    pub fn field(&self, field: Field) -> &FieldView {
        &self.fields[field.index()]
    }
}

impl fmt::Display for CascadeSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "state: {}", self.state)?;
        for view in self.fields.iter().filter(|v| v.visible) {
            let lock = if view.enabled { "" } else { " [locked]" };
            let value = view.value.as_deref().unwrap_or("-");
            let options = view
                .options
                .iter()
                .map(|c| if c.enabled { c.label.clone() } else { format!("({})", c.label) })
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(f, "  {:<16} {}{}  [{}]", view.field.to_string(), value, lock, options)?;
        }
        if self.remarks_visible {
            writeln!(f, "  remarks          (free text)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_progression() {
        let mut chain = SelectionChain::new(false);
        assert_eq!(CascadeState::of(&chain), CascadeState::Idle);

        chain.set_options(Field::Squadron, vec![Choice::new("101st", "101st")], None);
        chain.select(Field::Squadron, Some("101st")).unwrap();
        assert_eq!(CascadeState::of(&chain), CascadeState::SquadronChosen);

        chain.set_options(Field::RecoveryBase, vec![Choice::new("KXYZ", "Xyz")], None);
        chain.select(Field::RecoveryBase, Some("KXYZ")).unwrap();
        assert_eq!(CascadeState::of(&chain), CascadeState::BaseChosen);

        chain.set_options(Field::MissionType, vec![Choice::new("CAP", "CAP")], None);
        chain.select(Field::MissionType, Some("CAP")).unwrap();
        assert_eq!(CascadeState::of(&chain), CascadeState::AreaOrMissionChosen);

        chain.set_options(Field::Aircraft, vec![Choice::sentinel("No aircraft available")], None);
        assert_eq!(CascadeState::of(&chain), CascadeState::AreaOrMissionChosen);

        chain.set_options(Field::Aircraft, vec![Choice::new("101", "F-16C (101) - KXYZ")], None);
        assert_eq!(CascadeState::of(&chain), CascadeState::FullyConfigured);
    }

    #[test]
    fn test_snapshot_render_hides_inactive_fields() {
        let mut chain = SelectionChain::new(false);
        chain.set_options(Field::Squadron, vec![Choice::new("7th", "7th")], None);
        chain.select(Field::Squadron, Some("7th")).unwrap();
        let only = Choice::new("KONE", "Base One");
        chain.set_options(Field::DepartureBase, vec![only.clone()], Some(only));

        let snapshot = CascadeSnapshot::of(&chain);
        assert!(!snapshot.field(Field::DepartureBase).enabled);
        assert!(!snapshot.field(Field::Aircraft).visible);

        let text = snapshot.to_string();
        assert!(text.contains("KONE [locked]"));
        assert!(!text.contains("aircraft"));
    }
}
