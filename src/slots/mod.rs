//! Secondary Forms
//!
//! Join forms, create-flight forms and curated-slot claims each carry their
//! own small selection state. Every open form lives in a [`SlotRegistry`]
//! under an opaque [`SlotId`]; nothing is shared between them.

mod curated;
mod flight_form;
mod join;

pub use curated::CuratedSlotLayout;
pub use flight_form::FlightFormSlot;
pub use join::{JoinSlot, JoinTarget, NO_SQUADRON_AIRCRAFT};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::cascade::{ApplyOutcome, ResolveCompletion, ResolveRequest};
use crate::context::CampaignContext;

/// Handle to an open form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotId(Uuid);

impl SlotId {
    fn new() -> Self {
        SlotId(Uuid::new_v4())
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub enum Slot {
    Join(JoinSlot),
    FlightForm(FlightFormSlot),
}

pub struct SlotRegistry {
    context: Arc<CampaignContext>,
    slots: HashMap<SlotId, Slot>,
}

impl SlotRegistry {
    pub fn new(context: Arc<CampaignContext>) -> Self {
        Self {
            context,
            slots: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Open a join form, closing any other. The returned request fetches the
    /// squadron's wingman aircraft.
    pub fn open_join(&mut self, target: JoinTarget) -> (SlotId, Option<ResolveRequest>) {
        let before = self.slots.len();
        self.slots.retain(|_, slot| !matches!(slot, Slot::Join(_)));
        if self.slots.len() < before {
            debug!("Closed {} open join form(s)", before - self.slots.len());
        }

        let id = SlotId::new();
        info!("Joining flight {} position {} ({})", target.flight_id, target.position, id);
        let mut slot = JoinSlot::new(target, &self.context);
        let request = slot.resolve();
        self.slots.insert(id, Slot::Join(slot));
        (id, request)
    }

    pub fn open_flight_form(&mut self) -> SlotId {
        let id = SlotId::new();
        self.slots
            .insert(id, Slot::FlightForm(FlightFormSlot::new(self.context.clone())));
        id
    }

    pub fn join(&self, id: SlotId) -> Option<&JoinSlot> {
        match self.slots.get(&id) {
            Some(Slot::Join(slot)) => Some(slot),
            _ => None,
        }
    }

    pub fn join_mut(&mut self, id: SlotId) -> Option<&mut JoinSlot> {
        match self.slots.get_mut(&id) {
            Some(Slot::Join(slot)) => Some(slot),
            _ => None,
        }
    }

    pub fn flight_form(&self, id: SlotId) -> Option<&FlightFormSlot> {
        match self.slots.get(&id) {
            Some(Slot::FlightForm(slot)) => Some(slot),
            _ => None,
        }
    }

    pub fn flight_form_mut(&mut self, id: SlotId) -> Option<&mut FlightFormSlot> {
        match self.slots.get_mut(&id) {
            Some(Slot::FlightForm(slot)) => Some(slot),
            _ => None,
        }
    }

    /// Dispose of a form. Returns false if it was already gone.
    pub fn close(&mut self, id: SlotId) -> bool {
        self.slots.remove(&id).is_some()
    }

    /// Route a completion to its form; answers for closed forms are stale.
    pub fn apply(&mut self, id: SlotId, completion: ResolveCompletion) -> ApplyOutcome {
        match self.slots.get_mut(&id) {
            Some(Slot::Join(slot)) => slot.apply(completion),
            Some(Slot::FlightForm(slot)) => slot.apply(completion),
            None => {
                debug!("Dropping response for closed slot {}", id);
                ApplyOutcome::Stale
            }
        }
    }
}
