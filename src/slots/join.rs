//! Join form for an open wingman position.

use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::cascade::{ApplyOutcome, Generations, ResolveCompletion, ResolveQuery, ResolveRequest, ResolveTarget, Resolved};
use crate::context::CampaignContext;
use crate::error::CascadeError;
use crate::resolver::Mode;
use crate::selection::{Choice, Field, FieldState};

pub const NO_SQUADRON_AIRCRAFT: &str = "No aircraft available for this squadron";

/// The flight position being joined
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinTarget {
    pub flight_id: String,
    pub position: String,
    /// Squadron the position was offered for; preselected when it is known
    pub squadron: String,
    /// Departure base of the flight lead
    pub target_base: String,
}

/// Two-field chain: squadron gates the aircraft list
pub struct JoinSlot {
    target: JoinTarget,
    campaign_id: String,
    squadron: FieldState,
    aircraft: FieldState,
    /// tail -> location of the last resolved list
    locations: HashMap<String, String>,
    cross_base_warning: bool,
    generations: Generations,
}

impl JoinSlot {
    pub fn new(target: JoinTarget, context: &CampaignContext) -> Self {
        let mut squadron = FieldState::default();
        squadron.populate(context.catalog().squadrons.clone(), None);
        let preselect = target.squadron.trim();
        if !preselect.is_empty() && squadron.select(Field::Squadron, Some(preselect)).is_err() {
            warn!(
                "Join {}#{}: squadron '{}' is not in the catalog",
                target.flight_id, target.position, preselect
            );
        }

        let slot = Self {
            target,
            campaign_id: context.campaign_id().to_string(),
            squadron,
            aircraft: FieldState::default(),
            locations: HashMap::new(),
            cross_base_warning: false,
            generations: Generations::default(),
        };
        slot.assert_consistent();
        slot
    }

    pub fn target(&self) -> &JoinTarget {
        &self.target
    }

    pub fn squadron(&self) -> &FieldState {
        &self.squadron
    }

    pub fn aircraft(&self) -> &FieldState {
        &self.aircraft
    }

    /// Whether the chosen aircraft sits somewhere other than the lead's base
    pub fn cross_base_warning(&self) -> bool {
        self.cross_base_warning
    }

    /// Lookup for the current squadron, superseding any in flight.
    pub fn resolve(&mut self) -> Option<ResolveRequest> {
        self.aircraft.clear();
        self.locations.clear();
        self.cross_base_warning = false;
        let generation = self.generations.bump(ResolveTarget::Aircraft);
        self.assert_consistent();

        let squadron = self.squadron.value()?.value.clone();
        Some(ResolveRequest {
            target: ResolveTarget::Aircraft,
            generation,
            query: ResolveQuery::Aircraft {
                squadron,
                base: None,
                campaign_id: self.campaign_id.clone(),
                mode: Mode::Wingman,
            },
        })
    }

    /// Change (or clear) the squadron. Only catalog squadrons are accepted.
    pub fn set_squadron(&mut self, squadron: Option<&str>) -> Result<Option<ResolveRequest>, CascadeError> {
        let squadron = squadron.map(str::trim).filter(|s| !s.is_empty());
        self.squadron.select(Field::Squadron, squadron)?;
        debug!(
            "Join {}#{}: squadron now {:?}",
            self.target.flight_id, self.target.position, squadron
        );
        Ok(self.resolve())
    }

    pub fn apply(&mut self, completion: ResolveCompletion) -> ApplyOutcome {
        let ResolveCompletion { request, outcome } = completion;
        if !self.generations.is_current(request.target, request.generation) {
            debug!("Discarding stale join aircraft response");
            return ApplyOutcome::Stale;
        }

        let aircraft = match outcome {
            Ok(Resolved::Aircraft(aircraft)) => aircraft,
            Ok(other) => {
                warn!("Join slot received unexpected payload: {:?}", other);
                return ApplyOutcome::Failed;
            }
            Err(e) => {
                warn!("Could not fetch aircraft for {:?}: {}", request.query, e);
                return ApplyOutcome::Failed;
            }
        };

        self.locations = aircraft
            .iter()
            .map(|ac| (ac.tail.clone(), ac.location.clone()))
            .collect();
        let choices = if aircraft.is_empty() {
            vec![Choice::sentinel(NO_SQUADRON_AIRCRAFT)]
        } else {
            aircraft.iter().map(|ac| ac.choice()).collect()
        };
        self.aircraft.populate(choices, None);
        self.cross_base_warning = false;
        self.assert_consistent();
        ApplyOutcome::Applied
    }

    /// Pick an aircraft; returns whether the cross-base warning is now shown.
    pub fn select_aircraft(&mut self, tail: Option<&str>) -> Result<bool, CascadeError> {
        self.aircraft.select(Field::Aircraft, tail)?;

        let location = self
            .aircraft
            .value()
            .and_then(|c| self.locations.get(&c.value))
            .map(String::as_str)
            .unwrap_or("");
        self.cross_base_warning = !location.is_empty() && location != self.target.target_base;
        if self.cross_base_warning {
            info!(
                "Aircraft at {} differs from flight base {}",
                location, self.target.target_base
            );
        }
        self.assert_consistent();
        Ok(self.cross_base_warning)
    }

    fn assert_consistent(&self) {
        if let Err(e) = self.squadron.check() {
            panic!("join slot invariant violated: squadron: {}", e);
        }
        if let Err(e) = self.aircraft.check() {
            panic!("join slot invariant violated: aircraft: {}", e);
        }
        if self.aircraft.is_active() && self.squadron.value().is_none() {
            panic!("join slot invariant violated: aircraft active without a squadron");
        }
    }
}
