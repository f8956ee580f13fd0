//! "Create flight" form: squadron, departure base and aircraft side by side.
//!
//! Unlike the main signup cascade, nothing here is hidden or locked. A
//! squadron change empties both dependent lists back to their placeholder and
//! refills them from the resolver; an empty answer leaves the list empty.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::cascade::{ApplyOutcome, Generations, ResolveCompletion, ResolveQuery, ResolveRequest, ResolveTarget, Resolved};
use crate::context::CampaignContext;
use crate::error::CascadeError;
use crate::resolver::{Aircraft, Base, Mode};
use crate::selection::{Field, FieldState};

pub struct FlightFormSlot {
    context: Arc<CampaignContext>,
    squadron: FieldState,
    departure: FieldState,
    aircraft: FieldState,
    generations: Generations,
}

impl FlightFormSlot {
    pub fn new(context: Arc<CampaignContext>) -> Self {
        let mut squadron = FieldState::default();
        squadron.populate(context.catalog().squadrons.clone(), None);
        let form = Self {
            context,
            squadron,
            departure: FieldState::default(),
            aircraft: FieldState::default(),
            generations: Generations::default(),
        };
        form.assert_consistent();
        form
    }

    pub fn squadron(&self) -> &FieldState {
        &self.squadron
    }

    pub fn departure(&self) -> &FieldState {
        &self.departure
    }

    pub fn aircraft(&self) -> &FieldState {
        &self.aircraft
    }

    pub fn set_squadron(&mut self, value: Option<&str>) -> Result<Vec<ResolveRequest>, CascadeError> {
        let value = value.map(str::trim).filter(|v| !v.is_empty());
        self.squadron.select(Field::Squadron, value)?;

        let bases_gen = self.generations.bump(ResolveTarget::DepartureBases);
        let aircraft_gen = self.generations.bump(ResolveTarget::Aircraft);
        self.departure.clear();
        self.aircraft.clear();

        let Some(squadron) = value else {
            self.assert_consistent();
            return Ok(Vec::new());
        };
        self.departure.populate(Vec::new(), None);
        self.aircraft.populate(Vec::new(), None);
        self.assert_consistent();
        debug!("Flight form: resolving bases and aircraft for {}", squadron);

        let campaign_id = self.context.campaign_id().to_string();
        Ok(vec![
            ResolveRequest {
                target: ResolveTarget::DepartureBases,
                generation: bases_gen,
                query: ResolveQuery::Bases {
                    squadron: squadron.to_string(),
                    persistent: self.context.persistent_ac_location(),
                    campaign_id: campaign_id.clone(),
                },
            },
            ResolveRequest {
                target: ResolveTarget::Aircraft,
                generation: aircraft_gen,
                query: ResolveQuery::Aircraft {
                    squadron: squadron.to_string(),
                    base: None,
                    campaign_id,
                    mode: Mode::Lead,
                },
            },
        ])
    }

    pub fn set_departure(&mut self, value: Option<&str>) -> Result<(), CascadeError> {
        self.departure.select(Field::DepartureBase, value)?;
        self.assert_consistent();
        Ok(())
    }

    pub fn set_aircraft(&mut self, value: Option<&str>) -> Result<(), CascadeError> {
        self.aircraft.select(Field::Aircraft, value)?;
        self.assert_consistent();
        Ok(())
    }

    pub fn apply(&mut self, completion: ResolveCompletion) -> ApplyOutcome {
        let ResolveCompletion { request, outcome } = completion;
        if !self.generations.is_current(request.target, request.generation) {
            return ApplyOutcome::Stale;
        }
        let outcome = match outcome {
            Ok(Resolved::Bases(bases)) => {
                self.departure.populate(bases.iter().map(Base::choice).collect(), None);
                ApplyOutcome::Applied
            }
            Ok(Resolved::Aircraft(aircraft)) => {
                self.aircraft
                    .populate(aircraft.iter().map(Aircraft::choice).collect(), None);
                ApplyOutcome::Applied
            }
            Err(e) => {
                warn!("Flight form lookup failed: {}", e);
                ApplyOutcome::Failed
            }
        };
        self.assert_consistent();
        outcome
    }

    /// Both dependent lists are open exactly while a squadron is chosen
    fn assert_consistent(&self) {
        for (field, state) in [
            (Field::Squadron, &self.squadron),
            (Field::DepartureBase, &self.departure),
            (Field::Aircraft, &self.aircraft),
        ] {
            if let Err(e) = state.check() {
                panic!("flight form invariant violated: {}: {}", field, e);
            }
        }
        let chosen = self.squadron.value().is_some();
        if self.departure.is_active() != chosen || self.aircraft.is_active() != chosen {
            panic!("flight form invariant violated: dependent lists out of step with the squadron");
        }
    }
}
