//! Cascade Controller
//!
//! State machine behind the signup form. A field change resets everything
//! downstream, re-activates what the new value unlocks, and emits the resolver
//! requests needed to fill the dependent option lists. Completions come back
//! through [`CascadeController::apply`], which drops anything a newer request
//! has superseded.

mod request;
mod state;

pub use request::{
    ApplyOutcome, Generation, ResolveCompletion, ResolveQuery, ResolveRequest, ResolveTarget, Resolved,
};
pub use state::{CascadeSnapshot, CascadeState, FieldView};

pub(crate) use request::Generations;

use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::context::{CampaignContext, FormAnchors};
use crate::error::CascadeError;
use crate::resolver::{Aircraft, Base, Mode, Resolver};
use crate::selection::{Choice, Field, SelectionChain};

pub const NO_BASES: &str = "No bases available for this squadron";
pub const NO_AIRCRAFT: &str = "No aircraft available for this squadron/base";

/// Owns the selection chain of one signup form
pub struct CascadeController {
    context: Arc<CampaignContext>,
    anchors: FormAnchors,
    chain: SelectionChain,
    generations: Generations,
    /// Aircraft resolved while the aircraft field was still hidden
    staged_aircraft: Option<Vec<Choice>>,
    /// Lookups a completion made necessary, drained by the driver
    follow_ups: Vec<ResolveRequest>,
}

impl CascadeController {
    pub fn new(context: Arc<CampaignContext>) -> Self {
        Self::with_anchors(context, FormAnchors::all())
    }

    pub fn with_anchors(context: Arc<CampaignContext>, anchors: FormAnchors) -> Self {
        let mut chain = SelectionChain::new(context.campaign_type().uses_operations_areas());
        if anchors.has(Field::Squadron) {
            chain.set_options(Field::Squadron, context.catalog().squadrons.clone(), None);
        } else {
            warn!("Squadron field is missing; signup cascade disabled");
        }
        Self {
            context,
            anchors,
            chain,
            generations: Generations::default(),
            staged_aircraft: None,
            follow_ups: Vec::new(),
        }
    }

    pub fn context(&self) -> &CampaignContext {
        &self.context
    }

    pub fn chain(&self) -> &SelectionChain {
        &self.chain
    }

    pub fn state(&self) -> CascadeState {
        CascadeState::of(&self.chain)
    }

    pub fn snapshot(&self) -> CascadeSnapshot {
        CascadeSnapshot::of(&self.chain)
    }

    /// Handle a user change of `field`. Returns the lookups the caller must run
    /// and feed back through [`apply`](Self::apply).
    pub fn on_field_changed(
        &mut self,
        field: Field,
        value: Option<&str>,
    ) -> Result<Vec<ResolveRequest>, CascadeError> {
        if !self.anchors.has(field) {
            debug!("Ignoring change to {}: field not present in the form", field);
            return Ok(Vec::new());
        }
        let value = value.map(str::trim).filter(|v| !v.is_empty());
        self.chain.select(field, value)?;
        debug!("{} changed to {:?}", field, value);

        let requests = match field {
            Field::Squadron => self.on_squadron_changed(value),
            Field::DepartureBase => self.on_departure_changed(value),
            Field::RecoveryBase => self.on_recovery_changed(value),
            Field::Area => self.on_area_changed(value),
            Field::MissionType => self.on_mission_type_changed(value),
            Field::Aircraft => Vec::new(),
        };
        Ok(requests)
    }

    /// Apply a resolver completion unless it has been superseded.
    pub fn apply(&mut self, completion: ResolveCompletion) -> ApplyOutcome {
        let ResolveCompletion { request, outcome } = completion;
        if !self.generations.is_current(request.target, request.generation) {
            debug!(
                "Discarding stale {:?} response (generation {:?})",
                request.target, request.generation
            );
            return ApplyOutcome::Stale;
        }

        match (request.target, outcome) {
            (_, Err(e)) => {
                warn!("Could not resolve {:?}: {}", request.target, e);
                ApplyOutcome::Failed
            }
            (ResolveTarget::DepartureBases, Ok(Resolved::Bases(bases))) => self.apply_bases(bases),
            (ResolveTarget::Aircraft, Ok(Resolved::Aircraft(aircraft))) => self.apply_aircraft(aircraft),
            (target, Ok(_)) => {
                warn!("Resolver answered {:?} with the wrong payload", target);
                ApplyOutcome::Failed
            }
        }
    }

    /// Lookups issued while applying completions. A late auto-lock of the
    /// departure base re-resolves aircraft that are already on screen.
    pub fn take_follow_ups(&mut self) -> Vec<ResolveRequest> {
        std::mem::take(&mut self.follow_ups)
    }

    /// Change a field and run its lookups to completion, applying results in
    /// whatever order they arrive.
    ///
    /// The controller stays borrowed until every lookup has answered. An
    /// interactive driver should spawn the requests from
    /// [`on_field_changed`](Self::on_field_changed) instead, the way
    /// [`Dispatcher`](crate::dispatch::Dispatcher) does.
    pub async fn handle<R: Resolver + ?Sized>(
        &mut self,
        resolver: &R,
        field: Field,
        value: Option<&str>,
    ) -> Result<CascadeState, CascadeError> {
        let requests = self.on_field_changed(field, value)?;
        let mut pending: FuturesUnordered<_> = requests
            .into_iter()
            .map(|request| request.execute(resolver))
            .collect();
        while let Some(completion) = pending.next().await {
            self.apply(completion);
        }
        Ok(self.state())
    }

    fn on_squadron_changed(&mut self, squadron: Option<&str>) -> Vec<ResolveRequest> {
        self.chain.reset(Field::DepartureBase);
        self.generations.bump(ResolveTarget::DepartureBases);
        self.invalidate_aircraft();

        let Some(squadron) = squadron else {
            info!("Squadron cleared; cascade idle");
            return Vec::new();
        };

        if self.anchors.has(Field::RecoveryBase) {
            self.chain
                .set_options(Field::RecoveryBase, self.context.bases().choices(), None);
        }

        let mut requests = Vec::new();
        if self.anchors.has(Field::DepartureBase) {
            requests.push(self.issue(
                ResolveTarget::DepartureBases,
                ResolveQuery::Bases {
                    squadron: squadron.to_string(),
                    persistent: self.context.persistent_ac_location(),
                    campaign_id: self.context.campaign_id().to_string(),
                },
            ));
        }
        if let Some(request) = self.aircraft_request(squadron, None) {
            requests.push(request);
        }
        requests
    }

    fn on_departure_changed(&mut self, base: Option<&str>) -> Vec<ResolveRequest> {
        self.chain.reset(Field::RecoveryBase);
        self.invalidate_aircraft();

        if base.is_some() && self.anchors.has(Field::RecoveryBase) {
            self.chain
                .set_options(Field::RecoveryBase, self.context.bases().choices(), None);
        }

        let squadron = self.chain.value(Field::Squadron).map(str::to_string);
        squadron
            .and_then(|squadron| self.aircraft_request(&squadron, base))
            .into_iter()
            .collect()
    }

    fn on_recovery_changed(&mut self, base: Option<&str>) -> Vec<ResolveRequest> {
        self.chain.reset(Field::Area);
        if base.is_none() {
            return Vec::new();
        }

        if self.chain.area_applies() {
            if self.anchors.has(Field::Area) {
                let areas = self.context.catalog().operations_areas.clone();
                self.chain.set_options(Field::Area, areas, None);
            }
        } else if self.anchors.has(Field::MissionType) {
            let mission_types = self.context.catalog().mission_types.clone();
            self.chain.set_options(Field::MissionType, mission_types, None);
        }
        Vec::new()
    }

    fn on_area_changed(&mut self, area: Option<&str>) -> Vec<ResolveRequest> {
        self.chain.reset(Field::MissionType);
        if area.is_some() && self.anchors.has(Field::MissionType) {
            let mission_types = self.context.catalog().mission_types.clone();
            self.chain.set_options(Field::MissionType, mission_types, None);
        }
        Vec::new()
    }

    fn on_mission_type_changed(&mut self, mission_type: Option<&str>) -> Vec<ResolveRequest> {
        self.chain.reset(Field::Aircraft);
        if mission_type.is_none() {
            self.chain.set_remarks_visible(false);
            return Vec::new();
        }

        if self.anchors.has_remarks() {
            self.chain.set_remarks_visible(true);
        }
        if !self.anchors.has(Field::Aircraft) {
            return Vec::new();
        }

        let staged = self.staged_aircraft.clone().unwrap_or_default();
        self.chain.set_options(Field::Aircraft, staged, None);

        let squadron = self.chain.value(Field::Squadron).map(str::to_string);
        let base = self.chain.value(Field::DepartureBase).map(str::to_string);
        squadron
            .and_then(|squadron| self.aircraft_request(&squadron, base.as_deref()))
            .into_iter()
            .collect()
    }

    fn apply_bases(&mut self, bases: Vec<Base>) -> ApplyOutcome {
        if self.chain.value(Field::Squadron).is_none() {
            return ApplyOutcome::Stale;
        }

        if bases.is_empty() {
            self.chain
                .set_options(Field::DepartureBase, vec![Choice::sentinel(NO_BASES)], None);
        } else if self.context.persistent_ac_location() && bases.len() == 1 {
            let only = bases[0].choice();
            info!("Squadron has a single base under persistent locations; locking to {}", only.value);
            let locked = only.value.clone();
            self.chain
                .set_options(Field::DepartureBase, vec![only.clone()], Some(only));
            if self.chain.is_active(Field::Aircraft) {
                self.reresolve_aircraft_at(&locked);
            }
        } else {
            let choices = bases.iter().map(Base::choice).collect();
            self.chain.set_options(Field::DepartureBase, choices, None);
        }
        ApplyOutcome::Applied
    }

    fn apply_aircraft(&mut self, aircraft: Vec<Aircraft>) -> ApplyOutcome {
        let choices = if aircraft.is_empty() {
            vec![Choice::sentinel(NO_AIRCRAFT)]
        } else {
            aircraft.iter().map(Aircraft::choice).collect()
        };

        if self.chain.is_active(Field::Aircraft) {
            self.staged_aircraft = Some(choices.clone());
            self.chain.set_options(Field::Aircraft, choices, None);
            ApplyOutcome::Applied
        } else {
            self.staged_aircraft = Some(choices);
            ApplyOutcome::Staged
        }
    }

    /// The departure base was locked after the aircraft list went up
    fn reresolve_aircraft_at(&mut self, base: &str) {
        let Some(squadron) = self.chain.value(Field::Squadron).map(str::to_string) else {
            return;
        };
        debug!("Departure locked to {} with aircraft showing; re-resolving", base);
        if let Some(request) = self.aircraft_request(&squadron, Some(base)) {
            self.follow_ups.push(request);
        }
    }

    fn aircraft_request(&mut self, squadron: &str, base: Option<&str>) -> Option<ResolveRequest> {
        if !self.anchors.has(Field::Aircraft) {
            return None;
        }
        Some(self.issue(
            ResolveTarget::Aircraft,
            ResolveQuery::Aircraft {
                squadron: squadron.to_string(),
                base: base.map(str::to_string),
                campaign_id: self.context.campaign_id().to_string(),
                mode: Mode::Lead,
            },
        ))
    }

    fn issue(&mut self, target: ResolveTarget, query: ResolveQuery) -> ResolveRequest {
        let generation = self.generations.bump(target);
        ResolveRequest {
            target,
            generation,
            query,
        }
    }

    /// The aircraft query inputs changed: drop staged results and in-flight
    /// answers.
    fn invalidate_aircraft(&mut self) {
        self.staged_aircraft = None;
        self.follow_ups.retain(|request| request.target != ResolveTarget::Aircraft);
        self.generations.bump(ResolveTarget::Aircraft);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{fixtures, CampaignType};
    use crate::error::ResolverError;

    fn completion(request: &ResolveRequest, resolved: Resolved) -> ResolveCompletion {
        ResolveCompletion {
            request: request.clone(),
            outcome: Ok(resolved),
        }
    }

    fn bases(ctx: &CampaignContext, ids: &[&str]) -> Resolved {
        Resolved::Bases(ids.iter().map(|id| ctx.bases().base(id)).collect())
    }

    fn find(requests: &[ResolveRequest], target: ResolveTarget) -> ResolveRequest {
        requests
            .iter()
            .find(|r| r.target == target)
            .cloned()
            .unwrap()
    }

    /// Squadron "101st" chosen and both of its lookups applied
    fn with_squadron(campaign_type: CampaignType, persistent: bool) -> CascadeController {
        let ctx = fixtures::context(campaign_type, persistent);
        let mut controller = CascadeController::new(ctx.clone());
        let requests = controller.on_field_changed(Field::Squadron, Some("101st")).unwrap();
        let base_req = find(&requests, ResolveTarget::DepartureBases);
        let ac_req = find(&requests, ResolveTarget::Aircraft);
        controller.apply(completion(&base_req, bases(&ctx, &["KXYZ", "KABC"])));
        controller.apply(completion(
            &ac_req,
            Resolved::Aircraft(vec![Aircraft::new("101", "F-16C", "KXYZ")]),
        ));
        controller
    }

    #[test]
    fn test_squadron_change_issues_both_lookups() {
        let ctx = fixtures::context(CampaignType::Op, false);
        let mut controller = CascadeController::new(ctx);
        let requests = controller.on_field_changed(Field::Squadron, Some("101st")).unwrap();

        assert_eq!(requests.len(), 2);
        assert_eq!(
            find(&requests, ResolveTarget::DepartureBases).query,
            ResolveQuery::Bases {
                squadron: "101st".into(),
                persistent: false,
                campaign_id: "camp-1".into()
            }
        );
        assert_eq!(
            find(&requests, ResolveTarget::Aircraft).query,
            ResolveQuery::Aircraft {
                squadron: "101st".into(),
                base: None,
                campaign_id: "camp-1".into(),
                mode: Mode::Lead
            }
        );
        // Recovery base is the full list and does not wait for the lookup
        assert!(controller.chain().is_active(Field::RecoveryBase));
        assert_eq!(controller.chain().field(Field::RecoveryBase).options().len(), 3);
        assert!(!controller.chain().is_active(Field::DepartureBase));
    }

    #[test]
    fn test_bases_populate_departure() {
        let controller = with_squadron(CampaignType::Op, false);
        let departure = controller.chain().field(Field::DepartureBase);
        assert!(departure.is_active());
        assert!(!departure.is_disabled());
        let labels: Vec<_> = departure.options().iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Xyz Field", "Abc Airbase"]);
        assert_eq!(controller.state(), CascadeState::SquadronChosen);
    }

    #[test]
    fn test_single_base_auto_lock_only_when_persistent() {
        for persistent in [true, false] {
            let ctx = fixtures::context(CampaignType::Op, persistent);
            let mut controller = CascadeController::new(ctx.clone());
            let requests = controller.on_field_changed(Field::Squadron, Some("7th")).unwrap();
            let req = find(&requests, ResolveTarget::DepartureBases);
            assert_eq!(controller.apply(completion(&req, bases(&ctx, &["KONE"]))), ApplyOutcome::Applied);

            let departure = controller.chain().field(Field::DepartureBase);
            assert_eq!(departure.is_disabled(), persistent);
            assert_eq!(controller.chain().value(Field::DepartureBase).is_some(), persistent);
        }
    }

    #[test]
    fn test_empty_bases_show_sentinel() {
        let ctx = fixtures::context(CampaignType::Op, true);
        let mut controller = CascadeController::new(ctx);
        let requests = controller.on_field_changed(Field::Squadron, Some("7th")).unwrap();
        let req = find(&requests, ResolveTarget::DepartureBases);
        controller.apply(completion(&req, Resolved::Bases(vec![])));

        let departure = controller.chain().field(Field::DepartureBase);
        assert!(departure.is_active());
        assert_eq!(departure.options(), &[Choice::sentinel(NO_BASES)]);
    }

    #[test]
    fn test_failed_lookup_leaves_field_untouched() {
        let ctx = fixtures::context(CampaignType::Op, false);
        let mut controller = CascadeController::new(ctx);
        let requests = controller.on_field_changed(Field::Squadron, Some("101st")).unwrap();
        let req = find(&requests, ResolveTarget::DepartureBases);
        let before = controller.chain().clone();

        let outcome = controller.apply(ResolveCompletion {
            request: req,
            outcome: Err(ResolverError::NetworkFailure("connection reset".into())),
        });
        assert_eq!(outcome, ApplyOutcome::Failed);
        assert_eq!(controller.chain(), &before);
    }

    #[test]
    fn test_stale_squadron_response_is_discarded() {
        let ctx = fixtures::context(CampaignType::Op, false);
        let mut controller = CascadeController::new(ctx.clone());
        let first = controller.on_field_changed(Field::Squadron, Some("101st")).unwrap();
        let second = controller.on_field_changed(Field::Squadron, Some("7th")).unwrap();

        let stale = find(&first, ResolveTarget::DepartureBases);
        assert_eq!(
            controller.apply(completion(&stale, bases(&ctx, &["KXYZ", "KABC"]))),
            ApplyOutcome::Stale
        );
        assert!(!controller.chain().is_active(Field::DepartureBase));

        let stale_ac = find(&first, ResolveTarget::Aircraft);
        assert_eq!(
            controller.apply(completion(&stale_ac, Resolved::Aircraft(vec![Aircraft::new("1", "F-16C", "KXYZ")]))),
            ApplyOutcome::Stale
        );

        let fresh = find(&second, ResolveTarget::DepartureBases);
        assert_eq!(controller.apply(completion(&fresh, bases(&ctx, &["KONE"]))), ApplyOutcome::Applied);
    }

    #[test]
    fn test_departure_change_reresolves_aircraft_for_base() {
        let mut controller = with_squadron(CampaignType::Op, false);
        let requests = controller.on_field_changed(Field::DepartureBase, Some("KABC")).unwrap();

        assert_eq!(requests.len(), 1);
        match &requests[0].query {
            ResolveQuery::Aircraft { base, mode, .. } => {
                assert_eq!(base.as_deref(), Some("KABC"));
                assert_eq!(*mode, Mode::Lead);
            }
            other => panic!("unexpected query {:?}", other),
        }
        assert!(controller.chain().is_active(Field::RecoveryBase));
        assert!(controller.chain().value(Field::RecoveryBase).is_none());
        assert_eq!(controller.state(), CascadeState::BaseChosen);
    }

    #[test]
    fn test_clearing_departure_hides_everything_after_it() {
        let mut controller = with_squadron(CampaignType::Op, false);
        controller.on_field_changed(Field::DepartureBase, Some("KXYZ")).unwrap();
        controller.on_field_changed(Field::RecoveryBase, Some("KABC")).unwrap();
        controller.on_field_changed(Field::MissionType, Some("CAP")).unwrap();
        assert!(controller.chain().remarks_visible());

        controller.on_field_changed(Field::DepartureBase, None).unwrap();
        for field in Field::DepartureBase.downstream() {
            assert!(!controller.chain().is_active(field), "{} still active", field);
            assert!(controller.chain().value(field).is_none());
        }
        assert!(!controller.chain().remarks_visible());
    }

    #[test]
    fn test_tr_campaign_goes_through_area() {
        let mut controller = with_squadron(CampaignType::Tr, false);
        controller.on_field_changed(Field::DepartureBase, Some("KXYZ")).unwrap();
        controller.on_field_changed(Field::RecoveryBase, Some("KABC")).unwrap();

        assert!(controller.chain().is_active(Field::Area));
        assert!(!controller.chain().is_active(Field::MissionType));

        controller.on_field_changed(Field::Area, Some("NORTH")).unwrap();
        assert!(controller.chain().is_active(Field::MissionType));

        controller.on_field_changed(Field::Area, None).unwrap();
        assert!(!controller.chain().is_active(Field::MissionType));
        assert!(!controller.chain().is_active(Field::Aircraft));
    }

    #[test]
    fn test_op_campaign_skips_area() {
        let mut controller = with_squadron(CampaignType::Op, false);
        controller.on_field_changed(Field::DepartureBase, Some("KXYZ")).unwrap();
        controller.on_field_changed(Field::RecoveryBase, Some("KABC")).unwrap();

        assert!(!controller.chain().is_active(Field::Area));
        assert!(controller.chain().is_active(Field::MissionType));
        assert_eq!(
            controller.on_field_changed(Field::Area, Some("NORTH")).unwrap_err(),
            CascadeError::FieldInactive(Field::Area)
        );
    }

    #[test]
    fn test_mission_type_shows_staged_aircraft_then_refreshes() {
        let ctx = fixtures::context(CampaignType::Op, false);
        let mut controller = CascadeController::new(ctx.clone());
        let requests = controller.on_field_changed(Field::Squadron, Some("101st")).unwrap();
        controller.apply(completion(
            &find(&requests, ResolveTarget::DepartureBases),
            bases(&ctx, &["KXYZ", "KABC"]),
        ));
        controller.on_field_changed(Field::RecoveryBase, Some("KXYZ")).unwrap();

        let early = find(&requests, ResolveTarget::Aircraft);
        let staged = Resolved::Aircraft(vec![Aircraft::new("101", "F-16C", "KXYZ")]);
        assert_eq!(controller.apply(completion(&early, staged)), ApplyOutcome::Staged);
        assert!(!controller.chain().is_active(Field::Aircraft));

        let requests = controller.on_field_changed(Field::MissionType, Some("CAP")).unwrap();
        assert!(controller.chain().remarks_visible());
        assert_eq!(controller.state(), CascadeState::FullyConfigured);
        assert_eq!(controller.chain().field(Field::Aircraft).options().len(), 1);

        let refresh = find(&requests, ResolveTarget::Aircraft);
        assert_eq!(controller.apply(completion(&refresh, Resolved::Aircraft(vec![]))), ApplyOutcome::Applied);
        assert_eq!(
            controller.chain().field(Field::Aircraft).options(),
            &[Choice::sentinel(NO_AIRCRAFT)]
        );
        assert_eq!(controller.state(), CascadeState::AreaOrMissionChosen);
    }

    #[test]
    fn test_aircraft_answer_before_bases_answer() {
        let ctx = fixtures::context(CampaignType::Op, false);
        let mut controller = CascadeController::new(ctx.clone());
        let requests = controller.on_field_changed(Field::Squadron, Some("101st")).unwrap();
        let base_req = find(&requests, ResolveTarget::DepartureBases);
        let ac_req = find(&requests, ResolveTarget::Aircraft);

        let aircraft = Resolved::Aircraft(vec![
            Aircraft::new("101", "F-16C", "KXYZ"),
            Aircraft::new("102", "F-16C", "KABC"),
        ]);
        assert_eq!(controller.apply(completion(&ac_req, aircraft)), ApplyOutcome::Staged);
        assert!(!controller.chain().is_active(Field::DepartureBase));
        assert!(!controller.chain().is_active(Field::Aircraft));

        assert_eq!(
            controller.apply(completion(&base_req, bases(&ctx, &["KXYZ", "KABC"]))),
            ApplyOutcome::Applied
        );
        let departure = controller.chain().field(Field::DepartureBase);
        assert!(departure.is_active());
        assert!(departure.value().is_none());
        let labels: Vec<_> = departure.options().iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Xyz Field", "Abc Airbase"]);

        controller.on_field_changed(Field::RecoveryBase, Some("KABC")).unwrap();
        let requests = controller.on_field_changed(Field::MissionType, Some("CAP")).unwrap();
        let tails: Vec<_> = controller
            .chain()
            .field(Field::Aircraft)
            .options()
            .iter()
            .map(|c| c.value.as_str())
            .collect();
        assert_eq!(tails, vec!["101", "102"]);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].target, ResolveTarget::Aircraft);
    }

    #[test]
    fn test_late_auto_lock_reresolves_showing_aircraft() {
        let ctx = fixtures::context(CampaignType::Op, true);
        let mut controller = CascadeController::new(ctx.clone());
        let requests = controller.on_field_changed(Field::Squadron, Some("7th")).unwrap();
        let base_req = find(&requests, ResolveTarget::DepartureBases);

        controller.on_field_changed(Field::RecoveryBase, Some("KONE")).unwrap();
        let requests = controller.on_field_changed(Field::MissionType, Some("CAP")).unwrap();
        let unfiltered = find(&requests, ResolveTarget::Aircraft);
        assert!(controller.take_follow_ups().is_empty());

        assert_eq!(controller.apply(completion(&base_req, bases(&ctx, &["KONE"]))), ApplyOutcome::Applied);
        assert_eq!(controller.chain().value(Field::DepartureBase), Some("KONE"));

        let follow_ups = controller.take_follow_ups();
        assert_eq!(follow_ups.len(), 1);
        assert_eq!(
            follow_ups[0].query,
            ResolveQuery::Aircraft {
                squadron: "7th".into(),
                base: Some("KONE".into()),
                campaign_id: "camp-1".into(),
                mode: Mode::Lead
            }
        );
        assert!(controller.take_follow_ups().is_empty());

        // The base-less list asked for before the lock no longer applies
        let everywhere = Resolved::Aircraft(vec![Aircraft::new("701", "A-10C", "KXYZ")]);
        assert_eq!(controller.apply(completion(&unfiltered, everywhere)), ApplyOutcome::Stale);
        let at_kone = Resolved::Aircraft(vec![Aircraft::new("702", "A-10C", "KONE")]);
        assert_eq!(controller.apply(completion(&follow_ups[0], at_kone)), ApplyOutcome::Applied);
        assert_eq!(controller.chain().field(Field::Aircraft).options()[0].value, "702");
    }

    #[test]
    fn test_early_auto_lock_needs_no_follow_up() {
        let ctx = fixtures::context(CampaignType::Op, true);
        let mut controller = CascadeController::new(ctx.clone());
        let requests = controller.on_field_changed(Field::Squadron, Some("7th")).unwrap();
        let base_req = find(&requests, ResolveTarget::DepartureBases);
        controller.apply(completion(&base_req, bases(&ctx, &["KONE"])));
        assert!(controller.take_follow_ups().is_empty());
    }

    #[test]
    fn test_missing_secondary_anchor_is_a_no_op() {
        let ctx = fixtures::context(CampaignType::Op, false);
        let anchors = FormAnchors::all().without(Field::Aircraft);
        let mut controller = CascadeController::with_anchors(ctx, anchors);

        let requests = controller.on_field_changed(Field::Squadron, Some("101st")).unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].target, ResolveTarget::DepartureBases);
        assert!(controller.on_field_changed(Field::Aircraft, Some("101")).unwrap().is_empty());
    }

    #[test]
    fn test_clearing_squadron_returns_to_idle() {
        let mut controller = with_squadron(CampaignType::Op, false);
        controller.on_field_changed(Field::Squadron, None).unwrap();
        assert_eq!(controller.state(), CascadeState::Idle);
        for field in Field::Squadron.downstream() {
            assert!(!controller.chain().is_active(field));
        }
    }
}
