//! Resolver requests emitted by a transition, and their completions.

use tracing::debug;

use crate::resolver::{Aircraft, Base, Mode, Resolver, ResolverError};

/// Token stamped on a request. A completion is applied only while its token
/// is still the current one for its target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

/// Which option list a request will populate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolveTarget {
    DepartureBases,
    Aircraft,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveQuery {
    Bases {
        squadron: String,
        persistent: bool,
        campaign_id: String,
    },
    Aircraft {
        squadron: String,
        base: Option<String>,
        campaign_id: String,
        mode: Mode,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveRequest {
    pub target: ResolveTarget,
    pub generation: Generation,
    pub query: ResolveQuery,
}

impl ResolveRequest {
    /// Run the lookup. The request travels with its result so the owner can
    /// judge staleness on arrival.
    pub async fn execute<R: Resolver + ?Sized>(self, resolver: &R) -> ResolveCompletion {
        debug!("Resolving {:?} (generation {:?})", self.target, self.generation);
        let outcome = match &self.query {
            ResolveQuery::Bases {
                squadron,
                persistent,
                campaign_id,
            } => resolver
                .resolve_bases(squadron, *persistent, campaign_id)
                .await
                .map(Resolved::Bases),
            ResolveQuery::Aircraft {
                squadron,
                base,
                campaign_id,
                mode,
            } => resolver
                .resolve_aircraft(squadron, base.as_deref(), campaign_id, *mode)
                .await
                .map(Resolved::Aircraft),
        };
        ResolveCompletion {
            request: self,
            outcome,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Bases(Vec<Base>),
    Aircraft(Vec<Aircraft>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveCompletion {
    pub request: ResolveRequest,
    pub outcome: Result<Resolved, ResolverError>,
}

/// What became of a completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Options landed in an active field
    Applied,
    /// Options were kept for a field that is not active yet
    Staged,
    /// Superseded by a newer request; dropped
    Stale,
    /// Lookup failed; field left as it was
    Failed,
}

/// Per-target generation counters
#[derive(Debug, Clone, Default)]
pub(crate) struct Generations {
    bases: Generation,
    aircraft: Generation,
}

impl Generations {
    fn slot(&mut self, target: ResolveTarget) -> &mut Generation {
        match target {
            ResolveTarget::DepartureBases => &mut self.bases,
            ResolveTarget::Aircraft => &mut self.aircraft,
        }
    }

    /// Advance the counter, making every outstanding request for `target` stale
    pub(crate) fn bump(&mut self, target: ResolveTarget) -> Generation {
        let slot = self.slot(target);
        *slot = slot.next();
        *slot
    }

    pub(crate) fn is_current(&self, target: ResolveTarget, generation: Generation) -> bool {
        let current = match target {
            ResolveTarget::DepartureBases => self.bases,
            ResolveTarget::Aircraft => self.aircraft,
        };
        current == generation
    }
}
