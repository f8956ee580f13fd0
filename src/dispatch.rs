//! Lookup Dispatch
//!
//! Runs resolver lookups on their own tasks so a slow endpoint never holds up
//! the form. Each answer comes back over a channel tagged with the form that
//! asked for it; the owner applies it whenever it gets around to reading.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

use crate::cascade::{ApplyOutcome, CascadeController, ResolveCompletion, ResolveRequest};
use crate::resolver::Resolver;
use crate::slots::{SlotId, SlotRegistry};

/// Form a lookup belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    Cascade,
    Slot(SlotId),
}

/// A finished lookup on its way back to its form
#[derive(Debug)]
pub struct Routed {
    pub origin: Origin,
    pub completion: ResolveCompletion,
}

#[derive(Clone)]
pub struct Dispatcher {
    resolver: Arc<dyn Resolver>,
    tx: mpsc::UnboundedSender<Routed>,
}

impl Dispatcher {
    pub fn new(resolver: Arc<dyn Resolver>) -> (Self, mpsc::UnboundedReceiver<Routed>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { resolver, tx }, rx)
    }

    /// Start every request in the background. Returns immediately.
    pub fn spawn(&self, origin: Origin, requests: impl IntoIterator<Item = ResolveRequest>) {
        for request in requests {
            let resolver = Arc::clone(&self.resolver);
            let tx = self.tx.clone();
            tokio::spawn(async move {
                let completion = request.execute(resolver.as_ref()).await;
                if tx.send(Routed { origin, completion }).is_err() {
                    debug!("Driver gone before {:?} answered", origin);
                }
            });
        }
    }

    /// Hand an answer to its form, then start whatever lookups applying it
    /// made necessary.
    pub fn deliver(
        &self,
        routed: Routed,
        controller: &mut CascadeController,
        slots: &mut SlotRegistry,
    ) -> ApplyOutcome {
        match routed.origin {
            Origin::Cascade => {
                let outcome = controller.apply(routed.completion);
                self.spawn(Origin::Cascade, controller.take_follow_ups());
                outcome
            }
            Origin::Slot(id) => slots.apply(id, routed.completion),
        }
    }
}
