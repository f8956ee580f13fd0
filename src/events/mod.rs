//! Signup Event Bus
//!
//! Upward signals from the backend (or whatever renders the flight list)
//! delivered to any number of listeners over a broadcast channel.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Pilot details shown in a flight row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PilotRecord {
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub aircraft_id: Option<String>,
    #[serde(default)]
    pub squawk: Option<String>,
    #[serde(default)]
    pub transponder: Option<String>,
}

lazy_static::lazy_static! {
    static ref DISCORD_TAG: Regex = Regex::new(r"#\d{4,}").unwrap();
}

impl PilotRecord {
    /// Nickname without its discord tag, first letter upper-cased.
    pub fn display_nickname(&self) -> String {
        let Some(nick) = self.nickname.as_deref() else {
            return String::new();
        };
        let clean = DISCORD_TAG.replace(nick, "");
        let clean = clean.trim();
        let mut chars = clean.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail", rename_all = "camelCase")]
pub enum SignupEvent {
    /// A pilot joined or edited a flight position
    #[serde(rename_all = "camelCase")]
    PilotInfoUpdated {
        flight_id: String,
        position: String,
        pilot: PilotRecord,
    },
    /// A curated slot was released by its pilot
    #[serde(rename_all = "camelCase")]
    CuratedSlotRestored { slot_id: String },
}

impl SignupEvent {
    /// Events with blank identifiers carry nothing a listener can act on.
    fn is_complete(&self) -> bool {
        match self {
            SignupEvent::PilotInfoUpdated {
                flight_id, position, ..
            } => !flight_id.is_empty() && !position.is_empty(),
            SignupEvent::CuratedSlotRestored { slot_id } => !slot_id.is_empty(),
        }
    }
}

impl fmt::Display for SignupEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignupEvent::PilotInfoUpdated {
                flight_id,
                position,
                pilot,
            } => write!(
                f,
                "flight {} #{}: {} {} squawk {} {}",
                flight_id,
                position,
                pilot.display_nickname(),
                pilot.aircraft_id.as_deref().unwrap_or(""),
                pilot.squawk.as_deref().unwrap_or(""),
                pilot.transponder.as_deref().unwrap_or("")
            ),
            SignupEvent::CuratedSlotRestored { slot_id } => {
                write!(f, "curated slot {} released; callsign cleared", slot_id)
            }
        }
    }
}

pub struct EventBus {
    tx: broadcast::Sender<SignupEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: SignupEvent) {
        if !event.is_complete() {
            warn!("Ignoring incomplete event: {:?}", event);
            return;
        }
        debug!("Publishing {}", event);
        let _ = self.tx.send(event);
    }

    /// Publish a raw JSON signal. Returns false if it was dropped.
    pub fn publish_json(&self, raw: &str) -> bool {
        match serde_json::from_str::<SignupEvent>(raw) {
            Ok(event) if event.is_complete() => {
                self.publish(event);
                true
            }
            Ok(event) => {
                warn!("Ignoring incomplete event: {:?}", event);
                false
            }
            Err(e) => {
                warn!("Ignoring malformed event: {}", e);
                false
            }
        }
    }

    /// Create a new subscriber
    pub fn subscribe(&self) -> broadcast::Receiver<SignupEvent> {
        self.tx.subscribe()
    }
}

/// Wait for the next event a subscriber can still see. A subscriber that fell
/// behind skips what it missed; `None` once every publisher is gone.
pub async fn next_event(rx: &mut broadcast::Receiver<SignupEvent>) -> Option<SignupEvent> {
    loop {
        match rx.recv().await {
            Ok(event) => return Some(event),
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                warn!("Event listener fell behind; {} event(s) skipped", missed);
            }
            Err(broadcast::error::RecvError::Closed) => return None,
        }
    }
}

lazy_static::lazy_static! {
    /// Process-wide bus the driver listens on
    pub static ref SIGNUP_EVENT_BUS: Arc<EventBus> = Arc::new(EventBus::new());
}

/// Publish on the process-wide bus
#[macro_export]
macro_rules! emit_event {
    ($event:expr) => {
        $crate::events::SIGNUP_EVENT_BUS.publish($event);
    };
}
