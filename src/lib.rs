//! Mission Signup Cascade
//!
//! Dependent-selection engine behind a mission signup form:
//! - Squadron → departure base → recovery base → operations area → mission type → aircraft
//! - Async base/aircraft resolution with stale-response discard, run off the
//!   input path by a [`Dispatcher`]
//! - Campaign-type gating and single-base auto-lock
//! - Independent join, create-flight and curated-slot forms
//! - Broadcast bus for pilot and slot updates

pub mod cascade;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod resolver;
pub mod selection;
pub mod slots;

// Re-exports for convenience
pub use cascade::{CascadeController, CascadeSnapshot, CascadeState};
pub use config::SignupConfig;
pub use context::{CampaignContext, CampaignType, PageBootstrap};
pub use dispatch::{Dispatcher, Origin};
pub use error::{BootstrapError, CascadeError, ResolverError};
pub use resolver::{HttpResolver, Resolver};
pub use selection::Field;
pub use slots::SlotRegistry;
