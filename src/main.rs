//! Mission Signup Cascade
//!
//! Line-oriented driver for the signup form: loads the page bootstrap,
//! talks to the resolver endpoints over HTTP and prints the form after
//! every change.

use anyhow::{Context, Result};
use std::io::{self, Write};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use sortie_signup::cascade::{ApplyOutcome, CascadeController};
use sortie_signup::context::PageBootstrap;
use sortie_signup::dispatch::{Dispatcher, Origin};
use sortie_signup::events::{next_event, PilotRecord, SignupEvent, SIGNUP_EVENT_BUS};
use sortie_signup::emit_event;
use sortie_signup::selection::Choice;
use sortie_signup::slots::{CuratedSlotLayout, FlightFormSlot, JoinSlot, JoinTarget, SlotId, SlotRegistry};
use sortie_signup::{BootstrapError, Field, HttpResolver, Resolver, SignupConfig};

const HELP: &str = "Commands: set <field> <value> | clear <field> | show | join <flight> <position> <squadron> <base> | squadron <name> | pick <tail> | cancel | flight <squadron> | event <json> | quit";

// ──────────────────────────────────────────────────────────────────────────────
// MAIN ENTRY POINT
// ──────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();
    let config = SignupConfig::from_env();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let bootstrap = PageBootstrap::load(&config.bootstrap_file)
        .await
        .with_context(|| format!("loading bootstrap from {}", config.bootstrap_file.display()))?;
    let (context, anchors) = match bootstrap.into_context() {
        Ok(loaded) => loaded,
        Err(e @ BootstrapError::MissingAnchor(_)) => {
            eprintln!("\n{}\n", e);
            return Err(e.into());
        }
        Err(e) => return Err(anyhow::Error::new(e).context("building campaign context")),
    };

    println!("\n{}", "═".repeat(60));
    println!("✈️  Mission signup: campaign {} ({})", context.campaign_id(), context.campaign_type());
    println!("{}", "═".repeat(60));
    let layout = CuratedSlotLayout::for_campaign(context.campaign_type());
    println!(
        "Curated slots: area {} | mission type {}",
        if layout.area_visible { "shown" } else { "hidden" },
        if layout.mission_type_visible { "shown" } else { "hidden" }
    );
    println!("{}\n", HELP);

    let resolver: Arc<dyn Resolver> = Arc::new(HttpResolver::new(&config, context.clone()));
    let (dispatcher, mut answers) = Dispatcher::new(resolver);
    let mut controller = CascadeController::with_anchors(context.clone(), anchors);
    let mut slots = SlotRegistry::new(context.clone());
    let mut join_slot: Option<SlotId> = None;
    let mut flight_slot: Option<SlotId> = None;

    // Print upward signals as they arrive
    let mut events = SIGNUP_EVENT_BUS.subscribe();
    tokio::spawn(async move {
        while let Some(event) = next_event(&mut events).await {
            println!("📣 {}", event);
        }
    });

    println!("{}", controller.snapshot());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    // Main interaction loop: user input and resolver answers, whichever comes first
    loop {
        print!("📝 > ");
        io::stdout().flush()?;

        let input = tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => line,
                None => break,
            },
            Some(routed) = answers.recv() => {
                let origin = routed.origin;
                let outcome = dispatcher.deliver(routed, &mut controller, &mut slots);
                println!();
                if outcome == ApplyOutcome::Stale {
                    continue;
                }
                match origin {
                    Origin::Cascade => println!("{}", controller.snapshot()),
                    Origin::Slot(id) => {
                        if let Some(slot) = slots.join(id) {
                            print_join(slot);
                        } else if let Some(form) = slots.flight_form(id) {
                            print_flight_form(form);
                        }
                    }
                }
                continue;
            }
        };

        let line = input.trim();
        if line.is_empty() {
            continue;
        }
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();
        let command = command.to_lowercase();

        match command.as_str() {
            "quit" | "exit" | "q" => {
                println!("\n👋 Goodbye!\n");
                break;
            }
            "help" => println!("{}", HELP),
            "show" => println!("{}", controller.snapshot()),
            "set" | "clear" => {
                let (name, value) = rest.split_once(' ').unwrap_or((rest, ""));
                let field: Field = match name.parse() {
                    Ok(field) => field,
                    Err(e) => {
                        println!("❌ {}", e);
                        continue;
                    }
                };
                let value = if command == "clear" { None } else { Some(value.trim()) };
                match controller.on_field_changed(field, value) {
                    Ok(requests) => {
                        info!("Form is now {} ({} lookup(s) pending)", controller.state(), requests.len());
                        dispatcher.spawn(Origin::Cascade, requests);
                        println!("{}", controller.snapshot());
                    }
                    Err(e) => println!("❌ {}", e),
                }
            }
            "join" => {
                let parts: Vec<&str> = rest.split_whitespace().collect();
                let [flight_id, position, squadron, base] = parts.as_slice() else {
                    println!("❌ usage: join <flight> <position> <squadron> <base>");
                    continue;
                };
                let (id, request) = slots.open_join(JoinTarget {
                    flight_id: flight_id.to_string(),
                    position: position.to_string(),
                    squadron: squadron.to_string(),
                    target_base: base.to_string(),
                });
                join_slot = Some(id);
                if request.is_none() {
                    println!("❌ unknown squadron {}; use `squadron <name>`", squadron);
                }
                dispatcher.spawn(Origin::Slot(id), request);
            }
            "squadron" => {
                let Some(id) = join_slot else {
                    println!("❌ no join form open");
                    continue;
                };
                let Some(slot) = slots.join_mut(id) else {
                    continue;
                };
                match slot.set_squadron(Some(rest)) {
                    Ok(request) => dispatcher.spawn(Origin::Slot(id), request),
                    Err(e) => println!("❌ {}", e),
                }
            }
            "pick" => {
                let Some(slot) = join_slot.and_then(|id| slots.join_mut(id)) else {
                    println!("❌ no join form open");
                    continue;
                };
                match slot.select_aircraft(Some(rest)) {
                    Ok(cross_base) => {
                        if cross_base {
                            println!(
                                "⚠️  This aircraft is not at {}; it will have to be ferried.",
                                slot.target().target_base
                            );
                        } else {
                            println!("✅ {} selected", rest);
                        }
                        emit_event!(SignupEvent::PilotInfoUpdated {
                            flight_id: slot.target().flight_id.clone(),
                            position: slot.target().position.clone(),
                            pilot: PilotRecord {
                                aircraft_id: Some(rest.to_string()),
                                ..Default::default()
                            },
                        });
                    }
                    Err(e) => println!("❌ {}", e),
                }
            }
            "cancel" => {
                if let Some(id) = join_slot.take() {
                    slots.close(id);
                    println!("Join form closed.");
                }
            }
            "flight" => {
                if let Some(previous) = flight_slot.take() {
                    slots.close(previous);
                }
                let id = slots.open_flight_form();
                let requests = match slots.flight_form_mut(id).map(|form| form.set_squadron(Some(rest))) {
                    Some(Ok(requests)) => requests,
                    Some(Err(e)) => {
                        println!("❌ {}", e);
                        slots.close(id);
                        continue;
                    }
                    None => continue,
                };
                flight_slot = Some(id);
                dispatcher.spawn(Origin::Slot(id), requests);
            }
            "event" => {
                if !SIGNUP_EVENT_BUS.publish_json(rest) {
                    warn!("Event ignored");
                }
            }
            _ => println!("{}", HELP),
        }
    }

    Ok(())
}

fn print_join(slot: &JoinSlot) {
    println!(
        "Join {}#{} ({}):",
        slot.target().flight_id,
        slot.target().position,
        slot.squadron().value().map(|c| c.label.as_str()).unwrap_or("-")
    );
    for choice in slot.aircraft().options() {
        println!("   {}  {}", if choice.enabled { choice.value.as_str() } else { "-" }, choice.label);
    }
}

fn print_flight_form(form: &FlightFormSlot) {
    let labels = |options: &[Choice]| options.iter().map(|c| c.label.clone()).collect::<Vec<_>>().join(", ");
    println!("New flight:");
    println!("   bases:    [{}]", labels(form.departure().options()));
    println!("   aircraft: [{}]", labels(form.aircraft().options()));
}
