use axum::extract::Form;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;

use sortie_signup::context::PageBootstrap;
use sortie_signup::resolver::{HttpResolver, Mode, Resolver};
use sortie_signup::{ResolverError, SignupConfig};

async fn bases(Form(form): Form<HashMap<String, String>>) -> Json<Value> {
    match (form.get("squadron").map(String::as_str), form.get("persistent").map(String::as_str)) {
        (Some("7th"), Some("1")) => Json(json!({ "bases": ["KONE"] })),
        (Some("101st"), _) => Json(json!({ "bases": ["KXYZ", "KABC"] })),
        _ => Json(json!({ "bases": [] })),
    }
}

/// Echoes the form back through the aircraft type so tests can see what was sent
async fn aircraft(Form(form): Form<HashMap<String, String>>) -> Result<Json<Value>, StatusCode> {
    let squadron = form.get("squadron").cloned().unwrap_or_default();
    match squadron.as_str() {
        "broken" => return Ok(Json(json!({ "planes": [] }))),
        "down" => return Err(StatusCode::INTERNAL_SERVER_ERROR),
        "twins" => {
            return Ok(Json(json!({ "aircraft": [
                { "tail": "1", "type": "F-16C", "location": "KXYZ" },
                { "tail": "1", "type": "F-16C", "location": "KABC" }
            ]})))
        }
        _ => {}
    }
    let sent = format!(
        "mode={} base={}",
        form.get("mode").map(String::as_str).unwrap_or("-"),
        form.get("base").map(String::as_str).unwrap_or("-"),
    );
    Ok(Json(json!({ "aircraft": [
        { "tail": "101", "type": sent, "location": "KXYZ" }
    ]})))
}

async fn spawn_server() -> String {
    let app = Router::new()
        .route("/bases-for-squadron", post(bases))
        .route("/aircraft-for-squadron", post(aircraft));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn resolver() -> HttpResolver {
    let url = spawn_server().await;
    let (context, _) = PageBootstrap::from_json(
        &json!({
            "signup_root": { "campaign_id": "42", "campaign_type": "OP" },
            "bases": { "KXYZ": { "name": "Xyz Field" }, "KABC": { "name": "Abc Airbase" } },
            "squadrons": ["101st", "7th"]
        })
        .to_string(),
    )
    .unwrap()
    .into_context()
    .unwrap();
    let config = SignupConfig {
        resolver_url: url,
        ..SignupConfig::default()
    };
    HttpResolver::new(&config, context)
}

#[tokio::test]
async fn test_bases_are_named_from_directory() {
    let resolver = resolver().await;
    let bases = resolver.resolve_bases("101st", false, "42").await.unwrap();
    let names: Vec<_> = bases.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["Xyz Field", "Abc Airbase"]);

    let bases = resolver.resolve_bases("7th", true, "42").await.unwrap();
    assert_eq!(bases.len(), 1);
    assert_eq!(bases[0].id, "KONE");
    assert_eq!(bases[0].name, "KONE");

    assert!(resolver.resolve_bases("7th", false, "42").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_lead_sends_base_and_wingman_does_not() {
    let resolver = resolver().await;

    let lead = resolver
        .resolve_aircraft("101st", Some("KXYZ"), "42", Mode::Lead)
        .await
        .unwrap();
    assert_eq!(lead[0].aircraft_type, "mode=lead base=KXYZ");

    let lead_any = resolver.resolve_aircraft("101st", None, "42", Mode::Lead).await.unwrap();
    assert_eq!(lead_any[0].aircraft_type, "mode=lead base=");

    let wingman = resolver
        .resolve_aircraft("101st", Some("KXYZ"), "42", Mode::Wingman)
        .await
        .unwrap();
    assert_eq!(wingman[0].aircraft_type, "mode=wingman base=-");
}

#[tokio::test]
async fn test_bad_payloads_are_malformed() {
    let resolver = resolver().await;

    let err = resolver.resolve_aircraft("broken", None, "42", Mode::Lead).await.unwrap_err();
    assert!(matches!(err, ResolverError::MalformedResponse(_)), "{:?}", err);

    let err = resolver.resolve_aircraft("twins", None, "42", Mode::Wingman).await.unwrap_err();
    assert!(matches!(err, ResolverError::MalformedResponse(_)), "{:?}", err);
}

#[tokio::test]
async fn test_server_error_is_network_failure() {
    let resolver = resolver().await;
    let err = resolver.resolve_aircraft("down", None, "42", Mode::Lead).await.unwrap_err();
    assert!(matches!(err, ResolverError::NetworkFailure(_)), "{:?}", err);
}
