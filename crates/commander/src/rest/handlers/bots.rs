//! REST-Handler fuer die Steuerflaeche einzelner Bots
//!
//! Befehle werden nur zugestellt, nicht abgewartet: Antwort ist 202.
//! Die Buchfuehrung des Controllers bleibt davon unberuehrt.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use loopbot_bot::{BotCommand, BotControl, BotStatus};
use loopbot_core::BotId;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{CommanderError, CommanderResult};
use crate::rest::CommanderState;

/// Standard-Verzoegerung fuer `delay_on` ohne Body
const STANDARD_SEKUNDEN: f64 = 3.0;

fn zustellen(state: &CommanderState, id: &str, befehl: BotCommand) -> CommanderResult<Response> {
    let bot = state.bot(id)?;
    let name = befehl.name();
    bot.befehl(befehl)?;
    tracing::debug!(bot = %id, befehl = name, "Befehl per REST zugestellt");
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "bot": id, "befehl": name })),
    )
        .into_response())
}

pub async fn list_bots(State(state): State<CommanderState>) -> Json<Value> {
    let controller = state.controller.lock();
    let bots: Vec<Value> = controller
        .pool()
        .handles()
        .map(|h| {
            let id = h.id();
            json!({
                "id": id,
                "loop": controller.pool().zugewiesen(id),
                "status": state.status.get(id).map(|s| s.value().clone()),
            })
        })
        .collect();
    Json(json!({ "bots": bots }))
}

#[derive(Debug, Deserialize)]
pub struct JoinBody {
    #[serde(rename = "loop")]
    pub loop_name: String,
}

pub async fn join(
    State(state): State<CommanderState>,
    Path(id): Path<String>,
    Json(body): Json<JoinBody>,
) -> CommanderResult<Response> {
    zustellen(
        &state,
        &id,
        BotCommand::Join {
            loop_name: body.loop_name,
        },
    )
}

pub async fn leave(
    State(state): State<CommanderState>,
    Path(id): Path<String>,
) -> CommanderResult<Response> {
    zustellen(&state, &id, BotCommand::Leave)
}

pub async fn talk(
    State(state): State<CommanderState>,
    Path(id): Path<String>,
) -> CommanderResult<Response> {
    zustellen(&state, &id, BotCommand::Talk)
}

pub async fn mute(
    State(state): State<CommanderState>,
    Path(id): Path<String>,
) -> CommanderResult<Response> {
    zustellen(&state, &id, BotCommand::Mute)
}

#[derive(Debug, Deserialize)]
pub struct DeviceBody {
    pub device: u32,
}

pub async fn device_in(
    State(state): State<CommanderState>,
    Path(id): Path<String>,
    Json(body): Json<DeviceBody>,
) -> CommanderResult<Response> {
    zustellen(&state, &id, BotCommand::SetInput { device: body.device })
}

pub async fn device_out(
    State(state): State<CommanderState>,
    Path(id): Path<String>,
    Json(body): Json<DeviceBody>,
) -> CommanderResult<Response> {
    zustellen(&state, &id, BotCommand::SetOutput { device: body.device })
}

#[derive(Debug, Deserialize)]
pub struct VolumeBody {
    pub volume: f32,
}

pub async fn set_volume(
    State(state): State<CommanderState>,
    Path(id): Path<String>,
    Json(body): Json<VolumeBody>,
) -> CommanderResult<Response> {
    zustellen(&state, &id, BotCommand::SetVolume { volume: body.volume })
}

#[derive(Debug, Deserialize)]
pub struct DelayBody {
    pub seconds: Option<f64>,
}

pub async fn delay_on(
    State(state): State<CommanderState>,
    Path(id): Path<String>,
    body: Option<Json<DelayBody>>,
) -> CommanderResult<Response> {
    let seconds = body
        .and_then(|Json(b)| b.seconds)
        .unwrap_or(STANDARD_SEKUNDEN);
    zustellen(&state, &id, BotCommand::EnableDelay { seconds })
}

pub async fn delay_off(
    State(state): State<CommanderState>,
    Path(id): Path<String>,
) -> CommanderResult<Response> {
    zustellen(&state, &id, BotCommand::DisableDelay)
}

pub async fn leave_after_delay(
    State(state): State<CommanderState>,
    Path(id): Path<String>,
) -> CommanderResult<Response> {
    zustellen(&state, &id, BotCommand::LeaveAfterDelay)
}

pub async fn mute_after_delay(
    State(state): State<CommanderState>,
    Path(id): Path<String>,
) -> CommanderResult<Response> {
    zustellen(&state, &id, BotCommand::MuteAfterDelay)
}

pub async fn stop(
    State(state): State<CommanderState>,
    Path(id): Path<String>,
) -> CommanderResult<Response> {
    zustellen(&state, &id, BotCommand::Stop)
}

pub async fn status(
    State(state): State<CommanderState>,
    Path(id): Path<String>,
) -> CommanderResult<Json<BotStatus>> {
    let bot = state.bot(&id)?;
    let status = bot
        .status()
        .await
        .ok_or_else(|| CommanderError::NichtErreichbar(id.clone()))?;
    state.status.insert(BotId::from(id.as_str()), status.clone());
    Ok(Json(status))
}

pub async fn users(
    State(state): State<CommanderState>,
    Path(id): Path<String>,
) -> CommanderResult<Json<Value>> {
    let bot = state.bot(&id)?;
    let users = bot
        .users()
        .await
        .ok_or(CommanderError::NichtErreichbar(id))?;
    Ok(Json(json!({ "users": users })))
}

#[cfg(test)]
mod tests {
    use crate::rest::server::router;
    use crate::rest::testumgebung;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use loopbot_core::BotId;
    use serde_json::Value;
    use tower::ServiceExt;

    async fn post(app: axum::Router, uri: &str, body: Option<&str>) -> StatusCode {
        let mut req = Request::builder().method("POST").uri(uri);
        if body.is_some() {
            req = req.header("content-type", "application/json");
        }
        let req = req
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap();
        app.oneshot(req).await.unwrap().status()
    }

    async fn get(app: axum::Router, uri: &str) -> (StatusCode, Value) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn join_und_talk_ueber_rest() {
        let (state, server) = testumgebung::state(&["BOT1"]);
        let app = router(state.clone());

        let s = post(app.clone(), "/v1/bots/BOT1/join", Some(r#"{"loop":"X"}"#)).await;
        assert_eq!(s, StatusCode::ACCEPTED);
        assert_eq!(post(app.clone(), "/v1/bots/BOT1/talk", None).await, StatusCode::ACCEPTED);

        // Status laeuft durch dieselbe Queue und sieht beide Befehle
        let (s, json) = get(app, "/v1/bots/BOT1/status").await;
        assert_eq!(s, StatusCode::OK);
        assert_eq!(json["current_loop"], "X");
        assert_eq!(json["streaming"], true);
        assert_eq!(json["status_text"], "Sprechen → X");
        assert_eq!(server.kanal_von("BOT1").as_deref(), Some("X"));
        assert!(state.status.get(&BotId::from("BOT1")).is_some());
    }

    #[tokio::test]
    async fn unbekannter_bot_ist_404() {
        let (state, _server) = testumgebung::state(&["BOT1"]);
        assert_eq!(
            post(router(state), "/v1/bots/BOT9/talk", None).await,
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn leerer_join_ist_400() {
        let (state, _server) = testumgebung::state(&["BOT1"]);
        let s = post(router(state), "/v1/bots/BOT1/join", Some(r#"{"loop":" "}"#)).await;
        assert_eq!(s, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn delay_on_ohne_body() {
        let (state, _server) = testumgebung::state(&["BOT1"]);
        let app = router(state);
        assert_eq!(post(app.clone(), "/v1/bots/BOT1/delay_on", None).await, StatusCode::ACCEPTED);
        assert_eq!(
            post(app.clone(), "/v1/bots/BOT1/delay_on", Some(r#"{"seconds":-2}"#)).await,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(post(app, "/v1/bots/BOT1/delay_off", None).await, StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn geraete_und_stop() {
        let (state, _server) = testumgebung::state(&["BOT1"]);
        let app = router(state);
        post(app.clone(), "/v1/bots/BOT1/device_in", Some(r#"{"device":4}"#)).await;
        let (_, json) = get(app.clone(), "/v1/bots/BOT1/status").await;
        assert_eq!(json["input_device"], 4);
        assert_eq!(json["status_text"], "Eingang → 4");

        post(app.clone(), "/v1/bots/BOT1/stop", None).await;
        let (_, json) = get(app, "/v1/bots/BOT1/status").await;
        assert_eq!(json["status_text"], "Gestoppt");
        assert_eq!(json["streaming"], false);
    }

    #[tokio::test]
    async fn benutzerliste_und_botliste() {
        let (state, server) = testumgebung::state(&["BOT1", "BOT2"]);
        let (_mensch, _rx) = server.verbinden("Leitstelle").unwrap();
        let app = router(state);

        let (s, json) = get(app.clone(), "/v1/bots/BOT2/users").await;
        assert_eq!(s, StatusCode::OK);
        let users = json["users"].as_array().unwrap();
        assert_eq!(users.len(), 3);
        assert!(users.iter().any(|u| u == "Leitstelle"));

        let (_, json) = get(app, "/v1/bots").await;
        assert_eq!(json["bots"][0]["id"], "BOT1");
        assert_eq!(json["bots"][1]["loop"], Value::Null);
    }
}
