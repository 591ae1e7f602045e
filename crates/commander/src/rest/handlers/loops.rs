//! REST-Handler fuer Controller-Endpunkte

use axum::{
    extract::{Path, State},
    response::Json,
};
use loopbot_controller::ControllerSnapshot;
use loopbot_core::LoopState;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{CommanderError, CommanderResult};
use crate::rest::CommanderState;

fn zustand_antwort(state: &CommanderState, name: &str, zustand: LoopState) -> Json<Value> {
    let bot = state.controller.lock().bot_von(name);
    Json(json!({ "name": name, "state": zustand, "bot": bot }))
}

pub async fn list_loops(State(state): State<CommanderState>) -> Json<ControllerSnapshot> {
    Json(state.controller.lock().snapshot())
}

pub async fn click_loop(
    State(state): State<CommanderState>,
    Path(name): Path<String>,
) -> CommanderResult<Json<Value>> {
    let zustand = state.controller.lock().click(&name)?;
    Ok(zustand_antwort(&state, &name, zustand))
}

pub async fn off_loop(
    State(state): State<CommanderState>,
    Path(name): Path<String>,
) -> CommanderResult<Json<Value>> {
    let zustand = state.controller.lock().off(&name)?;
    Ok(zustand_antwort(&state, &name, zustand))
}

#[derive(Debug, Deserialize)]
pub struct StateBody {
    pub state: LoopState,
}

pub async fn put_state(
    State(state): State<CommanderState>,
    Path(name): Path<String>,
    Json(body): Json<StateBody>,
) -> CommanderResult<Json<Value>> {
    let zustand = state.controller.lock().set_loop_state(&name, body.state)?;
    Ok(zustand_antwort(&state, &name, zustand))
}

#[derive(Debug, Deserialize)]
pub struct VolumeBody {
    pub volume: f32,
}

pub async fn put_volume(
    State(state): State<CommanderState>,
    Path(name): Path<String>,
    Json(body): Json<VolumeBody>,
) -> CommanderResult<Json<Value>> {
    let zugestellt = state.controller.lock().set_loop_volume(&name, body.volume)?;
    Ok(Json(json!({ "name": name, "assigned": zugestellt })))
}

#[derive(Debug, Deserialize)]
pub struct DelayBody {
    pub enabled: bool,
    pub seconds: Option<f64>,
}

pub async fn post_delay(
    State(state): State<CommanderState>,
    Json(body): Json<DelayBody>,
) -> CommanderResult<Json<Value>> {
    let mut controller = state.controller.lock();
    controller.set_delay(body.enabled, body.seconds)?;
    let snap = controller.snapshot();
    Ok(Json(json!({
        "enabled": snap.delay_enabled,
        "seconds": snap.delay_seconds,
    })))
}

#[derive(Debug, Deserialize)]
pub struct DevicesBody {
    pub input: Option<u32>,
    pub output: Option<u32>,
}

pub async fn post_devices(
    State(state): State<CommanderState>,
    Json(body): Json<DevicesBody>,
) -> CommanderResult<Json<Value>> {
    if body.input.is_none() && body.output.is_none() {
        return Err(CommanderError::UngueltigeEingabe(
            "input oder output erforderlich".into(),
        ));
    }
    let controller = state.controller.lock();
    if let Some(i) = body.input {
        controller.set_input_device(i);
    }
    if let Some(o) = body.output {
        controller.set_output_device(o);
    }
    Ok(Json(json!({ "input": body.input, "output": body.output })))
}
