use serde_json::json;

use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{ctx, parse_params, required_i64};
use crate::ipc::types::{AppState, Request};
use crate::model::{MealPlan, Role};
use crate::repo::Repository;
use crate::store::keys;

/// One plan per school weekday (Sunday excluded); saving a second plan for
/// the same day is a uniqueness violation unless it replaces the original.
fn handle_save(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let mut c = ctx(state)?;
    c.require_role(Role::Principal)?;

    let record: MealPlan = parse_params(&req.params)?;
    let repo = Repository::<MealPlan>::open(c.store, c.sync, keys::MEAL_PLANS);
    let saved = repo.upsert(record)?;
    Ok(json!({ "mealPlan": saved }))
}

fn handle_delete(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let mut c = ctx(state)?;
    c.require_role(Role::Principal)?;

    let id = required_i64(&req.params, "id")?;
    Repository::<MealPlan>::open(c.store, c.sync, keys::MEAL_PLANS).remove(id);
    Ok(json!({ "deleted": true }))
}

fn handle_list(state: &mut AppState, _req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let c = ctx(state)?;
    c.require_session()?;
    let repo = Repository::<MealPlan>::open(c.store, c.sync, keys::MEAL_PLANS);
    Ok(json!({ "mealPlans": repo.list() }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "nutrition.save" => Some(respond(&req.id, handle_save(state, req))),
        "nutrition.delete" => Some(respond(&req.id, handle_delete(state, req))),
        "nutrition.list" => Some(respond(&req.id, handle_list(state, req))),
        _ => None,
    }
}
