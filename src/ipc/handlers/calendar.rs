use serde_json::json;

use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{ctx, parse_params, required_i64};
use crate::ipc::types::{AppState, Request};
use crate::model::{CalendarEvent, Holiday, Role};
use crate::repo::Repository;
use crate::state::Action;
use crate::store::keys;

fn handle_add_holiday(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let mut c = ctx(state)?;
    c.require_role(Role::Principal)?;

    let record: Holiday = parse_params(&req.params)?;
    let repo = Repository::<Holiday>::open(c.store, c.sync, keys::HOLIDAYS);
    let saved = repo.upsert(record)?;
    c.container.dispatch(c.store, Action::AddHoliday(saved.clone()));
    Ok(json!({ "holiday": saved }))
}

fn handle_add_event(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let mut c = ctx(state)?;
    c.require_role(Role::Principal)?;

    let record: CalendarEvent = parse_params(&req.params)?;
    let repo = Repository::<CalendarEvent>::open(c.store, c.sync, keys::EVENTS);
    let saved = repo.upsert(record)?;
    Ok(json!({ "event": saved }))
}

fn handle_remove_holiday(
    state: &mut AppState,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let mut c = ctx(state)?;
    c.require_role(Role::Principal)?;

    let id = required_i64(&req.params, "id")?;
    Repository::<Holiday>::open(c.store, c.sync, keys::HOLIDAYS).remove(id);
    Ok(json!({ "deleted": true }))
}

fn handle_remove_event(
    state: &mut AppState,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let mut c = ctx(state)?;
    c.require_role(Role::Principal)?;

    let id = required_i64(&req.params, "id")?;
    Repository::<CalendarEvent>::open(c.store, c.sync, keys::EVENTS).remove(id);
    Ok(json!({ "deleted": true }))
}

/// Holidays and events are independent collections; the same date may carry
/// both. Listed chronologically.
fn handle_list(state: &mut AppState, _req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let c = ctx(state)?;
    c.require_session()?;

    let mut holidays = Repository::<Holiday>::open(c.store, c.sync, keys::HOLIDAYS).list();
    holidays.sort_by(|a, b| a.date.cmp(&b.date));
    let mut events = Repository::<CalendarEvent>::open(c.store, c.sync, keys::EVENTS).list();
    events.sort_by(|a, b| a.date.cmp(&b.date));

    Ok(json!({ "holidays": holidays, "events": events }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "calendar.addHoliday" => Some(respond(&req.id, handle_add_holiday(state, req))),
        "calendar.addEvent" => Some(respond(&req.id, handle_add_event(state, req))),
        "calendar.removeHoliday" => Some(respond(&req.id, handle_remove_holiday(state, req))),
        "calendar.removeEvent" => Some(respond(&req.id, handle_remove_event(state, req))),
        "calendar.list" => Some(respond(&req.id, handle_list(state, req))),
        _ => None,
    }
}
