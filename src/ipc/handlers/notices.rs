use serde_json::json;

use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{ctx, parse_params, required_i64};
use crate::ipc::types::{AppState, Request};
use crate::model::{Notice, Role};
use crate::repo::Repository;
use crate::state::Action;
use crate::store::keys;

fn handle_add(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let mut c = ctx(state)?;
    let session = c.require_role(Role::Principal)?;

    let mut record: Notice = parse_params(&req.params)?;
    if record.created_by.is_empty() {
        record.created_by = session.name.clone();
    }
    let repo = Repository::<Notice>::open(c.store, c.sync, keys::NOTICES);
    let saved = repo.upsert(record)?;
    c.container.dispatch(c.store, Action::AddNotice(saved.clone()));
    Ok(json!({ "notice": saved }))
}

fn handle_list(state: &mut AppState, _req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let c = ctx(state)?;
    c.require_session()?;
    let repo = Repository::<Notice>::open(c.store, c.sync, keys::NOTICES);
    let mut notices = repo.list();
    notices.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(json!({ "notices": notices }))
}

fn handle_delete(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let mut c = ctx(state)?;
    c.require_role(Role::Principal)?;

    let id = required_i64(&req.params, "id")?;
    let repo = Repository::<Notice>::open(c.store, c.sync, keys::NOTICES);
    repo.remove(id);
    Ok(json!({ "deleted": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "notices.add" => Some(respond(&req.id, handle_add(state, req))),
        "notices.list" => Some(respond(&req.id, handle_list(state, req))),
        "notices.delete" => Some(respond(&req.id, handle_delete(state, req))),
        _ => None,
    }
}
