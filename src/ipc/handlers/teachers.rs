use serde_json::json;

use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{ctx, parse_params, required_i64};
use crate::ipc::types::{AppState, Request};
use crate::model::{Role, Teacher};
use crate::repo::Repository;
use crate::state::Action;
use crate::store::keys;

fn handle_list(state: &mut AppState, _req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let c = ctx(state)?;
    c.require_session()?;
    let repo = Repository::<Teacher>::open(c.store, c.sync, keys::TEACHERS);
    Ok(json!({ "teachers": repo.list() }))
}

fn handle_save(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let mut c = ctx(state)?;
    c.require_role(Role::Principal)?;

    let record: Teacher = parse_params(&req.params)?;
    let is_new = record.id == 0;
    let repo = Repository::<Teacher>::open(c.store, c.sync, keys::TEACHERS);
    let saved = repo.upsert(record)?;
    if is_new {
        c.container.dispatch(c.store, Action::AddTeacher(saved.clone()));
    } else {
        c.container.dispatch(c.store, Action::SetTeachers(repo.list()));
    }
    Ok(json!({ "teacher": saved }))
}

fn handle_delete(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let mut c = ctx(state)?;
    c.require_role(Role::Principal)?;

    let id = required_i64(&req.params, "id")?;
    let repo = Repository::<Teacher>::open(c.store, c.sync, keys::TEACHERS);
    repo.remove(id);
    c.container.dispatch(c.store, Action::SetTeachers(repo.list()));
    Ok(json!({ "deleted": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "teachers.list" => Some(respond(&req.id, handle_list(state, req))),
        "teachers.save" => Some(respond(&req.id, handle_save(state, req))),
        "teachers.delete" => Some(respond(&req.id, handle_delete(state, req))),
        _ => None,
    }
}
