use serde_json::json;

use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{ctx, optional_str, parse_params};
use crate::ipc::types::{AppState, Request};
use crate::model::{Homework, Role};
use crate::repo::Repository;
use crate::state::Action;
use crate::store::keys;

/// Homework lives in one collection per class, under `homework_<class>`.
fn handle_add(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let mut c = ctx(state)?;
    let session = c.require_role(Role::Teacher)?;
    let class = c.scoped_class(&session, optional_str(&req.params, "class"))?;

    let record: Homework = parse_params(&req.params)?;
    let repo = Repository::<Homework>::open(c.store, c.sync, keys::homework(&class));
    let saved = repo.upsert(record)?;
    c.container.dispatch(c.store, Action::AddHomework(saved.clone()));
    Ok(json!({ "homework": saved }))
}

fn handle_list(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let c = ctx(state)?;
    let session = c.require_session()?;
    let class = c.scoped_class(&session, optional_str(&req.params, "class"))?;

    let repo = Repository::<Homework>::open(c.store, c.sync, keys::homework(&class));
    let mut entries = repo.list();
    // Newest assignment first.
    entries.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(json!({ "class": class, "homework": entries }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "homework.add" => Some(respond(&req.id, handle_add(state, req))),
        "homework.list" => Some(respond(&req.id, handle_list(state, req))),
        _ => None,
    }
}
