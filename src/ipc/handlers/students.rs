use serde_json::json;

use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{ctx, optional_str, parse_params, required_i64};
use crate::ipc::types::{AppState, Request};
use crate::model::{Role, Student};
use crate::repo::Repository;
use crate::state::Action;
use crate::store::keys;

fn handle_list(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let c = ctx(state)?;
    let session = c.require_session()?;

    // Teachers only ever see their own class.
    let class = match session.class_assigned {
        Some(active) => Some(active),
        None => optional_str(&req.params, "class"),
    };

    let repo = Repository::<Student>::open(c.store, c.sync, keys::STUDENTS);
    let students: Vec<Student> = match class {
        Some(class) => repo.list().into_iter().filter(|s| s.class == class).collect(),
        None => repo.list(),
    };
    Ok(json!({ "students": students }))
}

fn handle_save(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let mut c = ctx(state)?;
    c.require_role(Role::Principal)?;

    let record: Student = parse_params(&req.params)?;
    let is_new = record.id == 0;
    let repo = Repository::<Student>::open(c.store, c.sync, keys::STUDENTS);
    let saved = repo.upsert(record)?;
    if is_new {
        c.container.dispatch(c.store, Action::AddStudent(saved.clone()));
    } else {
        c.container.dispatch(c.store, Action::UpdateStudent(saved.clone()));
    }
    Ok(json!({ "student": saved }))
}

fn handle_delete(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let mut c = ctx(state)?;
    c.require_role(Role::Principal)?;

    let id = required_i64(&req.params, "id")?;
    let repo = Repository::<Student>::open(c.store, c.sync, keys::STUDENTS);
    repo.remove(id);
    c.container.dispatch(c.store, Action::SetStudents(repo.list()));
    Ok(json!({ "deleted": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(respond(&req.id, handle_list(state, req))),
        "students.save" => Some(respond(&req.id, handle_save(state, req))),
        "students.delete" => Some(respond(&req.id, handle_delete(state, req))),
        _ => None,
    }
}
