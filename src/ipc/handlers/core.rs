use std::path::PathBuf;

use serde_json::json;

use crate::backup;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::required_str;
use crate::ipc::types::{AppState, Request};
use crate::model::Session;
use crate::state::{Action, StateContainer};
use crate::store::{keys, Store};

fn handle_health(state: &AppState, _req: &Request) -> Result<serde_json::Value, HandlerErr> {
    Ok(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string())
    }))
}

fn open_workspace(state: &mut AppState, path: PathBuf) -> Result<serde_json::Value, HandlerErr> {
    let store = Store::open(&path)
        .map_err(|e| HandlerErr::internal(format!("failed to open workspace: {:?}", e)))?;

    let mut container = StateContainer::rehydrate(&store);
    // The session is persisted independently under `user`; adopt it when the
    // snapshot predates it or was discarded as corrupt.
    if container.snapshot().user.is_none() {
        let session: Option<Session> = store.read_or(keys::USER, None);
        if let Some(session) = session {
            container.dispatch(&store, Action::SetCurrentClass(session.class_assigned.clone()));
            container.dispatch(&store, Action::SetUser(Some(session)));
        }
    }
    if let Some(session) = container.snapshot().user.as_ref() {
        state.sync.set_bearer(Some(session.mobile.clone()));
    }

    state.workspace = Some(path.clone());
    state.store = Some(store);
    state.container = container;
    Ok(json!({ "workspacePath": path.to_string_lossy() }))
}

fn handle_workspace_select(
    state: &mut AppState,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let path = PathBuf::from(required_str(&req.params, "path")?);
    open_workspace(state, path)
}

fn handle_workspace_backup(
    state: &mut AppState,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let Some(workspace) = state.workspace.clone() else {
        return Err(HandlerErr::no_workspace());
    };
    let out_path = PathBuf::from(required_str(&req.params, "outPath")?);
    let summary = backup::export_workspace_bundle(&workspace, &out_path)
        .map_err(|e| HandlerErr::internal(format!("backup failed: {:?}", e)))?;
    Ok(json!({
        "bundleFormat": summary.bundle_format,
        "outPath": out_path.to_string_lossy()
    }))
}

fn handle_workspace_restore(
    state: &mut AppState,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let Some(workspace) = state.workspace.clone() else {
        return Err(HandlerErr::no_workspace());
    };
    let in_path = PathBuf::from(required_str(&req.params, "inPath")?);

    // Release the open connection before swapping the database file.
    state.store = None;
    let summary = backup::import_workspace_bundle(&in_path, &workspace)
        .map_err(|e| HandlerErr::internal(format!("restore failed: {:?}", e)));
    let reopened = open_workspace(state, workspace)?;
    let summary = summary?;
    Ok(json!({
        "bundleFormat": summary.bundle_format_detected,
        "workspacePath": reopened["workspacePath"]
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(respond(&req.id, handle_health(state, req))),
        "workspace.select" => Some(respond(&req.id, handle_workspace_select(state, req))),
        "workspace.backup" => Some(respond(&req.id, handle_workspace_backup(state, req))),
        "workspace.restore" => Some(respond(&req.id, handle_workspace_restore(state, req))),
        _ => None,
    }
}
