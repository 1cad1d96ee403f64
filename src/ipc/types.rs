use std::path::PathBuf;

use serde::Deserialize;

use crate::state::StateContainer;
use crate::store::Store;
use crate::sync::SyncHandle;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub store: Option<Store>,
    pub container: StateContainer,
    pub sync: SyncHandle,
}

impl AppState {
    pub fn new(sync: SyncHandle) -> Self {
        AppState {
            workspace: None,
            store: None,
            container: StateContainer::default(),
            sync,
        }
    }
}
