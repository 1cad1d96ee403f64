use crate::error::AuthenticationError;
use crate::model::{Role, SchoolProfile, Session, Teacher};
use crate::repo::Repository;
use crate::state::{Action, StateContainer};
use crate::store::{keys, Store};
use crate::sync::SyncHandle;

/// Validate credentials against the school profile (principal) or the
/// teacher roster (teacher). The registered mobile number doubles as the
/// password. Failures are generic and do not say which part was wrong.
pub fn login(
    store: &Store,
    sync: &SyncHandle,
    container: &mut StateContainer,
    mobile: &str,
    password: &str,
    role: Role,
) -> Result<Session, AuthenticationError> {
    let session = match role {
        Role::Principal => {
            let profile: Option<SchoolProfile> = store.read_or(keys::SCHOOL_SETUP, None);
            let profile = profile.ok_or(AuthenticationError)?;
            if mobile != profile.principal_mobile || password != mobile {
                return Err(AuthenticationError);
            }
            Session {
                id: 1,
                mobile: profile.principal_mobile.clone(),
                role: Role::Principal,
                name: profile.principal_name.clone(),
                class_assigned: None,
            }
        }
        Role::Teacher => {
            let repo = Repository::<Teacher>::open(store, sync, keys::TEACHERS);
            let teacher = repo
                .find_by(|t| t.mobile == mobile && t.is_active)
                .ok_or(AuthenticationError)?;
            if password != mobile {
                return Err(AuthenticationError);
            }
            Session {
                id: teacher.id,
                mobile: teacher.mobile.clone(),
                role: Role::Teacher,
                name: teacher.name.clone(),
                class_assigned: Some(teacher.class_assigned.clone()),
            }
        }
    };

    store.write(keys::USER, &session);
    sync.set_bearer(Some(session.mobile.clone()));
    container.dispatch(store, Action::SetUser(Some(session.clone())));
    container.dispatch(store, Action::SetCurrentClass(session.class_assigned.clone()));
    Ok(session)
}

/// Clears the session only; collections and the school profile stay put.
pub fn logout(store: &Store, sync: &SyncHandle, container: &mut StateContainer) {
    store.remove(keys::USER);
    sync.set_bearer(None);
    container.dispatch(store, Action::Logout);
}

/// Gate for role-scoped operations. A missing or mismatched session is
/// forced back to the unauthenticated state so the host redirects to
/// login.
pub fn require_role(
    store: &Store,
    sync: &SyncHandle,
    container: &mut StateContainer,
    expected: Role,
) -> Result<Session, AuthenticationError> {
    match container.snapshot().user.clone() {
        Some(session) if session.role == expected => Ok(session),
        _ => {
            logout(store, sync, container);
            Err(AuthenticationError)
        }
    }
}

/// Any authenticated session, role irrelevant.
pub fn require_session(container: &StateContainer) -> Result<Session, AuthenticationError> {
    container.snapshot().user.clone().ok_or(AuthenticationError)
}
