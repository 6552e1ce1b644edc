//! Block-state and role-change decisions.
//!
//! Rules, in evaluation order:
//!
//! 1. Root is never a valid requested role.
//! 2. Nobody acts on themselves, root included.
//! 3. Admin and root targets can only be mutated by root.
//! 4. Root targets can't be mutated at all.
//!
//! Together these keep admins from locking each other out and leave root
//! unreachable through the API; root accounts are created by `seed-root`.

use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::database::{StoreError, User, UserStore};
use crate::error::ApiError;
use crate::types::Role;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("cannot act on yourself")]
    SelfAction,

    #[error("invalid user role '{0}'")]
    InvalidRole(String),

    #[error("cannot act on a privileged user")]
    PrivilegedTarget,

    #[error("root user cannot be modified")]
    ImmutableRoot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationIntent {
    SetBlocked(bool),
    SetRole(Role),
}

impl MutationIntent {
    fn label(&self) -> &'static str {
        match self {
            MutationIntent::SetBlocked(true) => "block",
            MutationIntent::SetBlocked(false) => "unblock",
            MutationIntent::SetRole(_) => "set_role",
        }
    }
}

/// Decide whether `actor` may apply `intent` to `target`. Pure; no I/O.
pub fn authorize(actor: &User, target: &User, intent: MutationIntent) -> Result<(), AuthzError> {
    if let MutationIntent::SetRole(role) = intent {
        if !role.is_assignable() {
            return Err(AuthzError::InvalidRole(role.to_string()));
        }
    }

    if actor.id == target.id {
        return Err(AuthzError::SelfAction);
    }

    if target.role.is_privileged() && actor.role != Role::Root {
        return Err(AuthzError::PrivilegedTarget);
    }

    if target.role == Role::Root {
        return Err(AuthzError::ImmutableRoot);
    }

    Ok(())
}

/// Parse a requested role from the wire. Anything but `default` or `admin` is rejected.
pub fn parse_assignable_role(raw: &str) -> Result<Role, AuthzError> {
    match raw.parse::<Role>() {
        Ok(role) if role.is_assignable() => Ok(role),
        _ => Err(AuthzError::InvalidRole(raw.to_string())),
    }
}

/// Endpoint-facing path for admin mutations: validates, loads both parties,
/// decides, then writes conditionally on the target's role as read.
#[derive(Clone)]
pub struct MutationService {
    users: Arc<dyn UserStore>,
}

impl MutationService {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    pub async fn set_blocked(&self, actor_id: Uuid, target_raw: &str, blocked: bool) -> Result<(), ApiError> {
        let target_id = parse_target_id(target_raw)?;
        self.apply(actor_id, target_id, MutationIntent::SetBlocked(blocked)).await
    }

    pub async fn set_role(&self, actor_id: Uuid, target_raw: &str, role_raw: &str) -> Result<(), ApiError> {
        let role = parse_assignable_role(role_raw)?;
        let target_id = parse_target_id(target_raw)?;
        self.apply(actor_id, target_id, MutationIntent::SetRole(role)).await
    }

    async fn apply(&self, actor_id: Uuid, target_id: Uuid, intent: MutationIntent) -> Result<(), ApiError> {
        if actor_id == target_id {
            tracing::info!(actor = %actor_id, intent = intent.label(), "rejected self-action");
            return Err(AuthzError::SelfAction.into());
        }

        let (actor, target) = futures::join!(
            self.users.find_by_id(actor_id),
            self.users.find_by_id(target_id)
        );
        let actor = load_actor(actor_id, actor)?;
        let target = load_target(target_id, target)?;

        if let Err(denied) = authorize(&actor, &target, intent) {
            tracing::info!(
                actor = %actor.id,
                actor_role = %actor.role,
                target = %target.id,
                target_role = %target.role,
                intent = intent.label(),
                "mutation denied: {}", denied
            );
            return Err(denied.into());
        }

        let written = match intent {
            MutationIntent::SetBlocked(blocked) => {
                self.users.set_blocked(target.id, blocked, target.role).await
            }
            MutationIntent::SetRole(role) => self.users.set_role(target.id, role, target.role).await,
        };

        match written {
            Ok(()) => {
                tracing::info!(
                    actor = %actor.id,
                    target = %target.id,
                    intent = intent.label(),
                    "mutation applied"
                );
                Ok(())
            }
            Err(StoreError::Conflict(msg)) => {
                tracing::warn!(target = %target.id, "mutation lost a race: {}", msg);
                Err(ApiError::invalid_operation("target user changed concurrently, retry the request"))
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn parse_target_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::invalid_input("invalid input"))
}

fn load_actor(id: Uuid, found: Result<Option<User>, StoreError>) -> Result<User, ApiError> {
    match found {
        Ok(Some(user)) => Ok(user),
        Ok(None) => {
            tracing::error!("Acting user {} vanished after authentication", id);
            Err(ApiError::internal("acting user record is missing"))
        }
        Err(e) => {
            tracing::error!("Failed to load acting user {}: {}", id, e);
            Err(ApiError::internal("failed to load acting user"))
        }
    }
}

fn load_target(id: Uuid, found: Result<Option<User>, StoreError>) -> Result<User, ApiError> {
    match found {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(ApiError::not_found(format!("user {} not found", id))),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{MemoryUserStore, NewUser};

    fn user(role: Role) -> User {
        let mut user = NewUser {
            name: format!("{} user", role),
            email: format!("{}@example.com", Uuid::new_v4().simple()),
            password_hash: "salt$hash".into(),
        }
        .into_user();
        user.role = role;
        user
    }

    const ROLES: [Role; 3] = [Role::Default, Role::Admin, Role::Root];

    fn intents() -> Vec<MutationIntent> {
        let mut intents = vec![MutationIntent::SetBlocked(true), MutationIntent::SetBlocked(false)];
        intents.extend(ROLES.iter().map(|r| MutationIntent::SetRole(*r)));
        intents
    }

    #[test]
    fn test_root_target_is_immutable() {
        let target = user(Role::Root);
        for actor_role in ROLES {
            let actor = user(actor_role);
            for intent in intents() {
                assert!(
                    authorize(&actor, &target, intent).is_err(),
                    "{} actor mutated root with {:?}",
                    actor_role,
                    intent
                );
            }
        }
    }

    #[test]
    fn test_non_root_cannot_touch_privileged() {
        for target_role in [Role::Admin, Role::Root] {
            for actor_role in [Role::Default, Role::Admin] {
                let (actor, target) = (user(actor_role), user(target_role));
                for intent in [
                    MutationIntent::SetBlocked(true),
                    MutationIntent::SetRole(Role::Default),
                    MutationIntent::SetRole(Role::Admin),
                ] {
                    assert_eq!(authorize(&actor, &target, intent), Err(AuthzError::PrivilegedTarget));
                }
            }
        }
    }

    #[test]
    fn test_self_action_rejected_for_valid_intents() {
        for role in ROLES {
            let actor = user(role);
            for intent in intents() {
                let expected = match intent {
                    MutationIntent::SetRole(Role::Root) => AuthzError::InvalidRole("root".into()),
                    _ => AuthzError::SelfAction,
                };
                assert_eq!(authorize(&actor, &actor, intent), Err(expected));
            }
        }
    }

    #[test]
    fn test_root_role_never_assignable() {
        let target = user(Role::Default);
        for actor_role in ROLES {
            let actor = user(actor_role);
            assert!(matches!(
                authorize(&actor, &target, MutationIntent::SetRole(Role::Root)),
                Err(AuthzError::InvalidRole(_))
            ));
        }
    }

    #[test]
    fn test_permitted_transitions() {
        let admin = user(Role::Admin);
        let root = user(Role::Root);
        let plain = user(Role::Default);
        let other_admin = user(Role::Admin);

        assert!(authorize(&admin, &plain, MutationIntent::SetBlocked(true)).is_ok());
        assert!(authorize(&admin, &plain, MutationIntent::SetRole(Role::Admin)).is_ok());
        assert!(authorize(&root, &other_admin, MutationIntent::SetRole(Role::Default)).is_ok());
        assert!(authorize(&root, &other_admin, MutationIntent::SetBlocked(true)).is_ok());
    }

    #[test]
    fn test_parse_assignable_role() {
        assert_eq!(parse_assignable_role("default"), Ok(Role::Default));
        assert_eq!(parse_assignable_role("admin"), Ok(Role::Admin));
        assert!(parse_assignable_role("root").is_err());
        assert!(parse_assignable_role("superadmin").is_err());
        assert!(parse_assignable_role("").is_err());
    }

    async fn seeded(roles: &[Role]) -> (Arc<MemoryUserStore>, Vec<User>) {
        let store = Arc::new(MemoryUserStore::new());
        let mut users = Vec::new();
        for role in roles {
            let u = user(*role);
            store.insert(u.clone()).await;
            users.push(u);
        }
        (store, users)
    }

    #[tokio::test]
    async fn test_admin_blocks_default_user_idempotently() {
        let (store, users) = seeded(&[Role::Admin, Role::Default]).await;
        let service = MutationService::new(store.clone());
        let (admin, plain) = (&users[0], &users[1]);

        service.set_blocked(admin.id, &plain.id.to_string(), true).await.unwrap();
        service.set_blocked(admin.id, &plain.id.to_string(), true).await.unwrap();

        let stored = store.find_by_id(plain.id).await.unwrap().unwrap();
        assert!(stored.blocked);
    }

    #[tokio::test]
    async fn test_admin_cannot_demote_admin() {
        let (store, users) = seeded(&[Role::Admin, Role::Admin]).await;
        let service = MutationService::new(store.clone());

        let err = service
            .set_role(users[0].id, &users[1].id.to_string(), "default")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidOperation(_)));
        assert_eq!(store.find_by_id(users[1].id).await.unwrap().unwrap().role, Role::Admin);
    }

    #[tokio::test]
    async fn test_root_demotes_admin() {
        let (store, users) = seeded(&[Role::Root, Role::Admin]).await;
        let service = MutationService::new(store.clone());

        service.set_role(users[0].id, &users[1].id.to_string(), "default").await.unwrap();
        assert_eq!(store.find_by_id(users[1].id).await.unwrap().unwrap().role, Role::Default);
    }

    #[tokio::test]
    async fn test_input_errors() {
        let (store, users) = seeded(&[Role::Root, Role::Default]).await;
        let service = MutationService::new(store);
        let root = users[0].id;

        let err = service.set_blocked(root, "xyz", true).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));

        let err = service.set_role(root, &users[1].id.to_string(), "root").await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));

        let err = service.set_role(root, &root.to_string(), "admin").await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidOperation(_)));

        let err = service.set_blocked(root, &Uuid::new_v4().to_string(), true).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_role_checked_before_self_action() {
        let (store, users) = seeded(&[Role::Root]).await;
        let service = MutationService::new(store);
        let root = users[0].clone();

        let err = service.set_role(root.id, &root.id.to_string(), "root").await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
        assert_eq!(
            authorize(&root, &root, MutationIntent::SetRole(Role::Root)),
            Err(AuthzError::InvalidRole("root".into()))
        );
    }

    #[tokio::test]
    async fn test_missing_actor_is_internal() {
        let (store, users) = seeded(&[Role::Default]).await;
        let service = MutationService::new(store);

        let err = service
            .set_blocked(Uuid::new_v4(), &users[0].id.to_string(), true)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Internal(_)));
    }

    /// Serves a stale snapshot of one user, as if it was promoted right after the read
    struct StaleRead {
        inner: MemoryUserStore,
        stale: User,
    }

    #[async_trait::async_trait]
    impl UserStore for StaleRead {
        async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
            self.inner.create(new_user).await
        }
        async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
            if id == self.stale.id {
                return Ok(Some(self.stale.clone()));
            }
            self.inner.find_by_id(id).await
        }
        async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
            self.inner.find_by_email(email).await
        }
        async fn update_name(&self, id: Uuid, name: &str) -> Result<(), StoreError> {
            self.inner.update_name(id, name).await
        }
        async fn set_password_hash(&self, id: Uuid, hash: &str) -> Result<(), StoreError> {
            self.inner.set_password_hash(id, hash).await
        }
        async fn set_blocked(&self, id: Uuid, blocked: bool, expected: Role) -> Result<(), StoreError> {
            self.inner.set_blocked(id, blocked, expected).await
        }
        async fn set_role(&self, id: Uuid, role: Role, expected: Role) -> Result<(), StoreError> {
            self.inner.set_role(id, role, expected).await
        }
    }

    #[tokio::test]
    async fn test_lost_race_is_rejected() {
        let admin = user(Role::Admin);
        let target = user(Role::Default);
        let mut promoted = target.clone();
        promoted.role = Role::Admin;

        let inner = MemoryUserStore::new();
        inner.insert(admin.clone()).await;
        inner.insert(promoted).await;
        let store = Arc::new(StaleRead { inner, stale: target.clone() });
        let service = MutationService::new(store.clone());

        let err = service.set_blocked(admin.id, &target.id.to_string(), true).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidOperation(_)));

        let err = service.set_role(admin.id, &target.id.to_string(), "default").await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidOperation(_)));

        let stored = store.inner.find_by_id(target.id).await.unwrap().unwrap();
        assert_eq!(stored.role, Role::Admin);
        assert!(!stored.blocked);
    }
}
