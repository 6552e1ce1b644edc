use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{generate_jwt, hash_password, verify_password, Claims};
use crate::config::MAX_JWT_EXPIRY_HOURS;
use crate::database::{NewUser, StoreError, User, UserFullInfo, UserShortInfo, UserStore};
use crate::error::ApiError;
use crate::services::notifier::{password_reset_message, Notifier};
use crate::types::Role;

/// What a caller may see about another account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum UserView {
    Full(UserFullInfo),
    Short(UserShortInfo),
}

#[derive(Debug, Clone, Serialize)]
pub struct SignInResult {
    pub token: String,
    pub user_id: Uuid,
    pub expires_in: u64,
}

/// Account operations behind the public, protected and admin handlers
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserStore>,
    notifier: Arc<dyn Notifier>,
    jwt_secret: String,
    jwt_expiry_hours: u64,
    password_cost: u32,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserStore>,
        notifier: Arc<dyn Notifier>,
        jwt_secret: impl Into<String>,
        jwt_expiry_hours: u64,
        password_cost: u32,
    ) -> Self {
        Self {
            users,
            notifier,
            jwt_secret: jwt_secret.into(),
            jwt_expiry_hours: jwt_expiry_hours.min(MAX_JWT_EXPIRY_HOURS),
            password_cost,
        }
    }

    pub async fn sign_up(&self, name: &str, email: &str, password: &str) -> Result<UserFullInfo, ApiError> {
        let name = name.trim();
        let email = email.trim();
        if name.is_empty() || password.is_empty() || !is_plausible_email(email) {
            return Err(ApiError::invalid_input("invalid input"));
        }

        let user = self
            .users
            .create(NewUser {
                name: name.to_string(),
                email: email.to_string(),
                password_hash: hash_password(password, self.password_cost)?,
            })
            .await?;

        tracing::info!(user = %user.id, "account created");
        Ok(user.full_info())
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SignInResult, ApiError> {
        let user = self
            .users
            .find_by_email(email.trim())
            .await?
            .filter(|u| verify_password(password, &u.password_hash))
            .ok_or_else(|| ApiError::forbidden("invalid email or password"))?;

        let claims = Claims::new(user.id, user.role, self.jwt_expiry_hours);
        let token = generate_jwt(&claims, &self.jwt_secret).map_err(|e| {
            tracing::error!("Token issuance failed: {}", e);
            ApiError::internal("failed to issue token")
        })?;

        Ok(SignInResult {
            token,
            user_id: user.id,
            expires_in: self.jwt_expiry_hours.saturating_mul(3600),
        })
    }

    /// Full info for admin+ callers and for the caller's own record, short info otherwise
    pub async fn user_info_for(&self, caller: &User, target_raw: &str) -> Result<UserView, ApiError> {
        let target_id = parse_user_id(target_raw)?;
        if target_id == caller.id {
            return Ok(UserView::Full(caller.full_info()));
        }

        let target = self.find_existing(target_id).await?;
        if caller.role.is_privileged() {
            Ok(UserView::Full(target.full_info()))
        } else {
            Ok(UserView::Short(target.short_info()))
        }
    }

    pub async fn admin_user_info(&self, target_raw: &str) -> Result<UserFullInfo, ApiError> {
        let target_id = parse_user_id(target_raw)?;
        Ok(self.find_existing(target_id).await?.full_info())
    }

    pub async fn rename(&self, caller: &User, name: &str) -> Result<(), ApiError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::invalid_input("invalid input"));
        }
        self.users
            .update_name(caller.id, name)
            .await
            .map_err(|e| caller_write_error(caller.id, e))
    }

    pub async fn change_password(&self, caller: &User, password: &str) -> Result<(), ApiError> {
        if password.is_empty() {
            return Err(ApiError::invalid_input("invalid input"));
        }
        self.users
            .set_password_hash(caller.id, &hash_password(password, self.password_cost)?)
            .await
            .map_err(|e| caller_write_error(caller.id, e))
    }

    /// Reset another account's password and mail the new one to its owner.
    /// Admin and root accounts can only be reset by root; a lost root
    /// credential is recovered with `seed-root`.
    pub async fn admin_reset_password(&self, actor: &User, target_raw: &str, password: &str) -> Result<(), ApiError> {
        let target_id = parse_user_id(target_raw)?;
        if password.is_empty() {
            return Err(ApiError::invalid_input("invalid input"));
        }

        let target = self.find_existing(target_id).await?;
        if target.role.is_privileged() {
            if actor.role != Role::Root {
                tracing::warn!(
                    actor = %actor.id,
                    target = %target.id,
                    target_role = %target.role,
                    "password reset of privileged account denied"
                );
                return Err(ApiError::invalid_operation("cannot reset the password of a privileged user"));
            }
            tracing::warn!(actor = %actor.id, target = %target.id, target_role = %target.role, "privileged password reset");
        }

        let hash = hash_password(password, self.password_cost)?;
        self.users.set_password_hash(target.id, &hash).await?;
        tracing::info!(actor = %actor.id, target = %target.id, "password reset by admin");

        let (subject, body) = password_reset_message(&target.name, password);
        self.notifier.send(&target.email, &subject, &body).await?;
        Ok(())
    }

    async fn find_existing(&self, id: Uuid) -> Result<User, ApiError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("user {} not found", id)))
    }
}

pub fn parse_user_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::invalid_input("invalid input"))
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

// The caller passed identity resolution moments ago, so a missing record is a fault
fn caller_write_error(id: Uuid, err: StoreError) -> ApiError {
    match err {
        StoreError::NotFound(_) => {
            tracing::error!("Caller {} vanished during request", id);
            ApiError::internal("caller record is missing")
        }
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::validate_jwt;
    use crate::database::MemoryUserStore;
    use crate::services::notifier::NotifyError;
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<(String, String, String)>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
            self.sent.lock().await.push((to.into(), subject.into(), body.into()));
            Ok(())
        }
    }

    fn service() -> (AccountService, Arc<MemoryUserStore>, Arc<RecordingNotifier>) {
        let store = Arc::new(MemoryUserStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let service = AccountService::new(
            store.clone(),
            notifier.clone(),
            "test-secret",
            1,
            crate::auth::MIN_PASSWORD_COST,
        );
        (service, store, notifier)
    }

    #[tokio::test]
    async fn test_sign_up_and_sign_in() {
        let (service, _, _) = service();
        let info = service.sign_up("Alice", "alice@example.com", "pw").await.unwrap();
        assert_eq!(info.role, Role::Default);
        assert!(!info.blocked);

        let session = service.sign_in("ALICE@example.com", "pw").await.unwrap();
        assert_eq!(session.user_id, info.id);
        assert_eq!(validate_jwt(&session.token, "test-secret").unwrap().sub, info.id);

        let err = service.sign_in("alice@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_sign_up_validation() {
        let (service, _, _) = service();
        assert!(matches!(
            service.sign_up("", "a@example.com", "pw").await,
            Err(ApiError::InvalidInput(_))
        ));
        assert!(matches!(
            service.sign_up("A", "not-an-email", "pw").await,
            Err(ApiError::InvalidInput(_))
        ));
        service.sign_up("A", "a@example.com", "pw").await.unwrap();
        assert!(matches!(
            service.sign_up("B", "a@example.com", "pw").await,
            Err(ApiError::InvalidOperation(_))
        ));
    }

    #[tokio::test]
    async fn test_user_info_views() {
        let (service, store, _) = service();
        let plain = service.sign_up("Plain", "plain@example.com", "pw").await.unwrap();
        let other = service.sign_up("Other", "other@example.com", "pw").await.unwrap();
        store.set_role(other.id, Role::Admin, Role::Default).await.unwrap();

        let plain = store.find_by_id(plain.id).await.unwrap().unwrap();
        let admin = store.find_by_id(other.id).await.unwrap().unwrap();

        assert!(matches!(
            service.user_info_for(&plain, &plain.id.to_string()).await.unwrap(),
            UserView::Full(_)
        ));
        assert!(matches!(
            service.user_info_for(&plain, &admin.id.to_string()).await.unwrap(),
            UserView::Short(_)
        ));
        assert!(matches!(
            service.user_info_for(&admin, &plain.id.to_string()).await.unwrap(),
            UserView::Full(_)
        ));
        assert!(matches!(
            service.user_info_for(&admin, &Uuid::new_v4().to_string()).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            service.user_info_for(&admin, "xyz").await,
            Err(ApiError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_admin_reset_password_notifies() {
        let (service, store, notifier) = service();
        let admin = service.sign_up("Admin", "admin@example.com", "pw").await.unwrap();
        let target = service.sign_up("Target", "target@example.com", "old").await.unwrap();
        let admin = store.find_by_id(admin.id).await.unwrap().unwrap();

        service
            .admin_reset_password(&admin, &target.id.to_string(), "fresh-pw")
            .await
            .unwrap();

        assert!(service.sign_in("target@example.com", "fresh-pw").await.is_ok());
        let sent = notifier.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "target@example.com");
        assert!(sent[0].2.contains("fresh-pw"));
    }

    #[tokio::test]
    async fn test_admin_reset_password_unknown_user() {
        let (service, store, notifier) = service();
        let admin = service.sign_up("Admin", "admin@example.com", "pw").await.unwrap();
        let admin = store.find_by_id(admin.id).await.unwrap().unwrap();

        let err = service
            .admin_reset_password(&admin, &Uuid::new_v4().to_string(), "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        assert!(notifier.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_only_root_resets_privileged_passwords() {
        let (service, store, notifier) = service();
        let admin = service.sign_up("Admin", "admin@example.com", "pw").await.unwrap();
        let other = service.sign_up("Other", "other@example.com", "pw").await.unwrap();
        let root = service.sign_up("Root", "root@example.com", "pw").await.unwrap();
        store.set_role(admin.id, Role::Admin, Role::Default).await.unwrap();
        store.set_role(other.id, Role::Admin, Role::Default).await.unwrap();
        store.set_role(root.id, Role::Root, Role::Default).await.unwrap();
        let admin = store.find_by_id(admin.id).await.unwrap().unwrap();
        let root = store.find_by_id(root.id).await.unwrap().unwrap();

        for target in [other.id, root.id] {
            let err = service
                .admin_reset_password(&admin, &target.to_string(), "taken-over")
                .await
                .unwrap_err();
            assert!(matches!(err, ApiError::InvalidOperation(_)));
        }
        assert!(service.sign_in("root@example.com", "taken-over").await.is_err());
        assert!(service.sign_in("other@example.com", "pw").await.is_ok());
        assert!(notifier.sent.lock().await.is_empty());

        service
            .admin_reset_password(&root, &other.id.to_string(), "from-root")
            .await
            .unwrap();
        assert!(service.sign_in("other@example.com", "from-root").await.is_ok());
    }

    #[tokio::test]
    async fn test_expiry_is_capped_in_sign_in() {
        let store = Arc::new(MemoryUserStore::new());
        let service = AccountService::new(
            store,
            Arc::new(RecordingNotifier::default()),
            "test-secret",
            u64::MAX,
            crate::auth::MIN_PASSWORD_COST,
        );
        service.sign_up("Long", "long@example.com", "pw").await.unwrap();
        let session = service.sign_in("long@example.com", "pw").await.unwrap();
        assert_eq!(session.expires_in, MAX_JWT_EXPIRY_HOURS * 3600);
    }
}
