use std::sync::Arc;

use crate::data::user_repository::{NewUser, UserRepository};
use crate::domain::access::{Actor, ensure_owner, require_actor};
use crate::domain::error::DomainError;
use crate::domain::user::{PatchUserRequest, RegisterRequest, UpdateUserRequest, User, UserChanges};
use crate::infrastructure::password::hash_password;

const NOT_SELF: &str = "users may only modify their own profile";

pub(crate) struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    pub(crate) fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    pub(crate) async fn register(&self, req: RegisterRequest) -> Result<User, DomainError> {
        let req = req.validate()?;
        let password_hash = hash_password(&req.password)?;

        let user = self
            .users
            .create_user(NewUser {
                email: req.email,
                first_name: req.first_name,
                last_name: req.last_name,
                birthday: req.birthday,
                password_hash,
            })
            .await?;

        tracing::info!(user_id = user.id, "user registered");
        Ok(user)
    }

    pub(crate) async fn list_users(&self, actor: Option<&Actor>) -> Result<Vec<User>, DomainError> {
        require_actor(actor)?;
        self.users.list_users().await
    }

    pub(crate) async fn get_user(&self, id: i64) -> Result<User, DomainError> {
        self.users
            .get_user(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("user id: {id}")))
    }

    pub(crate) async fn update_user(
        &self,
        actor: Option<&Actor>,
        id: i64,
        req: UpdateUserRequest,
    ) -> Result<User, DomainError> {
        let user = self.load_own_profile(actor, id).await?;
        let (changes, password) = req.validate()?;
        let password_hash = password.as_deref().map(hash_password).transpose()?;

        self.save(user, changes, password_hash).await
    }

    pub(crate) async fn patch_user(
        &self,
        actor: Option<&Actor>,
        id: i64,
        req: PatchUserRequest,
    ) -> Result<User, DomainError> {
        let user = self.load_own_profile(actor, id).await?;
        let changes = req.validate()?;

        self.save(user, changes, None).await
    }

    pub(crate) async fn delete_user(&self, actor: Option<&Actor>, id: i64) -> Result<(), DomainError> {
        guard_self(actor, id)?;

        if !self.users.delete_user(id).await? {
            return Err(DomainError::NotFound(format!("user id: {id}")));
        }
        tracing::info!(user_id = id, "user deleted");
        Ok(())
    }

    async fn load_own_profile(&self, actor: Option<&Actor>, id: i64) -> Result<User, DomainError> {
        guard_self(actor, id)?;
        self.get_user(id).await
    }

    async fn save(
        &self,
        mut user: User,
        changes: UserChanges,
        password_hash: Option<String>,
    ) -> Result<User, DomainError> {
        let id = user.id;
        user.apply(changes);

        let user = self
            .users
            .update_user(&user, password_hash)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("user id: {id}")))?;

        tracing::info!(user_id = id, "user updated");
        Ok(user)
    }
}

fn guard_self(actor: Option<&Actor>, id: i64) -> Result<(), DomainError> {
    ensure_owner(actor, id, NOT_SELF)
        .inspect_err(|err| tracing::warn!(user_id = id, error = %err, "profile change denied"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use super::UserService;
    use crate::data::repositories::memory::InMemoryStore;
    use crate::data::user_repository::UserRepository;
    use crate::domain::access::Actor;
    use crate::domain::error::DomainError;
    use crate::domain::patch::Patch;
    use crate::domain::user::{PatchUserRequest, RegisterRequest, UpdateUserRequest, User};
    use crate::infrastructure::password::verify_password;

    fn setup() -> (Arc<InMemoryStore>, UserService) {
        let store = Arc::new(InMemoryStore::new());
        let service = UserService::new(store.clone());
        (store, service)
    }

    fn registration(email: &str) -> RegisterRequest {
        RegisterRequest {
            first_name: " Ada ".to_string(),
            last_name: "Lovelace".to_string(),
            email: email.to_string(),
            password: "analytical-engine".to_string(),
            birthday: NaiveDate::from_ymd_opt(1815, 12, 10),
        }
    }

    async fn registered(service: &UserService, email: &str) -> User {
        service
            .register(registration(email))
            .await
            .expect("registration must succeed")
    }

    #[tokio::test]
    async fn register_normalizes_and_hashes() {
        let (store, service) = setup();

        let user = registered(&service, " ADA@Example.com ").await;
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.first_name, "Ada");

        let creds = store
            .find_by_email("ada@example.com")
            .await
            .expect("lookup")
            .expect("stored");
        assert_ne!(creds.password_hash, "analytical-engine");
        verify_password("analytical-engine", &creds.password_hash).expect("digest must verify");
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() {
        let (_, service) = setup();
        registered(&service, "ada@example.com").await;

        let err = service
            .register(registration("Ada@example.com"))
            .await
            .expect_err("duplicate must fail");
        assert!(matches!(err, DomainError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn list_requires_authentication() {
        let (_, service) = setup();
        let user = registered(&service, "ada@example.com").await;

        let err = service.list_users(None).await.expect_err("must be denied");
        assert!(matches!(err, DomainError::Unauthenticated));

        let users = service
            .list_users(Some(&Actor::new(user.id)))
            .await
            .expect("list");
        assert_eq!(users, vec![user]);
    }

    #[tokio::test]
    async fn put_without_birthday_clears_it_and_keeps_password() {
        let (store, service) = setup();
        let user = registered(&service, "ada@example.com").await;

        let updated = service
            .update_user(
                Some(&Actor::new(user.id)),
                user.id,
                UpdateUserRequest {
                    first_name: "Augusta".to_string(),
                    last_name: "King".to_string(),
                    email: "augusta@example.com".to_string(),
                    birthday: None,
                    password: Some(String::new()),
                },
            )
            .await
            .expect("update");
        assert_eq!(updated.first_name, "Augusta");
        assert_eq!(updated.birthday, None);
        assert!(updated.updated_at >= updated.created_at);

        let creds = store
            .find_by_email("augusta@example.com")
            .await
            .expect("lookup")
            .expect("stored");
        verify_password("analytical-engine", &creds.password_hash).expect("password unchanged");
    }

    #[tokio::test]
    async fn patch_touches_only_sent_fields() {
        let (_, service) = setup();
        let user = registered(&service, "ada@example.com").await;

        let patched = service
            .patch_user(
                Some(&Actor::new(user.id)),
                user.id,
                PatchUserRequest {
                    last_name: Patch::Value("Byron".to_string()),
                    ..PatchUserRequest::default()
                },
            )
            .await
            .expect("patch");
        assert_eq!(patched.last_name, "Byron");
        assert_eq!(patched.first_name, user.first_name);
        assert_eq!(patched.birthday, user.birthday);

        let cleared = service
            .patch_user(
                Some(&Actor::new(user.id)),
                user.id,
                PatchUserRequest {
                    birthday: Patch::Null,
                    ..PatchUserRequest::default()
                },
            )
            .await
            .expect("patch");
        assert_eq!(cleared.birthday, None);
    }

    #[tokio::test]
    async fn other_users_cannot_touch_a_profile() {
        let (_, service) = setup();
        let owner = registered(&service, "ada@example.com").await;
        let intruder = registered(&service, "eve@example.com").await;
        let actor = Actor::new(intruder.id);

        let err = service
            .patch_user(Some(&actor), owner.id, PatchUserRequest::default())
            .await
            .expect_err("must be denied");
        assert!(matches!(err, DomainError::Forbidden(_)));

        let err = service
            .delete_user(Some(&actor), owner.id)
            .await
            .expect_err("must be denied");
        assert!(matches!(err, DomainError::Forbidden(_)));

        let err = service
            .delete_user(None, owner.id)
            .await
            .expect_err("must be denied");
        assert!(matches!(err, DomainError::Unauthenticated));

        assert_eq!(service.get_user(owner.id).await.expect("still there"), owner);
    }

    #[tokio::test]
    async fn deleting_twice_reports_not_found() {
        let (_, service) = setup();
        let user = registered(&service, "ada@example.com").await;
        let actor = Actor::new(user.id);

        service.delete_user(Some(&actor), user.id).await.expect("delete");
        let err = service
            .delete_user(Some(&actor), user.id)
            .await
            .expect_err("second delete must fail");
        assert!(matches!(err, DomainError::NotFound(_)));
    }
}
