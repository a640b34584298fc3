use std::sync::Arc;

use crate::config::AppConfig;
use crate::users::{
    memory::InMemoryUserRepository,
    repo::{PgUserRepository, UserRepository},
    services::UserQueryService,
};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
}

impl AppState {
    pub async fn init(config: &AppConfig) -> anyhow::Result<Self> {
        let db = crate::db::connect(&config.database).await?;
        crate::db::migrate(&db).await?;
        let users = Arc::new(PgUserRepository::new(db)) as Arc<dyn UserRepository>;
        Ok(Self { users })
    }

    pub fn user_queries(&self) -> UserQueryService {
        UserQueryService::new(self.users.clone())
    }

    /// State backed by an empty in-memory repository.
    pub fn fake() -> Self {
        Self::fake_with(Arc::new(InMemoryUserRepository::new()))
    }

    pub fn fake_with(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;
    use uuid::Uuid;

    use super::*;
    use crate::users::repo_types::{NewUser, UserStatus};
    use crate::users::services::Pagination;

    #[tokio::test]
    async fn queries_read_from_the_shared_repository() {
        let repo = Arc::new(InMemoryUserRepository::new());
        let state = AppState::fake_with(repo.clone());
        let copy = state.clone();

        repo.insert_many(&[NewUser {
            external_id: Uuid::new_v4(),
            name: "Grace Hopper".into(),
            email: "grace@example.com".into(),
            password_hash: "$argon2id$stub".into(),
            avatar_url: None,
            status: UserStatus::Active,
            last_login_at: None,
            created_at: datetime!(2024-01-01 00:00 UTC),
            updated_at: datetime!(2024-01-01 00:00 UTC),
        }])
        .await
        .unwrap();

        let page = copy.user_queries().list(Pagination::default()).await.unwrap();
        assert_eq!(page.meta.count, 1);
        assert_eq!(page.data[0].email, "grace@example.com");
    }
}
