use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::users::repo::{RepoError, UserRepository};
use crate::users::repo_types::{NewUser, SortOrder, User};

#[derive(Default)]
struct Inner {
    rows: Vec<User>,
    last_id: i64,
}

/// Process-local repository with the same contract as the PostgreSQL one:
/// ids increase and are never reused, `uuid` and `email` are unique, and a
/// batch that violates uniqueness leaves the store untouched.
#[derive(Default)]
pub struct InMemoryUserRepository {
    inner: RwLock<Inner>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert_many(&self, users: &[NewUser]) -> Result<Vec<User>, RepoError> {
        let mut inner = self.inner.write().await;

        let mut uuids: std::collections::HashSet<_> =
            inner.rows.iter().map(|u| u.external_id).collect();
        let mut emails: std::collections::HashSet<_> =
            inner.rows.iter().map(|u| u.email.clone()).collect();
        for u in users {
            if !uuids.insert(u.external_id) {
                return Err(RepoError::Conflict("users_uuid_key".into()));
            }
            if !emails.insert(u.email.clone()) {
                return Err(RepoError::Conflict("users_email_key".into()));
            }
        }

        let mut inserted = Vec::with_capacity(users.len());
        for u in users {
            inner.last_id += 1;
            let user = u.clone().into_user(inner.last_id);
            inner.rows.push(user.clone());
            inserted.push(user);
        }
        Ok(inserted)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepoError> {
        let inner = self.inner.read().await;
        Ok(inner.rows.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<User>, RepoError> {
        let Ok(uuid) = uuid::Uuid::parse_str(external_id) else {
            return Ok(None);
        };
        let inner = self.inner.read().await;
        Ok(inner.rows.iter().find(|u| u.external_id == uuid).cloned())
    }

    async fn list(&self, order: SortOrder, limit: i64, offset: i64) -> Result<Vec<User>, RepoError> {
        let inner = self.inner.read().await;
        let skip = usize::try_from(offset.max(0)).unwrap_or(usize::MAX);
        let take = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
        // Rows are appended with increasing ids.
        let rows: Vec<User> = match order {
            SortOrder::IdAscending => inner.rows.iter().skip(skip).take(take).cloned().collect(),
            SortOrder::IdDescending => inner.rows.iter().rev().skip(skip).take(take).cloned().collect(),
        };
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;
    use uuid::Uuid;

    use super::*;
    use crate::users::repo_types::UserStatus;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            external_id: Uuid::new_v4(),
            name: "Test User".into(),
            email: email.into(),
            password_hash: "$argon2id$stub".into(),
            avatar_url: None,
            status: UserStatus::Active,
            last_login_at: None,
            created_at: datetime!(2024-01-01 00:00 UTC),
            updated_at: datetime!(2024-01-02 00:00 UTC),
        }
    }

    #[tokio::test]
    async fn assigns_increasing_ids() {
        let repo = InMemoryUserRepository::new();
        let first = repo.insert_many(&[new_user("a@x.io"), new_user("b@x.io")]).await.unwrap();
        let second = repo.insert_many(&[new_user("c@x.io")]).await.unwrap();
        let ids: Vec<i64> = first.iter().chain(second.iter()).map(|u| u.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn duplicate_email_rejects_whole_batch() {
        let repo = InMemoryUserRepository::new();
        repo.insert_many(&[new_user("a@x.io")]).await.unwrap();

        let err = repo
            .insert_many(&[new_user("b@x.io"), new_user("a@x.io")])
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Conflict(ref c) if c == "users_email_key"));
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn duplicate_within_batch_is_a_conflict() {
        let repo = InMemoryUserRepository::new();
        let err = repo
            .insert_many(&[new_user("same@x.io"), new_user("same@x.io")])
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Conflict(_)));
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn lists_in_both_directions() {
        let repo = InMemoryUserRepository::new();
        let batch: Vec<NewUser> = (0..5).map(|i| new_user(&format!("u{i}@x.io"))).collect();
        repo.insert_many(&batch).await.unwrap();

        let desc: Vec<i64> = repo
            .list(SortOrder::IdDescending, 2, 1)
            .await
            .unwrap()
            .iter()
            .map(|u| u.id)
            .collect();
        assert_eq!(desc, vec![4, 3]);

        let asc: Vec<i64> = repo
            .list(SortOrder::IdAscending, 10, 3)
            .await
            .unwrap()
            .iter()
            .map(|u| u.id)
            .collect();
        assert_eq!(asc, vec![4, 5]);
    }

    #[tokio::test]
    async fn malformed_external_id_matches_nothing() {
        let repo = InMemoryUserRepository::new();
        repo.insert_many(&[new_user("a@x.io")]).await.unwrap();
        assert!(repo.find_by_external_id("not-a-uuid").await.unwrap().is_none());
    }
}
