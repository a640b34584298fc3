//! Synthetic user factory.
//!
//! Cosmetic fields (names, addresses, dates, flags) come from a caller-supplied
//! RNG. Passwords come from [`password::generate_credential`], which draws from
//! the OS CSPRNG, so the two randomness domains never mix.

use std::collections::HashSet;

use fake::faker::internet::en::FreeEmail;
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use rand::Rng;
use time::{Duration, OffsetDateTime};
use tracing::debug;
use url::form_urlencoded;
use uuid::Uuid;

use super::password::{self, Credential, PasswordError};
use super::repo_types::{GeneratedUser, NewUser, UserStatus};

pub const AVATAR_TEMPLATE: &str = "https://api.dicebear.com/7.x/initials/svg?seed=";

const MAX_AGE_DAYS: i64 = 365;
const MIN_LOGIN_OFFSET_HOURS: i64 = 1;
const MAX_LOGIN_OFFSET_HOURS: i64 = 240;

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("count must be greater than zero, got {0}")]
    InvalidCount(i64),
    #[error("hash password: {0}")]
    Hashing(#[from] PasswordError),
}

/// Generates `count` users stamped against the current time.
pub fn generate_users(count: i64) -> Result<Vec<GeneratedUser>, GenerateError> {
    generate_users_at(
        count,
        OffsetDateTime::now_utc(),
        &mut rand::thread_rng(),
        password::generate_credential,
    )
}

/// Same as [`generate_users`] with the clock, cosmetic RNG and credential
/// source supplied by the caller.
pub fn generate_users_at<R, F>(
    count: i64,
    now: OffsetDateTime,
    rng: &mut R,
    mut credentials: F,
) -> Result<Vec<GeneratedUser>, GenerateError>
where
    R: Rng + ?Sized,
    F: FnMut() -> Result<Credential, PasswordError>,
{
    if count <= 0 {
        return Err(GenerateError::InvalidCount(count));
    }
    let n = usize::try_from(count).map_err(|_| GenerateError::InvalidCount(count))?;

    // No up-front reservation: count comes straight from the operator.
    let mut seen = HashSet::new();
    let mut users = Vec::new();
    for _ in 0..n {
        let credential = credentials()?;
        let mut external_id = Uuid::new_v4();
        while !seen.insert(external_id) {
            external_id = Uuid::new_v4();
        }
        users.push(build_user(rng, now, external_id, credential));
    }

    debug!(count = users.len(), "generated synthetic users");
    Ok(users)
}

fn build_user<R: Rng + ?Sized>(
    rng: &mut R,
    now: OffsetDateTime,
    external_id: Uuid,
    credential: Credential,
) -> GeneratedUser {
    let first: String = FirstName().fake_with_rng(rng);
    let last: String = LastName().fake_with_rng(rng);
    let name = format!("{first} {last}").trim().to_string();

    let email: String = FreeEmail().fake_with_rng(rng);
    let email = email.to_lowercase();

    let created_at = now - Duration::days(rng.gen_range(0..=MAX_AGE_DAYS));
    let updated_at = draw_updated_at(rng, created_at, now);

    let last_login_at = if rng.gen_bool(0.5) {
        let offset = rng.gen_range(MIN_LOGIN_OFFSET_HOURS..=MAX_LOGIN_OFFSET_HOURS);
        Some((created_at + Duration::hours(offset)).min(now))
    } else {
        None
    };

    let avatar_url = if rng.gen_bool(0.5) {
        Some(avatar_url_for(&name))
    } else {
        None
    };

    let status = UserStatus::ALL[rng.gen_range(0..UserStatus::ALL.len())];

    GeneratedUser {
        record: NewUser {
            external_id,
            name,
            email,
            password_hash: credential.hash,
            avatar_url,
            status,
            last_login_at,
            created_at,
            updated_at,
        },
        plain_password: credential.plain,
    }
}

fn draw_updated_at<R: Rng + ?Sized>(
    rng: &mut R,
    created_at: OffsetDateTime,
    now: OffsetDateTime,
) -> OffsetDateTime {
    let elapsed_hours = (now - created_at).whole_hours().max(0);
    let delta = rng.gen_range(0..=elapsed_hours);
    if delta == 0 {
        return created_at;
    }
    (created_at + Duration::hours(delta)).min(now)
}

/// Avatar URL seeded with the name, whitespace removed and query-escaped.
pub fn avatar_url_for(name: &str) -> String {
    let compact: String = name.chars().filter(|c| !c.is_whitespace()).collect();
    let seed: String = form_urlencoded::byte_serialize(compact.as_bytes()).collect();
    format!("{AVATAR_TEMPLATE}{seed}")
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use time::macros::datetime;

    use super::*;

    const NOW: OffsetDateTime = datetime!(2024-06-01 12:00 UTC);

    fn cheap_credential() -> Result<Credential, PasswordError> {
        Ok(Credential {
            plain: "Abcdefgh1234".into(),
            hash: "$argon2id$stub".into(),
        })
    }

    fn generate(count: i64, seed: u64) -> Vec<GeneratedUser> {
        let mut rng = StdRng::seed_from_u64(seed);
        generate_users_at(count, NOW, &mut rng, cheap_credential).expect("generated")
    }

    #[test]
    fn rejects_non_positive_counts() {
        for count in [0, -1] {
            let err = generate_users(count).unwrap_err();
            assert!(matches!(err, GenerateError::InvalidCount(c) if c == count));
        }
    }

    #[test]
    fn produces_exactly_n_users_with_unique_external_ids() {
        let users = generate(250, 7);
        assert_eq!(users.len(), 250);
        let ids: HashSet<_> = users.iter().map(|u| u.record.external_id).collect();
        assert_eq!(ids.len(), 250);
    }

    #[test]
    fn timestamps_are_consistent() {
        for user in generate(500, 42) {
            let r = &user.record;
            assert!(r.created_at >= NOW - Duration::days(MAX_AGE_DAYS));
            assert!(r.created_at <= r.updated_at, "{r:?}");
            assert!(r.updated_at <= NOW, "{r:?}");
            if let Some(login) = r.last_login_at {
                assert!(r.created_at <= login, "{r:?}");
                assert!(login <= NOW, "{r:?}");
            }
        }
    }

    #[test]
    fn cosmetic_fields_are_well_formed() {
        for user in generate(200, 3) {
            let r = &user.record;
            assert!(!r.name.is_empty());
            assert_eq!(r.name, r.name.trim());
            assert_eq!(r.email, r.email.to_lowercase());
            assert!(r.email.contains('@'));
            if let Some(url) = &r.avatar_url {
                assert!(url.starts_with(AVATAR_TEMPLATE));
                assert!(!url.contains(' '));
            }
        }
    }

    #[test]
    fn optional_fields_and_statuses_are_mixed() {
        let users = generate(400, 11);
        let with_avatar = users.iter().filter(|u| u.record.avatar_url.is_some()).count();
        let with_login = users.iter().filter(|u| u.record.last_login_at.is_some()).count();
        assert!((100..300).contains(&with_avatar), "{with_avatar}");
        assert!((100..300).contains(&with_login), "{with_login}");

        let statuses: HashSet<_> = users.iter().map(|u| u.record.status).collect();
        assert_eq!(statuses.len(), UserStatus::ALL.len());
    }

    #[test]
    fn same_seed_gives_same_cosmetic_fields() {
        let a = generate(5, 99);
        let b = generate(5, 99);
        let names = |v: &[GeneratedUser]| v.iter().map(|u| u.record.name.clone()).collect::<Vec<_>>();
        assert_eq!(names(&a), names(&b));
    }

    #[test]
    fn hashing_failure_aborts_the_batch() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut calls = 0;
        let err = generate_users_at(5, NOW, &mut rng, || {
            calls += 1;
            if calls == 3 {
                Err(PasswordError::HashingFailed("out of memory".into()))
            } else {
                cheap_credential()
            }
        })
        .unwrap_err();
        assert!(matches!(err, GenerateError::Hashing(PasswordError::HashingFailed(_))));
    }

    #[test]
    fn huge_count_fails_on_first_credential_without_preallocating() {
        let mut rng = StdRng::seed_from_u64(2);
        let err = generate_users_at(i64::MAX, NOW, &mut rng, || {
            Err(PasswordError::HashingFailed("stop".into()))
        })
        .unwrap_err();
        assert!(matches!(err, GenerateError::Hashing(_)));
    }

    #[test]
    fn real_credentials_verify_against_stored_hash() {
        let users = generate_users(2).expect("generated");
        for user in users {
            assert_eq!(user.plain_password.len(), password::PASSWORD_LENGTH);
            assert!(!user.record.password_hash.contains(&user.plain_password));
            assert!(password::verify_password(&user.plain_password, &user.record.password_hash)
                .expect("verify"));
        }
    }

    #[test]
    fn avatar_url_strips_whitespace_and_escapes() {
        assert_eq!(
            avatar_url_for("Zoë O'Neil"),
            format!("{AVATAR_TEMPLATE}Zo%C3%ABO%27Neil")
        );
        assert_eq!(avatar_url_for("Ann Lee"), format!("{AVATAR_TEMPLATE}AnnLee"));
    }

    #[test]
    fn updated_at_is_created_at_when_no_time_elapsed() {
        let mut rng = StdRng::seed_from_u64(5);
        assert_eq!(draw_updated_at(&mut rng, NOW, NOW), NOW);
    }
}
