//! User profiles, signup and password login.

mod error;

pub use error::UserError;

use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rootedlane_core::{CREATED_AT_FIELD, Collection, Document, UPDATED_AT_FIELD};
use serde::Deserialize;
use tracing::instrument;

use crate::clock::Clock;
use crate::db::{DocumentStore, Filter, RepositoryError};

const PASSWORD_FIELD: &str = "password";

/// Well-formed Argon2id hash of no one's password, with the default cost
/// parameters. Logins for unknown emails are verified against it so they take
/// as long as a wrong password.
const DUMMY_PASSWORD_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$cm9vdGVkbGFuZS1kdW1teQ$AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8";

/// Body of `POST /api/user`.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Body of `POST /api/users/signup`.
#[derive(Default, Deserialize)]
pub struct SignupRequest {
    pub username: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl SignupRequest {
    /// The display name field and its value; `username` wins over `name`.
    #[must_use]
    pub fn display_name(&self) -> Option<(&'static str, &str)> {
        non_empty(self.username.as_deref())
            .map(|username| ("username", username))
            .or_else(|| non_empty(self.name.as_deref()).map(|name| ("name", name)))
    }
}

impl std::fmt::Debug for SignupRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupRequest")
            .field("username", &self.username)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Body of `POST /api/users/login`.
#[derive(Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// A user created through signup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub id: String,
}

/// User registration and authentication over the `users` collection.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
}

impl UserService {
    /// Create a user service over a store.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Create a profile (name and email, no password).
    ///
    /// Returns the stored document including its id.
    ///
    /// # Errors
    ///
    /// Returns `UserError::MissingFields` if name or email is empty.
    /// Returns `UserError::UserAlreadyExists` if the email is already registered.
    #[instrument(skip(self, request), fields(backend = self.store.backend()))]
    pub async fn create_profile(&self, request: &ProfileRequest) -> Result<Document, UserError> {
        let missing = UserError::MissingFields("Name and email are required");
        let (Some(name), Some(email)) = (
            non_empty(request.name.as_deref()),
            non_empty(request.email.as_deref()),
        ) else {
            return Err(missing);
        };

        self.ensure_email_available(email).await?;

        let mut user = self.stamped();
        user.insert("name", name);
        user.insert("email", email);

        let id = self.insert_user(user.clone()).await?;
        user.set_id(id);

        tracing::info!(user_id = user.id(), "profile created");
        Ok(user)
    }

    /// Register a new user with a hashed password.
    ///
    /// # Errors
    ///
    /// Returns `UserError::MissingFields` if any of name, email or password is empty.
    /// Returns `UserError::UserAlreadyExists` if the email is already registered.
    #[instrument(skip(self, request), fields(backend = self.store.backend()))]
    pub async fn signup(&self, request: &SignupRequest) -> Result<NewUser, UserError> {
        let fields = validate_signup(request)?;

        self.ensure_email_available(fields.email).await?;

        let password_hash = hash_password(fields.password)?;

        let mut user = self.stamped();
        user.insert(fields.name_field, fields.name);
        user.insert("email", fields.email);
        user.insert(PASSWORD_FIELD, password_hash);

        let id = self.insert_user(user).await?;

        tracing::info!(user_id = %id, "user signed up");
        Ok(NewUser { id })
    }

    /// Login with email and password.
    ///
    /// Returns the user without the password hash.
    ///
    /// # Errors
    ///
    /// Returns `UserError::MissingFields` if email or password is empty.
    /// Returns `UserError::InvalidCredentials` if the email/password is wrong.
    #[instrument(skip(self, request), fields(backend = self.store.backend()))]
    pub async fn login(&self, request: &LoginRequest) -> Result<Document, UserError> {
        let (email, password) = validate_login(request)?;

        let user = self
            .store
            .find_one(Collection::Users, &Filter::field("email", email))
            .await?;

        // Profiles created without a password cannot log in
        let password_hash = user.as_ref().and_then(|user| user.get_str(PASSWORD_FIELD));
        let has_password = password_hash.is_some();
        let verified =
            verify_password(password, password_hash.unwrap_or(DUMMY_PASSWORD_HASH)).is_ok();

        let user = user
            .filter(|_| has_password && verified)
            .ok_or(UserError::InvalidCredentials)?;

        tracing::info!(user_id = user.id(), "user logged in");
        Ok(user.without(Collection::Users.redacted_fields()))
    }

    async fn ensure_email_available(&self, email: &str) -> Result<(), UserError> {
        let existing = self
            .store
            .find_one(Collection::Users, &Filter::field("email", email))
            .await?;
        if existing.is_some() {
            return Err(UserError::UserAlreadyExists);
        }
        Ok(())
    }

    /// Insert, mapping a lost race on the unique email to `UserAlreadyExists`.
    async fn insert_user(&self, user: Document) -> Result<String, UserError> {
        self.store
            .insert(Collection::Users, user)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => UserError::UserAlreadyExists,
                other => UserError::Repository(other),
            })
    }

    fn stamped(&self) -> Document {
        let now = self.clock.timestamp();
        let mut document = Document::new();
        document.insert(CREATED_AT_FIELD, now.clone());
        document.insert(UPDATED_AT_FIELD, now);
        document
    }
}

/// Signup fields after presence checks.
#[derive(Debug)]
pub struct ValidSignup<'a> {
    pub name_field: &'static str,
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// Check that a signup request has every required field.
///
/// # Errors
///
/// Returns `UserError::MissingFields` if any of name, email or password is empty.
pub fn validate_signup(request: &SignupRequest) -> Result<ValidSignup<'_>, UserError> {
    let missing = || UserError::MissingFields("All fields are required");
    let (name_field, name) = request.display_name().ok_or_else(missing)?;
    let email = non_empty(request.email.as_deref()).ok_or_else(missing)?;
    let password = non_empty(request.password.as_deref()).ok_or_else(missing)?;

    Ok(ValidSignup {
        name_field,
        name,
        email,
        password,
    })
}

/// Check that a login request has both email and password.
///
/// # Errors
///
/// Returns `UserError::MissingFields` if either is empty.
pub fn validate_login(request: &LoginRequest) -> Result<(&str, &str), UserError> {
    match (
        non_empty(request.email.as_deref()),
        non_empty(request.password.as_deref()),
    ) {
        (Some(email), Some(password)) => Ok((email, password)),
        _ => Err(UserError::MissingFields("Email and password are required")),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, UserError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| UserError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), UserError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| UserError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| UserError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::db::MemoryStore;

    fn service() -> (UserService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let service = UserService::new(store.clone(), Arc::new(SystemClock::new()));
        (service, store)
    }

    fn signup_request(username: &str, email: &str, password: &str) -> SignupRequest {
        SignupRequest {
            username: Some(username.to_string()),
            email: Some(email.to_string()),
            password: Some(password.to_string()),
            ..SignupRequest::default()
        }
    }

    fn login_request(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(UserError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        assert_ne!(hash_password("p").unwrap(), hash_password("p").unwrap());
    }

    #[test]
    fn test_plaintext_is_not_a_valid_hash() {
        assert!(matches!(
            verify_password("p", "p"),
            Err(UserError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_dummy_hash_costs_the_same_as_a_real_one() {
        let dummy = PasswordHash::new(DUMMY_PASSWORD_HASH).unwrap();
        let real_hash = hash_password("secret").unwrap();
        let real = PasswordHash::new(&real_hash).unwrap();

        assert_eq!(dummy.algorithm, real.algorithm);
        assert_eq!(dummy.version, real.version);
        assert_eq!(dummy.params, real.params);
        assert!(matches!(
            verify_password("secret", DUMMY_PASSWORD_HASH),
            Err(UserError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_display_name_prefers_username() {
        let request = SignupRequest {
            username: Some("u1".to_string()),
            name: Some("User One".to_string()),
            ..SignupRequest::default()
        };
        assert_eq!(request.display_name(), Some(("username", "u1")));

        let request = SignupRequest {
            username: Some(String::new()),
            name: Some("User One".to_string()),
            ..SignupRequest::default()
        };
        assert_eq!(request.display_name(), Some(("name", "User One")));
    }

    #[test]
    fn test_validate_signup_requires_every_field() {
        let missing = [
            signup_request("", "a@b.c", "p"),
            signup_request("u", "", "p"),
            signup_request("u", "a@b.c", ""),
            SignupRequest::default(),
        ];
        for request in &missing {
            let err = validate_signup(request).unwrap_err();
            assert_eq!(err.to_string(), "All fields are required");
        }
    }

    #[test]
    fn test_validate_login_requires_both_fields() {
        for request in [login_request("", "p"), login_request("a@b.c", "")] {
            let err = validate_login(&request).unwrap_err();
            assert_eq!(err.to_string(), "Email and password are required");
        }
        assert_eq!(
            validate_login(&login_request("a@b.c", "p")).unwrap(),
            ("a@b.c", "p")
        );
    }

    #[test]
    fn test_request_debug_redacts_password() {
        let debug = format!("{:?}", signup_request("u", "a@b.c", "hunter2"));
        assert!(!debug.contains("hunter2"));
        let debug = format!("{:?}", login_request("a@b.c", "hunter2"));
        assert!(!debug.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_signup_then_login() {
        let (service, store) = service();

        let created = service
            .signup(&signup_request("u1", "u1@x.com", "p"))
            .await
            .unwrap();

        // Stored hashed, never plaintext
        let stored = store
            .find_one(Collection::Users, &Filter::Id(created.id.clone()))
            .await
            .unwrap()
            .unwrap();
        assert_ne!(stored.get_str(PASSWORD_FIELD), Some("p"));
        assert_eq!(stored.get_str("username"), Some("u1"));

        let user = service
            .login(&login_request("u1@x.com", "p"))
            .await
            .unwrap();
        assert_eq!(user.id(), Some(created.id.as_str()));
        assert_eq!(user.get_str("email"), Some("u1@x.com"));
        assert!(!user.contains_key(PASSWORD_FIELD));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let (service, _) = service();
        service
            .signup(&signup_request("u1", "u1@x.com", "p"))
            .await
            .unwrap();

        let wrong_password = service
            .login(&login_request("u1@x.com", "nope"))
            .await
            .unwrap_err();
        let unknown_email = service
            .login(&login_request("ghost@x.com", "p"))
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, UserError::InvalidCredentials));
        assert!(matches!(unknown_email, UserError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[tokio::test]
    async fn test_signup_duplicate_email() {
        let (service, _) = service();
        service
            .signup(&signup_request("u1", "dup@x.com", "p"))
            .await
            .unwrap();

        let err = service
            .signup(&signup_request("u2", "dup@x.com", "q"))
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::UserAlreadyExists));
    }

    #[tokio::test]
    async fn test_create_profile() {
        let (service, _) = service();
        let request = ProfileRequest {
            name: Some("Ada".to_string()),
            email: Some("ada@x.com".to_string()),
        };

        let user = service.create_profile(&request).await.unwrap();
        assert!(user.id().is_some());
        assert_eq!(user.get_str("name"), Some("Ada"));
        assert!(user.get_str(CREATED_AT_FIELD).is_some());

        let err = service.create_profile(&request).await.unwrap_err();
        assert!(matches!(err, UserError::UserAlreadyExists));

        let other = ProfileRequest {
            name: Some("Ada".to_string()),
            email: Some("ada2@x.com".to_string()),
        };
        let second = service.create_profile(&other).await.unwrap();
        assert_ne!(second.id(), user.id());
    }

    #[tokio::test]
    async fn test_create_profile_requires_name_and_email() {
        let (service, _) = service();
        let err = service
            .create_profile(&ProfileRequest {
                name: Some("Ada".to_string()),
                email: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Name and email are required");
    }

    #[tokio::test]
    async fn test_profile_without_password_cannot_login() {
        let (service, _) = service();
        service
            .create_profile(&ProfileRequest {
                name: Some("Ada".to_string()),
                email: Some("ada@x.com".to_string()),
            })
            .await
            .unwrap();

        assert!(matches!(
            service.login(&login_request("ada@x.com", "anything")).await,
            Err(UserError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_concurrent_signups_with_same_email() {
        let (service, store) = service();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let service = service.clone();
                tokio::spawn(async move {
                    service
                        .signup(&signup_request(&format!("u{i}"), "race@x.com", "p"))
                        .await
                })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(e) => assert!(matches!(e, UserError::UserAlreadyExists)),
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(store.count_all(Collection::Users).await.unwrap(), 1);
    }
}
