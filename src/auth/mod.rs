use thiserror::Error;
use tracing::debug;

use crate::api::{ApiClient, ApiError};
use crate::session::{Session, SessionStore};
use crate::validate::{
    validate_display_name, validate_email, validate_password, ValidationError,
};

/// Confirmation shown after a successful registration. The client does not
/// keep the returned token; the user logs in explicitly.
pub const REGISTERED_MESSAGE: &str = "Registration successful! Please log in.";

pub const INVALID_CREDENTIALS: &str = "Invalid credentials";
pub const EMAIL_CONFLICT_MESSAGE: &str = "This email is already registered";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Username,
    Email,
    Password,
}

impl Field {
    pub fn label(&self) -> &'static str {
        match self {
            Field::Username => "username",
            Field::Email => "email",
            Field::Password => "password",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

#[derive(Debug)]
pub struct RegistrationForm {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// Client-side validation failed; nothing was sent.
    #[error("validation failed")]
    Invalid(Vec<FieldError>),
    /// The backend rejected the request. `field_errors` carries any
    /// message we could map to a specific field.
    #[error("{banner}")]
    Rejected {
        banner: String,
        field_errors: Vec<FieldError>,
    },
    #[error(transparent)]
    Transport(anyhow::Error),
}

fn collect(checks: Vec<(Field, Result<(), ValidationError>)>) -> Vec<FieldError> {
    checks
        .into_iter()
        .filter_map(|(field, result)| {
            result.err().map(|e| FieldError {
                field,
                message: e.to_string(),
            })
        })
        .collect()
}

pub fn validate_registration(form: &RegistrationForm) -> Vec<FieldError> {
    collect(vec![
        (Field::Username, validate_display_name(&form.username)),
        (Field::Email, validate_email(&form.email)),
        (Field::Password, validate_password(&form.password, true)),
    ])
}

pub fn validate_login(form: &LoginForm) -> Vec<FieldError> {
    collect(vec![
        (Field::Username, validate_display_name(&form.username)),
        (Field::Password, validate_password(&form.password, false)),
    ])
}

/// Duplicate-email heuristic: the backend reports collisions only as free
/// text, so we look for the word "email" in it. See DESIGN.md.
pub fn email_conflict(detail: &str) -> bool {
    detail.to_lowercase().contains("email")
}

/// Validate then POST /register/ exactly once.
pub fn register(client: &ApiClient, form: &RegistrationForm) -> Result<(), AuthError> {
    let errors = validate_registration(form);
    if !errors.is_empty() {
        return Err(AuthError::Invalid(errors));
    }

    match client.register(&form.username, &form.email, &form.password) {
        Ok(_) => Ok(()),
        Err(ApiError::Rejected { message, .. }) => {
            let field_errors = if email_conflict(&message) {
                vec![FieldError {
                    field: Field::Email,
                    message: EMAIL_CONFLICT_MESSAGE.to_string(),
                }]
            } else {
                Vec::new()
            };
            Err(AuthError::Rejected {
                banner: message,
                field_errors,
            })
        }
        Err(e) => Err(AuthError::Transport(e.into())),
    }
}

/// Validate then POST /login/ exactly once; a success is persisted before
/// returning. Every rejection maps to the same "Invalid credentials" copy.
pub fn login(
    client: &ApiClient,
    store: &SessionStore,
    form: &LoginForm,
) -> Result<Session, AuthError> {
    let errors = validate_login(form);
    if !errors.is_empty() {
        return Err(AuthError::Invalid(errors));
    }

    match client.login(&form.username, &form.password) {
        Ok(resp) => {
            let session = Session::new(resp.token, resp.user_id, resp.username);
            store
                .save(&session)
                .map_err(AuthError::Transport)?;
            Ok(session)
        }
        Err(ApiError::Rejected { message, .. }) => {
            debug!("Login rejected: {message}");
            Err(AuthError::Rejected {
                banner: INVALID_CREDENTIALS.to_string(),
                field_errors: vec![
                    FieldError {
                        field: Field::Username,
                        message: INVALID_CREDENTIALS.to_string(),
                    },
                    FieldError {
                        field: Field::Password,
                        message: INVALID_CREDENTIALS.to_string(),
                    },
                ],
            })
        }
        Err(e) => Err(AuthError::Transport(e.into())),
    }
}

/// Two independent steps: clear local state (always), then tell the server
/// (best-effort). Returns whether a session was actually cleared.
pub fn logout(client: &ApiClient, store: &SessionStore) -> anyhow::Result<bool> {
    let session = store.load().unwrap_or_default();
    let cleared = store.clear()?;
    if let Some(s) = session {
        client.logout(&s.token);
    }
    Ok(cleared)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_collects_all_field_errors() {
        let form = RegistrationForm {
            username: " ".to_string(),
            email: "not-an-email".to_string(),
            password: "short".to_string(),
        };
        let errors = validate_registration(&form);
        let fields: Vec<Field> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, [Field::Username, Field::Email, Field::Password]);
        assert_eq!(errors[1].message, "Invalid email format");
    }

    #[test]
    fn valid_registration_has_no_errors() {
        let form = RegistrationForm {
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "longenough".to_string(),
        };
        assert!(validate_registration(&form).is_empty());
    }

    #[test]
    fn login_does_not_enforce_password_length() {
        let form = LoginForm {
            username: "ada".to_string(),
            password: "short".to_string(),
        };
        assert!(validate_login(&form).is_empty());
    }

    #[test]
    fn email_conflict_heuristic_matches_free_text() {
        assert!(email_conflict("Email already exists"));
        assert!(email_conflict("a user with this email is registered"));
        assert!(!email_conflict("username taken"));
    }

    #[test]
    fn logout_clears_locally_without_a_server() {
        // Unreachable backend: the local clear must still succeed.
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open(dir.path());
        store
            .save(&Session::new("tok".to_string(), 1, "ada".to_string()))
            .unwrap();

        let client = ApiClient::new("http://127.0.0.1:1", None);
        assert!(logout(&client, &store).unwrap());
        assert_eq!(store.load().unwrap(), None);
        // Second logout is a no-op, not an error.
        assert!(!logout(&client, &store).unwrap());
    }
}
