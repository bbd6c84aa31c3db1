use chrono::{DateTime, NaiveDate, Utc};
use validator::ValidateEmail;

use super::error::{DomainError, FieldErrors};
use super::patch::{Patch, merge};

/// Outward-safe view of a user. The password digest lives in
/// [`crate::data::user_repository::UserCredentials`] only.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct User {
    pub(crate) id: i64,
    pub(crate) email: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) birthday: Option<NaiveDate>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub(crate) struct RegisterRequest {
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) email: String,
    pub(crate) password: String,
    pub(crate) birthday: Option<NaiveDate>,
}

impl RegisterRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        let first_name = normalize_name(&self.first_name);
        let last_name = normalize_name(&self.last_name);
        let email = normalize_email(&self.email);
        let password = check_password(&self.password);

        match (first_name, last_name, email, password) {
            (Ok(first_name), Ok(last_name), Ok(email), Ok(())) => Ok(Self {
                first_name,
                last_name,
                email,
                password: self.password,
                birthday: self.birthday,
            }),
            (first_name, last_name, email, password) => Err(FieldErrors::default()
                .with("firstName", first_name.err())
                .with("lastName", last_name.err())
                .with("email", email.err())
                .with("password", password.err())
                .into()),
        }
    }
}

/// Full replacement of a profile. A missing birthday clears it, a missing
/// password keeps the current one.
#[derive(Debug, Clone)]
pub(crate) struct UpdateUserRequest {
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) email: String,
    pub(crate) birthday: Option<NaiveDate>,
    pub(crate) password: Option<String>,
}

impl UpdateUserRequest {
    pub(crate) fn validate(self) -> Result<(UserChanges, Option<String>), DomainError> {
        let first_name = normalize_name(&self.first_name);
        let last_name = normalize_name(&self.last_name);
        let email = normalize_email(&self.email);
        let password = self.password.filter(|password| !password.is_empty());
        let password_check = password.as_deref().map(check_password).transpose();

        match (first_name, last_name, email, password_check) {
            (Ok(first_name), Ok(last_name), Ok(email), Ok(_)) => Ok((
                UserChanges {
                    first_name: Some(first_name),
                    last_name: Some(last_name),
                    email: Some(email),
                    birthday: Patch::from(self.birthday),
                },
                password,
            )),
            (first_name, last_name, email, password_check) => Err(FieldErrors::default()
                .with("firstName", first_name.err())
                .with("lastName", last_name.err())
                .with("email", email.err())
                .with("password", password_check.err())
                .into()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PatchUserRequest {
    pub(crate) first_name: Patch<String>,
    pub(crate) last_name: Patch<String>,
    pub(crate) email: Patch<String>,
    pub(crate) birthday: Patch<NaiveDate>,
}

impl PatchUserRequest {
    pub(crate) fn validate(self) -> Result<UserChanges, DomainError> {
        let first_name = required_patch(self.first_name, normalize_name);
        let last_name = required_patch(self.last_name, normalize_name);
        let email = required_patch(self.email, normalize_email);

        match (first_name, last_name, email) {
            (Ok(first_name), Ok(last_name), Ok(email)) => Ok(UserChanges {
                first_name,
                last_name,
                email,
                birthday: self.birthday,
            }),
            (first_name, last_name, email) => Err(FieldErrors::default()
                .with("firstName", first_name.err())
                .with("lastName", last_name.err())
                .with("email", email.err())
                .into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct UserChanges {
    pub(crate) first_name: Option<String>,
    pub(crate) last_name: Option<String>,
    pub(crate) email: Option<String>,
    pub(crate) birthday: Patch<NaiveDate>,
}

#[derive(Debug, Clone)]
pub(crate) struct LoginRequest {
    pub(crate) email: String,
    pub(crate) password: String,
}

impl LoginRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        let email = self.email.trim().to_lowercase();
        if email.is_empty() {
            return Err(FieldErrors::single("email", "must not be blank").into());
        }
        if self.password.is_empty() {
            return Err(FieldErrors::single("password", "must not be empty").into());
        }
        Ok(Self {
            email,
            password: self.password,
        })
    }
}

impl User {
    pub(crate) fn new(
        id: i64,
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        birthday: Option<NaiveDate>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if id <= 0 {
            return Err(FieldErrors::single("id", "must be > 0").into());
        }
        let email = normalize_email(&email.into())
            .map_err(|message| DomainError::from(FieldErrors::single("email", message)))?;

        Ok(Self {
            id,
            email,
            first_name: first_name.into(),
            last_name: last_name.into(),
            birthday,
            created_at,
            updated_at,
        })
    }

    pub(crate) fn apply(&mut self, changes: UserChanges) {
        merge(&mut self.first_name, changes.first_name);
        merge(&mut self.last_name, changes.last_name);
        merge(&mut self.email, changes.email);
        changes.birthday.apply_to(&mut self.birthday);
    }
}

fn required_patch(
    patch: Patch<String>,
    normalize: fn(&str) -> Result<String, &'static str>,
) -> Result<Option<String>, &'static str> {
    patch
        .into_required()
        .and_then(|value| value.as_deref().map(normalize).transpose())
}

fn normalize_name(name: &str) -> Result<String, &'static str> {
    let name = name.trim();
    if name.is_empty() {
        return Err("must not be blank");
    }
    let len = name.chars().count();
    if !(2..=50).contains(&len) {
        return Err("must be 2..50 chars");
    }
    Ok(name.to_string())
}

fn normalize_email(email: &str) -> Result<String, &'static str> {
    let email = email.trim().to_lowercase();
    if email.is_empty() {
        return Err("must not be blank");
    }
    if !email.validate_email() {
        return Err("must be a valid email");
    }
    Ok(email)
}

fn check_password(password: &str) -> Result<(), &'static str> {
    let len = password.chars().count();
    if !(8..=128).contains(&len) {
        return Err("must be 8..128 chars");
    }
    Ok(())
}
