//! Registration input rules.
//!
//! Field-level checks run through `validator`; uniqueness of the username and
//! display name needs the user store and is appended by the caller as extra
//! [`FieldViolation`]s.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._]+$").expect("valid regex"));

/// Characters accepted as the "symbol" class of the password rule.
const PASSWORD_SYMBOLS: &str = "`~!@#$%^&*()-_=+{}[]|\\;:'\",<.>/?";

/// Wire names of the registration fields, in the order violations are reported.
const FIELD_ORDER: [(&str, &str); 4] = [
    ("username", "username"),
    ("password", "password"),
    ("confirm_password", "confirmPassword"),
    ("display_name", "displayName"),
];

/// A single field-level rule violation returned in `{ "errors": [...] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Body of `POST /register`. Missing fields deserialize as empty strings so
/// they are reported as violations instead of a parse failure.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct Registration {
    #[validate(
        length(
            min = 1,
            max = 20,
            message = "Username must be between 1 and 20 characters long."
        ),
        custom(function = "username_charset")
    )]
    pub username: String,

    #[validate(
        length(
            min = 6,
            max = 50,
            message = "Password must contain between 6 and 50 characters."
        ),
        custom(function = "password_complexity")
    )]
    pub password: String,

    #[validate(must_match(other = "password", message = "Passwords must match."))]
    pub confirm_password: String,

    #[validate(length(
        min = 1,
        max = 20,
        message = "Display name must be between 1 and 20 characters long."
    ))]
    pub display_name: String,
}

impl Registration {
    /// Trim the free-text fields. Passwords are kept verbatim.
    pub fn normalized(mut self) -> Self {
        self.username = self.username.trim().to_string();
        self.display_name = self.display_name.trim().to_string();
        self
    }

    /// Run every field rule and collect the violations in field order.
    pub fn violations(&self) -> Vec<FieldViolation> {
        match self.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => flatten(&errors),
        }
    }
}

/// Position of a wire field name in the reporting order; unknown fields sort last.
pub fn field_rank(field: &str) -> usize {
    FIELD_ORDER
        .iter()
        .position(|(_, wire_name)| *wire_name == field)
        .unwrap_or(FIELD_ORDER.len())
}

fn username_charset(username: &str) -> Result<(), ValidationError> {
    if USERNAME_RE.is_match(username) {
        return Ok(());
    }
    Err(ValidationError::new("username_charset").with_message(
        "Username must only contain letters of the alphabet, numbers, '.' and/or '_'.".into(),
    ))
}

fn password_complexity(password: &str) -> Result<(), ValidationError> {
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password.chars().any(|c| PASSWORD_SYMBOLS.contains(c));

    if has_lower && has_upper && has_digit && has_symbol {
        return Ok(());
    }
    Err(ValidationError::new("password_complexity").with_message(
        "Password must contain at least: 1 uppercase letter, 1 lowercase letter, 1 number and 1 symbol."
            .into(),
    ))
}

fn flatten(errors: &ValidationErrors) -> Vec<FieldViolation> {
    let by_field = errors.field_errors();
    let mut violations = Vec::new();

    for (rust_name, wire_name) in FIELD_ORDER {
        let Some(field_errors) = by_field.get(rust_name).or_else(|| by_field.get(wire_name))
        else {
            continue;
        };
        for error in field_errors.iter() {
            let message = error
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| error.code.to_string());
            violations.push(FieldViolation::new(wire_name, message));
        }
    }

    violations
}
