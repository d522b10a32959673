//! # Session Context
//!
//! Who is operating the console. Passed explicitly to whatever needs it
//! (new documents, notifications); nothing reads it from ambient storage.
//!
//! Authentication itself happens upstream. `suppress_auto_login` only
//! records that the operator signed out, so the front end must not sign
//! them straight back in.

use serde::{Deserialize, Serialize};

use docket_core::validation::validate_display_name;
use docket_core::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub user_email: String,
    pub display_name: Option<String>,
    pub suppress_auto_login: bool,
}

impl SessionContext {
    pub fn new(user_email: impl Into<String>, display_name: Option<String>) -> Self {
        SessionContext {
            user_email: user_email.into(),
            display_name,
            suppress_auto_login: false,
        }
    }

    /// Rejects an empty or implausible email and an unusable display name.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let email = self.user_email.trim();
        if email.is_empty() {
            return Err(ValidationError::Required {
                field: "user_email".to_string(),
            });
        }
        if !email.contains('@') {
            return Err(ValidationError::InvalidFormat {
                field: "user_email".to_string(),
                reason: "must be an email address".to_string(),
            });
        }
        if let Some(name) = &self.display_name {
            validate_display_name(name)?;
        }
        Ok(())
    }

    /// `"Name (email)"`, or just the email.
    pub fn actor(&self) -> String {
        match &self.display_name {
            Some(name) if !name.trim().is_empty() => format!("{} ({})", name.trim(), self.user_email),
            _ => self.user_email.clone(),
        }
    }

    pub fn sign_out(&mut self) {
        self.suppress_auto_login = true;
    }

    /// An explicit sign-in lifts the suppression.
    pub fn sign_in(&mut self, user_email: impl Into<String>, display_name: Option<String>) {
        self.user_email = user_email.into();
        self.display_name = display_name;
        self.suppress_auto_login = false;
    }
}
