use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// A registered user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

/// Fields required to register an account
#[derive(Debug, Clone, Deserialize)]
pub struct NewAccount {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl NewAccount {
    /// Validates the request and normalizes the email address
    pub fn validated(self) -> AppResult<Self> {
        let email = normalize_email(&self.email)?;
        let first_name = self.first_name.trim().to_string();
        let last_name = self.last_name.trim().to_string();

        if first_name.is_empty() || last_name.is_empty() {
            return Err(AppError::InvalidInput(
                "first_name and last_name are required".to_string(),
            ));
        }

        Ok(Self {
            email,
            first_name,
            last_name,
        })
    }
}

/// Trims the address and lowercases its domain part
pub fn normalize_email(email: &str) -> AppResult<String> {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
            Ok(format!("{}@{}", local, domain.to_lowercase()))
        }
        _ => Err(AppError::InvalidInput(
            "A valid email address is required".to_string(),
        )),
    }
}
