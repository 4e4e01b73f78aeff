use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{AuthError, AuthProvider};
use crate::config::SessionConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Technician,
    Customer,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Technician => "technician",
            Role::Customer => "customer",
            Role::Admin => "admin",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub role: Role,
}

impl Session {
    pub fn is_technician(&self) -> bool {
        self.role == Role::Technician
    }
}

/// Identity fixed at startup, for the command-line front end where the
/// technician is whoever the configuration names.
#[derive(Debug, Clone)]
pub struct StaticAuthProvider {
    session: Session,
}

impl StaticAuthProvider {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(Session {
            user_id: config.user_id.clone(),
            role: config.role,
        })
    }
}

#[async_trait]
impl AuthProvider for StaticAuthProvider {
    async fn current_session(&self) -> Result<Session, AuthError> {
        if self.session.user_id.trim().is_empty() {
            return Err(AuthError::NoSession);
        }
        Ok(self.session.clone())
    }
}
