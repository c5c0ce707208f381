//! Shared-secret gate in front of the admin dashboard.

use crate::error::QuizError;

/// Login state for the single admin role.
#[derive(Debug)]
pub struct AdminGate {
    secret: String,
    logged_in: bool,
}

impl AdminGate {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            logged_in: false,
        }
    }

    /// Log in if `password` matches the configured secret exactly.
    pub fn login(&mut self, password: &str) -> Result<(), QuizError> {
        if constant_time_eq(password.as_bytes(), self.secret.as_bytes()) {
            self.logged_in = true;
            tracing::info!("admin logged in");
            Ok(())
        } else {
            tracing::warn!("admin login rejected");
            Err(QuizError::Validation("invalid password".into()))
        }
    }

    pub fn logout(&mut self) {
        if self.logged_in {
            tracing::info!("admin logged out");
        }
        self.logged_in = false;
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_and_logout() {
        let mut gate = AdminGate::new("admin123");
        assert!(!gate.is_logged_in());
        gate.login("admin123").unwrap();
        assert!(gate.is_logged_in());
        gate.logout();
        assert!(!gate.is_logged_in());
    }

    #[test]
    fn wrong_password_stays_logged_out() {
        let mut gate = AdminGate::new("admin123");
        assert!(matches!(gate.login("admin12"), Err(QuizError::Validation(_))));
        assert!(gate.login("Admin123").is_err());
        assert!(gate.login("").is_err());
        assert!(!gate.is_logged_in());
    }
}
