// Local authentication
// Family member accounts live in the same SQLite file as the songs;
// passwords are stored as salted SHA-256 digests and sessions are held
// in memory for the lifetime of the process.

use anyhow::{anyhow, Result};
use parking_lot::Mutex;
use rand::RngCore;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::db::connection::DatabaseConnection;
use crate::db::operations::DbOperations;

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub user_id: i64,
    pub email: String,
}

pub struct AuthManager {
    current: Mutex<Option<Session>>,
}

impl AuthManager {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(None),
        }
    }

    pub fn register(&self, db: &DatabaseConnection, email: &str, password: &str) -> Result<Session> {
        let email = email.trim().to_lowercase();
        if email.is_empty() {
            return Err(anyhow!("email is required"));
        }
        if password.len() < 6 {
            return Err(anyhow!("password must be at least 6 characters"));
        }

        let user = DbOperations::insert_user(db, &email, &hash_password(password, &new_salt()))?;
        eprintln!("[Auth] Registered {}", user.email);
        Ok(self.start_session(user.id, user.email))
    }

    pub fn sign_in(&self, db: &DatabaseConnection, email: &str, password: &str) -> Result<Session> {
        let email = email.trim().to_lowercase();
        let Some((user_id, stored)) = DbOperations::get_user_credentials(db, &email)? else {
            return Err(anyhow!("unknown email or wrong password"));
        };
        if !verify_password(password, &stored) {
            return Err(anyhow!("unknown email or wrong password"));
        }

        eprintln!("[Auth] Signed in {}", email);
        Ok(self.start_session(user_id, email))
    }

    pub fn sign_out(&self) {
        if let Some(session) = self.current.lock().take() {
            eprintln!("[Auth] Signed out {}", session.email);
        }
    }

    pub fn current_session(&self) -> Option<Session> {
        self.current.lock().clone()
    }

    /// The signed-in user's id, or an error for commands that require one.
    pub fn require_user(&self) -> Result<i64> {
        self.current
            .lock()
            .as_ref()
            .map(|s| s.user_id)
            .ok_or_else(|| anyhow!("not signed in"))
    }

    fn start_session(&self, user_id: i64, email: String) -> Session {
        let session = Session {
            token: new_token(),
            user_id,
            email,
        };
        *self.current.lock() = Some(session.clone());
        session
    }
}

/// Digest format: `<salt-hex>$<sha256(salt || password)-hex>`.
fn hash_password(password: &str, salt: &[u8; 16]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    format!("{}${}", to_hex(salt), to_hex(&hasher.finalize()))
}

fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, _)) = stored.split_once('$') else {
        return false;
    };
    let Some(salt) = from_hex_16(salt_hex) else {
        return false;
    };
    hash_password(password, &salt) == stored
}

fn new_salt() -> [u8; 16] {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

fn new_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    to_hex(&bytes)
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn from_hex_16(hex: &str) -> Option<[u8; 16]> {
    if hex.len() != 32 {
        return None;
    }
    let mut out = [0u8; 16];
    for (i, chunk) in out.iter_mut().enumerate() {
        *chunk = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> DatabaseConnection {
        DatabaseConnection::open_in_memory().unwrap()
    }

    #[test]
    fn test_password_hash_round_trip() {
        let stored = hash_password("chanson", &new_salt());
        assert!(verify_password("chanson", &stored));
        assert!(!verify_password("Chanson", &stored));
        assert!(!verify_password("", &stored));
    }

    #[test]
    fn test_register_then_sign_in() {
        let db = test_db();
        let auth = AuthManager::new();

        let session = auth.register(&db, "Papa@Example.com", "secret1").unwrap();
        assert_eq!(session.email, "papa@example.com");
        assert!(auth.current_session().is_some());

        auth.sign_out();
        assert!(auth.current_session().is_none());
        assert!(auth.require_user().is_err());

        let session = auth.sign_in(&db, "papa@example.com", "secret1").unwrap();
        assert_eq!(auth.require_user().unwrap(), session.user_id);
    }

    #[test]
    fn test_wrong_password_rejected() {
        let db = test_db();
        let auth = AuthManager::new();
        auth.register(&db, "papa@example.com", "secret1").unwrap();
        auth.sign_out();

        assert!(auth.sign_in(&db, "papa@example.com", "wrong").is_err());
        assert!(auth.sign_in(&db, "nobody@example.com", "secret1").is_err());
        assert!(auth.current_session().is_none());
    }

    #[test]
    fn test_short_password_rejected() {
        let db = test_db();
        let auth = AuthManager::new();
        assert!(auth.register(&db, "papa@example.com", "abc").is_err());
    }

    #[test]
    fn test_tokens_are_unique() {
        assert_ne!(new_token(), new_token());
    }
}
