use std::collections::HashMap;
use std::time::{Duration, Instant};

use rand::Rng;

const SESSION_DURATION: Duration = Duration::from_secs(8 * 3600);

#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user_id: u64,
    pub created_at: Instant,
}

impl Session {
    pub fn new(user_id: u64) -> Self {
        Session {
            token: generate_session_token(),
            user_id,
            created_at: Instant::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > SESSION_DURATION
    }
}

pub struct SessionStore {
    sessions: HashMap<String, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        SessionStore {
            sessions: HashMap::new(),
        }
    }

    pub fn create(&mut self, user_id: u64) -> Session {
        self.cleanup_expired();
        let session = Session::new(user_id);
        self.sessions.insert(session.token.clone(), session.clone());
        session
    }

    /// User id behind a live session token.
    pub fn validate(&self, token: &str) -> Option<u64> {
        self.sessions
            .get(token)
            .filter(|s| !s.is_expired())
            .map(|s| s.user_id)
    }

    pub fn remove(&mut self, token: &str) {
        self.sessions.remove(token);
    }

    fn cleanup_expired(&mut self) {
        self.sessions.retain(|_, s| !s.is_expired());
    }
}

fn generate_session_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: Vec<u8> = (0..32).map(|_| rng.r#gen()).collect();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
