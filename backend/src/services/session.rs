use actix_web::cookie::{Cookie, time::Duration as CookieDuration};
use actix_web::{FromRequest, HttpRequest, dev::Payload, error::InternalError, web};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::future::{Ready, ready};
use std::sync::Mutex;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "session_id";

/// Sessions live for 24 hours from login.
const SESSION_TTL_HOURS: i64 = 24;

struct SessionEntry {
    user_id: i32,
    expires_at: DateTime<Utc>,
}

/// Server-side in-memory session store keyed by opaque UUID tokens.
/// Expired entries are pruned lazily on access.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, SessionEntry>>,
}

impl SessionStore {
    pub fn new() -> Self {
        SessionStore {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a session for the user and returns its token.
    pub fn create(&self, user_id: i32) -> String {
        let token = Uuid::new_v4().to_string();
        let mut sessions = self.lock();
        let now = Utc::now();
        sessions.retain(|_, entry| entry.expires_at > now);
        sessions.insert(
            token.clone(),
            SessionEntry {
                user_id,
                expires_at: now + Duration::hours(SESSION_TTL_HOURS),
            },
        );
        token
    }

    /// Resolves a token to its user id, removing the session if expired.
    pub fn resolve(&self, token: &str) -> Option<i32> {
        let mut sessions = self.lock();
        match sessions.get(token) {
            Some(entry) if entry.expires_at > Utc::now() => Some(entry.user_id),
            Some(_) => {
                sessions.remove(token);
                None
            }
            None => None,
        }
    }

    pub fn destroy(&self, token: &str) {
        self.lock().remove(token);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, SessionEntry>> {
        // Sessions are best-effort; recover the map if a panic poisoned it.
        match self.sessions.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Session cookie sent to the browser on login/register.
pub fn session_cookie(token: &str) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token.to_string())
        .path("/")
        .http_only(true)
        .max_age(CookieDuration::hours(SESSION_TTL_HOURS))
        .finish()
}

/// Expired cookie that instructs the browser to drop the session.
pub fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, "");
    cookie.set_path("/");
    cookie.make_removal();
    cookie
}

fn unauthorized() -> actix_web::Error {
    let response = actix_web::HttpResponse::Unauthorized()
        .json(serde_json::json!({"message": "Unauthorized"}));
    InternalError::from_response("Unauthorized", response).into()
}

/// Authenticated user extracted from the session cookie.
pub struct SessionUser {
    pub user_id: i32,
}

impl FromRequest for SessionUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(store) = req.app_data::<web::Data<SessionStore>>() else {
            return ready(Err(unauthorized()));
        };

        let Some(cookie) = req.cookie(SESSION_COOKIE) else {
            return ready(Err(unauthorized()));
        };

        match store.resolve(cookie.value()) {
            Some(user_id) => ready(Ok(SessionUser { user_id })),
            None => ready(Err(unauthorized())),
        }
    }
}
