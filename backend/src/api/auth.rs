use crate::api::internal_error;
use crate::models::NewUser;
use crate::services::auth::{hash_password, verify_password};
use crate::services::session::{
    SESSION_COOKIE, SessionStore, SessionUser, removal_cookie, session_cookie,
};
use crate::storage::{Storage, StorageError};
use actix_web::{HttpRequest, HttpResponse, Responder, get, post, web};
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub name: String,
    pub email: String,
}

/// Public projection of a user; the password hash never leaves the server.
#[derive(Serialize)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub name: String,
    pub email: String,
}

impl From<crate::models::User> for UserResponse {
    fn from(user: crate::models::User) -> Self {
        UserResponse {
            id: user.id,
            username: user.username,
            name: user.name,
            email: user.email,
        }
    }
}

fn validate_credentials(username: &str, password: &str) -> Vec<String> {
    let mut errors = Vec::new();
    if username.chars().count() < 3 || username.chars().count() > 50 {
        errors.push("username must be between 3 and 50 characters".to_string());
    }
    if password.chars().count() < 6 || password.chars().count() > 100 {
        errors.push("password must be between 6 and 100 characters".to_string());
    }
    errors
}

fn validate_register(body: &RegisterRequest) -> Vec<String> {
    let mut errors = validate_credentials(&body.username, &body.password);
    if body.name.trim().is_empty() {
        errors.push("name is required".to_string());
    }
    if !body.email.contains('@') {
        errors.push("email must be a valid email address".to_string());
    }
    errors
}

#[post("/login")]
pub async fn login(
    storage: web::Data<dyn Storage>,
    sessions: web::Data<SessionStore>,
    body: web::Json<LoginRequest>,
) -> impl Responder {
    let errors = validate_credentials(&body.username, &body.password);
    if !errors.is_empty() {
        return HttpResponse::BadRequest().json(serde_json::json!({"message": errors}));
    }

    let user = match storage.get_user_by_username(&body.username).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            return HttpResponse::Unauthorized()
                .json(serde_json::json!({"message": "Invalid username or password"}));
        }
        Err(e) => return internal_error("Login lookup failed", e),
    };

    match verify_password(&body.password, &user.password) {
        Ok(true) => {
            let token = sessions.create(user.id);
            HttpResponse::Ok()
                .cookie(session_cookie(&token))
                .json(UserResponse::from(user))
        }
        _ => HttpResponse::Unauthorized()
            .json(serde_json::json!({"message": "Invalid username or password"})),
    }
}

#[post("/register")]
pub async fn register(
    storage: web::Data<dyn Storage>,
    sessions: web::Data<SessionStore>,
    body: web::Json<RegisterRequest>,
) -> impl Responder {
    let errors = validate_register(&body);
    if !errors.is_empty() {
        return HttpResponse::BadRequest().json(serde_json::json!({"message": errors}));
    }

    let hashed = match hash_password(&body.password) {
        Ok(h) => h,
        Err(e) => return internal_error("Error hashing password", e),
    };

    let body = body.into_inner();
    match storage
        .create_user(NewUser {
            username: body.username,
            password: hashed,
            name: body.name,
            email: body.email,
        })
        .await
    {
        Ok(user) => {
            // Registration logs the new user straight in.
            let token = sessions.create(user.id);
            HttpResponse::Created()
                .cookie(session_cookie(&token))
                .json(UserResponse::from(user))
        }
        Err(StorageError::DuplicateUsername(_)) => {
            HttpResponse::BadRequest().json(serde_json::json!({"message": "Username already taken"}))
        }
        Err(e) => internal_error("Error creating user", e),
    }
}

#[post("/logout")]
pub async fn logout(
    req: HttpRequest,
    sessions: web::Data<SessionStore>,
    _user: SessionUser,
) -> impl Responder {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        sessions.destroy(cookie.value());
    }
    HttpResponse::Ok()
        .cookie(removal_cookie())
        .json(serde_json::json!({"message": "Logged out successfully"}))
}

/// Profile of the currently logged-in user
#[get("/api/user")]
pub async fn current_user(storage: web::Data<dyn Storage>, user: SessionUser) -> impl Responder {
    match storage.get_user(user.user_id).await {
        Ok(Some(u)) => HttpResponse::Ok().json(UserResponse::from(u)),
        Ok(None) => {
            HttpResponse::NotFound().json(serde_json::json!({"message": "User not found"}))
        }
        Err(e) => internal_error("Error fetching user", e),
    }
}
