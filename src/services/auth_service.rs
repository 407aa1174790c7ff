use crate::{
    config::AuthConfig,
    database::MongoDB,
    models::{Role, User, UserInfo},
    utils::{AppError, AppResult},
};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use futures::stream::TryStreamExt;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::{doc, oid::ObjectId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

pub const USERS: &str = "users";
pub const MIN_PASSWORD_LENGTH: usize = 6;

// JWT Claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // user_id
    pub email: String,
    pub name: String,
    pub role: Role,
    pub iat: usize,
    pub exp: usize,
    pub jti: String,
    pub aud: String,
    pub iss: String,
}

// Request/Response structures
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    /// "Staff" or "Student"
    pub role: Option<String>,
    pub subject: Option<String>,
    pub bio: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub user: UserInfo,
}

/// Registration input after validation; the password is still plain text.
#[derive(Debug, PartialEq)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl RegisterRequest {
    pub fn validate(&self) -> AppResult<NewAccount> {
        let field = |value: &Option<String>, name: &str| -> AppResult<String> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or_else(|| AppError::InvalidRequest(format!("{} is required", name)))
        };

        let name = field(&self.name, "Name")?;
        let email = field(&self.email, "Email")?.to_ascii_lowercase();
        if !email.contains('@') {
            return Err(AppError::InvalidRequest("Invalid email address".to_string()));
        }

        let password = self
            .password
            .clone()
            .ok_or_else(|| AppError::InvalidRequest("Password is required".to_string()))?;
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AppError::InvalidRequest(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        let role = match self.role.as_deref() {
            Some(raw) => Role::parse(raw)
                .ok_or_else(|| AppError::InvalidRequest("Invalid role. Must be one of: Staff, Student".to_string()))?,
            None => Role::Student,
        };

        Ok(NewAccount {
            name,
            email,
            password,
            role,
        })
    }
}

// Generate JWT token
pub fn generate_jwt(user: &User, config: &AuthConfig) -> AppResult<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.user_id.clone(),
        email: user.email.clone(),
        name: user.name.clone(),
        role: user.role,
        iat: now.timestamp() as usize,
        exp: (now + Duration::hours(config.token_ttl_hours)).timestamp() as usize,
        jti: Uuid::new_v4().to_string(),
        aud: config.jwt_audience.clone(),
        iss: config.jwt_issuer.clone(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_ref()),
    )
    .map_err(|e| AppError::DatabaseError(format!("Failed to generate token: {}", e)))
}

// Verify JWT token
pub fn verify_token(token: &str, config: &AuthConfig) -> AppResult<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[config.jwt_audience.clone()]);

    let mut issuers = HashSet::new();
    issuers.insert(config.jwt_issuer.clone());
    validation.iss = Some(issuers);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_ref()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
}

// User login
pub async fn login(db: &MongoDB, config: &AuthConfig, request: &LoginRequest) -> AppResult<AuthResponse> {
    let collection = db.collection::<User>(USERS);
    let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

    let email = request.email.trim().to_ascii_lowercase();
    let user = collection
        .find_one(doc! { "email": &email })
        .await?
        .ok_or_else(invalid)?;

    let valid = verify(&request.password, &user.password)
        .map_err(|e| AppError::DatabaseError(format!("Password verification error: {}", e)))?;
    if !valid {
        log::warn!("⚠️  Failed login for {}", email);
        return Err(invalid());
    }

    let now = Utc::now().timestamp();
    collection
        .update_one(doc! { "user_id": &user.user_id }, doc! { "$set": { "last_login": now } })
        .await?;

    let token = generate_jwt(&user, config)?;
    log::info!("🔑 {} logged in ({})", user.email, user.role.as_str());

    Ok(AuthResponse {
        success: true,
        token,
        user: user.into(),
    })
}

// User registration
pub async fn register(db: &MongoDB, config: &AuthConfig, request: &RegisterRequest) -> AppResult<AuthResponse> {
    let account = request.validate()?;
    let collection = db.collection::<User>(USERS);

    if collection.find_one(doc! { "email": &account.email }).await?.is_some() {
        return Err(AppError::InvalidRequest("User already exists".to_string()));
    }

    let hashed_password = hash(&account.password, DEFAULT_COST)
        .map_err(|e| AppError::DatabaseError(format!("Failed to hash password: {}", e)))?;

    let new_user = User {
        _id: None,
        user_id: ObjectId::new().to_hex(),
        name: account.name,
        email: account.email,
        password: hashed_password,
        role: account.role,
        subject: request.subject.clone(),
        bio: request.bio.clone(),
        phone: request.phone.clone(),
        created_at: Utc::now().timestamp(),
        last_login: None,
    };

    // the unique index on email settles concurrent registrations
    collection.insert_one(&new_user).await.map_err(|e| {
        if crate::repositories::is_duplicate_key(&e) {
            AppError::InvalidRequest("User already exists".to_string())
        } else {
            e.into()
        }
    })?;

    let token = generate_jwt(&new_user, config)?;
    log::info!("✅ User registered: {} ({})", new_user.email, new_user.role.as_str());

    Ok(AuthResponse {
        success: true,
        token,
        user: new_user.into(),
    })
}

// Get current user
pub async fn get_current_user(db: &MongoDB, user_id: &str) -> AppResult<UserInfo> {
    db.collection::<User>(USERS)
        .find_one(doc! { "user_id": user_id })
        .await?
        .map(UserInfo::from)
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// Staff directory, alphabetical.
pub async fn list_staff(db: &MongoDB) -> AppResult<Vec<UserInfo>> {
    let users: Vec<User> = db
        .collection::<User>(USERS)
        .find(doc! { "role": Role::Staff.as_str() })
        .sort(doc! { "name": 1 })
        .await?
        .try_collect()
        .await?;

    Ok(users.into_iter().map(UserInfo::from).collect())
}
