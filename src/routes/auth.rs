use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use mongodb::bson::{doc, DateTime};
use crate::db::DbConn;
use crate::models::{LoginDto, RefreshTokenDto, RegisterDto, User};
use crate::services::JwtService;
use crate::utils::{validation, ApiError, ApiResponse};

#[openapi(tag = "Auth")]
#[post("/auth/register", data = "<dto>")]
pub async fn register(
    db: &State<DbConn>,
    dto: Json<RegisterDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let email = dto.email.trim().to_lowercase();

    if !validation::validate_email(&email) {
        return Err(ApiError::bad_request("Invalid email address"));
    }
    if !validation::validate_password(&dto.password) {
        return Err(ApiError::bad_request("Password must be at least 8 characters"));
    }
    if dto.name.trim().is_empty() {
        return Err(ApiError::bad_request("Name is required"));
    }

    let existing = db
        .collection::<User>("users")
        .find_one(doc! { "email": &email }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    if existing.is_some() {
        return Err(ApiError::bad_request("An account with this email already exists"));
    }

    let password_hash = bcrypt::hash(&dto.password, bcrypt::DEFAULT_COST)
        .map_err(|e| ApiError::internal_error(format!("Failed to hash password: {}", e)))?;

    let user = User {
        id: None,
        email: email.clone(),
        password_hash,
        name: dto.name.trim().to_string(),
        role: dto.role,
        created_at: DateTime::now(),
        updated_at: DateTime::now(),
    };

    let result = db
        .collection::<User>("users")
        .insert_one(&user, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to create account: {}", e)))?;

    let user_id = result
        .inserted_id
        .as_object_id()
        .ok_or_else(|| ApiError::internal_error("Invalid user ID"))?;

    let access_token = JwtService::generate_access_token(&user_id, &email, dto.role)
        .map_err(|e| ApiError::internal_error(format!("Token error: {}", e)))?;
    let refresh_token = JwtService::generate_refresh_token(&user_id, &email, dto.role)
        .map_err(|e| ApiError::internal_error(format!("Token error: {}", e)))?;

    Ok(Json(ApiResponse::success_with_message(
        "Account created successfully".to_string(),
        serde_json::json!({
            "user_id": user_id.to_hex(),
            "access_token": access_token,
            "refresh_token": refresh_token,
            "role": dto.role
        }),
    )))
}

#[openapi(tag = "Auth")]
#[post("/auth/login", data = "<dto>")]
pub async fn login(
    db: &State<DbConn>,
    dto: Json<LoginDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let email = dto.email.trim().to_lowercase();

    let user = db
        .collection::<User>("users")
        .find_one(doc! { "email": &email }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;

    let valid = bcrypt::verify(&dto.password, &user.password_hash)
        .map_err(|e| ApiError::internal_error(format!("Verification error: {}", e)))?;

    if !valid {
        return Err(ApiError::unauthorized("Invalid email or password"));
    }

    let user_id = user
        .id
        .ok_or_else(|| ApiError::internal_error("Invalid user record"))?;

    let access_token = JwtService::generate_access_token(&user_id, &user.email, user.role)
        .map_err(|e| ApiError::internal_error(format!("Token error: {}", e)))?;
    let refresh_token = JwtService::generate_refresh_token(&user_id, &user.email, user.role)
        .map_err(|e| ApiError::internal_error(format!("Token error: {}", e)))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "user_id": user_id.to_hex(),
        "name": user.name,
        "role": user.role,
        "access_token": access_token,
        "refresh_token": refresh_token
    }))))
}

#[openapi(tag = "Auth")]
#[post("/auth/refresh", data = "<dto>")]
pub async fn refresh_token(
    dto: Json<RefreshTokenDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let claims = JwtService::verify_token(&dto.refresh_token, true)
        .map_err(|_| ApiError::unauthorized("Invalid or expired refresh token"))?;

    let user_id = mongodb::bson::oid::ObjectId::parse_str(&claims.sub)
        .map_err(|_| ApiError::unauthorized("Invalid token subject"))?;

    let access_token = JwtService::generate_access_token(&user_id, &claims.email, claims.role)
        .map_err(|e| ApiError::internal_error(format!("Token error: {}", e)))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "access_token": access_token
    }))))
}
