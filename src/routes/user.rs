use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use mongodb::bson::{doc, DateTime};
use crate::db::DbConn;
use crate::guards::AuthGuard;
use crate::models::{ApplicantProfile, CreateProfileDto, UpdateProfileDto, UserRole};
use crate::utils::{ApiError, ApiResponse};

#[openapi(tag = "Profile")]
#[post("/profile", data = "<dto>")]
pub async fn create_profile(
    db: &State<DbConn>,
    auth: AuthGuard,
    dto: Json<CreateProfileDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    if auth.role != UserRole::Applicant {
        return Err(ApiError::forbidden("Only applicant accounts can create a profile"));
    }

    if dto.full_name.trim().is_empty() {
        return Err(ApiError::bad_request("Full name is required"));
    }
    if dto.skills.is_empty() {
        return Err(ApiError::bad_request("At least one skill is required"));
    }

    let existing = db
        .collection::<ApplicantProfile>("applicant_profiles")
        .find_one(doc! { "user_id": auth.user_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    if existing.is_some() {
        return Err(ApiError::bad_request("Profile already exists"));
    }

    let profile = ApplicantProfile {
        id: None,
        user_id: auth.user_id,
        full_name: dto.full_name.trim().to_string(),
        headline: dto.headline.clone(),
        skills: dto.skills.clone(),
        experience_years: dto.experience_years,
        resume_url: dto.resume_url.clone(),
        created_at: DateTime::now(),
        updated_at: DateTime::now(),
    };

    let result = db
        .collection::<ApplicantProfile>("applicant_profiles")
        .insert_one(&profile, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to create profile: {}", e)))?;

    Ok(Json(ApiResponse::success_with_message(
        "Profile created successfully".to_string(),
        serde_json::json!({
            "profile_id": result
                .inserted_id
                .as_object_id()
                .map(|oid| oid.to_hex())
        }),
    )))
}

#[openapi(tag = "Profile")]
#[get("/profile")]
pub async fn get_profile(
    db: &State<DbConn>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let profile = db
        .collection::<ApplicantProfile>("applicant_profiles")
        .find_one(doc! { "user_id": auth.user_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Profile not found"))?;

    Ok(Json(ApiResponse::success(serde_json::json!(profile))))
}

#[openapi(tag = "Profile")]
#[put("/profile", data = "<dto>")]
pub async fn update_profile(
    db: &State<DbConn>,
    auth: AuthGuard,
    dto: Json<UpdateProfileDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let mut update_doc = doc! {
        "updated_at": DateTime::now()
    };

    if let Some(ref full_name) = dto.full_name {
        if full_name.trim().is_empty() {
            return Err(ApiError::bad_request("Full name cannot be empty"));
        }
        update_doc.insert("full_name", full_name.trim());
    }
    if let Some(ref headline) = dto.headline {
        update_doc.insert("headline", headline);
    }
    if let Some(ref skills) = dto.skills {
        if skills.is_empty() {
            return Err(ApiError::bad_request("At least one skill is required"));
        }
        update_doc.insert("skills", skills);
    }
    if let Some(experience) = dto.experience_years {
        update_doc.insert("experience_years", experience);
    }
    if let Some(ref resume) = dto.resume_url {
        update_doc.insert("resume_url", resume);
    }

    let result = db
        .collection::<ApplicantProfile>("applicant_profiles")
        .update_one(
            doc! { "user_id": auth.user_id },
            doc! { "$set": update_doc },
            None,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to update profile: {}", e)))?;

    if result.matched_count == 0 {
        return Err(ApiError::not_found("Profile not found"));
    }

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": "Profile updated successfully"
    }))))
}
