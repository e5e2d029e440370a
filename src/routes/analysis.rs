use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use mongodb::bson::{doc, oid::ObjectId, DateTime};
use mongodb::options::UpdateOptions;
use crate::db::DbConn;
use crate::guards::RecruiterGuard;
use crate::models::{ApplicantProfile, Application, JobPosting, MatchScore};
use crate::services::matching;
use crate::utils::{ApiError, ApiResponse};

/// Computes the match for one application and persists it, keyed by the
/// (job, applicant) pair. Reruns upsert over the previous row, so the
/// operation is idempotent and safe to re-invoke.
#[openapi(tag = "Analysis")]
#[post("/application/<application_id>/analyze")]
pub async fn analyze_application(
    db: &State<DbConn>,
    recruiter: RecruiterGuard,
    application_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let object_id = ObjectId::parse_str(&application_id)
        .map_err(|_| ApiError::bad_request("Invalid application ID"))?;

    let application = db
        .collection::<Application>("applications")
        .find_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Application not found"))?;

    let job = db
        .collection::<JobPosting>("jobs")
        .find_one(
            doc! { "_id": application.job_id, "recruiter_id": recruiter.auth.user_id },
            None,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    let profile = db
        .collection::<ApplicantProfile>("applicant_profiles")
        .find_one(doc! { "user_id": application.applicant_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Applicant profile not found"))?;

    let result = matching::compute_match(
        &job.required_skills,
        job.experience_level,
        &profile.skills,
        profile.experience_years,
    );

    let breakdown_bson = mongodb::bson::to_bson(&result.breakdown)
        .map_err(|e| ApiError::internal_error(format!("Serialization error: {}", e)))?;

    // Last writer wins on concurrent recomputation; the pair key keeps
    // the collection at one row per (job, applicant).
    db.collection::<MatchScore>("match_scores")
        .update_one(
            doc! {
                "job_id": application.job_id,
                "applicant_id": application.applicant_id
            },
            doc! {
                "$set": {
                    "score": result.score,
                    "analysis_text": &result.analysis_text,
                    "criteria_breakdown": breakdown_bson,
                    "computed_at": DateTime::now()
                }
            },
            UpdateOptions::builder().upsert(true).build(),
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to store match score: {}", e)))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "score": result.score,
        "label": result.label,
        "analysis_text": result.analysis_text,
        "criteria_breakdown": result.breakdown
    }))))
}

#[openapi(tag = "Analysis")]
#[get("/application/<application_id>/match-score")]
pub async fn get_match_score(
    db: &State<DbConn>,
    recruiter: RecruiterGuard,
    application_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let object_id = ObjectId::parse_str(&application_id)
        .map_err(|_| ApiError::bad_request("Invalid application ID"))?;

    let application = db
        .collection::<Application>("applications")
        .find_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Application not found"))?;

    db.collection::<JobPosting>("jobs")
        .find_one(
            doc! { "_id": application.job_id, "recruiter_id": recruiter.auth.user_id },
            None,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    let match_score = db
        .collection::<MatchScore>("match_scores")
        .find_one(
            doc! {
                "job_id": application.job_id,
                "applicant_id": application.applicant_id
            },
            None,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("No match score computed yet"))?;

    Ok(Json(ApiResponse::success(serde_json::json!(match_score))))
}

/// Mean of the persisted match scores for one applicant across all
/// jobs they were analyzed against.
#[openapi(tag = "Analysis")]
#[get("/applicant/<applicant_id>/match-summary")]
pub async fn applicant_match_summary(
    db: &State<DbConn>,
    _recruiter: RecruiterGuard,
    applicant_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let object_id = ObjectId::parse_str(&applicant_id)
        .map_err(|_| ApiError::bad_request("Invalid applicant ID"))?;

    let mut cursor = db
        .collection::<MatchScore>("match_scores")
        .find(doc! { "applicant_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut scores = Vec::new();
    while cursor
        .advance()
        .await
        .map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))?
    {
        let row: MatchScore = cursor
            .deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        scores.push(row.score);
    }

    let average = if scores.is_empty() {
        None
    } else {
        let sum: i64 = scores.iter().map(|&s| s as i64).sum();
        Some((sum as f64 / scores.len() as f64).round() as i32)
    };

    Ok(Json(ApiResponse::success(serde_json::json!({
        "applicant_id": applicant_id,
        "analyzed_jobs": scores.len(),
        "average_score": average,
        "best_score": scores.iter().max()
    }))))
}
