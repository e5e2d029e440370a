use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use log::warn;
use mongodb::bson::{doc, oid::ObjectId, DateTime};
use mongodb::options::FindOptions;
use crate::db::DbConn;
use crate::guards::{AuthGuard, RecruiterGuard};
use crate::models::{
    ApplicantProfile, Application, ApplicationStatus, ContactCandidateDto, JobPosting, MatchScore,
    User, UserRole,
};
use crate::services::notify;
use crate::services::NotificationSender;
use crate::utils::{ApiError, ApiResponse};

#[openapi(tag = "Application")]
#[post("/job/<job_id>/apply")]
pub async fn apply(
    db: &State<DbConn>,
    auth: AuthGuard,
    job_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    if auth.role != UserRole::Applicant {
        return Err(ApiError::forbidden("Only applicant accounts can apply"));
    }

    let object_id =
        ObjectId::parse_str(&job_id).map_err(|_| ApiError::bad_request("Invalid job ID"))?;

    let job = db
        .collection::<JobPosting>("jobs")
        .find_one(doc! { "_id": object_id, "is_published": true }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    // Applying requires a profile; the scorer reads it later.
    db.collection::<ApplicantProfile>("applicant_profiles")
        .find_one(doc! { "user_id": auth.user_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::bad_request("Create a profile before applying"))?;

    let existing = db
        .collection::<Application>("applications")
        .find_one(
            doc! { "job_id": object_id, "applicant_id": auth.user_id },
            None,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    if existing.is_some() {
        return Err(ApiError::bad_request("You have already applied to this job"));
    }

    let application = Application {
        id: None,
        job_id: object_id,
        applicant_id: auth.user_id,
        status: ApplicationStatus::Applied,
        created_at: DateTime::now(),
        updated_at: DateTime::now(),
    };

    let result = db
        .collection::<Application>("applications")
        .insert_one(&application, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to apply: {}", e)))?;

    db.collection::<JobPosting>("jobs")
        .update_one(
            doc! { "_id": object_id },
            doc! { "$inc": { "applications_count": 1 } },
            None,
        )
        .await
        .ok();

    Ok(Json(ApiResponse::success_with_message(
        format!("Applied to {}", job.title),
        serde_json::json!({
            "application_id": result.inserted_id.as_object_id().map(|oid| oid.to_hex())
        }),
    )))
}

#[openapi(tag = "Application")]
#[get("/applications")]
pub async fn my_applications(
    db: &State<DbConn>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let find_options = FindOptions::builder()
        .sort(doc! { "created_at": -1 })
        .build();

    let mut cursor = db
        .collection::<Application>("applications")
        .find(doc! { "applicant_id": auth.user_id }, find_options)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut applications = Vec::new();
    while cursor
        .advance()
        .await
        .map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))?
    {
        let application: Application = cursor
            .deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;

        let job = db
            .collection::<JobPosting>("jobs")
            .find_one(doc! { "_id": application.job_id }, None)
            .await
            .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

        applications.push(serde_json::json!({
            "application": application,
            "job_title": job.map(|j| j.title)
        }));
    }

    Ok(Json(ApiResponse::success(serde_json::json!({
        "applications": applications
    }))))
}

#[openapi(tag = "Application")]
#[get("/job/<job_id>/applications")]
pub async fn job_applications(
    db: &State<DbConn>,
    recruiter: RecruiterGuard,
    job_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let object_id =
        ObjectId::parse_str(&job_id).map_err(|_| ApiError::bad_request("Invalid job ID"))?;

    // Recruiters only see applications for their own jobs.
    db.collection::<JobPosting>("jobs")
        .find_one(
            doc! { "_id": object_id, "recruiter_id": recruiter.auth.user_id },
            None,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    let find_options = FindOptions::builder()
        .sort(doc! { "created_at": -1 })
        .build();

    let mut cursor = db
        .collection::<Application>("applications")
        .find(doc! { "job_id": object_id }, find_options)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut applications = Vec::new();
    while cursor
        .advance()
        .await
        .map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))?
    {
        let application: Application = cursor
            .deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;

        let profile = db
            .collection::<ApplicantProfile>("applicant_profiles")
            .find_one(doc! { "user_id": application.applicant_id }, None)
            .await
            .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

        let match_score = db
            .collection::<MatchScore>("match_scores")
            .find_one(
                doc! { "job_id": object_id, "applicant_id": application.applicant_id },
                None,
            )
            .await
            .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

        applications.push(serde_json::json!({
            "application": application,
            "applicant_name": profile.as_ref().map(|p| p.full_name.clone()),
            "applicant_skills": profile.as_ref().map(|p| p.skills.clone()),
            "match_score": match_score
        }));
    }

    Ok(Json(ApiResponse::success(serde_json::json!({
        "applications": applications
    }))))
}

/// Sends a formatted email to the candidate. Delivery is fire and
/// forget: a sender failure is logged but never fails the request.
#[openapi(tag = "Application")]
#[post("/application/<application_id>/contact", data = "<dto>")]
pub async fn contact_candidate(
    db: &State<DbConn>,
    notifier: &State<Box<dyn NotificationSender>>,
    recruiter: RecruiterGuard,
    application_id: String,
    dto: Json<ContactCandidateDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    if dto.message.trim().is_empty() {
        return Err(ApiError::bad_request("Message is required"));
    }

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
        .ok_or_else(|| ApiError::forbidden("You do not own this job"))?;

    let candidate = db
        .collection::<User>("users")
        .find_one(doc! { "_id": application.applicant_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Candidate not found"))?;

    let recruiter_user = db
        .collection::<User>("users")
        .find_one(doc! { "_id": recruiter.auth.user_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Recruiter account not found"))?;

    let subject = dto
        .subject
        .clone()
        .unwrap_or_else(|| "A recruiter reached out about your application".to_string());
    let body = notify::contact_candidate_body(&candidate.name, &recruiter_user.name, &dto.message);

    if let Err(e) = notifier.send(&candidate.email, &subject, &body).await {
        warn!("Failed to send contact email to {}: {}", candidate.email, e);
    }

    db.collection::<Application>("applications")
        .update_one(
            doc! { "_id": object_id },
            doc! { "$set": { "status": "contacted", "updated_at": DateTime::now() } },
            None,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to update application: {}", e)))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": "Candidate contacted"
    }))))
}
