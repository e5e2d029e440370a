use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use log::warn;
use chrono::{Duration, Utc};
use mongodb::bson::{doc, oid::ObjectId, DateTime};
use uuid::Uuid;
use crate::db::DbConn;
use crate::guards::{AuthGuard, RecruiterGuard};
use crate::models::{
    Application, Assessment, AssessmentStatus, GenerateAssessmentDto, JobPosting, QuestionBank,
    SubmitResponsesDto, User, ASSESSMENT_TTL_DAYS,
};
use crate::services::assessment::{check_submission, completion_score, SubmitRejection};
use crate::services::notify;
use crate::services::NotificationSender;
use crate::utils::{ApiError, ApiResponse};

#[openapi(tag = "Assessment")]
#[post("/assessment/generate", data = "<dto>")]
pub async fn generate_assessment(
    db: &State<DbConn>,
    notifier: &State<Box<dyn NotificationSender>>,
    recruiter: RecruiterGuard,
    dto: Json<GenerateAssessmentDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let application_id = ObjectId::parse_str(&dto.application_id)
        .map_err(|_| ApiError::bad_request("Invalid application ID"))?;

    let application = db
        .collection::<Application>("applications")
        .find_one(doc! { "_id": application_id }, None)
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

    // One active assessment per application: reject while a previous
    // one is still open and inside its window.
    let now = Utc::now();
    let active = db
        .collection::<Assessment>("assessments")
        .find_one(
            doc! {
                "application_id": application_id,
                "status": {
                    "$nin": [
                        AssessmentStatus::Completed.as_str(),
                        AssessmentStatus::Expired.as_str()
                    ]
                },
                "expires_at": { "$gt": DateTime::from_millis(now.timestamp_millis()) }
            },
            None,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    if active.is_some() {
        return Err(ApiError::conflict(
            "An active assessment already exists for this application",
        ));
    }

    // Provided banks are stored verbatim, no validation of question
    // structure; absent ones fall back to the fixed default.
    let questions = dto
        .questions
        .clone()
        .unwrap_or_else(QuestionBank::default_bank);

    let expires_at = now + Duration::days(ASSESSMENT_TTL_DAYS);

    let mut assessment = Assessment {
        id: None,
        application_id,
        job_id: application.job_id,
        applicant_id: application.applicant_id,
        questions,
        status: AssessmentStatus::Sent,
        score: None,
        responses: None,
        access_token: Uuid::new_v4().to_string(),
        expires_at: DateTime::from_millis(expires_at.timestamp_millis()),
        created_at: DateTime::now(),
        updated_at: DateTime::now(),
    };

    let result = db
        .collection::<Assessment>("assessments")
        .insert_one(&assessment, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to create assessment: {}", e)))?;

    let assessment_id = result
        .inserted_id
        .as_object_id()
        .ok_or_else(|| ApiError::internal_error("Invalid assessment ID"))?;

    assessment.id = Some(assessment_id);
    let url = assessment.client_url();

    // Fire-and-forget invitation.
    if let Ok(Some(candidate)) = db
        .collection::<User>("users")
        .find_one(doc! { "_id": application.applicant_id }, None)
        .await
    {
        let body = notify::assessment_invitation_body(&candidate.name, &job.title, &url);
        if let Err(e) = notifier
            .send(&candidate.email, "You have a new assessment", &body)
            .await
        {
            warn!("Failed to send assessment invite to {}: {}", candidate.email, e);
        }
    }

    Ok(Json(ApiResponse::success_with_message(
        "Assessment generated successfully".to_string(),
        serde_json::json!({
            "assessment_id": assessment_id.to_hex(),
            "assessment_url": url,
            "expires_at": assessment.expires_at,
            "status": assessment.status
        }),
    )))
}

/// Applicant-facing read. Reports the effective status (lazy expiry)
/// and moves a freshly opened assessment from `sent` to `in_progress`.
#[openapi(tag = "Assessment")]
#[get("/assessment/<assessment_id>")]
pub async fn get_assessment(
    db: &State<DbConn>,
    auth: AuthGuard,
    assessment_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let object_id = ObjectId::parse_str(&assessment_id)
        .map_err(|_| ApiError::bad_request("Invalid assessment ID"))?;

    let assessment = db
        .collection::<Assessment>("assessments")
        .find_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Assessment not found"))?;

    if assessment.applicant_id != auth.user_id {
        return Err(ApiError::forbidden("You do not own this assessment"));
    }

    let now = Utc::now();
    let mut effective_status = assessment.effective_status(now);

    if effective_status == AssessmentStatus::Sent {
        // First open starts the clock on the applicant's side. Guarded
        // by the stored status so a concurrent open is harmless.
        let updated = db
            .collection::<Assessment>("assessments")
            .update_one(
                doc! {
                    "_id": object_id,
                    "status": AssessmentStatus::Sent.as_str(),
                    "expires_at": { "$gt": DateTime::from_millis(now.timestamp_millis()) }
                },
                doc! {
                    "$set": {
                        "status": AssessmentStatus::InProgress.as_str(),
                        "updated_at": DateTime::now()
                    }
                },
                None,
            )
            .await
            .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

        if updated.modified_count > 0 {
            effective_status = AssessmentStatus::InProgress;
        }
    }

    let questions: Vec<_> = assessment.questions.presentation_order();

    Ok(Json(ApiResponse::success(serde_json::json!({
        "assessment_id": assessment_id,
        "status": effective_status,
        "questions": questions,
        "score": assessment.score,
        "expires_at": assessment.expires_at
    }))))
}

#[openapi(tag = "Assessment")]
#[post("/assessment/<assessment_id>/submit", data = "<dto>")]
pub async fn submit_responses(
    db: &State<DbConn>,
    auth: AuthGuard,
    assessment_id: String,
    dto: Json<SubmitResponsesDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let object_id = ObjectId::parse_str(&assessment_id)
        .map_err(|_| ApiError::bad_request("Invalid assessment ID"))?;

    let assessment = db
        .collection::<Assessment>("assessments")
        .find_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Assessment not found"))?;

    let now = Utc::now();
    check_submission(&assessment, auth.user_id, now).map_err(|rejection| match rejection {
        SubmitRejection::NotOwner => ApiError::forbidden("You do not own this assessment"),
        SubmitRejection::AlreadyCompleted => {
            ApiError::conflict("This assessment has already been submitted")
        }
        SubmitRejection::Expired => ApiError::conflict("This assessment has expired"),
    })?;

    let score = completion_score(&assessment.questions, &dto.responses);

    let responses_bson = mongodb::bson::to_bson(&dto.responses)
        .map_err(|e| ApiError::internal_error(format!("Serialization error: {}", e)))?;

    // Single conditional update: the status and deadline guards live in
    // the filter, so two racing submissions cannot both win.
    let result = db
        .collection::<Assessment>("assessments")
        .update_one(
            doc! {
                "_id": object_id,
                "applicant_id": auth.user_id,
                "status": { "$ne": AssessmentStatus::Completed.as_str() },
                "expires_at": { "$gt": DateTime::from_millis(now.timestamp_millis()) }
            },
            doc! {
                "$set": {
                    "status": AssessmentStatus::Completed.as_str(),
                    "score": score,
                    "responses": responses_bson,
                    "updated_at": DateTime::now()
                }
            },
            None,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to submit responses: {}", e)))?;

    if result.modified_count == 0 {
        // Lost the race to another submission, or the window closed
        // between the check and the write.
        return Err(ApiError::conflict("Assessment can no longer be submitted"));
    }

    Ok(Json(ApiResponse::success_with_message(
        "Responses submitted successfully".to_string(),
        serde_json::json!({
            "assessment_id": assessment_id,
            "score": score,
            "status": AssessmentStatus::Completed
        }),
    )))
}

#[openapi(tag = "Assessment")]
#[get("/application/<application_id>/assessments")]
pub async fn application_assessments(
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

    let mut cursor = db
        .collection::<Assessment>("assessments")
        .find(doc! { "application_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let now = Utc::now();
    let mut assessments = Vec::new();
    while cursor
        .advance()
        .await
        .map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))?
    {
        let assessment: Assessment = cursor
            .deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;

        assessments.push(serde_json::json!({
            "assessment_id": assessment.id.map(|oid| oid.to_hex()),
            "status": assessment.effective_status(now),
            "score": assessment.score,
            "responses": assessment.responses,
            "expires_at": assessment.expires_at,
            "created_at": assessment.created_at
        }));
    }

    Ok(Json(ApiResponse::success(serde_json::json!({
        "assessments": assessments
    }))))
}
