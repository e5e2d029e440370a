use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use mongodb::bson::{doc, oid::ObjectId, DateTime};
use mongodb::options::FindOptions;
use crate::db::DbConn;
use crate::guards::{AuthGuard, RecruiterGuard};
use crate::models::{
    ApplicantProfile, Application, Assessment, CreateJobDto, JobPosting, MatchScore, UpdateJobDto,
};
use crate::services::matching;
use crate::utils::{ApiError, ApiResponse};

#[openapi(tag = "Job")]
#[post("/job", data = "<dto>")]
pub async fn create_job(
    db: &State<DbConn>,
    recruiter: RecruiterGuard,
    dto: Json<CreateJobDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    if dto.title.trim().is_empty() {
        return Err(ApiError::bad_request("Job title is required"));
    }
    if dto.required_skills.is_empty() {
        return Err(ApiError::bad_request("At least one required skill is needed"));
    }

    let job = JobPosting {
        id: None,
        recruiter_id: recruiter.auth.user_id,
        title: dto.title.trim().to_string(),
        description: dto.description.clone(),
        required_skills: dto.required_skills.clone(),
        experience_level: dto.experience_level,
        is_published: false,
        applications_count: 0,
        created_at: DateTime::now(),
        updated_at: DateTime::now(),
    };

    let result = db
        .collection::<JobPosting>("jobs")
        .insert_one(&job, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to create job: {}", e)))?;

    Ok(Json(ApiResponse::success_with_message(
        "Job created successfully".to_string(),
        serde_json::json!({
            "job_id": result.inserted_id.as_object_id().map(|oid| oid.to_hex())
        }),
    )))
}

#[openapi(tag = "Job")]
#[post("/job/<job_id>/publish")]
pub async fn publish_job(
    db: &State<DbConn>,
    recruiter: RecruiterGuard,
    job_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let object_id =
        ObjectId::parse_str(&job_id).map_err(|_| ApiError::bad_request("Invalid job ID"))?;

    let result = db
        .collection::<JobPosting>("jobs")
        .update_one(
            doc! { "_id": object_id, "recruiter_id": recruiter.auth.user_id },
            doc! { "$set": { "is_published": true, "updated_at": DateTime::now() } },
            None,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    if result.matched_count == 0 {
        return Err(ApiError::not_found("Job not found"));
    }

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": "Job published successfully"
    }))))
}

#[openapi(tag = "Job")]
#[put("/job/<job_id>", data = "<dto>")]
pub async fn update_job(
    db: &State<DbConn>,
    recruiter: RecruiterGuard,
    job_id: String,
    dto: Json<UpdateJobDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let object_id =
        ObjectId::parse_str(&job_id).map_err(|_| ApiError::bad_request("Invalid job ID"))?;

    let job = db
        .collection::<JobPosting>("jobs")
        .find_one(
            doc! { "_id": object_id, "recruiter_id": recruiter.auth.user_id },
            None,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    // Requirements freeze once the job is live.
    if job.is_published {
        return Err(ApiError::conflict("Published jobs cannot be modified"));
    }

    let mut update_doc = doc! {
        "updated_at": DateTime::now()
    };

    if let Some(ref title) = dto.title {
        if title.trim().is_empty() {
            return Err(ApiError::bad_request("Job title cannot be empty"));
        }
        update_doc.insert("title", title.trim());
    }
    if let Some(ref description) = dto.description {
        update_doc.insert("description", description);
    }
    if let Some(ref skills) = dto.required_skills {
        if skills.is_empty() {
            return Err(ApiError::bad_request("At least one required skill is needed"));
        }
        update_doc.insert("required_skills", skills);
    }
    if let Some(level) = dto.experience_level {
        let level_bson = mongodb::bson::to_bson(&level)
            .map_err(|e| ApiError::internal_error(format!("Serialization error: {}", e)))?;
        update_doc.insert("experience_level", level_bson);
    }

    db.collection::<JobPosting>("jobs")
        .update_one(doc! { "_id": object_id }, doc! { "$set": update_doc }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to update job: {}", e)))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": "Job updated successfully"
    }))))
}

#[openapi(tag = "Job")]
#[get("/job/<job_id>")]
pub async fn get_job(
    db: &State<DbConn>,
    _auth: AuthGuard,
    job_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let object_id =
        ObjectId::parse_str(&job_id).map_err(|_| ApiError::bad_request("Invalid job ID"))?;

    let job = db
        .collection::<JobPosting>("jobs")
        .find_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    Ok(Json(ApiResponse::success(serde_json::json!(job))))
}

#[openapi(tag = "Job")]
#[get("/jobs?<page>&<limit>")]
pub async fn list_jobs(
    db: &State<DbConn>,
    _auth: AuthGuard,
    page: Option<i64>,
    limit: Option<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(20).min(100);
    let skip = (page - 1) * limit;

    let filter = doc! { "is_published": true };

    let find_options = FindOptions::builder()
        .skip(skip as u64)
        .limit(limit)
        .sort(doc! { "created_at": -1 })
        .build();

    let mut cursor = db
        .collection::<JobPosting>("jobs")
        .find(filter.clone(), find_options)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut jobs = Vec::new();
    while cursor
        .advance()
        .await
        .map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))?
    {
        let job = cursor
            .deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        jobs.push(job);
    }

    let total = db
        .collection::<JobPosting>("jobs")
        .count_documents(filter, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Count error: {}", e)))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "jobs": jobs,
        "pagination": {
            "page": page,
            "limit": limit,
            "total": total,
            "pages": (total as f64 / limit as f64).ceil() as i64,
        }
    }))))
}

#[openapi(tag = "Job")]
#[get("/job/mine")]
pub async fn my_jobs(
    db: &State<DbConn>,
    recruiter: RecruiterGuard,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let find_options = FindOptions::builder()
        .sort(doc! { "created_at": -1 })
        .build();

    let mut cursor = db
        .collection::<JobPosting>("jobs")
        .find(doc! { "recruiter_id": recruiter.auth.user_id }, find_options)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut jobs = Vec::new();
    while cursor
        .advance()
        .await
        .map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))?
    {
        let job = cursor
            .deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        jobs.push(job);
    }

    Ok(Json(ApiResponse::success(serde_json::json!({ "jobs": jobs }))))
}

#[openapi(tag = "Job")]
#[delete("/job/<job_id>")]
pub async fn delete_job(
    db: &State<DbConn>,
    recruiter: RecruiterGuard,
    job_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let object_id =
        ObjectId::parse_str(&job_id).map_err(|_| ApiError::bad_request("Invalid job ID"))?;

    let result = db
        .collection::<JobPosting>("jobs")
        .delete_one(
            doc! { "_id": object_id, "recruiter_id": recruiter.auth.user_id },
            None,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to delete job: {}", e)))?;

    if result.deleted_count == 0 {
        return Err(ApiError::not_found("Job not found"));
    }

    // Cascade the dependent records for this job.
    db.collection::<MatchScore>("match_scores")
        .delete_many(doc! { "job_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to delete match scores: {}", e)))?;
    db.collection::<Application>("applications")
        .delete_many(doc! { "job_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to delete applications: {}", e)))?;
    db.collection::<Assessment>("assessments")
        .delete_many(doc! { "job_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to delete assessments: {}", e)))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": "Job deleted successfully"
    }))))
}

/// Interactive estimate for the calling applicant. Computes through the
/// same canonical scorer as the persisted analysis, but stores nothing.
#[openapi(tag = "Job")]
#[get("/job/<job_id>/match-estimate")]
pub async fn match_estimate(
    db: &State<DbConn>,
    auth: AuthGuard,
    job_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let object_id =
        ObjectId::parse_str(&job_id).map_err(|_| ApiError::bad_request("Invalid job ID"))?;

    let job = db
        .collection::<JobPosting>("jobs")
        .find_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    let profile = db
        .collection::<ApplicantProfile>("applicant_profiles")
        .find_one(doc! { "user_id": auth.user_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Profile not found"))?;

    let result = matching::compute_match(
        &job.required_skills,
        job.experience_level,
        &profile.skills,
        profile.experience_years,
    );

    Ok(Json(ApiResponse::success(serde_json::json!({
        "score": result.score,
        "label": result.label,
        "analysis_text": result.analysis_text,
        "criteria_breakdown": result.breakdown
    }))))
}
