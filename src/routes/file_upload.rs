use rocket::serde::json::Json;
use rocket::fs::TempFile;
use rocket::serde::Deserialize;
use rocket_okapi::openapi;
use rocket_okapi::okapi::schemars;
use rocket_okapi::okapi::schemars::JsonSchema;
use std::path::Path;
use tokio::fs;
use uuid::Uuid;
use crate::guards::AuthGuard;
use crate::utils::{ApiResponse, ApiError};

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct Base64UploadRequest {
    pub filename: String,
    pub mime_type: String,
    pub data: String,
}

fn get_extension_from_filename(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|s| s.to_lowercase())
}

fn is_valid_resume_extension(ext: &str) -> bool {
    matches!(ext, "pdf" | "doc" | "docx")
}

fn extension_from_content_type(content_type: &str) -> Option<String> {
    match content_type {
        "application/pdf" => Some("pdf".to_string()),
        "application/msword" => Some("doc".to_string()),
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
            Some("docx".to_string())
        }
        _ => None,
    }
}

fn is_valid_resume_mime(mime_type: &str) -> bool {
    extension_from_content_type(mime_type).is_some()
}

async fn save_path(owner: &mongodb::bson::oid::ObjectId, extension: &str) -> Result<(String, String), ApiError> {
    // Blobs are keyed per owner: uploads/resumes/<user>/<file>.
    let upload_dir = format!("uploads/resumes/{}", owner.to_hex());
    fs::create_dir_all(&upload_dir)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to create directory: {}", e)))?;

    let filename = format!(
        "{}_{}.{}",
        Uuid::new_v4(),
        chrono::Utc::now().timestamp(),
        extension
    );
    let filepath = format!("{}/{}", upload_dir, filename);
    Ok((filepath, filename))
}

#[openapi(tag = "File Upload")]
#[post("/upload/resume", data = "<file>")]
pub async fn upload_resume(
    mut file: TempFile<'_>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let extension = file
        .name()
        .and_then(get_extension_from_filename)
        .or_else(|| {
            file.content_type()
                .and_then(|ct| extension_from_content_type(&ct.to_string()))
        })
        .ok_or_else(|| ApiError::bad_request("Cannot determine file type"))?;

    if !is_valid_resume_extension(&extension) {
        return Err(ApiError::bad_request(format!(
            "Only PDF and Word documents are allowed. Received: '{}'",
            extension
        )));
    }

    let (filepath, filename) = save_path(&auth.user_id, &extension).await?;

    file.persist_to(&filepath)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to save file: {}", e)))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "url": format!("/{}", filepath),
        "filename": filename,
        "message": "Resume uploaded successfully"
    }))))
}

#[openapi(tag = "File Upload")]
#[post("/upload/resume-base64", data = "<request>")]
pub async fn upload_resume_base64(
    request: Json<Base64UploadRequest>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    if !is_valid_resume_mime(&request.mime_type) {
        return Err(ApiError::bad_request(format!(
            "Invalid MIME type: {}. Allowed: application/pdf, application/msword, docx",
            request.mime_type
        )));
    }

    let extension = extension_from_content_type(&request.mime_type)
        .ok_or_else(|| ApiError::bad_request("Cannot determine file extension from MIME type"))?;

    use data_encoding::BASE64;

    let file_data = BASE64
        .decode(request.data.as_bytes())
        .map_err(|_| ApiError::bad_request("Invalid base64 data"))?;

    let file_size = file_data.len();
    if file_size > 10 * 1024 * 1024 {
        return Err(ApiError::bad_request("File size exceeds 10MB limit"));
    }

    let (filepath, filename) = save_path(&auth.user_id, &extension).await?;

    fs::write(&filepath, &file_data)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to save file: {}", e)))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "url": format!("/{}", filepath),
        "filename": filename,
        "size": file_size,
        "message": "Resume uploaded successfully"
    }))))
}

#[openapi(tag = "File Upload")]
#[get("/upload/resume/list")]
pub async fn list_resumes(
    auth: AuthGuard,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let upload_dir = format!("uploads/resumes/{}", auth.user_id.to_hex());

    let mut files = Vec::new();
    if let Ok(mut entries) = fs::read_dir(&upload_dir).await {
        while let Ok(Some(entry)) = entries.next_entry().await {
            if let Some(name) = entry.file_name().to_str() {
                files.push(serde_json::json!({
                    "filename": name,
                    "url": format!("/{}/{}", upload_dir, name)
                }));
            }
        }
    }

    Ok(Json(ApiResponse::success(serde_json::json!({
        "resumes": files
    }))))
}
