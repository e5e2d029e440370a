use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars::JsonSchema;

/// Applicant-owned profile. Mutable at any time and not versioned:
/// match analysis always reads the latest snapshot.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ApplicantProfile {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub full_name: String,
    pub headline: Option<String>,
    pub skills: Vec<String>,
    pub experience_years: Option<i32>,
    pub resume_url: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateProfileDto {
    pub full_name: String,
    pub headline: Option<String>,
    pub skills: Vec<String>,
    pub experience_years: Option<i32>,
    pub resume_url: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateProfileDto {
    pub full_name: Option<String>,
    pub headline: Option<String>,
    pub skills: Option<Vec<String>>,
    pub experience_years: Option<i32>,
    pub resume_url: Option<String>,
}
