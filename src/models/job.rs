use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars::JsonSchema;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Entry,
    Mid,
    Senior,
    /// Covers both "lead" and "executive" postings.
    Lead,
}

impl ExperienceLevel {
    /// Minimum years of experience expected at this level.
    pub fn min_years(&self) -> i32 {
        match self {
            ExperienceLevel::Entry => 0,
            ExperienceLevel::Mid => 2,
            ExperienceLevel::Senior => 5,
            ExperienceLevel::Lead => 8,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JobPosting {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub recruiter_id: ObjectId,
    pub title: String,
    pub description: Option<String>,

    // Requirements matched against applicant profiles. Ordered,
    // compared case-insensitively. Immutable once published.
    pub required_skills: Vec<String>,
    pub experience_level: ExperienceLevel,

    pub is_published: bool,
    pub applications_count: i32,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateJobDto {
    pub title: String,
    pub description: Option<String>,
    pub required_skills: Vec<String>,
    pub experience_level: ExperienceLevel,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateJobDto {
    pub title: Option<String>,
    pub description: Option<String>,
    pub required_skills: Option<Vec<String>>,
    pub experience_level: Option<ExperienceLevel>,
}
