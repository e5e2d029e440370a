use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars::JsonSchema;

/// Named sub-scores behind a persisted match score.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
pub struct CriteriaBreakdown {
    pub base: i32,
    pub skills: i32,
    pub experience: i32,
}

/// One row per (job, applicant) pair. Recomputation upserts over the
/// previous row, so the pair key is the identity that matters.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MatchScore {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub job_id: ObjectId,
    pub applicant_id: ObjectId,
    pub score: i32,
    pub analysis_text: String,
    pub criteria_breakdown: CriteriaBreakdown,
    pub computed_at: DateTime,
}
