use std::collections::HashMap;

use chrono::{DateTime as ChronoDateTime, Utc};
use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars::JsonSchema;

/// Completion window granted at generation time. `expires_at` is fixed
/// at creation and never extended.
pub const ASSESSMENT_TTL_DAYS: i64 = 7;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentStatus {
    Sent,
    InProgress,
    Completed,
    Expired,
}

impl AssessmentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AssessmentStatus::Completed | AssessmentStatus::Expired)
    }

    /// Collection-filter value, matching the serde snake_case rename.
    pub fn as_str(&self) -> &'static str {
        match self {
            AssessmentStatus::Sent => "sent",
            AssessmentStatus::InProgress => "in_progress",
            AssessmentStatus::Completed => "completed",
            AssessmentStatus::Expired => "expired",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
pub struct Question {
    pub key: String,
    pub prompt: String,
}

impl Question {
    pub fn new(key: impl Into<String>, prompt: impl Into<String>) -> Self {
        Question {
            key: key.into(),
            prompt: prompt.into(),
        }
    }
}

/// Question payloads arrive in two shapes: a flat ordered list, or two
/// category buckets. Both are accepted verbatim and stored as-is; reads
/// normalize through [`QuestionBank::presentation_order`].
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
#[serde(untagged)]
pub enum QuestionBank {
    Bucketed {
        work_ethics: Vec<Question>,
        technical: Vec<Question>,
    },
    Flat(Vec<Question>),
}

impl QuestionBank {
    /// Normalized presentation order: work ethics first, then technical;
    /// a flat bank keeps its natural order.
    pub fn presentation_order(&self) -> Vec<&Question> {
        match self {
            QuestionBank::Bucketed {
                work_ethics,
                technical,
            } => work_ethics.iter().chain(technical.iter()).collect(),
            QuestionBank::Flat(questions) => questions.iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            QuestionBank::Bucketed {
                work_ethics,
                technical,
            } => work_ethics.len() + technical.len(),
            QuestionBank::Flat(questions) => questions.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fallback bank used when a generation request names no questions.
    pub fn default_bank() -> Self {
        QuestionBank::Bucketed {
            work_ethics: vec![
                Question::new(
                    "we_1",
                    "Describe a time you had to meet a tight deadline. How did you organize your work?",
                ),
                Question::new(
                    "we_2",
                    "How do you handle disagreement with a teammate about the right approach?",
                ),
            ],
            technical: vec![
                Question::new(
                    "tech_1",
                    "Walk through a recent technical problem you solved and the trade-offs you weighed.",
                ),
                Question::new(
                    "tech_2",
                    "Which tools or practices do you rely on to keep your work maintainable?",
                ),
            ],
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Assessment {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub application_id: ObjectId,
    pub job_id: ObjectId,
    pub applicant_id: ObjectId,
    pub questions: QuestionBank,
    pub status: AssessmentStatus,
    pub score: Option<i32>,
    pub responses: Option<HashMap<String, String>>,
    // Embedded in the client URL; informational only, access is gated
    // by applicant_id on read.
    pub access_token: String,
    pub expires_at: DateTime,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Assessment {
    /// Expiry is lazy: the stored status is never demoted by a sweep,
    /// so reads derive the effective status from the clock.
    pub fn effective_status(&self, now: ChronoDateTime<Utc>) -> AssessmentStatus {
        if self.status.is_terminal() {
            return self.status;
        }
        if now.timestamp_millis() > self.expires_at.timestamp_millis() {
            AssessmentStatus::Expired
        } else {
            self.status
        }
    }

    pub fn client_url(&self) -> String {
        let id = self
            .id
            .map(|oid| oid.to_hex())
            .unwrap_or_default();
        format!("/assessment/{}?token={}", id, self.access_token)
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GenerateAssessmentDto {
    pub application_id: String,
    /// Optional question bank (e.g. suggested by a prior scoring pass);
    /// used verbatim when present.
    pub questions: Option<QuestionBank>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SubmitResponsesDto {
    pub responses: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(key: &str) -> Question {
        Question::new(key, format!("prompt for {}", key))
    }

    #[test]
    fn bucketed_bank_presents_work_ethics_before_technical() {
        let bank = QuestionBank::Bucketed {
            work_ethics: vec![q("q1"), q("q2")],
            technical: vec![q("q3"), q("q4")],
        };
        let order: Vec<&str> = bank
            .presentation_order()
            .iter()
            .map(|question| question.key.as_str())
            .collect();
        assert_eq!(order, vec!["q1", "q2", "q3", "q4"]);
    }

    #[test]
    fn flat_bank_keeps_natural_order() {
        let bank = QuestionBank::Flat(vec![q("a"), q("b"), q("c")]);
        let order: Vec<&str> = bank
            .presentation_order()
            .iter()
            .map(|question| question.key.as_str())
            .collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn question_bank_deserializes_both_shapes() {
        let bucketed: QuestionBank = serde_json::from_str(
            r#"{"work_ethics":[{"key":"w1","prompt":"p"}],"technical":[{"key":"t1","prompt":"p"}]}"#,
        )
        .unwrap();
        assert!(matches!(bucketed, QuestionBank::Bucketed { .. }));
        assert_eq!(bucketed.len(), 2);

        let flat: QuestionBank =
            serde_json::from_str(r#"[{"key":"f1","prompt":"p"},{"key":"f2","prompt":"p"}]"#)
                .unwrap();
        assert!(matches!(flat, QuestionBank::Flat(_)));
        assert_eq!(flat.len(), 2);
    }

    #[test]
    fn default_bank_has_two_questions_per_category() {
        match QuestionBank::default_bank() {
            QuestionBank::Bucketed {
                work_ethics,
                technical,
            } => {
                assert_eq!(work_ethics.len(), 2);
                assert_eq!(technical.len(), 2);
            }
            QuestionBank::Flat(_) => panic!("default bank should be bucketed"),
        }
    }

    fn assessment_with(status: AssessmentStatus, expires_at_millis: i64) -> Assessment {
        Assessment {
            id: Some(ObjectId::new()),
            application_id: ObjectId::new(),
            job_id: ObjectId::new(),
            applicant_id: ObjectId::new(),
            questions: QuestionBank::default_bank(),
            status,
            score: None,
            responses: None,
            access_token: "token".to_string(),
            expires_at: DateTime::from_millis(expires_at_millis),
            created_at: DateTime::from_millis(0),
            updated_at: DateTime::from_millis(0),
        }
    }

    #[test]
    fn effective_status_reports_expired_past_deadline() {
        let now = Utc::now();
        let stale = assessment_with(AssessmentStatus::Sent, now.timestamp_millis() - 1_000);
        assert_eq!(stale.effective_status(now), AssessmentStatus::Expired);

        let in_progress =
            assessment_with(AssessmentStatus::InProgress, now.timestamp_millis() - 1_000);
        assert_eq!(in_progress.effective_status(now), AssessmentStatus::Expired);
    }

    #[test]
    fn effective_status_keeps_live_and_terminal_states() {
        let now = Utc::now();
        let live = assessment_with(AssessmentStatus::Sent, now.timestamp_millis() + 60_000);
        assert_eq!(live.effective_status(now), AssessmentStatus::Sent);

        // Completed stays completed even past the deadline.
        let done = assessment_with(AssessmentStatus::Completed, now.timestamp_millis() - 1_000);
        assert_eq!(done.effective_status(now), AssessmentStatus::Completed);
    }
}
