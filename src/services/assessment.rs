use std::collections::HashMap;

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;

use crate::models::{Assessment, AssessmentStatus, QuestionBank};

/// Why a submission attempt was refused. Route handlers map these onto
/// the API error taxonomy (ownership → 403, terminal/expired → 409).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitRejection {
    NotOwner,
    AlreadyCompleted,
    Expired,
}

/// Precondition check for a submission. The persisted write still goes
/// through an atomic conditional update; this only classifies failures
/// up front so callers get a precise error instead of a bare
/// "no rows matched".
pub fn check_submission(
    assessment: &Assessment,
    caller_id: ObjectId,
    now: DateTime<Utc>,
) -> Result<(), SubmitRejection> {
    if assessment.applicant_id != caller_id {
        return Err(SubmitRejection::NotOwner);
    }
    match assessment.effective_status(now) {
        AssessmentStatus::Completed => Err(SubmitRejection::AlreadyCompleted),
        AssessmentStatus::Expired => Err(SubmitRejection::Expired),
        AssessmentStatus::Sent | AssessmentStatus::InProgress => Ok(()),
    }
}

/// Completion-rate grade: the percentage of questions that received a
/// non-empty answer. There is no answer key, so this measures how much
/// of the quiz was filled in, not correctness.
pub fn completion_score(bank: &QuestionBank, responses: &HashMap<String, String>) -> i32 {
    if bank.is_empty() {
        return 0;
    }
    let questions = bank.presentation_order();
    let answered = questions
        .iter()
        .filter(|question| {
            responses
                .get(&question.key)
                .is_some_and(|answer| !answer.trim().is_empty())
        })
        .count();
    let percentage = answered as f64 / questions.len() as f64 * 100.0;
    (percentage.round() as i32).clamp(0, 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use mongodb::bson::DateTime as BsonDateTime;
    use crate::models::{Question, ASSESSMENT_TTL_DAYS};

    fn bank(keys: &[&str]) -> QuestionBank {
        QuestionBank::Flat(
            keys.iter()
                .map(|key| Question::new(*key, "prompt"))
                .collect(),
        )
    }

    fn responses(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn fresh_assessment(now: DateTime<Utc>, status: AssessmentStatus) -> Assessment {
        let expires = now + Duration::days(ASSESSMENT_TTL_DAYS);
        Assessment {
            id: Some(ObjectId::new()),
            application_id: ObjectId::new(),
            job_id: ObjectId::new(),
            applicant_id: ObjectId::new(),
            questions: bank(&["q1", "q2"]),
            status,
            score: None,
            responses: None,
            access_token: "token".to_string(),
            expires_at: BsonDateTime::from_millis(expires.timestamp_millis()),
            created_at: BsonDateTime::from_millis(now.timestamp_millis()),
            updated_at: BsonDateTime::from_millis(now.timestamp_millis()),
        }
    }

    #[test]
    fn owner_can_submit_within_the_window() {
        let now = Utc::now();
        let assessment = fresh_assessment(now, AssessmentStatus::Sent);
        assert_eq!(
            check_submission(&assessment, assessment.applicant_id, now),
            Ok(())
        );
        let assessment = fresh_assessment(now, AssessmentStatus::InProgress);
        assert_eq!(
            check_submission(&assessment, assessment.applicant_id, now),
            Ok(())
        );
    }

    #[test]
    fn non_owner_is_rejected_before_anything_else() {
        let now = Utc::now();
        let assessment = fresh_assessment(now, AssessmentStatus::Sent);
        assert_eq!(
            check_submission(&assessment, ObjectId::new(), now),
            Err(SubmitRejection::NotOwner)
        );
    }

    #[test]
    fn submission_one_second_past_the_window_is_expired() {
        let now = Utc::now();
        let assessment = fresh_assessment(now, AssessmentStatus::InProgress);
        let late = now + Duration::days(ASSESSMENT_TTL_DAYS) + Duration::seconds(1);
        assert_eq!(
            check_submission(&assessment, assessment.applicant_id, late),
            Err(SubmitRejection::Expired)
        );
    }

    #[test]
    fn second_submission_hits_the_completed_guard() {
        let now = Utc::now();
        let mut assessment = fresh_assessment(now, AssessmentStatus::Sent);
        assert!(check_submission(&assessment, assessment.applicant_id, now).is_ok());

        // First submit landed: status is terminal now.
        assessment.status = AssessmentStatus::Completed;
        assert_eq!(
            check_submission(&assessment, assessment.applicant_id, now),
            Err(SubmitRejection::AlreadyCompleted)
        );
    }

    #[test]
    fn completion_score_counts_non_empty_answers() {
        let bank = bank(&["q1", "q2", "q3", "q4"]);
        let full = responses(&[("q1", "a"), ("q2", "b"), ("q3", "c"), ("q4", "d")]);
        assert_eq!(completion_score(&bank, &full), 100);

        let half = responses(&[("q1", "a"), ("q2", "   "), ("q3", ""), ("q4", "d")]);
        assert_eq!(completion_score(&bank, &half), 50);

        assert_eq!(completion_score(&bank, &HashMap::new()), 0);
    }

    #[test]
    fn completion_score_ignores_unknown_keys_and_empty_banks() {
        let bank2 = bank(&["q1", "q2"]);
        let noise = responses(&[("bogus", "x"), ("q1", "real")]);
        assert_eq!(completion_score(&bank2, &noise), 50);

        assert_eq!(completion_score(&bank(&[]), &noise), 0);
    }

    #[test]
    fn completion_score_handles_bucketed_banks() {
        let bucketed = QuestionBank::Bucketed {
            work_ethics: vec![Question::new("we_1", "p")],
            technical: vec![Question::new("tech_1", "p"), Question::new("tech_2", "p")],
        };
        let partial = responses(&[("we_1", "done"), ("tech_2", "done")]);
        assert_eq!(completion_score(&bucketed, &partial), 67);
    }
}
