use crate::models::{CriteriaBreakdown, ExperienceLevel};

/// Fixed floor every candidate starts from.
pub const BASE_SCORE: i32 = 60;
/// Points available from the required-skill overlap term.
pub const SKILL_WEIGHT: f64 = 30.0;
/// Flat bonus when the years-of-experience threshold for the job's
/// level is met.
pub const EXPERIENCE_BONUS: i32 = 10;

pub const STRONG_THRESHOLD: i32 = 80;
pub const GOOD_THRESHOLD: i32 = 60;

#[derive(Debug, Clone, PartialEq)]
pub struct MatchScoreResult {
    pub score: i32,
    pub label: &'static str,
    pub analysis_text: String,
    pub breakdown: CriteriaBreakdown,
}

/// Heuristic compatibility score between a job's requirements and an
/// applicant profile. Deterministic, pure and total: missing data on
/// either side contributes zero to its term, and the result is always
/// an integer in [0, 100].
///
/// This is the single canonical formula; both the interactive estimate
/// and the persisted analysis go through here.
pub fn compute_match(
    required_skills: &[String],
    experience_level: ExperienceLevel,
    profile_skills: &[String],
    experience_years: Option<i32>,
) -> MatchScoreResult {
    let matched = required_skills
        .iter()
        .filter(|required| skill_matches(required, profile_skills))
        .count();

    let skill_points = if required_skills.is_empty() {
        0
    } else {
        let fraction = matched as f64 / required_skills.len() as f64;
        (fraction * SKILL_WEIGHT).round() as i32
    };

    let experience_met =
        experience_years.is_some_and(|years| years >= experience_level.min_years());
    let experience_points = if experience_met { EXPERIENCE_BONUS } else { 0 };

    let score = (BASE_SCORE + skill_points + experience_points).clamp(0, 100);
    let label = score_label(score);

    let analysis_text = format!(
        "{} match ({}%): {} of {} required skills matched; experience requirement {}.",
        label,
        score,
        matched,
        required_skills.len(),
        if experience_met { "met" } else { "not met" },
    );

    MatchScoreResult {
        score,
        label,
        analysis_text,
        breakdown: CriteriaBreakdown {
            base: BASE_SCORE,
            skills: skill_points,
            experience: experience_points,
        },
    }
}

pub fn score_label(score: i32) -> &'static str {
    if score >= STRONG_THRESHOLD {
        "Strong"
    } else if score >= GOOD_THRESHOLD {
        "Good"
    } else {
        "Moderate"
    }
}

/// Case-insensitive substring containment in either direction, so
/// "react" matches "React.js" and "Node.js" matches "node".
fn skill_matches(required: &str, profile_skills: &[String]) -> bool {
    let required = required.trim().to_lowercase();
    if required.is_empty() {
        return false;
    }
    profile_skills.iter().any(|skill| {
        let skill = skill.trim().to_lowercase();
        !skill.is_empty() && (skill.contains(&required) || required.contains(&skill))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skills(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn full_overlap_and_top_bracket_experience_scores_100() {
        let required = skills(&["Rust", "MongoDB", "Docker"]);
        let result = compute_match(&required, ExperienceLevel::Lead, &required, Some(10));
        assert_eq!(result.score, 100);
        assert_eq!(result.label, "Strong");
        assert_eq!(result.breakdown.skills, 30);
        assert_eq!(result.breakdown.experience, 10);
    }

    #[test]
    fn empty_profile_scores_exactly_the_base() {
        let required = skills(&["Rust", "Kubernetes"]);
        let result = compute_match(&required, ExperienceLevel::Senior, &[], None);
        assert_eq!(result.score, BASE_SCORE);
        assert_eq!(result.breakdown.skills, 0);
        assert_eq!(result.breakdown.experience, 0);
    }

    #[test]
    fn empty_requirements_do_not_divide_by_zero() {
        let result = compute_match(
            &[],
            ExperienceLevel::Entry,
            &skills(&["anything"]),
            Some(1),
        );
        assert!(result.score >= 0 && result.score <= 100);
        assert_eq!(result.breakdown.skills, 0);
        // Entry level is always satisfied when years are present.
        assert_eq!(result.breakdown.experience, EXPERIENCE_BONUS);
    }

    #[test]
    fn mid_level_react_scenario_scores_85_strong() {
        let required = skills(&["React", "Node.js"]);
        let profile = skills(&["react", "aws"]);
        let result = compute_match(&required, ExperienceLevel::Mid, &profile, Some(3));
        assert_eq!(result.breakdown.skills, 15);
        assert_eq!(result.breakdown.experience, 10);
        assert_eq!(result.score, 85);
        assert_eq!(result.label, "Strong");
    }

    #[test]
    fn skill_match_is_case_insensitive_substring_both_ways() {
        let required = skills(&["Node.js"]);
        assert_eq!(
            compute_match(&required, ExperienceLevel::Entry, &skills(&["node"]), None)
                .breakdown
                .skills,
            30
        );
        let required = skills(&["node"]);
        assert_eq!(
            compute_match(&required, ExperienceLevel::Entry, &skills(&["Node.js"]), None)
                .breakdown
                .skills,
            30
        );
    }

    #[test]
    fn missing_years_never_earns_the_experience_bonus() {
        let result = compute_match(
            &skills(&["rust"]),
            ExperienceLevel::Entry,
            &skills(&["rust"]),
            None,
        );
        assert_eq!(result.breakdown.experience, 0);
        assert_eq!(result.score, 90);
    }

    #[test]
    fn below_threshold_years_earn_no_bonus() {
        let result = compute_match(
            &skills(&["rust"]),
            ExperienceLevel::Senior,
            &skills(&["go"]),
            Some(4),
        );
        assert_eq!(result.breakdown.experience, 0);
        assert_eq!(result.score, BASE_SCORE);
        assert_eq!(result.label, "Good");
    }

    #[test]
    fn label_banding_boundaries() {
        assert_eq!(score_label(80), "Strong");
        assert_eq!(score_label(79), "Good");
        assert_eq!(score_label(60), "Good");
        assert_eq!(score_label(59), "Moderate");
    }

    #[test]
    fn score_is_always_an_integer_in_range() {
        let cases: &[(&[&str], &[&str], Option<i32>)] = &[
            (&[], &[], None),
            (&["a", "b", "c"], &["a"], Some(100)),
            (&["x"], &["y"], Some(-3)),
            (&["", "  "], &["z"], Some(0)),
        ];
        for (required, profile, years) in cases {
            let result = compute_match(
                &skills(required),
                ExperienceLevel::Mid,
                &skills(profile),
                *years,
            );
            assert!(
                (0..=100).contains(&result.score),
                "score {} out of range",
                result.score
            );
        }
    }
}
