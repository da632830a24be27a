//! Confidence scoring
//!
//! Scores one agent profile against a task. Three independently capped
//! components sum to at most 100:
//! - keyword weight (<=40): fraction of trigger keywords found in the text
//! - complexity fit (<=30): full credit inside the profile's band, minus 5
//!   per point of distance outside it
//! - priority weight (<=30): lower priority numbers are slightly favored

use crate::agents::{AgentName, AgentProfile};

/// One agent's score for a task
#[derive(Debug, Clone)]
pub struct AgentScore {
    pub agent: AgentName,
    /// 0..=100
    pub score: u8,
    pub reasoning: String,
}

/// Score a profile against the task text and its derived complexity
pub fn score_agent(task_text: &str, profile: &AgentProfile, complexity: u8) -> AgentScore {
    let lower = task_text.to_lowercase();

    let matched = profile
        .keywords
        .iter()
        .filter(|k| lower.contains(&k.to_lowercase()))
        .count();
    let keyword_weight = if profile.keywords.is_empty() {
        0.0
    } else {
        matched as f64 / profile.keywords.len() as f64 * 40.0
    };

    let (min, max) = profile.complexity_range;
    let fit_weight = complexity_fit(complexity, min, max);

    let priority_weight = (((4 - i32::from(profile.priority)) * 10).clamp(0, 30)) as f64;

    let total = (keyword_weight + fit_weight + priority_weight)
        .round()
        .clamp(0.0, 100.0) as u8;

    let fit_note = if complexity >= min && complexity <= max {
        format!("complexity {complexity} in range [{min},{max}]")
    } else {
        format!("complexity {complexity} outside range [{min},{max}]")
    };
    let reasoning = format!(
        "{matched}/{} keyword matches; {fit_note}; priority {}",
        profile.keywords.len(),
        profile.priority,
    );

    AgentScore {
        agent: profile.name,
        score: total,
        reasoning,
    }
}

fn complexity_fit(complexity: u8, min: u8, max: u8) -> f64 {
    let complexity = i32::from(complexity);
    let (min, max) = (i32::from(min), i32::from(max));
    let distance = if complexity < min {
        min - complexity
    } else if complexity > max {
        complexity - max
    } else {
        0
    };
    f64::from((30 - 5 * distance).max(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> AgentProfile {
        AgentProfile::new(AgentName::Review, "Reviewer")
            .with_keywords(vec!["review".to_string(), "check".to_string()])
            .with_priority(2)
            .with_complexity_range(3, 8)
    }

    #[test]
    fn test_score_within_bounds() {
        for complexity in 1..=10 {
            let scored = score_agent("review and check everything", &profile(), complexity);
            assert!(scored.score <= 100);
        }
    }

    #[test]
    fn test_full_keyword_match() {
        // 2/2 keywords -> 40, complexity 5 in range -> 30, priority 2 -> 20
        let scored = score_agent("please review and check this", &profile(), 5);
        assert_eq!(scored.score, 90);
    }

    #[test]
    fn test_no_keyword_match() {
        // 0 keywords, in range 30, priority 20
        let scored = score_agent("delete the file", &profile(), 5);
        assert_eq!(scored.score, 50);
    }

    #[test]
    fn test_complexity_below_range() {
        // 30 - 5*(3-1) = 20
        assert_eq!(complexity_fit(1, 3, 8), 20.0);
    }

    #[test]
    fn test_complexity_above_range_floors_at_zero() {
        assert_eq!(complexity_fit(10, 1, 2), 0.0);
        assert_eq!(complexity_fit(9, 3, 8), 25.0);
    }

    #[test]
    fn test_priority_weight_clamped() {
        // priority 0 gives (4-0)*10 = 40, clamped to 30
        let general = AgentProfile::new(AgentName::Execute, "General").with_priority(0);
        let scored = score_agent("anything", &general, 5);
        assert_eq!(scored.score, 60); // 0 keywords + 30 fit + 30 priority

        // priority 9 floors at 0
        let low = AgentProfile::new(AgentName::Execute, "Low").with_priority(9);
        let scored = score_agent("anything", &low, 5);
        assert_eq!(scored.score, 30);
    }

    #[test]
    fn test_reasoning_mentions_matches_and_range() {
        let scored = score_agent("review this", &profile(), 5);
        assert!(scored.reasoning.contains("1/2 keyword matches"));
        assert!(scored.reasoning.contains("complexity 5 in range [3,8]"));
    }

    #[test]
    fn test_keyword_match_case_insensitive() {
        let scored = score_agent("REVIEW the patch", &profile(), 5);
        assert!(scored.reasoning.starts_with("1/2"));
    }
}
