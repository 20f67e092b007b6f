//! Sanity checks over analysis-engine result documents.

use serde::Serialize;
use serde_json::Value;

const FIXED_SEGMENT_SECONDS: f64 = 30.0;
const DURATION_TOLERANCE: f64 = 0.1;
const PENALTY_PER_ISSUE: u32 = 25;

pub(crate) const FIXED_SEGMENTATION_ISSUE: &str =
    "fixed 30-second segmentation instead of content-aware segmentation";
pub(crate) const EMPTY_TRANSCRIPTION_ISSUE: &str = "audio transcription is empty";
pub(crate) const VIDEO_PATH_MISMATCH_ISSUE: &str = "video path does not match the task id";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct DataQualityReport {
    pub(crate) has_issues: bool,
    pub(crate) issues: Vec<String>,
    pub(crate) score: u32,
}

pub(crate) fn assess(results: &Value, task_id: &str) -> DataQualityReport {
    let mut issues = Vec::new();

    if has_fixed_length_segments(results) {
        issues.push(FIXED_SEGMENTATION_ISSUE.to_string());
    }

    if transcription_is_empty(results.get("transcription")) {
        issues.push(EMPTY_TRANSCRIPTION_ISSUE.to_string());
    }

    if let Some(video_path) = results.get("video_path").and_then(Value::as_str)
        && !video_path.is_empty()
        && !video_path.contains(task_id)
    {
        issues.push(VIDEO_PATH_MISMATCH_ISSUE.to_string());
    }

    let penalty = PENALTY_PER_ISSUE.saturating_mul(issues.len() as u32);
    DataQualityReport {
        has_issues: !issues.is_empty(),
        score: 100u32.saturating_sub(penalty),
        issues,
    }
}

// Any non-numeric duration means the check cannot conclude anything.
fn has_fixed_length_segments(results: &Value) -> bool {
    let Some(segments) = results.get("segments").and_then(Value::as_array) else {
        return false;
    };
    let durations: Option<Vec<f64>> = segments
        .iter()
        .map(|segment| segment.get("duration").and_then(Value::as_f64))
        .collect();
    let Some(durations) = durations else {
        return false;
    };
    let Some(&first) = durations.first() else {
        return false;
    };

    durations
        .iter()
        .all(|duration| (duration - first).abs() < DURATION_TOLERANCE)
        && (first - FIXED_SEGMENT_SECONDS).abs() < DURATION_TOLERANCE
}

fn transcription_is_empty(transcription: Option<&Value>) -> bool {
    match transcription {
        None | Some(Value::Null) => true,
        Some(Value::Object(map)) => map.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::String(text)) => text.is_empty(),
        Some(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clean_results_score_full_marks() {
        let results = json!({
            "segments": [{"duration": 12.5}, {"duration": 30.0}],
            "transcription": {"segments": [{"text": "hello"}]},
            "video_path": "uploads/task-42.mp4"
        });
        let report = assess(&results, "task-42");
        assert_eq!(
            report,
            DataQualityReport {
                has_issues: false,
                issues: vec![],
                score: 100
            }
        );
    }

    #[test]
    fn flags_every_problem_and_deducts_per_issue() {
        let results = json!({
            "segments": [{"duration": 30.0}, {"duration": 30.05}, {"duration": 29.95}],
            "transcription": {},
            "video_path": "uploads/other-task.mp4"
        });
        let report = assess(&results, "task-42");
        assert!(report.has_issues);
        assert_eq!(
            report.issues,
            vec![
                FIXED_SEGMENTATION_ISSUE,
                EMPTY_TRANSCRIPTION_ISSUE,
                VIDEO_PATH_MISMATCH_ISSUE
            ]
        );
        assert_eq!(report.score, 25);
    }

    #[test]
    fn uniform_segments_of_other_lengths_are_fine() {
        let results = json!({
            "segments": [{"duration": 10.0}, {"duration": 10.0}],
            "transcription": {"text": "x"}
        });
        assert!(!assess(&results, "t").has_issues);
    }

    #[test]
    fn missing_transcription_and_empty_path() {
        let report = assess(&json!({"segments": [], "video_path": ""}), "t");
        assert_eq!(report.issues, vec![EMPTY_TRANSCRIPTION_ISSUE]);
        assert_eq!(report.score, 75);
    }

    #[test]
    fn non_numeric_durations_are_not_flagged() {
        let results = json!({
            "segments": [{"duration": 30.0}, {"duration": "30"}],
            "transcription": {"text": "x"}
        });
        assert!(!assess(&results, "t").has_issues);
    }
}
