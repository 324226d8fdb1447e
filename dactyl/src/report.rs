//! JSON match report handed to the UI and session storage.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::matching::{CandidateMatch, Decision, FeatureScores, MatchResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateReport {
    pub id: String,
    pub score: f64,
    pub decision: Decision,
    pub feature_scores: FeatureScores,
    pub time_ms: f64,
}

impl From<&CandidateMatch> for CandidateReport {
    fn from(m: &CandidateMatch) -> Self {
        Self {
            id: m.candidate_id.clone(),
            score: m.score,
            decision: m.decision,
            feature_scores: m.feature_scores,
            time_ms: m.elapsed.as_secs_f64() * 1000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    pub session_id: Uuid,
    pub probe_filename: String,
    pub threshold_used: f64,
    pub candidates: Vec<CandidateReport>,
    pub total_time_ms: f64,
}

impl MatchReport {
    /// Report for `result` under a fresh session id.
    pub fn new(probe_filename: impl Into<String>, result: &MatchResult) -> Self {
        Self::with_session(Uuid::new_v4(), probe_filename, result)
    }

    pub fn with_session(session_id: Uuid, probe_filename: impl Into<String>, result: &MatchResult) -> Self {
        Self {
            session_id,
            probe_filename: probe_filename.into(),
            threshold_used: result.threshold_used,
            candidates: result.candidates.iter().map(CandidateReport::from).collect(),
            total_time_ms: result.elapsed.as_secs_f64() * 1000.0,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
