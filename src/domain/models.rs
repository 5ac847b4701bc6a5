use serde::{Deserialize, Serialize};

const DEFAULT_PRIORITY: &str = "medium";

fn default_priority() -> String {
    DEFAULT_PRIORITY.to_string()
}

fn default_status() -> String {
    "active".to_string()
}

fn default_mode() -> String {
    "focus".to_string()
}

fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub title: String,
    #[serde(default = "default_priority")]
    pub priority: String,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
}

impl Task {
    pub fn is_active(&self) -> bool {
        is_active_status(&self.status)
    }

    pub fn priority_tier(&self) -> PriorityTier {
        PriorityTier::from_raw(&self.priority)
    }

    /// Priority as echoed back to callers; blank values read as "medium".
    pub fn display_priority(&self) -> &str {
        if self.priority.is_empty() {
            DEFAULT_PRIORITY
        } else {
            &self.priority
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default)]
    pub task_id: Option<i64>,
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default)]
    pub minutes: i64,
    #[serde(default)]
    pub started_at: Option<String>,
}

impl Session {
    pub fn mode(&self) -> SessionMode {
        SessionMode::from_raw(&self.mode)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    Focus,
    Break,
    Other,
}

impl SessionMode {
    pub fn from_raw(raw: &str) -> Self {
        match normalize(raw).as_str() {
            "focus" => SessionMode::Focus,
            "break" => SessionMode::Break,
            _ => SessionMode::Other,
        }
    }
}

pub fn is_active_status(status: &str) -> bool {
    !matches!(normalize(status).as_str(), "done" | "completed" | "complete")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityTier {
    High,
    Medium,
    /// "low" and anything unrecognised, including blanks.
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriorityProfile {
    pub score: f64,
    pub weight: f64,
    pub reason: Option<Reason>,
}

impl PriorityTier {
    pub fn from_raw(raw: &str) -> Self {
        match normalize(raw).as_str() {
            "high" => PriorityTier::High,
            "medium" => PriorityTier::Medium,
            _ => PriorityTier::Other,
        }
    }

    pub fn profile(self) -> PriorityProfile {
        match self {
            PriorityTier::High => PriorityProfile {
                score: 1.8,
                weight: 1.35,
                reason: Some(Reason::HighPriority),
            },
            PriorityTier::Medium => PriorityProfile {
                score: 1.2,
                weight: 1.0,
                reason: None,
            },
            PriorityTier::Other => PriorityProfile {
                score: 0.8,
                weight: 0.85,
                reason: None,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum Reason {
    #[serde(rename = "High priority")]
    HighPriority,
    #[serde(rename = "Overdue")]
    Overdue,
    #[serde(rename = "Due soon")]
    DueSoon,
    #[serde(rename = "Due in a few days")]
    DueInAFewDays,
    #[serde(rename = "Low focus time")]
    LowFocusTime,
    #[serde(rename = "Needs more focus")]
    NeedsMoreFocus,
    #[serde(rename = "Not touched recently")]
    NotTouchedRecently,
}

impl Reason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reason::HighPriority => "High priority",
            Reason::Overdue => "Overdue",
            Reason::DueSoon => "Due soon",
            Reason::DueInAFewDays => "Due in a few days",
            Reason::LowFocusTime => "Low focus time",
            Reason::NeedsMoreFocus => "Needs more focus",
            Reason::NotTouchedRecently => "Not touched recently",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub task_id: i64,
    pub title: String,
    pub priority: String,
    pub deadline: Option<String>,
    pub score: f64,
    pub reasons: Vec<Reason>,
    pub suggested_pomodoros: u32,
}
