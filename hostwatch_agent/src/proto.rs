//! Push-channel message envelope.

use serde::{Deserialize, Serialize};

use crate::types::{MetricsSnapshot, SystemDescription};

/// Text frame a viewer sends to ask for a tracking capture. No payload.
pub const START_TRACKING: &str = "start_tracking";

/// Events the agent pushes to a viewer, serialized as `{"event": ..., "data": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    SystemInfo(SystemDescription),
    Metrics(Box<MetricsSnapshot>),
    MetricsError { message: String },
}

impl ServerEvent {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerRequest {
    StartTracking,
}

impl ViewerRequest {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim() {
            START_TRACKING => Some(ViewerRequest::StartTracking),
            _ => None,
        }
    }
}
