//! Projects and the client view derived from them

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::Hub;
use crate::workflow::ParseStatusError;

const PROJECT_ID_PREFIX: &str = "PRJ-";

/// A customer build that reserves and consumes stock
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub project_id: String,
    pub name: String,
    pub client: String,
    pub hub: Hub,
    pub status: ProjectStatus,
    pub lead: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Planning,
    Active,
    Complete,
    OnHold,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Planning => "planning",
            ProjectStatus::Active => "active",
            ProjectStatus::Complete => "complete",
            ProjectStatus::OnHold => "on_hold",
        }
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectStatus::Planning => write!(f, "Planning"),
            ProjectStatus::Active => write!(f, "Active"),
            ProjectStatus::Complete => write!(f, "Complete"),
            ProjectStatus::OnHold => write!(f, "On Hold"),
        }
    }
}

impl std::str::FromStr for ProjectStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "planning" => Ok(ProjectStatus::Planning),
            "active" => Ok(ProjectStatus::Active),
            "complete" => Ok(ProjectStatus::Complete),
            "on_hold" => Ok(ProjectStatus::OnHold),
            _ => Err(ParseStatusError::new("project status", s)),
        }
    }
}

/// Input for creating a project
#[derive(Debug, Clone, Deserialize)]
pub struct NewProject {
    pub name: String,
    pub client: String,
    pub hub: Hub,
    #[serde(default)]
    pub status: ProjectStatus,
    pub lead: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Numeric suffix of a `PRJ-NNN` id
pub fn project_number(project_id: &str) -> Option<u32> {
    project_id.strip_prefix(PROJECT_ID_PREFIX)?.parse().ok()
}

/// Next sequential project id: one past the highest existing number, zero-padded to three digits
pub fn next_project_id<'a, I>(existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let max = existing
        .into_iter()
        .filter_map(project_number)
        .max()
        .unwrap_or(0);
    format!("{}{:03}", PROJECT_ID_PREFIX, max + 1)
}

/// Projects grouped under one client name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSummary {
    pub client: String,
    pub project_count: usize,
    pub planning: usize,
    pub active: usize,
    pub complete: usize,
    pub on_hold: usize,
    pub project_ids: Vec<String>,
}

/// Synthesize the clients view from the free-text client field
pub fn summarize_clients(projects: &[Project]) -> Vec<ClientSummary> {
    let mut by_client: BTreeMap<String, ClientSummary> = BTreeMap::new();

    for project in projects {
        let key = project.client.trim().to_string();
        let entry = by_client.entry(key.clone()).or_insert_with(|| ClientSummary {
            client: key,
            project_count: 0,
            planning: 0,
            active: 0,
            complete: 0,
            on_hold: 0,
            project_ids: Vec::new(),
        });
        entry.project_count += 1;
        match project.status {
            ProjectStatus::Planning => entry.planning += 1,
            ProjectStatus::Active => entry.active += 1,
            ProjectStatus::Complete => entry.complete += 1,
            ProjectStatus::OnHold => entry.on_hold += 1,
        }
        entry.project_ids.push(project.project_id.clone());
    }

    by_client.into_values().collect()
}
