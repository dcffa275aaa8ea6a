//! Team models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

use super::user::{TeamMember, User, UserResponse};

/// Database-assigned team identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct TeamId(pub i64);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Team row without members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamRecord {
    pub id: TeamId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Team with its members.
#[derive(Debug, Clone)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub members: Vec<User>,
    pub created_at: DateTime<Utc>,
}

impl Team {
    pub fn from_record(record: TeamRecord, members: Vec<User>) -> Self {
        Self {
            id: record.id,
            name: record.name,
            members,
            created_at: record.created_at,
        }
    }
}

/// Request body for team creation.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTeamRequest {
    pub team_name: String,
    pub members: Vec<TeamMember>,
}

/// Query parameters for team lookup.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TeamQuery {
    pub team_name: String,
}

/// Team payload returned by the API.
#[derive(Debug, Serialize, ToSchema)]
pub struct TeamResponse {
    pub team_id: i64,
    pub team_name: String,
    pub members: Vec<UserResponse>,
    pub created_at: DateTime<Utc>,
}

impl From<Team> for TeamResponse {
    fn from(t: Team) -> Self {
        Self {
            team_id: t.id.0,
            team_name: t.name,
            members: t.members.into_iter().map(UserResponse::from).collect(),
            created_at: t.created_at,
        }
    }
}
