use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::error::DomainError;
use crate::itinerary::Itinerary;

/// Per-itinerary access level. `Owner` is assigned exactly once, at creation,
/// to the creating user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    Owner,
    Editor,
    Viewer,
}

impl AccessLevel {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "owner" => Some(AccessLevel::Owner),
            "editor" => Some(AccessLevel::Editor),
            "viewer" => Some(AccessLevel::Viewer),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Owner => "owner",
            AccessLevel::Editor => "editor",
            AccessLevel::Viewer => "viewer",
        }
    }

    pub fn can_edit(&self) -> bool {
        matches!(self, AccessLevel::Owner | AccessLevel::Editor)
    }
}

/// A (user, access-level) binding scoped to one itinerary. At most one record
/// per user id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub user_id: String,
    pub access: AccessLevel,
}

/// Looks up the user's access level on the itinerary's permission list.
/// Absence is `NotAuthorized`, never a default level; an empty permission
/// list is indistinguishable from a missing record.
pub fn resolve_access(itinerary: &Itinerary, user_id: &str) -> DomainResult<AccessLevel> {
    itinerary
        .permissions
        .iter()
        .find(|permission| permission.user_id == user_id)
        .map(|permission| permission.access.clone())
        .ok_or(DomainError::NotAuthorized)
}
