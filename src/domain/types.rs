//! Status enumerations shared by the listable records.

use serde::{Deserialize, Serialize};

pub use collabdesk_api_types::{
    BlogStatus, BulkCreationState, EventStatus, InstitutionStatus, ProjectStatus, ThreadStatus,
    UserRole,
};

use super::error::DomainError;

/// Account state of a user, derived from the API's `is_active` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountState {
    Active,
    Inactive,
}

impl AccountState {
    pub fn from_active(is_active: bool) -> Self {
        if is_active {
            AccountState::Active
        } else {
            AccountState::Inactive
        }
    }
}

/// A status type whose values have stable lowercase keys.
pub trait StatusKey: Copy + Eq + Send + Sync + 'static {
    fn all() -> &'static [Self];

    fn key(self) -> &'static str;

    /// Human label, e.g. `Published`.
    fn label(self) -> String {
        let key = self.key();
        let mut chars = key.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    fn parse_key(value: &str) -> Result<Self, DomainError> {
        let wanted = value.trim().to_ascii_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|status| status.key() == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::all().iter().map(|status| status.key()).collect();
                DomainError::validation(
                    "status",
                    format!("unknown status `{value}` (expected one of: {})", known.join(", ")),
                )
            })
    }
}

macro_rules! wire_status_key {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl StatusKey for $ty {
                fn all() -> &'static [Self] {
                    <$ty>::ALL
                }

                fn key(self) -> &'static str {
                    self.as_str()
                }
            }
        )+
    };
}

wire_status_key!(
    BlogStatus,
    ProjectStatus,
    EventStatus,
    ThreadStatus,
    InstitutionStatus
);

impl StatusKey for AccountState {
    fn all() -> &'static [Self] {
        &[AccountState::Active, AccountState::Inactive]
    }

    fn key(self) -> &'static str {
        match self {
            AccountState::Active => "active",
            AccountState::Inactive => "inactive",
        }
    }
}
