//! Wire types shared between the collabdesk console and the platform's admin API.
//!
//! Records mirror what the admin endpoints return; request bodies mirror what
//! they accept. Timestamps travel as RFC 3339 strings.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $key:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $key),+
                }
            }
        }

        impl TryFrom<&str> for $name {
            type Error = ();

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                match value {
                    $($key => Ok($name::$variant),)+
                    _ => Err(()),
                }
            }
        }
    };
}

wire_enum! {
    /// Publication state of a blog post.
    BlogStatus {
        Draft => "draft",
        Published => "published",
        Archived => "archived",
    }
}

wire_enum! {
    /// Moderation state of a research project.
    ProjectStatus {
        Pending => "pending",
        Active => "active",
        Inactive => "inactive",
        Completed => "completed",
    }
}

wire_enum! {
    EventStatus {
        Upcoming => "upcoming",
        Ongoing => "ongoing",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

wire_enum! {
    ThreadStatus {
        Open => "open",
        Answered => "answered",
        Closed => "closed",
    }
}

wire_enum! {
    InstitutionStatus {
        Active => "active",
        Inactive => "inactive",
    }
}

wire_enum! {
    UserRole {
        Admin => "admin",
        Instructor => "instructor",
        Student => "student",
        Researcher => "researcher",
    }
}

/// State of a bulk user creation job. The API spells these in title case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BulkCreationState {
    Processing,
    Completed,
    Failed,
}

impl BulkCreationState {
    pub fn as_str(self) -> &'static str {
        match self {
            BulkCreationState::Processing => "Processing",
            BulkCreationState::Completed => "Completed",
            BulkCreationState::Failed => "Failed",
        }
    }

    /// Whether the job has stopped changing.
    pub fn is_terminal(self) -> bool {
        !matches!(self, BulkCreationState::Processing)
    }
}

/// Lightweight reference to the person who authored or owns a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRef {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogRecord {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub status: BlogStatus,
    #[serde(default)]
    pub author: Option<PersonRef>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub id: Uuid,
    pub title: String,
    #[serde(rename = "abstract", default)]
    pub abstract_text: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub status: ProjectStatus,
    #[serde(default)]
    pub owner: Option<PersonRef>,
    #[serde(default)]
    pub assigned_instructor: Option<PersonRef>,
    #[serde(default)]
    pub institution: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: UserRole,
    #[serde(default)]
    pub institution: Option<String>,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstitutionRecord {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub institution_type: Option<String>,
    pub status: InstitutionStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub event_type: Option<String>,
    pub status: EventStatus,
    #[serde(default)]
    pub organizer: Option<PersonRef>,
    #[serde(with = "time::serde::rfc3339")]
    pub starts_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaThreadRecord {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    pub status: ThreadStatus,
    #[serde(default)]
    pub author: Option<PersonRef>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Pagination parameters accepted by every list endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListParams {
    pub page: u32,
    pub limit: u32,
}

/// Envelope returned by list endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListResponse<T> {
    #[serde(alias = "data")]
    pub items: Vec<T>,
    #[serde(default)]
    pub total: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogStatusRequest {
    pub status: BlogStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectStatusRequest {
    pub status: ProjectStatus,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDeletionRequest {
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserActivationRequest {
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Text fields of a project update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectUpdateFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "abstract", default, skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
}

impl ProjectUpdateFields {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.abstract_text.is_none()
            && self.category.is_none()
            && self.status.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructorRow {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRow {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub assigned_instructor_email: String,
}

/// Roster extracted from an uploaded spreadsheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedRoster {
    #[serde(default)]
    pub instructors: Vec<InstructorRow>,
    #[serde(default)]
    pub students: Vec<StudentRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkUsersRequest {
    pub instructors: Vec<InstructorRow>,
    pub students: Vec<StudentRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkCreationAccepted {
    #[serde(alias = "bulkCreationId")]
    pub bulk_creation_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkCreationStatus {
    pub status: BulkCreationState,
    #[serde(default)]
    pub total_instructors: u32,
    #[serde(default)]
    pub processed_instructors: u32,
    #[serde(default)]
    pub total_students: u32,
    #[serde(default)]
    pub processed_students: u32,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Error body the admin API attaches to rejected requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ApiErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.message.or(self.error).filter(|text| !text.trim().is_empty())
    }
}
