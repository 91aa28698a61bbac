//! Boundary to the platform's admin API.
//!
//! Every mutating or fetching operation the console performs goes through
//! [`AdminApi`]. The HTTP adapter lives in `infra::http_client`; an in-memory adapter
//! lives in `infra::memory`.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use uuid::Uuid;

use collabdesk_api_types::{
    BlogRecord, BlogStatus, BulkCreationStatus, BulkUsersRequest, EventRecord, InstitutionRecord,
    ListParams, ParsedRoster, ProjectRecord, ProjectStatus, ProjectUpdateFields, QaThreadRecord,
    UserRecord,
};

use crate::domain::uploads::{UploadError, UploadPolicy, UploadPurpose};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The server answered and refused; `message` is shown to the operator verbatim.
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn decode(err: impl std::fmt::Display) -> Self {
        Self::Decode(err.to_string())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Rejected { status: 404, .. })
    }
}

/// A file held in memory on its way to the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl FileAttachment {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Guess the content type from the file extension.
    pub fn guessed(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let file_name = file_name.into();
        let content_type = mime_guess::from_path(&file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self::new(file_name, content_type, bytes)
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn check(&self, policy: &UploadPolicy, purpose: UploadPurpose) -> Result<(), UploadError> {
        policy.check(purpose, &self.file_name, &self.content_type, self.size())
    }
}

/// Multipart update of a project: optional text fields plus attachments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectUpdate {
    pub fields: ProjectUpdateFields,
    pub logo: Option<FileAttachment>,
    pub files: Vec<FileAttachment>,
}

impl ProjectUpdate {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.logo.is_none() && self.files.is_empty()
    }

    /// Run every attachment through the upload policy.
    pub fn check_attachments(&self, policy: &UploadPolicy) -> Result<(), UploadError> {
        if let Some(logo) = &self.logo {
            logo.check(policy, UploadPurpose::Logo)?;
        }
        for file in &self.files {
            file.check(policy, UploadPurpose::ProjectFile)?;
        }
        Ok(())
    }
}

#[async_trait]
pub trait AdminApi: Send + Sync {
    async fn fetch_blogs(&self, params: ListParams) -> Result<Vec<BlogRecord>, ApiError>;

    async fn update_blog_status(&self, id: Uuid, status: BlogStatus) -> Result<(), ApiError>;

    async fn delete_blog(&self, id: Uuid, confirm: bool) -> Result<(), ApiError>;

    async fn archive_blog(&self, id: Uuid) -> Result<(), ApiError>;

    async fn get_all_projects_for_admin(
        &self,
        params: ListParams,
    ) -> Result<Vec<ProjectRecord>, ApiError>;

    async fn activate_deactivate_project(
        &self,
        id: Uuid,
        status: ProjectStatus,
        reason: &str,
    ) -> Result<(), ApiError>;

    async fn delete_project_by_admin(&self, id: Uuid, reason: &str) -> Result<(), ApiError>;

    async fn update_project(
        &self,
        id: Uuid,
        update: ProjectUpdate,
    ) -> Result<ProjectRecord, ApiError>;

    async fn get_all_users(&self, params: ListParams) -> Result<Vec<UserRecord>, ApiError>;

    async fn activate_deactivate_user(
        &self,
        id: Uuid,
        is_active: bool,
        reason: Option<&str>,
    ) -> Result<(), ApiError>;

    async fn list_institutions(
        &self,
        params: ListParams,
    ) -> Result<Vec<InstitutionRecord>, ApiError>;

    async fn list_events(&self, params: ListParams) -> Result<Vec<EventRecord>, ApiError>;

    async fn list_threads(&self, params: ListParams) -> Result<Vec<QaThreadRecord>, ApiError>;

    async fn parse_excel_file(&self, file: FileAttachment) -> Result<ParsedRoster, ApiError>;

    async fn create_bulk_users(&self, request: BulkUsersRequest) -> Result<Uuid, ApiError>;

    async fn get_bulk_creation_status(&self, id: Uuid) -> Result<BulkCreationStatus, ApiError>;
}
