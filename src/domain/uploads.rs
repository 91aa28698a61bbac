//! Client-side checks applied to files before they are sent anywhere.

use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIB: u64 = 1024 * 1024;
pub const DEFAULT_LOGO_MAX_BYTES: u64 = 5 * MIB;
pub const DEFAULT_PROJECT_FILE_MAX_BYTES: u64 = 10 * MIB;
pub const DEFAULT_SPREADSHEET_MAX_BYTES: u64 = 10 * MIB;

const LOGO_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/gif",
    "image/webp",
    "image/svg+xml",
];

const PROJECT_FILE_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-powerpoint",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "application/zip",
    "text/plain",
    "image/png",
    "image/jpeg",
];

const SPREADSHEET_TYPES: &[&str] = &[
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-excel",
    "text/csv",
];

/// What an uploaded file is for; each purpose has its own limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadPurpose {
    Logo,
    ProjectFile,
    Spreadsheet,
}

impl UploadPurpose {
    pub fn as_str(self) -> &'static str {
        match self {
            UploadPurpose::Logo => "logo",
            UploadPurpose::ProjectFile => "project file",
            UploadPurpose::Spreadsheet => "spreadsheet",
        }
    }

    fn accepted_types(self) -> &'static [&'static str] {
        match self {
            UploadPurpose::Logo => LOGO_TYPES,
            UploadPurpose::ProjectFile => PROJECT_FILE_TYPES,
            UploadPurpose::Spreadsheet => SPREADSHEET_TYPES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("{file_name} is empty")]
    Empty { file_name: String },
    #[error("{file_name} is {size} bytes; a {} may be at most {limit} bytes", .purpose.as_str())]
    TooLarge {
        file_name: String,
        purpose: UploadPurpose,
        size: u64,
        limit: u64,
    },
    #[error("{file_name} has type `{content_type}`, which is not accepted for a {}", .purpose.as_str())]
    UnsupportedType {
        file_name: String,
        purpose: UploadPurpose,
        content_type: String,
    },
}

/// Size ceilings per upload purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadPolicy {
    pub logo_max_bytes: NonZeroU64,
    pub project_file_max_bytes: NonZeroU64,
    pub spreadsheet_max_bytes: NonZeroU64,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            logo_max_bytes: NonZeroU64::new(DEFAULT_LOGO_MAX_BYTES).unwrap_or(NonZeroU64::MIN),
            project_file_max_bytes: NonZeroU64::new(DEFAULT_PROJECT_FILE_MAX_BYTES)
                .unwrap_or(NonZeroU64::MIN),
            spreadsheet_max_bytes: NonZeroU64::new(DEFAULT_SPREADSHEET_MAX_BYTES)
                .unwrap_or(NonZeroU64::MIN),
        }
    }
}

impl UploadPolicy {
    pub fn limit_for(&self, purpose: UploadPurpose) -> u64 {
        match purpose {
            UploadPurpose::Logo => self.logo_max_bytes.get(),
            UploadPurpose::ProjectFile => self.project_file_max_bytes.get(),
            UploadPurpose::Spreadsheet => self.spreadsheet_max_bytes.get(),
        }
    }

    /// Check a file's size and MIME type against the limits for `purpose`.
    pub fn check(
        &self,
        purpose: UploadPurpose,
        file_name: &str,
        content_type: &str,
        size: u64,
    ) -> Result<(), UploadError> {
        if size == 0 {
            return Err(UploadError::Empty {
                file_name: file_name.to_string(),
            });
        }

        let limit = self.limit_for(purpose);
        if size > limit {
            return Err(UploadError::TooLarge {
                file_name: file_name.to_string(),
                purpose,
                size,
                limit,
            });
        }

        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if !purpose.accepted_types().contains(&essence.as_str()) {
            return Err(UploadError::UnsupportedType {
                file_name: file_name.to_string(),
                purpose,
                content_type: content_type.to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logo_limit_is_five_mebibytes() {
        let policy = UploadPolicy::default();
        assert!(policy.check(UploadPurpose::Logo, "logo.png", "image/png", 5 * MIB).is_ok());

        let err = policy
            .check(UploadPurpose::Logo, "logo.png", "image/png", 5 * MIB + 1)
            .expect_err("too large");
        assert!(matches!(err, UploadError::TooLarge { limit, .. } if limit == 5 * MIB));
    }

    #[test]
    fn project_files_allow_ten_mebibytes_of_pdf() {
        let policy = UploadPolicy::default();
        assert!(
            policy
                .check(UploadPurpose::ProjectFile, "paper.pdf", "application/pdf", 10 * MIB)
                .is_ok()
        );
        assert!(
            policy
                .check(UploadPurpose::ProjectFile, "paper.pdf", "application/pdf", 10 * MIB + 1)
                .is_err()
        );
    }

    #[test]
    fn content_type_parameters_are_ignored() {
        let policy = UploadPolicy::default();
        assert!(
            policy
                .check(UploadPurpose::Spreadsheet, "roster.csv", "text/csv; charset=utf-8", 120)
                .is_ok()
        );
    }

    #[test]
    fn wrong_type_and_empty_files_are_rejected() {
        let policy = UploadPolicy::default();
        assert!(matches!(
            policy.check(UploadPurpose::Logo, "logo.pdf", "application/pdf", 10),
            Err(UploadError::UnsupportedType { .. })
        ));
        assert!(matches!(
            policy.check(UploadPurpose::Spreadsheet, "roster.xlsx", SPREADSHEET_TYPES[0], 0),
            Err(UploadError::Empty { .. })
        ));
    }
}
