use std::path::Path;

use collabdesk_api_types::ParsedRoster;

use crate::application::api::FileAttachment;
use crate::application::error::AppError;
use crate::infra::error::InfraError;

/// Read a local file into an attachment whose content type follows its extension.
pub async fn read_attachment(path: &Path) -> Result<FileAttachment, AppError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| InfraError::input_file(path, source))?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload")
        .to_string();
    Ok(FileAttachment::guessed(file_name, bytes))
}

/// Read a roster typed up as JSON: `{"instructors": [...], "students": [...]}`.
pub async fn read_roster(path: &Path) -> Result<ParsedRoster, AppError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| InfraError::input_file(path, source))?;
    serde_json::from_slice(&bytes).map_err(|err| {
        AppError::validation(format!(
            "roster file {} is not valid JSON: {err}",
            path.display()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn attachment_takes_name_and_type_from_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("logo.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G']).expect("write logo");

        let file = read_attachment(&path).await.expect("attachment");
        assert_eq!(file.file_name, "logo.png");
        assert_eq!(file.content_type, "image/png");
        assert_eq!(file.size(), 4);
    }

    #[tokio::test]
    async fn missing_file_names_the_path() {
        let err = read_attachment(Path::new("/nonexistent/cohort.xlsx"))
            .await
            .expect_err("missing");
        assert!(err.to_string().contains("/nonexistent/cohort.xlsx"));
    }

    #[tokio::test]
    async fn malformed_roster_is_a_validation_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("roster.json");
        std::fs::write(&path, "{\"instructors\": 3}").expect("write roster");

        let err = read_roster(&path).await.expect_err("bad roster");
        assert!(matches!(err, AppError::Validation(_)));
    }
}
