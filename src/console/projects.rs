use std::sync::Arc;

use collabdesk_api_types::{ProjectStatus, ProjectUpdateFields};
use tracing::info;

use crate::application::api::{AdminApi, ProjectUpdate};
use crate::application::error::AppError;
use crate::config::ProjectUpdateArgs;
use crate::domain::uploads::UploadPolicy;

use super::io::read_attachment;
use super::print::print_json;

fn parse_status(value: &str) -> Result<ProjectStatus, AppError> {
    ProjectStatus::try_from(value.trim()).map_err(|()| {
        AppError::validation(format!(
            "unknown project status `{value}` (expected pending, active, inactive or completed)"
        ))
    })
}

/// Build the multipart update from flags and local files, checking every attachment.
pub async fn build_update(
    args: ProjectUpdateArgs,
    policy: &UploadPolicy,
) -> Result<ProjectUpdate, AppError> {
    let status = args.status.as_deref().map(parse_status).transpose()?;
    let logo = match &args.logo {
        Some(path) => Some(read_attachment(path).await?),
        None => None,
    };
    let mut files = Vec::with_capacity(args.files.len());
    for path in &args.files {
        files.push(read_attachment(path).await?);
    }

    let update = ProjectUpdate {
        fields: ProjectUpdateFields {
            title: args.title,
            abstract_text: args.abstract_text,
            category: args.category,
            status,
        },
        logo,
        files,
    };
    if update.is_empty() {
        return Err(AppError::validation(
            "nothing to update: pass at least one field, --logo or --file",
        ));
    }
    update.check_attachments(policy)?;
    Ok(update)
}

pub async fn update(
    api: Arc<dyn AdminApi>,
    policy: &UploadPolicy,
    args: ProjectUpdateArgs,
) -> Result<(), AppError> {
    let id = args.id;
    let update = build_update(args, policy).await?;
    let project = api.update_project(id, update).await?;
    info!(%id, "project updated");
    print_json(&project)
}
