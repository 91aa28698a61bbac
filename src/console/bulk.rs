//! `bulk-import` subcommands driving the onboarding wizard.

use std::path::Path;
use std::sync::Arc;

use collabdesk_api_types::{BulkCreationState, BulkCreationStatus};
use uuid::Uuid;

use crate::application::api::AdminApi;
use crate::application::bulk_import::{BulkImportWizard, WizardError};
use crate::application::error::AppError;
use crate::application::polling::{BulkStatusPoller, PollExit, PollPolicy};
use crate::config::{BulkImportCmd, Settings};
use crate::domain::uploads::UploadPolicy;
use crate::presentation::views;

use super::io::{read_attachment, read_roster};
use super::print::print_toasts;

pub async fn handle(
    api: Arc<dyn AdminApi>,
    settings: &Settings,
    cmd: BulkImportCmd,
) -> Result<(), AppError> {
    let uploads = UploadPolicy::from(&settings.uploads);
    let polling = PollPolicy::from(&settings.polling);
    match cmd {
        BulkImportCmd::Parse { file } => parse(api, uploads, &file).await,
        BulkImportCmd::Submit {
            file,
            roster,
            watch,
        } => submit(api, uploads, polling, file.as_deref(), roster.as_deref(), watch).await,
        BulkImportCmd::Status { id, watch } => status(api, polling, id, watch).await,
    }
}

async fn parse(api: Arc<dyn AdminApi>, uploads: UploadPolicy, file: &Path) -> Result<(), AppError> {
    let mut wizard = BulkImportWizard::new(api, uploads);
    let attachment = read_attachment(file).await?;
    let rendered = wizard.upload_spreadsheet(attachment).await.map(views::roster);
    print_toasts(wizard.drain_toasts());
    print!("{}", rendered?);
    Ok(())
}

async fn fill_roster(
    wizard: &mut BulkImportWizard,
    file: Option<&Path>,
    roster: Option<&Path>,
) -> Result<(), AppError> {
    match (file, roster) {
        (Some(file), _) => {
            let attachment = read_attachment(file).await?;
            let uploaded = wizard.upload_spreadsheet(attachment).await.map(|_| ());
            print_toasts(wizard.drain_toasts());
            uploaded?;
        }
        (None, Some(path)) => {
            let parsed = read_roster(path).await?;
            wizard.start_manual_entry()?;
            let roster = wizard.roster_mut()?;
            for instructor in parsed.instructors {
                roster.add_instructor(instructor);
            }
            for student in parsed.students {
                roster.add_student(student);
            }
        }
        (None, None) => {
            return Err(AppError::validation(
                "a roster is required: pass --file or --roster",
            ));
        }
    }
    Ok(())
}

fn failed(status: Option<&BulkCreationStatus>) -> Result<(), AppError> {
    match status {
        Some(status) if status.status == BulkCreationState::Failed => Err(AppError::unexpected(
            status
                .error_message
                .clone()
                .unwrap_or_else(|| "bulk user creation failed".to_string()),
        )),
        _ => Ok(()),
    }
}

async fn submit(
    api: Arc<dyn AdminApi>,
    uploads: UploadPolicy,
    polling: PollPolicy,
    file: Option<&Path>,
    roster: Option<&Path>,
    watch: bool,
) -> Result<(), AppError> {
    let mut wizard = BulkImportWizard::new(api.clone(), uploads);
    fill_roster(&mut wizard, file, roster).await?;
    print!("{}", views::roster(wizard.roster()));

    let submitted = wizard.submit().await;
    print_toasts(wizard.drain_toasts());
    let job = submitted?;
    println!("Bulk creation job {job}");

    if !watch {
        return Ok(());
    }

    let poller = BulkStatusPoller::new(api, polling);
    let followed = wizard.follow(&poller).await;
    if let Some(status) = wizard.status() {
        println!("{}", views::job_status(status));
    }
    print_toasts(wizard.drain_toasts());
    followed?;
    failed(wizard.status())
}

async fn status(
    api: Arc<dyn AdminApi>,
    polling: PollPolicy,
    id: Uuid,
    watch: bool,
) -> Result<(), AppError> {
    if !watch {
        let status = api.get_bulk_creation_status(id).await?;
        println!("{}", views::job_status(&status));
        return failed(Some(&status));
    }

    let poller = BulkStatusPoller::new(api, polling);
    let mut updates = poller.start(id);
    let mut shown: Option<BulkCreationStatus> = None;
    while updates.changed().await.is_ok() {
        let latest = updates.borrow_and_update().clone();
        if let Some(status) = latest
            && shown.as_ref() != Some(&status)
        {
            println!("{}", views::job_status(&status));
            shown = Some(status);
        }
    }

    let last = updates.borrow().clone();
    if let Some(status) = last
        && shown.as_ref() != Some(&status)
    {
        println!("{}", views::job_status(&status));
        shown = Some(status);
    }

    match poller.wait(id).await {
        Some(PollExit::Errored(reason)) => Err(WizardError::Polling(reason).into()),
        Some(PollExit::Cancelled) => Err(WizardError::Polling("cancelled".to_string()).into()),
        _ => failed(shown.as_ref()),
    }
}
