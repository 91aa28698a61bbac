//! Bulk user import wizard: `Upload → Review → Creating → Done`.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use collabdesk_api_types::{BulkCreationState, BulkCreationStatus};

use crate::domain::roster::{RemovedInstructor, Roster, RosterError};
use crate::domain::uploads::{UploadError, UploadPolicy, UploadPurpose};

use super::api::{AdminApi, ApiError, FileAttachment};
use super::polling::{BulkStatusPoller, PollExit};
use super::toasts::{Toast, ToastQueue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Upload,
    Review,
    Creating,
    Done,
}

impl WizardStep {
    pub fn as_str(self) -> &'static str {
        match self {
            WizardStep::Upload => "upload",
            WizardStep::Review => "review",
            WizardStep::Creating => "creating",
            WizardStep::Done => "done",
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the roster under review came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterSource {
    Spreadsheet { file_name: String },
    Manual,
}

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("the import is at the {actual} step, not {expected}")]
    WrongStep {
        expected: WizardStep,
        actual: WizardStep,
    },
    #[error("users are still being created")]
    Busy,
    #[error("instructor `{email}` has {students} assigned students; confirm to unassign them")]
    CascadeNeedsConfirmation { email: String, students: usize },
    #[error("status polling stopped: {0}")]
    Polling(String),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Roster(#[from] RosterError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Processed and total counts of a bulk creation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BulkProgress {
    pub processed_instructors: u32,
    pub total_instructors: u32,
    pub processed_students: u32,
    pub total_students: u32,
}

impl BulkProgress {
    pub fn processed(&self) -> u64 {
        u64::from(self.processed_instructors) + u64::from(self.processed_students)
    }

    pub fn total(&self) -> u64 {
        u64::from(self.total_instructors) + u64::from(self.total_students)
    }

    /// Completion in percent; 0 while the totals are unknown.
    pub fn percent(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.processed() as f64 / total as f64 * 100.0,
        }
    }
}

impl From<&BulkCreationStatus> for BulkProgress {
    fn from(status: &BulkCreationStatus) -> Self {
        Self {
            processed_instructors: status.processed_instructors,
            total_instructors: status.total_instructors,
            processed_students: status.processed_students,
            total_students: status.total_students,
        }
    }
}

pub struct BulkImportWizard {
    api: Arc<dyn AdminApi>,
    policy: UploadPolicy,
    step: WizardStep,
    roster: Roster,
    source: Option<RosterSource>,
    job: Option<Uuid>,
    status: Option<BulkCreationStatus>,
    toasts: ToastQueue,
}

impl BulkImportWizard {
    pub fn new(api: Arc<dyn AdminApi>, policy: UploadPolicy) -> Self {
        Self {
            api,
            policy,
            step: WizardStep::Upload,
            roster: Roster::new(),
            source: None,
            job: None,
            status: None,
            toasts: ToastQueue::new(),
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn source(&self) -> Option<&RosterSource> {
        self.source.as_ref()
    }

    pub fn job_id(&self) -> Option<Uuid> {
        self.job
    }

    pub fn status(&self) -> Option<&BulkCreationStatus> {
        self.status.as_ref()
    }

    pub fn progress(&self) -> Option<BulkProgress> {
        self.status.as_ref().map(BulkProgress::from)
    }

    pub fn toasts(&self) -> &[Toast] {
        self.toasts.peek()
    }

    pub fn drain_toasts(&mut self) -> Vec<Toast> {
        self.toasts.drain()
    }

    fn expect_step(&self, expected: WizardStep) -> Result<(), WizardError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(WizardError::WrongStep {
                expected,
                actual: self.step,
            })
        }
    }

    fn report<T>(&mut self, result: Result<T, WizardError>) -> Result<T, WizardError> {
        if let Err(err) = &result {
            self.toasts.error(err.to_string());
        }
        result
    }

    /// Check the spreadsheet locally, then let the API extract the roster.
    pub async fn upload_spreadsheet(&mut self, file: FileAttachment) -> Result<&Roster, WizardError> {
        self.expect_step(WizardStep::Upload)?;
        let checked = file
            .check(&self.policy, UploadPurpose::Spreadsheet)
            .map_err(WizardError::from);
        self.report(checked)?;

        let file_name = file.file_name.clone();
        let parsed = self.api.parse_excel_file(file).await.map_err(WizardError::from);
        let parsed = self.report(parsed)?;

        self.roster = Roster::from(parsed);
        self.source = Some(RosterSource::Spreadsheet {
            file_name: file_name.clone(),
        });
        self.step = WizardStep::Review;
        info!(
            file = %file_name,
            instructors = self.roster.instructors().len(),
            students = self.roster.students().len(),
            "roster parsed"
        );
        self.toasts.success(format!(
            "Parsed {} instructors and {} students from {file_name}",
            self.roster.instructors().len(),
            self.roster.students().len()
        ));
        Ok(&self.roster)
    }

    pub fn start_manual_entry(&mut self) -> Result<(), WizardError> {
        self.expect_step(WizardStep::Upload)?;
        self.roster = Roster::new();
        self.source = Some(RosterSource::Manual);
        self.step = WizardStep::Review;
        Ok(())
    }

    pub fn roster_mut(&mut self) -> Result<&mut Roster, WizardError> {
        self.expect_step(WizardStep::Review)?;
        Ok(&mut self.roster)
    }

    /// Remove an instructor; students assigned to them need `confirmed`.
    pub fn remove_instructor(
        &mut self,
        row: usize,
        confirmed: bool,
    ) -> Result<RemovedInstructor, WizardError> {
        self.expect_step(WizardStep::Review)?;
        let students = self.roster.dependents_of(row);
        if students > 0 && !confirmed {
            let email = self
                .roster
                .instructors()
                .get(row)
                .map(|instructor| instructor.email.clone())
                .unwrap_or_default();
            return Err(WizardError::CascadeNeedsConfirmation { email, students });
        }
        let removed = self.roster.remove_instructor(row)?;
        if removed.unassigned_students > 0 {
            info!(
                email = %removed.instructor.email,
                students = removed.unassigned_students,
                "instructor removed, students unassigned"
            );
        }
        Ok(removed)
    }

    /// Validate the roster and hand it to the API.
    pub async fn submit(&mut self) -> Result<Uuid, WizardError> {
        self.expect_step(WizardStep::Review)?;
        let request = self.roster.to_request().map_err(WizardError::from);
        let request = self.report(request)?;

        let accepted = self
            .api
            .create_bulk_users(request)
            .await
            .map_err(WizardError::from);
        let job = self.report(accepted)?;

        self.job = Some(job);
        self.status = None;
        self.step = WizardStep::Creating;
        info!(%job, "bulk creation submitted");
        self.toasts.success("Bulk user creation started");
        Ok(job)
    }

    /// Record a polled status; a terminal state finishes the wizard.
    pub fn apply_status(&mut self, status: BulkCreationStatus) -> Result<WizardStep, WizardError> {
        self.expect_step(WizardStep::Creating)?;
        let state = status.status;
        let error_message = status.error_message.clone();
        self.status = Some(status);

        match state {
            BulkCreationState::Processing => {}
            BulkCreationState::Completed => {
                self.step = WizardStep::Done;
                self.toasts.success("All users were created");
            }
            BulkCreationState::Failed => {
                self.step = WizardStep::Done;
                self.toasts.error(
                    error_message.unwrap_or_else(|| "Bulk user creation failed".to_string()),
                );
            }
        }
        Ok(self.step)
    }

    /// Poll the submitted job until it finishes, applying every status seen.
    pub async fn follow(&mut self, poller: &BulkStatusPoller) -> Result<WizardStep, WizardError> {
        self.expect_step(WizardStep::Creating)?;
        let Some(job) = self.job else {
            return Err(WizardError::Busy);
        };

        let mut updates = poller.start(job);
        while updates.changed().await.is_ok() {
            let latest = updates.borrow_and_update().clone();
            if let Some(status) = latest
                && self.apply_status(status)? == WizardStep::Done
            {
                break;
            }
        }

        // The final status may land together with the sender closing.
        if self.step == WizardStep::Creating {
            let latest = updates.borrow().clone();
            if let Some(status) = latest {
                self.apply_status(status)?;
            }
        }

        match poller.wait(job).await {
            Some(PollExit::Errored(reason)) if self.step == WizardStep::Creating => {
                warn!(%job, error = %reason, "bulk status polling gave up");
                self.report(Err(WizardError::Polling(reason)))
            }
            Some(PollExit::Cancelled) if self.step == WizardStep::Creating => {
                Err(WizardError::Polling("cancelled".to_string()))
            }
            _ => Ok(self.step),
        }
    }

    /// Review → Upload, discarding the roster.
    pub fn back(&mut self) -> Result<(), WizardError> {
        self.expect_step(WizardStep::Review)?;
        self.roster = Roster::new();
        self.source = None;
        self.step = WizardStep::Upload;
        Ok(())
    }

    /// Start over from any step except while users are being created.
    pub fn reset(&mut self) -> Result<(), WizardError> {
        if self.step == WizardStep::Creating {
            return Err(WizardError::Busy);
        }
        self.roster = Roster::new();
        self.source = None;
        self.job = None;
        self.status = None;
        self.step = WizardStep::Upload;
        Ok(())
    }
}
