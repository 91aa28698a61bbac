//! In-process [`AdminApi`] used by tests and by `--fixtures` runs.
//!
//! Records live behind one mutex. Every call is appended to a log, failures can
//! be queued with [`InMemoryAdminApi::fail_next`], and bulk creation jobs can
//! be scripted to walk through a sequence of statuses.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use collabdesk_api_types::{
    BlogRecord, BlogStatus, BulkCreationState, BulkCreationStatus, BulkUsersRequest, EventRecord,
    InstitutionRecord, ListParams, ParsedRoster, ProjectRecord, ProjectStatus, QaThreadRecord,
    UserRecord,
};

use crate::application::api::{AdminApi, ApiError, FileAttachment, ProjectUpdate};

use super::error::InfraError;
use super::lock::lock_state;

/// One recorded call against the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiCall {
    pub operation: &'static str,
    pub target: Option<Uuid>,
    pub detail: Option<String>,
}

impl ApiCall {
    pub fn new(operation: &'static str, target: Option<Uuid>) -> Self {
        Self {
            operation,
            target,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Fixture document accepted by `--fixtures`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MemorySeed {
    pub blogs: Vec<BlogRecord>,
    pub projects: Vec<ProjectRecord>,
    pub users: Vec<UserRecord>,
    pub institutions: Vec<InstitutionRecord>,
    pub events: Vec<EventRecord>,
    pub threads: Vec<QaThreadRecord>,
    pub parsed_roster: Option<ParsedRoster>,
}

impl MemorySeed {
    pub fn from_json_file(path: &Path) -> Result<Self, InfraError> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|err| {
            InfraError::configuration(format!(
                "fixture file {} is not valid: {err}",
                path.display()
            ))
        })
    }
}

#[derive(Debug, Default)]
struct State {
    blogs: Vec<BlogRecord>,
    projects: Vec<ProjectRecord>,
    users: Vec<UserRecord>,
    institutions: Vec<InstitutionRecord>,
    events: Vec<EventRecord>,
    threads: Vec<QaThreadRecord>,
    parsed_roster: ParsedRoster,
    jobs: HashMap<Uuid, VecDeque<BulkCreationStatus>>,
    next_job_script: Option<Vec<BulkCreationStatus>>,
    failures: VecDeque<ApiError>,
    calls: Vec<ApiCall>,
}

impl State {
    /// Log the call and hand back a queued failure, if any.
    fn record(&mut self, call: ApiCall) -> Result<(), ApiError> {
        debug!(operation = call.operation, target = ?call.target, "in-memory admin call");
        self.calls.push(call);
        match self.failures.pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryAdminApi {
    state: Mutex<State>,
}

fn page<T: Clone>(items: &[T], params: ListParams) -> Vec<T> {
    let limit = params.limit as usize;
    let start = (params.page.max(1) as usize - 1).saturating_mul(limit);
    items.iter().skip(start).take(limit).cloned().collect()
}

fn not_found(entity: &str, id: Uuid) -> ApiError {
    ApiError::rejected(404, format!("{entity} {id} not found"))
}

fn position<T>(items: &[T], id: Uuid, key: impl Fn(&T) -> Uuid) -> Option<usize> {
    items.iter().position(|item| key(item) == id)
}

impl InMemoryAdminApi {
    pub fn from_seed(seed: MemorySeed) -> Self {
        let MemorySeed {
            blogs,
            projects,
            users,
            institutions,
            events,
            threads,
            parsed_roster,
        } = seed;
        Self {
            state: Mutex::new(State {
                blogs,
                projects,
                users,
                institutions,
                events,
                threads,
                parsed_roster: parsed_roster.unwrap_or_default(),
                ..State::default()
            }),
        }
    }

    fn with_state(self, apply: impl FnOnce(&mut State)) -> Self {
        apply(&mut lock_state(&self.state, "memory.seed"));
        self
    }

    pub fn with_blogs(self, blogs: Vec<BlogRecord>) -> Self {
        self.with_state(|state| state.blogs = blogs)
    }

    pub fn with_projects(self, projects: Vec<ProjectRecord>) -> Self {
        self.with_state(|state| state.projects = projects)
    }

    pub fn with_users(self, users: Vec<UserRecord>) -> Self {
        self.with_state(|state| state.users = users)
    }

    pub fn with_institutions(self, institutions: Vec<InstitutionRecord>) -> Self {
        self.with_state(|state| state.institutions = institutions)
    }

    pub fn with_events(self, events: Vec<EventRecord>) -> Self {
        self.with_state(|state| state.events = events)
    }

    pub fn with_threads(self, threads: Vec<QaThreadRecord>) -> Self {
        self.with_state(|state| state.threads = threads)
    }

    /// Queue a failure for the next call of any kind. The call is still logged.
    pub fn fail_next(&self, err: ApiError) {
        lock_state(&self.state, "memory.fail_next")
            .failures
            .push_back(err);
    }

    /// Roster returned by `parse_excel_file`.
    pub fn set_parsed_roster(&self, roster: ParsedRoster) {
        lock_state(&self.state, "memory.set_parsed_roster").parsed_roster = roster;
    }

    /// Register a job whose status walks through `statuses`; the last one repeats.
    pub fn script_bulk_job(&self, statuses: Vec<BulkCreationStatus>) -> Uuid {
        let id = Uuid::new_v4();
        lock_state(&self.state, "memory.script_bulk_job")
            .jobs
            .insert(id, statuses.into());
        id
    }

    /// Script the job created by the next `create_bulk_users` call.
    pub fn script_next_bulk_job(&self, statuses: Vec<BulkCreationStatus>) {
        lock_state(&self.state, "memory.script_next_bulk_job").next_job_script = Some(statuses);
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        lock_state(&self.state, "memory.calls").calls.clone()
    }

    pub fn calls_to(&self, operation: &str) -> usize {
        lock_state(&self.state, "memory.calls_to")
            .calls
            .iter()
            .filter(|call| call.operation == operation)
            .count()
    }

    pub fn blogs(&self) -> Vec<BlogRecord> {
        lock_state(&self.state, "memory.blogs").blogs.clone()
    }

    pub fn projects(&self) -> Vec<ProjectRecord> {
        lock_state(&self.state, "memory.projects").projects.clone()
    }

    pub fn users(&self) -> Vec<UserRecord> {
        lock_state(&self.state, "memory.users").users.clone()
    }
}

#[async_trait]
impl AdminApi for InMemoryAdminApi {
    async fn fetch_blogs(&self, params: ListParams) -> Result<Vec<BlogRecord>, ApiError> {
        let mut state = lock_state(&self.state, "memory.fetch_blogs");
        state.record(ApiCall::new("fetch_blogs", None))?;
        Ok(page(&state.blogs, params))
    }

    async fn update_blog_status(&self, id: Uuid, status: BlogStatus) -> Result<(), ApiError> {
        let mut state = lock_state(&self.state, "memory.update_blog_status");
        state.record(ApiCall::new("update_blog_status", Some(id)).with_detail(status.as_str()))?;
        let blog = state
            .blogs
            .iter_mut()
            .find(|blog| blog.id == id)
            .ok_or_else(|| not_found("blog", id))?;
        blog.status = status;
        Ok(())
    }

    async fn delete_blog(&self, id: Uuid, confirm: bool) -> Result<(), ApiError> {
        let mut state = lock_state(&self.state, "memory.delete_blog");
        state.record(ApiCall::new("delete_blog", Some(id)).with_detail(confirm.to_string()))?;
        if !confirm {
            return Err(ApiError::rejected(400, "Deletion must be confirmed"));
        }
        let index = position(&state.blogs, id, |blog| blog.id).ok_or_else(|| not_found("blog", id))?;
        state.blogs.remove(index);
        Ok(())
    }

    async fn archive_blog(&self, id: Uuid) -> Result<(), ApiError> {
        let mut state = lock_state(&self.state, "memory.archive_blog");
        state.record(ApiCall::new("archive_blog", Some(id)))?;
        let blog = state
            .blogs
            .iter_mut()
            .find(|blog| blog.id == id)
            .ok_or_else(|| not_found("blog", id))?;
        blog.status = BlogStatus::Archived;
        Ok(())
    }

    async fn get_all_projects_for_admin(
        &self,
        params: ListParams,
    ) -> Result<Vec<ProjectRecord>, ApiError> {
        let mut state = lock_state(&self.state, "memory.get_all_projects_for_admin");
        state.record(ApiCall::new("get_all_projects_for_admin", None))?;
        Ok(page(&state.projects, params))
    }

    async fn activate_deactivate_project(
        &self,
        id: Uuid,
        status: ProjectStatus,
        reason: &str,
    ) -> Result<(), ApiError> {
        let mut state = lock_state(&self.state, "memory.activate_deactivate_project");
        state.record(
            ApiCall::new("activate_deactivate_project", Some(id))
                .with_detail(format!("{}: {reason}", status.as_str())),
        )?;
        let project = state
            .projects
            .iter_mut()
            .find(|project| project.id == id)
            .ok_or_else(|| not_found("project", id))?;
        project.status = status;
        Ok(())
    }

    async fn delete_project_by_admin(&self, id: Uuid, reason: &str) -> Result<(), ApiError> {
        let mut state = lock_state(&self.state, "memory.delete_project_by_admin");
        state.record(ApiCall::new("delete_project_by_admin", Some(id)).with_detail(reason))?;
        let index = position(&state.projects, id, |project| project.id)
            .ok_or_else(|| not_found("project", id))?;
        state.projects.remove(index);
        Ok(())
    }

    async fn update_project(
        &self,
        id: Uuid,
        update: ProjectUpdate,
    ) -> Result<ProjectRecord, ApiError> {
        let mut state = lock_state(&self.state, "memory.update_project");
        let attachments = update.files.len() + usize::from(update.logo.is_some());
        state.record(
            ApiCall::new("update_project", Some(id))
                .with_detail(format!("{attachments} attachment(s)")),
        )?;
        let project = state
            .projects
            .iter_mut()
            .find(|project| project.id == id)
            .ok_or_else(|| not_found("project", id))?;
        let fields = update.fields;
        if let Some(title) = fields.title {
            project.title = title;
        }
        if let Some(abstract_text) = fields.abstract_text {
            project.abstract_text = Some(abstract_text);
        }
        if let Some(category) = fields.category {
            project.category = Some(category);
        }
        if let Some(status) = fields.status {
            project.status = status;
        }
        Ok(project.clone())
    }

    async fn get_all_users(&self, params: ListParams) -> Result<Vec<UserRecord>, ApiError> {
        let mut state = lock_state(&self.state, "memory.get_all_users");
        state.record(ApiCall::new("get_all_users", None))?;
        Ok(page(&state.users, params))
    }

    async fn activate_deactivate_user(
        &self,
        id: Uuid,
        is_active: bool,
        reason: Option<&str>,
    ) -> Result<(), ApiError> {
        let mut state = lock_state(&self.state, "memory.activate_deactivate_user");
        let mut call = ApiCall::new("activate_deactivate_user", Some(id));
        if let Some(reason) = reason {
            call = call.with_detail(reason);
        }
        state.record(call)?;
        let user = state
            .users
            .iter_mut()
            .find(|user| user.id == id)
            .ok_or_else(|| not_found("user", id))?;
        user.is_active = is_active;
        Ok(())
    }

    async fn list_institutions(
        &self,
        params: ListParams,
    ) -> Result<Vec<InstitutionRecord>, ApiError> {
        let mut state = lock_state(&self.state, "memory.list_institutions");
        state.record(ApiCall::new("list_institutions", None))?;
        Ok(page(&state.institutions, params))
    }

    async fn list_events(&self, params: ListParams) -> Result<Vec<EventRecord>, ApiError> {
        let mut state = lock_state(&self.state, "memory.list_events");
        state.record(ApiCall::new("list_events", None))?;
        Ok(page(&state.events, params))
    }

    async fn list_threads(&self, params: ListParams) -> Result<Vec<QaThreadRecord>, ApiError> {
        let mut state = lock_state(&self.state, "memory.list_threads");
        state.record(ApiCall::new("list_threads", None))?;
        Ok(page(&state.threads, params))
    }

    async fn parse_excel_file(&self, file: FileAttachment) -> Result<ParsedRoster, ApiError> {
        let mut state = lock_state(&self.state, "memory.parse_excel_file");
        state.record(ApiCall::new("parse_excel_file", None).with_detail(file.file_name))?;
        Ok(state.parsed_roster.clone())
    }

    async fn create_bulk_users(&self, request: BulkUsersRequest) -> Result<Uuid, ApiError> {
        let mut state = lock_state(&self.state, "memory.create_bulk_users");
        state.record(ApiCall::new("create_bulk_users", None).with_detail(format!(
            "{} instructor(s), {} student(s)",
            request.instructors.len(),
            request.students.len()
        )))?;

        let id = Uuid::new_v4();
        let script = state.next_job_script.take().unwrap_or_else(|| {
            let instructors = u32::try_from(request.instructors.len()).unwrap_or(u32::MAX);
            let students = u32::try_from(request.students.len()).unwrap_or(u32::MAX);
            vec![BulkCreationStatus {
                status: BulkCreationState::Completed,
                total_instructors: instructors,
                processed_instructors: instructors,
                total_students: students,
                processed_students: students,
                error_message: None,
            }]
        });
        state.jobs.insert(id, script.into());
        debug!(job = %id, "bulk creation job registered");
        Ok(id)
    }

    async fn get_bulk_creation_status(&self, id: Uuid) -> Result<BulkCreationStatus, ApiError> {
        let mut state = lock_state(&self.state, "memory.get_bulk_creation_status");
        state.record(ApiCall::new("get_bulk_creation_status", Some(id)))?;
        let statuses = state
            .jobs
            .get_mut(&id)
            .ok_or_else(|| not_found("bulk creation job", id))?;
        let status = if statuses.len() > 1 {
            statuses.pop_front()
        } else {
            statuses.front().cloned()
        };
        status.ok_or_else(|| not_found("bulk creation job", id))
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn blog(title: &str) -> BlogRecord {
        BlogRecord {
            id: Uuid::new_v4(),
            title: title.into(),
            excerpt: None,
            category: None,
            status: BlogStatus::Draft,
            author: None,
            created_at: datetime!(2025-03-01 10:00 UTC),
        }
    }

    #[tokio::test]
    async fn fetches_are_paged() {
        let api = InMemoryAdminApi::default()
            .with_blogs((0..5).map(|index| blog(&format!("Post {index}"))).collect());

        let second = api
            .fetch_blogs(ListParams { page: 2, limit: 2 })
            .await
            .expect("page");
        let titles: Vec<_> = second.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, ["Post 2", "Post 3"]);
        assert!(
            api.fetch_blogs(ListParams { page: 4, limit: 2 })
                .await
                .expect("past the end")
                .is_empty()
        );
    }

    #[tokio::test]
    async fn queued_failure_is_consumed_once_and_logged() {
        let target = blog("Field notes");
        let api = InMemoryAdminApi::default().with_blogs(vec![target.clone()]);
        api.fail_next(ApiError::rejected(500, "database unavailable"));

        let err = api.archive_blog(target.id).await.expect_err("queued failure");
        assert_eq!(err.to_string(), "database unavailable");
        assert_eq!(api.blogs()[0].status, BlogStatus::Draft);

        api.archive_blog(target.id).await.expect("second call succeeds");
        assert_eq!(api.blogs()[0].status, BlogStatus::Archived);
        assert_eq!(api.calls_to("archive_blog"), 2);
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let api = InMemoryAdminApi::default();
        let err = api
            .activate_deactivate_user(Uuid::new_v4(), false, Some("left the lab"))
            .await
            .expect_err("missing user");
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn unscripted_job_completes_with_request_counts() {
        let api = InMemoryAdminApi::default();
        let request = BulkUsersRequest {
            instructors: vec![Default::default(); 2],
            students: vec![Default::default(); 3],
        };
        let job = api.create_bulk_users(request).await.expect("job");

        let status = api.get_bulk_creation_status(job).await.expect("status");
        assert_eq!(status.status, BulkCreationState::Completed);
        assert_eq!(status.processed_instructors, 2);
        assert_eq!(status.total_students, 3);
    }

    #[tokio::test]
    async fn scripted_job_repeats_last_status() {
        let api = InMemoryAdminApi::default();
        let processing = BulkCreationStatus {
            status: BulkCreationState::Processing,
            total_instructors: 1,
            processed_instructors: 0,
            total_students: 0,
            processed_students: 0,
            error_message: None,
        };
        let done = BulkCreationStatus {
            status: BulkCreationState::Completed,
            processed_instructors: 1,
            ..processing.clone()
        };
        let job = api.script_bulk_job(vec![processing.clone(), done.clone()]);

        assert_eq!(api.get_bulk_creation_status(job).await.expect("first"), processing);
        assert_eq!(api.get_bulk_creation_status(job).await.expect("second"), done);
        assert_eq!(api.get_bulk_creation_status(job).await.expect("third"), done);
    }

    #[test]
    fn seed_parses_partial_documents() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("seed.json");
        std::fs::write(
            &path,
            r#"{"blogs":[{"id":"6f1c3f7e-8f0b-4a53-9b8f-0d8d1c1e2a10","title":"Field notes","status":"published","created_at":"2025-02-01T10:00:00Z"}]}"#,
        )
        .expect("write seed");

        let seed = MemorySeed::from_json_file(&path).expect("seed");
        assert_eq!(seed.blogs.len(), 1);
        assert!(seed.projects.is_empty());
        assert!(seed.parsed_roster.is_none());
    }
}
