//! reqwest-backed [`AdminApi`] talking JSON to the platform's admin endpoints.

use std::fs;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use collabdesk_api_types::{
    ApiErrorBody, BlogRecord, BlogStatus, BlogStatusRequest, BulkCreationAccepted,
    BulkCreationStatus, BulkUsersRequest, EventRecord, InstitutionRecord, ListParams,
    ListResponse, ParsedRoster, ProjectDeletionRequest, ProjectRecord, ProjectStatus,
    ProjectStatusRequest, QaThreadRecord, UserActivationRequest, UserRecord,
};

use crate::application::api::{AdminApi, ApiError, FileAttachment, ProjectUpdate};
use crate::config::ApiSettings;

use super::error::InfraError;

/// List endpoints answer with an envelope; older deployments send a bare array.
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum ListBody<T> {
    Envelope(ListResponse<T>),
    Bare(Vec<T>),
}

impl<T> ListBody<T> {
    fn into_items(self) -> Vec<T> {
        match self {
            ListBody::Envelope(envelope) => envelope.items,
            ListBody::Bare(items) => items,
        }
    }
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum SingleBody<T> {
    Bare(T),
    Wrapped {
        #[serde(alias = "project", alias = "roster")]
        data: T,
    },
}

impl<T> SingleBody<T> {
    fn into_inner(self) -> T {
        match self {
            SingleBody::Bare(value) | SingleBody::Wrapped { data: value } => value,
        }
    }
}

#[derive(Clone, Debug)]
pub struct HttpAdminApi {
    client: Client,
    base: Url,
    token: Option<String>,
}

impl HttpAdminApi {
    pub fn new(base: &Url, token: Option<String>, timeout: Duration) -> Result<Self, InfraError> {
        let mut base = base.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(timeout)
            .build()
            .map_err(|err| InfraError::http(err.to_string()))?;
        Ok(Self {
            client,
            base,
            token,
        })
    }

    /// Build a client from settings; a token file wins over an inline token.
    pub fn from_settings(api: &ApiSettings) -> Result<Self, InfraError> {
        let base = api.base_url.as_ref().ok_or_else(|| {
            InfraError::configuration(
                "api.base_url is required (use --api-base-url or COLLABDESK__API__BASE_URL)",
            )
        })?;
        let token = resolve_token(api)?;
        Self::new(base, token, api.timeout)
    }

    pub fn user_agent() -> &'static str {
        concat!("collabdesk/", env!("CARGO_PKG_VERSION"))
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, ApiError> {
        let mut url = self.base.join(path).map_err(ApiError::transport)?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<RequestBuilder, ApiError> {
        let url = self.url(path, query)?;
        debug!(%method, %url, "admin api request");
        let builder = self.client.request(method, url);
        Ok(match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn send(builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().await.map_err(ApiError::transport)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), body = %text, "admin api rejected request");
        Err(ApiError::rejected(status.as_u16(), rejection_message(status, &text)))
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let bytes = response.bytes().await.map_err(ApiError::transport)?;
        serde_json::from_slice(&bytes).map_err(ApiError::decode)
    }

    async fn list<T: DeserializeOwned>(
        &self,
        path: &str,
        params: ListParams,
    ) -> Result<Vec<T>, ApiError> {
        let query = [
            ("page", params.page.to_string()),
            ("limit", params.limit.to_string()),
        ];
        let response = Self::send(self.request(Method::GET, path, &query)?).await?;
        Ok(Self::decode::<ListBody<T>>(response).await?.into_items())
    }

    async fn unit<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<(), ApiError> {
        let mut builder = self.request(method, path, query)?;
        if let Some(body) = body {
            builder = builder.json(body);
        }
        Self::send(builder).await?;
        Ok(())
    }
}

/// Server text for a rejected request: `message`, then `error`, then the raw body.
fn rejection_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body)
        && let Some(message) = parsed.into_message()
    {
        return message;
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!(
            "{} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("error")
        )
    } else {
        trimmed.to_string()
    }
}

fn resolve_token(api: &ApiSettings) -> Result<Option<String>, InfraError> {
    if let Some(path) = &api.token_file {
        let raw = fs::read_to_string(path).map_err(|err| {
            InfraError::configuration(format!(
                "failed to read token file {}: {err}",
                path.display()
            ))
        })?;
        let token = raw.trim();
        if token.is_empty() {
            return Err(InfraError::configuration(format!(
                "token file {} is empty",
                path.display()
            )));
        }
        return Ok(Some(token.to_string()));
    }
    Ok(api.token.clone())
}

fn file_part(file: FileAttachment) -> Result<Part, ApiError> {
    Part::bytes(file.bytes.to_vec())
        .file_name(file.file_name)
        .mime_str(&file.content_type)
        .map_err(ApiError::transport)
}

#[async_trait]
impl AdminApi for HttpAdminApi {
    async fn fetch_blogs(&self, params: ListParams) -> Result<Vec<BlogRecord>, ApiError> {
        self.list("api/admin/blogs", params).await
    }

    async fn update_blog_status(&self, id: Uuid, status: BlogStatus) -> Result<(), ApiError> {
        let path = format!("api/admin/blogs/{id}/status");
        self.unit(Method::PATCH, &path, &[], Some(&BlogStatusRequest { status }))
            .await
    }

    async fn delete_blog(&self, id: Uuid, confirm: bool) -> Result<(), ApiError> {
        let path = format!("api/admin/blogs/{id}");
        self.unit::<()>(
            Method::DELETE,
            &path,
            &[("confirm", confirm.to_string())],
            None,
        )
        .await
    }

    async fn archive_blog(&self, id: Uuid) -> Result<(), ApiError> {
        let path = format!("api/admin/blogs/{id}/archive");
        self.unit::<()>(Method::POST, &path, &[], None).await
    }

    async fn get_all_projects_for_admin(
        &self,
        params: ListParams,
    ) -> Result<Vec<ProjectRecord>, ApiError> {
        self.list("api/admin/projects", params).await
    }

    async fn activate_deactivate_project(
        &self,
        id: Uuid,
        status: ProjectStatus,
        reason: &str,
    ) -> Result<(), ApiError> {
        let path = format!("api/admin/projects/{id}/status");
        let body = ProjectStatusRequest {
            status,
            reason: reason.to_string(),
        };
        self.unit(Method::PATCH, &path, &[], Some(&body)).await
    }

    async fn delete_project_by_admin(&self, id: Uuid, reason: &str) -> Result<(), ApiError> {
        let path = format!("api/admin/projects/{id}");
        let body = ProjectDeletionRequest {
            reason: reason.to_string(),
        };
        self.unit(Method::DELETE, &path, &[], Some(&body)).await
    }

    async fn update_project(
        &self,
        id: Uuid,
        update: ProjectUpdate,
    ) -> Result<ProjectRecord, ApiError> {
        let ProjectUpdate {
            fields,
            logo,
            files,
        } = update;

        let mut form = Form::new();
        if let Some(title) = fields.title {
            form = form.text("title", title);
        }
        if let Some(abstract_text) = fields.abstract_text {
            form = form.text("abstract", abstract_text);
        }
        if let Some(category) = fields.category {
            form = form.text("category", category);
        }
        if let Some(status) = fields.status {
            form = form.text("status", status.as_str());
        }
        if let Some(logo) = logo {
            form = form.part("logo", file_part(logo)?);
        }
        for file in files {
            form = form.part("files", file_part(file)?);
        }

        let path = format!("api/admin/projects/{id}");
        let builder = self.request(Method::PUT, &path, &[])?.multipart(form);
        let response = Self::send(builder).await?;
        Ok(Self::decode::<SingleBody<ProjectRecord>>(response)
            .await?
            .into_inner())
    }

    async fn get_all_users(&self, params: ListParams) -> Result<Vec<UserRecord>, ApiError> {
        self.list("api/admin/users", params).await
    }

    async fn activate_deactivate_user(
        &self,
        id: Uuid,
        is_active: bool,
        reason: Option<&str>,
    ) -> Result<(), ApiError> {
        let path = format!("api/admin/users/{id}/activation");
        let body = UserActivationRequest {
            is_active,
            reason: reason.map(str::to_string),
        };
        self.unit(Method::PATCH, &path, &[], Some(&body)).await
    }

    async fn list_institutions(
        &self,
        params: ListParams,
    ) -> Result<Vec<InstitutionRecord>, ApiError> {
        self.list("api/admin/institutions", params).await
    }

    async fn list_events(&self, params: ListParams) -> Result<Vec<EventRecord>, ApiError> {
        self.list("api/admin/events", params).await
    }

    async fn list_threads(&self, params: ListParams) -> Result<Vec<QaThreadRecord>, ApiError> {
        self.list("api/admin/threads", params).await
    }

    async fn parse_excel_file(&self, file: FileAttachment) -> Result<ParsedRoster, ApiError> {
        let form = Form::new().part("file", file_part(file)?);
        let builder = self
            .request(Method::POST, "api/admin/users/bulk/parse", &[])?
            .multipart(form);
        let response = Self::send(builder).await?;
        Ok(Self::decode::<SingleBody<ParsedRoster>>(response)
            .await?
            .into_inner())
    }

    async fn create_bulk_users(&self, request: BulkUsersRequest) -> Result<Uuid, ApiError> {
        let builder = self
            .request(Method::POST, "api/admin/users/bulk", &[])?
            .json(&request);
        let response = Self::send(builder).await?;
        let accepted: BulkCreationAccepted = Self::decode(response).await?;
        Ok(accepted.bulk_creation_id)
    }

    async fn get_bulk_creation_status(&self, id: Uuid) -> Result<BulkCreationStatus, ApiError> {
        let path = format!("api/admin/users/bulk/{id}");
        let response = Self::send(self.request(Method::GET, &path, &[])?).await?;
        Ok(Self::decode::<SingleBody<BulkCreationStatus>>(response)
            .await?
            .into_inner())
    }
}

#[cfg(test)]
mod tests {
    use httpmock::MockServer;
    use tempfile::NamedTempFile;

    use super::*;

    fn api(server: &MockServer) -> HttpAdminApi {
        let base = Url::parse(&server.base_url()).expect("base url");
        HttpAdminApi::new(&base, Some("admin-token".into()), Duration::from_secs(5))
            .expect("client")
    }

    fn settings(token: Option<&str>, token_file: Option<&NamedTempFile>) -> ApiSettings {
        ApiSettings {
            base_url: Some(Url::parse("https://admin.example.org/platform").expect("url")),
            token: token.map(str::to_string),
            token_file: token_file.map(|file| file.path().to_path_buf()),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn token_file_takes_precedence() {
        let file = NamedTempFile::new().expect("tmp file");
        std::fs::write(file.path(), "from-file\n").expect("write token");

        let resolved = resolve_token(&settings(Some("inline"), Some(&file))).expect("token");
        assert_eq!(resolved.as_deref(), Some("from-file"));
        assert_eq!(
            resolve_token(&settings(Some("inline"), None)).expect("token").as_deref(),
            Some("inline")
        );
    }

    #[test]
    fn base_path_is_kept_for_relative_joins() {
        let api = HttpAdminApi::from_settings(&settings(None, None)).expect("client");
        assert_eq!(api.base().as_str(), "https://admin.example.org/platform/");
    }

    #[test]
    fn missing_base_url_is_a_configuration_error() {
        let mut settings = settings(None, None);
        settings.base_url = None;
        let err = HttpAdminApi::from_settings(&settings).expect_err("no base url");
        assert!(matches!(err, InfraError::Configuration { .. }));
    }

    #[test]
    fn rejection_message_prefers_structured_fields() {
        let status = reqwest::StatusCode::CONFLICT;
        assert_eq!(
            rejection_message(status, r#"{"message":"Project already archived"}"#),
            "Project already archived"
        );
        assert_eq!(
            rejection_message(status, r#"{"error":"Forbidden for moderators"}"#),
            "Forbidden for moderators"
        );
        assert_eq!(rejection_message(status, "plain failure"), "plain failure");
        assert_eq!(rejection_message(status, ""), "409 Conflict");
    }

    #[tokio::test]
    async fn fetch_blogs_sends_paging_and_bearer() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method("GET")
                .path("/api/admin/blogs")
                .query_param("page", "1")
                .query_param("limit", "1000")
                .header("authorization", "Bearer admin-token");
            then.status(200)
                .header("content-type", "application/json")
                .body(
                    r#"{"items":[{"id":"6f1c3f7e-8f0b-4a53-9b8f-0d8d1c1e2a10","title":"Field notes","status":"draft","created_at":"2025-02-01T10:00:00Z"}]}"#,
                );
        });

        let blogs = api(&server)
            .fetch_blogs(ListParams { page: 1, limit: 1000 })
            .await
            .expect("blogs");
        mock.assert();
        assert_eq!(blogs.len(), 1);
        assert_eq!(blogs[0].status, BlogStatus::Draft);
    }

    #[tokio::test]
    async fn bare_array_list_is_accepted() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method("GET").path("/api/admin/institutions");
            then.status(200)
                .header("content-type", "application/json")
                .body(
                    r#"[{"id":"0d3f1a55-1111-4f3e-9a0c-7a6c1f0b9e01","name":"Makerere University","status":"active","created_at":"2024-09-01T00:00:00Z"}]"#,
                );
        });

        let institutions = api(&server)
            .list_institutions(ListParams { page: 1, limit: 50 })
            .await
            .expect("institutions");
        assert_eq!(institutions[0].name, "Makerere University");
    }

    #[tokio::test]
    async fn delete_blog_passes_confirm_flag() {
        let server = MockServer::start();
        let id = Uuid::new_v4();
        let mock = server.mock(|when, then| {
            when.method("DELETE")
                .path(format!("/api/admin/blogs/{id}"))
                .query_param("confirm", "true");
            then.status(204);
        });

        api(&server).delete_blog(id, true).await.expect("deleted");
        mock.assert();
    }

    #[tokio::test]
    async fn project_deletion_carries_reason_body() {
        let server = MockServer::start();
        let id = Uuid::new_v4();
        let mock = server.mock(|when, then| {
            when.method("DELETE")
                .path(format!("/api/admin/projects/{id}"))
                .json_body_includes(r#"{"reason":"Duplicate of an approved project"}"#);
            then.status(200).body("{}");
        });

        api(&server)
            .delete_project_by_admin(id, "Duplicate of an approved project")
            .await
            .expect("deleted");
        mock.assert();
    }

    #[tokio::test]
    async fn rejection_surfaces_server_message() {
        let server = MockServer::start();
        let id = Uuid::new_v4();
        server.mock(|when, then| {
            when.method("PATCH").path(format!("/api/admin/users/{id}/activation"));
            then.status(403)
                .header("content-type", "application/json")
                .body(r#"{"message":"Cannot deactivate the last administrator"}"#);
        });

        let err = api(&server)
            .activate_deactivate_user(id, false, None)
            .await
            .expect_err("rejected");
        assert_eq!(
            err,
            ApiError::rejected(403, "Cannot deactivate the last administrator")
        );
    }

    #[tokio::test]
    async fn bulk_creation_returns_job_id() {
        let server = MockServer::start();
        let job = Uuid::new_v4();
        let mock = server.mock(|when, then| {
            when.method("POST")
                .path("/api/admin/users/bulk")
                .json_body_includes(r#"{"instructors":[],"students":[]}"#);
            then.status(202)
                .header("content-type", "application/json")
                .body(format!(r#"{{"bulkCreationId":"{job}"}}"#));
        });

        let id = api(&server)
            .create_bulk_users(BulkUsersRequest::default())
            .await
            .expect("accepted");
        mock.assert();
        assert_eq!(id, job);
    }

    #[tokio::test]
    async fn spreadsheet_is_sent_as_multipart() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method("POST").path("/api/admin/users/bulk/parse");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"instructors":[{"first_name":"Grace","last_name":"Hopper","email":"grace@uni.edu"}],"students":[]}"#);
        });

        let roster = api(&server)
            .parse_excel_file(FileAttachment::new("cohort.csv", "text/csv", "a,b\n"))
            .await
            .expect("parsed");
        mock.assert();
        assert_eq!(roster.instructors.len(), 1);
    }

    #[tokio::test]
    async fn undecodable_body_is_a_decode_error() {
        let server = MockServer::start();
        let id = Uuid::new_v4();
        server.mock(|when, then| {
            when.method("GET").path(format!("/api/admin/users/bulk/{id}"));
            then.status(200).body("not json");
        });

        let err = api(&server)
            .get_bulk_creation_status(id)
            .await
            .expect_err("bad body");
        assert!(matches!(err, ApiError::Decode(_)));
    }
}
