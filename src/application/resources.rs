//! Per-resource bindings: how a list is fetched and which verbs its rows offer.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use collabdesk_api_types::{
    BlogRecord, BlogStatus, EventRecord, InstitutionRecord, ListParams, ProjectRecord,
    ProjectStatus, QaThreadRecord, UserRecord,
};

use crate::domain::entities::Listable;
use crate::domain::types::AccountState;

use super::actions::{ActionVerb, ConfirmationInput};
use super::api::{AdminApi, ApiError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    #[error("cannot {verb} a {entity} in its current state")]
    Unsupported {
        entity: &'static str,
        verb: &'static str,
    },
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ResourceError {
    fn unsupported<T: Listable>(verb: ActionVerb) -> Self {
        Self::Unsupported {
            entity: T::ENTITY,
            verb: verb.as_str(),
        }
    }
}

/// A list the admin console can show and act on.
#[async_trait]
pub trait AdminResource: Send + Sync {
    type Item: Listable;

    /// Heading shown above the list.
    fn label(&self) -> &'static str;

    /// Verbs offered for `item` given its current status.
    fn verbs_for(&self, item: &Self::Item) -> &'static [ActionVerb];

    /// Fixed predicate applied before user filters.
    fn in_scope(&self, _item: &Self::Item) -> bool {
        true
    }

    async fn fetch_all(&self, limit: u32) -> Result<Vec<Self::Item>, ApiError>;

    async fn perform(
        &self,
        item: &Self::Item,
        verb: ActionVerb,
        input: &ConfirmationInput,
    ) -> Result<(), ResourceError>;
}

fn first_page(limit: u32) -> ListParams {
    ListParams { page: 1, limit }
}

pub struct BlogsResource {
    api: Arc<dyn AdminApi>,
}

impl BlogsResource {
    pub fn new(api: Arc<dyn AdminApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl AdminResource for BlogsResource {
    type Item = BlogRecord;

    fn label(&self) -> &'static str {
        "Blogs"
    }

    fn verbs_for(&self, item: &BlogRecord) -> &'static [ActionVerb] {
        match item.status {
            BlogStatus::Draft => &[ActionVerb::Publish, ActionVerb::Delete],
            BlogStatus::Published => &[
                ActionVerb::Unpublish,
                ActionVerb::Archive,
                ActionVerb::Delete,
            ],
            BlogStatus::Archived => &[ActionVerb::Publish, ActionVerb::Delete],
        }
    }

    async fn fetch_all(&self, limit: u32) -> Result<Vec<BlogRecord>, ApiError> {
        self.api.fetch_blogs(first_page(limit)).await
    }

    async fn perform(
        &self,
        item: &BlogRecord,
        verb: ActionVerb,
        _input: &ConfirmationInput,
    ) -> Result<(), ResourceError> {
        match verb {
            ActionVerb::Publish => self.api.update_blog_status(item.id, BlogStatus::Published).await?,
            ActionVerb::Unpublish => self.api.update_blog_status(item.id, BlogStatus::Draft).await?,
            ActionVerb::Archive => self.api.archive_blog(item.id).await?,
            ActionVerb::Delete => self.api.delete_blog(item.id, true).await?,
            other => return Err(ResourceError::unsupported::<BlogRecord>(other)),
        }
        Ok(())
    }
}

/// Which projects a project list shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectScope {
    All,
    /// Community resources: projects nobody has been assigned to supervise.
    Community,
}

pub struct ProjectsResource {
    api: Arc<dyn AdminApi>,
    scope: ProjectScope,
}

impl ProjectsResource {
    pub fn new(api: Arc<dyn AdminApi>) -> Self {
        Self {
            api,
            scope: ProjectScope::All,
        }
    }

    pub fn community(api: Arc<dyn AdminApi>) -> Self {
        Self {
            api,
            scope: ProjectScope::Community,
        }
    }

    pub fn scope(&self) -> ProjectScope {
        self.scope
    }
}

#[async_trait]
impl AdminResource for ProjectsResource {
    type Item = ProjectRecord;

    fn label(&self) -> &'static str {
        match self.scope {
            ProjectScope::All => "Projects",
            ProjectScope::Community => "Community resources",
        }
    }

    fn verbs_for(&self, item: &ProjectRecord) -> &'static [ActionVerb] {
        match item.status {
            ProjectStatus::Active => &[ActionVerb::Deactivate, ActionVerb::Delete],
            ProjectStatus::Pending | ProjectStatus::Inactive => {
                &[ActionVerb::Activate, ActionVerb::Delete]
            }
            ProjectStatus::Completed => &[ActionVerb::Delete],
        }
    }

    fn in_scope(&self, item: &ProjectRecord) -> bool {
        match self.scope {
            ProjectScope::All => true,
            ProjectScope::Community => item.assigned_instructor.is_none(),
        }
    }

    async fn fetch_all(&self, limit: u32) -> Result<Vec<ProjectRecord>, ApiError> {
        self.api.get_all_projects_for_admin(first_page(limit)).await
    }

    async fn perform(
        &self,
        item: &ProjectRecord,
        verb: ActionVerb,
        input: &ConfirmationInput,
    ) -> Result<(), ResourceError> {
        let note = input.note().unwrap_or_default();
        match verb {
            ActionVerb::Activate => {
                self.api
                    .activate_deactivate_project(item.id, ProjectStatus::Active, note)
                    .await?
            }
            ActionVerb::Deactivate => {
                self.api
                    .activate_deactivate_project(item.id, ProjectStatus::Inactive, note)
                    .await?
            }
            ActionVerb::Delete => {
                self.api
                    .delete_project_by_admin(item.id, input.reason.trim())
                    .await?
            }
            other => return Err(ResourceError::unsupported::<ProjectRecord>(other)),
        }
        Ok(())
    }
}

pub struct UsersResource {
    api: Arc<dyn AdminApi>,
}

impl UsersResource {
    pub fn new(api: Arc<dyn AdminApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl AdminResource for UsersResource {
    type Item = UserRecord;

    fn label(&self) -> &'static str {
        "Users"
    }

    fn verbs_for(&self, item: &UserRecord) -> &'static [ActionVerb] {
        match AccountState::from_active(item.is_active) {
            AccountState::Active => &[ActionVerb::Deactivate],
            AccountState::Inactive => &[ActionVerb::Activate],
        }
    }

    async fn fetch_all(&self, limit: u32) -> Result<Vec<UserRecord>, ApiError> {
        self.api.get_all_users(first_page(limit)).await
    }

    async fn perform(
        &self,
        item: &UserRecord,
        verb: ActionVerb,
        input: &ConfirmationInput,
    ) -> Result<(), ResourceError> {
        let is_active = match verb {
            ActionVerb::Activate => true,
            ActionVerb::Deactivate => false,
            other => return Err(ResourceError::unsupported::<UserRecord>(other)),
        };
        self.api
            .activate_deactivate_user(item.id, is_active, input.note())
            .await?;
        Ok(())
    }
}

macro_rules! read_only_resource {
    ($(#[$meta:meta])* $name:ident, $item:ty, $label:literal, $fetch:ident) => {
        $(#[$meta])*
        pub struct $name {
            api: Arc<dyn AdminApi>,
        }

        impl $name {
            pub fn new(api: Arc<dyn AdminApi>) -> Self {
                Self { api }
            }
        }

        #[async_trait]
        impl AdminResource for $name {
            type Item = $item;

            fn label(&self) -> &'static str {
                $label
            }

            fn verbs_for(&self, _item: &$item) -> &'static [ActionVerb] {
                &[]
            }

            async fn fetch_all(&self, limit: u32) -> Result<Vec<$item>, ApiError> {
                self.api.$fetch(first_page(limit)).await
            }

            async fn perform(
                &self,
                _item: &$item,
                verb: ActionVerb,
                _input: &ConfirmationInput,
            ) -> Result<(), ResourceError> {
                Err(ResourceError::unsupported::<$item>(verb))
            }
        }
    };
}

read_only_resource!(InstitutionsResource, InstitutionRecord, "Institutions", list_institutions);
read_only_resource!(EventsResource, EventRecord, "Events", list_events);
read_only_resource!(
    /// Q&A threads; moderation happens elsewhere.
    ThreadsResource,
    QaThreadRecord,
    "Q&A threads",
    list_threads
);

#[cfg(test)]
mod tests {
    use collabdesk_api_types::PersonRef;
    use time::macros::datetime;
    use uuid::Uuid;

    use super::*;
    use crate::infra::memory::{ApiCall, InMemoryAdminApi};

    fn project(status: ProjectStatus, supervised: bool) -> ProjectRecord {
        ProjectRecord {
            id: Uuid::new_v4(),
            title: "Coral bleaching".into(),
            abstract_text: None,
            category: Some("marine".into()),
            status,
            owner: None,
            assigned_instructor: supervised.then(|| PersonRef {
                id: Uuid::new_v4(),
                name: "Dr. Reyes".into(),
                email: None,
            }),
            institution: None,
            created_at: datetime!(2025-05-02 12:00 UTC),
        }
    }

    #[test]
    fn project_verbs_follow_status() {
        let resource = ProjectsResource::new(Arc::new(InMemoryAdminApi::default()));
        assert_eq!(
            resource.verbs_for(&project(ProjectStatus::Active, false)),
            &[ActionVerb::Deactivate, ActionVerb::Delete]
        );
        assert_eq!(
            resource.verbs_for(&project(ProjectStatus::Pending, false)),
            &[ActionVerb::Activate, ActionVerb::Delete]
        );
        assert_eq!(
            resource.verbs_for(&project(ProjectStatus::Completed, false)),
            &[ActionVerb::Delete]
        );
    }

    #[test]
    fn community_scope_excludes_supervised_projects() {
        let api: Arc<dyn AdminApi> = Arc::new(InMemoryAdminApi::default());
        let community = ProjectsResource::community(api.clone());
        let all = ProjectsResource::new(api);

        let supervised = project(ProjectStatus::Active, true);
        assert!(!community.in_scope(&supervised));
        assert!(community.in_scope(&project(ProjectStatus::Active, false)));
        assert!(all.in_scope(&supervised));
        assert_eq!(community.label(), "Community resources");
    }

    #[tokio::test]
    async fn deleting_a_project_sends_trimmed_reason() {
        let target = project(ProjectStatus::Active, false);
        let backend = Arc::new(InMemoryAdminApi::default().with_projects(vec![target.clone()]));
        let resource = ProjectsResource::new(backend.clone());
        let input = ConfirmationInput {
            reason: "  Duplicate submission from spring intake  ".into(),
            confirmation_text: "PERMANENTLY DELETE".into(),
            message: None,
        };

        resource
            .perform(&target, ActionVerb::Delete, &input)
            .await
            .expect("delete accepted");

        assert!(backend.projects().is_empty());
        assert_eq!(
            backend.calls().last(),
            Some(&ApiCall::new("delete_project_by_admin", Some(target.id))
                .with_detail("Duplicate submission from spring intake"))
        );
    }

    #[tokio::test]
    async fn read_only_lists_refuse_every_verb() {
        let resource = EventsResource::new(Arc::new(InMemoryAdminApi::default()));
        let event = EventRecord {
            id: Uuid::new_v4(),
            title: "Lab open day".into(),
            description: None,
            event_type: None,
            status: collabdesk_api_types::EventStatus::Upcoming,
            organizer: None,
            starts_at: datetime!(2025-06-10 09:00 UTC),
            created_at: datetime!(2025-05-02 12:00 UTC),
        };

        assert!(resource.verbs_for(&event).is_empty());
        let err = resource
            .perform(&event, ActionVerb::Delete, &ConfirmationInput::default())
            .await
            .expect_err("read only");
        assert!(matches!(err, ResourceError::Unsupported { entity: "event", .. }));
    }
}
