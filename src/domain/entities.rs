//! Listable records and the uniform view the list machinery has of them.

use std::borrow::Cow;

use time::OffsetDateTime;
use uuid::Uuid;

pub use collabdesk_api_types::{
    BlogRecord, EventRecord, InstitutionRecord, PersonRef, ProjectRecord, QaThreadRecord,
    UserRecord,
};

use super::types::{
    AccountState, BlogStatus, EventStatus, InstitutionStatus, ProjectStatus, StatusKey,
    ThreadStatus,
};

/// A record rendered as a table row with status-driven actions.
pub trait Listable: Clone + Send + Sync + 'static {
    type Status: StatusKey;

    /// Singular noun used in messages, e.g. `blog`.
    const ENTITY: &'static str;

    fn id(&self) -> Uuid;

    fn title(&self) -> Cow<'_, str>;

    fn status(&self) -> Self::Status;

    /// Up to two text fields matched by the free-text search.
    fn search_fields(&self) -> [Option<Cow<'_, str>>; 2];

    /// Category or type discriminator matched by the category filter.
    fn category(&self) -> Option<&str>;

    fn created_at(&self) -> OffsetDateTime;
}

fn borrowed(value: &str) -> Option<Cow<'_, str>> {
    Some(Cow::Borrowed(value))
}

impl Listable for BlogRecord {
    type Status = BlogStatus;
    const ENTITY: &'static str = "blog";

    fn id(&self) -> Uuid {
        self.id
    }

    fn title(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.title)
    }

    fn status(&self) -> BlogStatus {
        self.status
    }

    fn search_fields(&self) -> [Option<Cow<'_, str>>; 2] {
        [
            borrowed(&self.title),
            self.author.as_ref().map(|author| Cow::Borrowed(author.name.as_str())),
        ]
    }

    fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }
}

impl Listable for ProjectRecord {
    type Status = ProjectStatus;
    const ENTITY: &'static str = "project";

    fn id(&self) -> Uuid {
        self.id
    }

    fn title(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.title)
    }

    fn status(&self) -> ProjectStatus {
        self.status
    }

    fn search_fields(&self) -> [Option<Cow<'_, str>>; 2] {
        [
            borrowed(&self.title),
            self.abstract_text.as_deref().map(Cow::Borrowed),
        ]
    }

    fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }
}

impl Listable for UserRecord {
    type Status = AccountState;
    const ENTITY: &'static str = "user";

    fn id(&self) -> Uuid {
        self.id
    }

    fn title(&self) -> Cow<'_, str> {
        Cow::Owned(format!("{} {}", self.first_name, self.last_name))
    }

    fn status(&self) -> AccountState {
        AccountState::from_active(self.is_active)
    }

    fn search_fields(&self) -> [Option<Cow<'_, str>>; 2] {
        [Some(self.title()), borrowed(&self.email)]
    }

    fn category(&self) -> Option<&str> {
        Some(self.role.as_str())
    }

    fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }
}

impl Listable for InstitutionRecord {
    type Status = InstitutionStatus;
    const ENTITY: &'static str = "institution";

    fn id(&self) -> Uuid {
        self.id
    }

    fn title(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }

    fn status(&self) -> InstitutionStatus {
        self.status
    }

    fn search_fields(&self) -> [Option<Cow<'_, str>>; 2] {
        [borrowed(&self.name), self.country.as_deref().map(Cow::Borrowed)]
    }

    fn category(&self) -> Option<&str> {
        self.institution_type.as_deref()
    }

    fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }
}

impl Listable for EventRecord {
    type Status = EventStatus;
    const ENTITY: &'static str = "event";

    fn id(&self) -> Uuid {
        self.id
    }

    fn title(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.title)
    }

    fn status(&self) -> EventStatus {
        self.status
    }

    fn search_fields(&self) -> [Option<Cow<'_, str>>; 2] {
        [
            borrowed(&self.title),
            self.description.as_deref().map(Cow::Borrowed),
        ]
    }

    fn category(&self) -> Option<&str> {
        self.event_type.as_deref()
    }

    fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }
}

impl Listable for QaThreadRecord {
    type Status = ThreadStatus;
    const ENTITY: &'static str = "thread";

    fn id(&self) -> Uuid {
        self.id
    }

    fn title(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.title)
    }

    fn status(&self) -> ThreadStatus {
        self.status
    }

    fn search_fields(&self) -> [Option<Cow<'_, str>>; 2] {
        [borrowed(&self.title), self.body.as_deref().map(Cow::Borrowed)]
    }

    fn category(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }
}
