//! Generic admin list controller.
//!
//! Owns the fetched records of one resource together with its list state,
//! action machine and toast queue. Confirmation takes `&mut self`, so at most
//! one mutation per controller is ever in flight.

use std::num::{NonZeroU32, NonZeroUsize};

use metrics::counter;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::entities::Listable;

use super::actions::{ActionError, ActionMachine, ActionVerb, ConfirmationInput, PendingAction};
use super::api::ApiError;
use super::listing::{ListAction, ListState, ListView};
use super::resources::{AdminResource, ResourceError};
use super::toasts::{Toast, ToastQueue};

pub const METRIC_ADMIN_ACTIONS: &str = "collabdesk_admin_actions_total";

const DEFAULT_PAGE_SIZE: usize = 10;
const DEFAULT_FETCH_LIMIT: u32 = 1000;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("{entity} {id} is not in the loaded list")]
    UnknownRow { entity: &'static str, id: Uuid },
    #[error("cannot {verb} {entity} {id} in its current state")]
    VerbUnavailable {
        entity: &'static str,
        id: Uuid,
        verb: &'static str,
    },
    #[error(transparent)]
    Action(#[from] ActionError),
    #[error(transparent)]
    Resource(#[from] ResourceError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Sizing knobs shared by every list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingOptions {
    pub page_size: NonZeroUsize,
    /// Records requested per fetch; the whole list is filtered client side.
    pub fetch_limit: NonZeroU32,
}

impl Default for ListingOptions {
    fn default() -> Self {
        Self {
            page_size: NonZeroUsize::new(DEFAULT_PAGE_SIZE).unwrap_or(NonZeroUsize::MIN),
            fetch_limit: NonZeroU32::new(DEFAULT_FETCH_LIMIT).unwrap_or(NonZeroU32::MIN),
        }
    }
}

type StatusOf<R> = <<R as AdminResource>::Item as Listable>::Status;

pub struct AdminListController<R: AdminResource> {
    resource: R,
    items: Vec<R::Item>,
    list: ListState<StatusOf<R>>,
    actions: ActionMachine<R::Item>,
    toasts: ToastQueue,
    fetch_limit: NonZeroU32,
    loading: bool,
}

impl<R: AdminResource> AdminListController<R> {
    pub fn new(resource: R, options: ListingOptions) -> Self {
        Self {
            resource,
            items: Vec::new(),
            list: ListState::new(options.page_size),
            actions: ActionMachine::new(),
            toasts: ToastQueue::new(),
            fetch_limit: options.fetch_limit,
            loading: false,
        }
    }

    pub fn resource(&self) -> &R {
        &self.resource
    }

    pub fn items(&self) -> &[R::Item] {
        &self.items
    }

    pub fn list_state(&self) -> &ListState<StatusOf<R>> {
        &self.list
    }

    pub fn pending(&self) -> &PendingAction<R::Item> {
        self.actions.state()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_submitting(&self) -> bool {
        self.actions.is_submitting()
    }

    pub fn toasts(&self) -> &[Toast] {
        self.toasts.peek()
    }

    pub fn drain_toasts(&mut self) -> Vec<Toast> {
        self.toasts.drain()
    }

    /// Fetch the full list. On failure the previous records stay visible.
    pub async fn load(&mut self) -> Result<usize, ControllerError> {
        self.loading = true;
        let result = self.resource.fetch_all(self.fetch_limit.get()).await;
        self.loading = false;

        match result {
            Ok(items) => {
                info!(
                    entity = R::Item::ENTITY,
                    count = items.len(),
                    "admin list loaded"
                );
                self.items = items;
                Ok(self.items.len())
            }
            Err(err) => {
                warn!(entity = R::Item::ENTITY, error = %err, "admin list fetch failed");
                self.toasts.error(err.to_string());
                Err(err.into())
            }
        }
    }

    pub fn dispatch(&mut self, action: ListAction<StatusOf<R>>) {
        self.list.reduce(action);
    }

    pub fn view(&self) -> ListView<R::Item> {
        self.list
            .view_scoped(&self.items, |item| self.resource.in_scope(item))
    }

    /// Verbs to render for `item`; none while its mutation is in flight.
    pub fn verbs_for(&self, item: &R::Item) -> &'static [ActionVerb] {
        if self.actions.is_locked(item.id()) {
            &[]
        } else {
            self.resource.verbs_for(item)
        }
    }

    pub fn find(&self, id: Uuid) -> Option<&R::Item> {
        self.items
            .iter()
            .find(|item| item.id() == id && self.resource.in_scope(item))
    }

    /// Open the confirmation for `verb` on the row `id`.
    pub fn request_action(&mut self, id: Uuid, verb: ActionVerb) -> Result<(), ControllerError> {
        let item = self
            .find(id)
            .cloned()
            .ok_or(ControllerError::UnknownRow {
                entity: R::Item::ENTITY,
                id,
            })?;
        if !self.resource.verbs_for(&item).contains(&verb) {
            return Err(ControllerError::VerbUnavailable {
                entity: R::Item::ENTITY,
                id,
                verb: verb.as_str(),
            });
        }
        self.actions.open(item, verb)?;
        Ok(())
    }

    pub fn confirmation_input_mut(&mut self) -> Option<&mut ConfirmationInput> {
        self.actions.input_mut()
    }

    pub fn can_confirm(&self) -> bool {
        self.actions.can_confirm()
    }

    pub fn cancel(&mut self) -> Result<(), ControllerError> {
        self.actions.cancel()?;
        Ok(())
    }

    /// Submit the pending action.
    ///
    /// A closed gate raises an error toast without contacting the API. On
    /// success the list is refetched and returns to page 1. A rejection is
    /// surfaced verbatim; nothing is retried.
    pub async fn confirm(&mut self) -> Result<(), ControllerError> {
        let submission = match self.actions.begin() {
            Ok(submission) => submission,
            Err(ActionError::Gate(gate)) => {
                self.toasts.error(gate.to_string());
                return Err(ActionError::Gate(gate).into());
            }
            Err(err) => return Err(err.into()),
        };

        let verb = submission.verb();
        let id = submission.target().id();
        let title = submission.target().title().into_owned();
        let result = self
            .resource
            .perform(submission.target(), verb, submission.input())
            .await;

        match result {
            Ok(()) => {
                self.actions.finish(submission, Ok(()));
                counter!(METRIC_ADMIN_ACTIONS, "verb" => verb.as_str(), "outcome" => "success")
                    .increment(1);
                info!(entity = R::Item::ENTITY, %id, verb = verb.as_str(), "admin action applied");
                self.toasts.success(format!(
                    "{} \"{}\" {}",
                    capitalize(R::Item::ENTITY),
                    title,
                    verb.past_tense()
                ));

                if let Err(err) = self.load().await {
                    warn!(entity = R::Item::ENTITY, error = %err, "refetch after action failed");
                }
                self.list.rewind();
                Ok(())
            }
            Err(err) => {
                let reason = err.to_string();
                self.actions.finish(submission, Err(reason.clone()));
                counter!(METRIC_ADMIN_ACTIONS, "verb" => verb.as_str(), "outcome" => "failure")
                    .increment(1);
                warn!(
                    entity = R::Item::ENTITY,
                    %id,
                    verb = verb.as_str(),
                    error = %reason,
                    "admin action rejected"
                );
                self.toasts.error(reason);
                Err(err.into())
            }
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
