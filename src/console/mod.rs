//! Command handlers of the `collabdesk` binary.

mod bulk;
mod io;
mod lists;
mod print;
mod projects;

use std::sync::Arc;

use tracing::info;

use crate::application::actions::ActionVerb;
use crate::application::api::AdminApi;
use crate::application::controller::ListingOptions;
use crate::application::error::AppError;
use crate::application::resources::{
    AdminResource, BlogsResource, EventsResource, InstitutionsResource, ProjectsResource, ThreadsResource,
    UsersResource,
};
use crate::config::{
    BlogsArgs, BlogsCmd, BulkImportArgs, Command, GlobalOverrides, ProjectsArgs, ProjectsCmd,
    ReadOnlyArgs, ReadOnlyCmd, ResourcesArgs, ResourcesCmd, Settings, UsersArgs, UsersCmd,
};
use crate::domain::uploads::UploadPolicy;
use crate::infra::http_client::HttpAdminApi;
use crate::infra::memory::{InMemoryAdminApi, MemorySeed};

/// Pick the backend: a fixture file when `--fixtures` is given, the platform otherwise.
pub fn backend(
    overrides: &GlobalOverrides,
    settings: &Settings,
) -> Result<Arc<dyn AdminApi>, AppError> {
    if let Some(path) = &overrides.fixtures {
        let seed = MemorySeed::from_json_file(path)?;
        info!(fixtures = %path.display(), "serving from fixture data");
        return Ok(Arc::new(InMemoryAdminApi::from_seed(seed)));
    }
    let client = HttpAdminApi::from_settings(&settings.api)?;
    info!(base = %client.base(), "using admin API");
    Ok(Arc::new(client))
}

pub async fn dispatch(
    command: Command,
    settings: &Settings,
    api: Arc<dyn AdminApi>,
) -> Result<(), AppError> {
    let options = ListingOptions::from(&settings.listing);
    match command {
        Command::Blogs(BlogsArgs { action }) => {
            let resource = BlogsResource::new(api);
            match action {
                BlogsCmd::List(args) => lists::list(resource, options, &args).await,
                BlogsCmd::Show(args) => lists::show(resource, options, args.id).await,
                BlogsCmd::Publish(args) => {
                    lists::act(resource, options, ActionVerb::Publish, args).await
                }
                BlogsCmd::Unpublish(args) => {
                    lists::act(resource, options, ActionVerb::Unpublish, args).await
                }
                BlogsCmd::Archive(args) => {
                    lists::act(resource, options, ActionVerb::Archive, args).await
                }
                BlogsCmd::Delete(args) => {
                    lists::act(resource, options, ActionVerb::Delete, args).await
                }
            }
        }
        Command::Projects(ProjectsArgs { action }) => match action {
            ProjectsCmd::List(args) => {
                lists::list(ProjectsResource::new(api), options, &args).await
            }
            ProjectsCmd::Show(args) => {
                lists::show(ProjectsResource::new(api), options, args.id).await
            }
            ProjectsCmd::Activate(args) => {
                lists::act(ProjectsResource::new(api), options, ActionVerb::Activate, args).await
            }
            ProjectsCmd::Deactivate(args) => {
                lists::act(ProjectsResource::new(api), options, ActionVerb::Deactivate, args)
                    .await
            }
            ProjectsCmd::Delete(args) => {
                lists::act(ProjectsResource::new(api), options, ActionVerb::Delete, args).await
            }
            ProjectsCmd::Update(args) => {
                projects::update(api, &UploadPolicy::from(&settings.uploads), *args).await
            }
        },
        Command::Resources(ResourcesArgs { action }) => {
            let resource = ProjectsResource::community(api);
            match action {
                ResourcesCmd::List(args) => lists::list(resource, options, &args).await,
                ResourcesCmd::Show(args) => lists::show(resource, options, args.id).await,
                ResourcesCmd::Activate(args) => {
                    lists::act(resource, options, ActionVerb::Activate, args).await
                }
                ResourcesCmd::Deactivate(args) => {
                    lists::act(resource, options, ActionVerb::Deactivate, args).await
                }
                ResourcesCmd::Delete(args) => {
                    lists::act(resource, options, ActionVerb::Delete, args).await
                }
            }
        }
        Command::Users(UsersArgs { action }) => {
            let resource = UsersResource::new(api);
            match action {
                UsersCmd::List(args) => lists::list(resource, options, &args).await,
                UsersCmd::Show(args) => lists::show(resource, options, args.id).await,
                UsersCmd::Activate(args) => {
                    lists::act(resource, options, ActionVerb::Activate, args).await
                }
                UsersCmd::Deactivate(args) => {
                    lists::act(resource, options, ActionVerb::Deactivate, args).await
                }
            }
        }
        Command::Institutions(ReadOnlyArgs { action }) => {
            read_only(InstitutionsResource::new(api), options, action).await
        }
        Command::Events(ReadOnlyArgs { action }) => {
            read_only(EventsResource::new(api), options, action).await
        }
        Command::Threads(ReadOnlyArgs { action }) => {
            read_only(ThreadsResource::new(api), options, action).await
        }
        Command::BulkImport(BulkImportArgs { action }) => bulk::handle(api, settings, action).await,
    }
}

async fn read_only<R>(resource: R, options: ListingOptions, cmd: ReadOnlyCmd) -> Result<(), AppError>
where
    R: AdminResource,
    R::Item: serde::Serialize,
{
    match cmd {
        ReadOnlyCmd::List(args) => lists::list(resource, options, &args).await,
        ReadOnlyCmd::Show(args) => lists::show(resource, options, args.id).await,
    }
}
