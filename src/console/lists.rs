//! `list` and row-action subcommands, shared by every admin table.

use serde::Serialize;
use uuid::Uuid;

use crate::application::actions::ActionVerb;
use crate::application::controller::{AdminListController, ControllerError, ListingOptions};
use crate::application::error::AppError;
use crate::application::filter::{SortOrder, StatusFilter};
use crate::application::listing::ListAction;
use crate::application::resources::AdminResource;
use crate::config::{ActionArgs, ListArgs};
use crate::domain::entities::Listable;
use crate::presentation::views;

use super::print::{print_json, print_toasts};

#[derive(Serialize)]
struct PageOutput<'a, T> {
    page: usize,
    total_pages: usize,
    total_matches: usize,
    total_items: usize,
    items: &'a [T],
}

fn apply_list_args<R: AdminResource>(
    controller: &mut AdminListController<R>,
    args: &ListArgs,
) -> Result<(), AppError> {
    if let Some(search) = &args.search {
        controller.dispatch(ListAction::SetSearch(search.clone()));
    }
    if let Some(status) = &args.status {
        controller.dispatch(ListAction::SetStatus(StatusFilter::parse(status)?));
    }
    if let Some(category) = &args.category {
        controller.dispatch(ListAction::SetCategory(Some(category.clone())));
    }
    if let Some(sort) = &args.sort {
        controller.dispatch(ListAction::SetSort(SortOrder::parse(sort)?));
    }
    // Filters reset the cursor, so the page goes last.
    controller.dispatch(ListAction::SetPage(args.page));
    Ok(())
}

async fn loaded<R: AdminResource>(
    resource: R,
    options: ListingOptions,
) -> Result<AdminListController<R>, AppError> {
    let mut controller = AdminListController::new(resource, options);
    let result = controller.load().await;
    print_toasts(controller.drain_toasts());
    result?;
    Ok(controller)
}

pub async fn list<R>(resource: R, options: ListingOptions, args: &ListArgs) -> Result<(), AppError>
where
    R: AdminResource,
    R::Item: Serialize,
{
    let mut controller = loaded(resource, options).await?;
    apply_list_args(&mut controller, args)?;
    let view = controller.view();

    if args.json {
        return print_json(&PageOutput {
            page: view.current_page,
            total_pages: view.total_pages,
            total_matches: view.total_matches,
            total_items: view.total_items,
            items: &view.rows,
        });
    }

    let plural = controller.resource().label().to_lowercase();
    print!(
        "{}",
        views::list_page(&plural, &view, |item| controller.verbs_for(item))
    );
    Ok(())
}

pub async fn show<R>(resource: R, options: ListingOptions, id: Uuid) -> Result<(), AppError>
where
    R: AdminResource,
    R::Item: Serialize,
{
    let controller = loaded(resource, options).await?;
    let item = controller.find(id).ok_or(ControllerError::UnknownRow {
        entity: <R::Item as Listable>::ENTITY,
        id,
    })?;
    print!("{}", views::details(item, controller.verbs_for(item)));
    Ok(())
}

/// Load the list, open the confirmation for `verb` on `args.id`, and submit it.
pub async fn act<R: AdminResource>(
    resource: R,
    options: ListingOptions,
    verb: ActionVerb,
    args: ActionArgs,
) -> Result<(), AppError> {
    let mut controller = loaded(resource, options).await?;
    controller.request_action(args.id, verb)?;
    if let Some(item) = controller.find(args.id) {
        print!("{}", views::confirmation(item, verb));
    }

    if let Some(input) = controller.confirmation_input_mut() {
        input.reason = args.reason.unwrap_or_default();
        input.confirmation_text = args.confirm.unwrap_or_default();
        input.message = args.message;
    }

    let outcome = controller.confirm().await;
    print_toasts(controller.drain_toasts());
    outcome?;
    Ok(())
}
