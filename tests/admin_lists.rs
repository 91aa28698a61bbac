use std::sync::Arc;

use collabdesk::application::actions::{ActionVerb, DELETE_CONFIRMATION_PHRASE, PendingAction};
use collabdesk::application::bulk_import::{BulkImportWizard, BulkProgress, WizardStep};
use collabdesk::application::controller::{AdminListController, ListingOptions};
use collabdesk::application::filter::StatusFilter;
use collabdesk::application::listing::ListAction;
use collabdesk::application::polling::{BulkStatusPoller, PollPolicy};
use collabdesk::application::resources::{BlogsResource, ProjectsResource};
use collabdesk::domain::entities::{BlogRecord, PersonRef, ProjectRecord};
use collabdesk::domain::uploads::UploadPolicy;
use collabdesk::infra::memory::InMemoryAdminApi;
use collabdesk::presentation::views;
use collabdesk_api_types::{
    BlogStatus, BulkCreationState, BulkCreationStatus, InstructorRow, ProjectStatus, StudentRow,
};
use time::macros::datetime;
use uuid::Uuid;

fn blogs(count: usize, drafts: usize) -> Vec<BlogRecord> {
    (0..count)
        .map(|index| BlogRecord {
            id: Uuid::new_v4(),
            title: format!("Expedition log {index:02}"),
            excerpt: None,
            category: Some("fieldwork".into()),
            status: if index < drafts {
                BlogStatus::Draft
            } else {
                BlogStatus::Published
            },
            author: None,
            created_at: datetime!(2025-01-01 00:00 UTC),
        })
        .collect()
}

fn project(title: &str, supervised: bool) -> ProjectRecord {
    ProjectRecord {
        id: Uuid::new_v4(),
        title: title.into(),
        abstract_text: Some("Longitudinal sampling of river sediment".into()),
        category: Some("ecology".into()),
        status: ProjectStatus::Active,
        owner: None,
        assigned_instructor: supervised.then(|| PersonRef {
            id: Uuid::new_v4(),
            name: "Dr. Mensah".into(),
            email: None,
        }),
        institution: None,
        created_at: datetime!(2025-02-01 00:00 UTC),
    }
}

#[tokio::test]
async fn twenty_five_blogs_span_three_pages() {
    let backend = Arc::new(InMemoryAdminApi::default().with_blogs(blogs(25, 4)));
    let mut controller =
        AdminListController::new(BlogsResource::new(backend), ListingOptions::default());
    controller.load().await.expect("load");
    controller.dispatch(ListAction::SetStatus(StatusFilter::All));

    let first = controller.view();
    assert_eq!(first.total_pages, 3);
    assert_eq!(first.rows.len(), 10);

    controller.dispatch(ListAction::SetPage(3));
    let last = controller.view();
    assert_eq!(last.current_page, 3);
    assert_eq!(last.rows.len(), 5);

    controller.dispatch(ListAction::SetStatus(StatusFilter::Only(BlogStatus::Draft)));
    let drafts = controller.view();
    assert_eq!(drafts.current_page, 1);
    assert_eq!(drafts.total_matches, 4);
    assert!(drafts.rows.iter().all(|blog| blog.status == BlogStatus::Draft));
}

#[tokio::test]
async fn short_reason_keeps_delete_disabled() {
    let target = project("River sediment survey", false);
    let backend = Arc::new(InMemoryAdminApi::default().with_projects(vec![target.clone()]));
    let mut controller = AdminListController::new(
        ProjectsResource::new(backend.clone()),
        ListingOptions::default(),
    );
    controller.load().await.expect("load");

    controller
        .request_action(target.id, ActionVerb::Delete)
        .expect("delete offered");
    let input = controller.confirmation_input_mut().expect("confirming");
    input.reason = "short".into();
    input.confirmation_text = DELETE_CONFIRMATION_PHRASE.into();

    assert!(!controller.can_confirm());
    controller.confirm().await.expect_err("gate closed");
    assert_eq!(backend.calls_to("delete_project_by_admin"), 0);
    assert!(matches!(controller.pending(), PendingAction::Confirming { .. }));
}

#[tokio::test]
async fn community_resources_hide_supervised_projects() {
    let backend = Arc::new(InMemoryAdminApi::default().with_projects(vec![
        project("Open bird census", false),
        project("Thesis: soil carbon", true),
    ]));
    let mut controller = AdminListController::new(
        ProjectsResource::community(backend),
        ListingOptions::default(),
    );
    controller.load().await.expect("load");

    let view = controller.view();
    assert_eq!(view.total_items, 1);
    assert_eq!(view.rows[0].title, "Open bird census");

    let text = views::list_page("community resources", &view, |item| controller.verbs_for(item));
    assert!(text.contains("Open bird census"));
    assert!(text.contains("deactivate,delete"));
    assert!(!text.contains("soil carbon"));
}

#[test]
fn processing_status_reports_one_third_done() {
    let status = BulkCreationStatus {
        status: BulkCreationState::Processing,
        total_instructors: 5,
        processed_instructors: 2,
        total_students: 10,
        processed_students: 3,
        error_message: None,
    };
    let progress = BulkProgress::from(&status);
    assert!((progress.percent() - 33.333).abs() < 0.01);
    assert!(views::job_status(&status).contains("(33.33%)"));
}

#[tokio::test(start_paused = true)]
async fn manual_roster_runs_through_the_wizard() {
    let backend = Arc::new(InMemoryAdminApi::default());
    backend.script_next_bulk_job(vec![
        BulkCreationStatus {
            status: BulkCreationState::Processing,
            total_instructors: 1,
            processed_instructors: 1,
            total_students: 2,
            processed_students: 0,
            error_message: None,
        },
        BulkCreationStatus {
            status: BulkCreationState::Completed,
            total_instructors: 1,
            processed_instructors: 1,
            total_students: 2,
            processed_students: 2,
            error_message: None,
        },
    ]);

    let mut wizard = BulkImportWizard::new(backend.clone(), UploadPolicy::default());
    wizard.start_manual_entry().expect("manual");
    let roster = wizard.roster_mut().expect("review");
    roster.add_instructor(InstructorRow {
        first_name: "Amina".into(),
        last_name: "Diallo".into(),
        email: "amina@uni.edu".into(),
        institution: None,
    });
    for email in ["kofi@uni.edu", "lena@uni.edu"] {
        roster.add_student(StudentRow {
            first_name: "Student".into(),
            last_name: "Example".into(),
            email: email.into(),
            assigned_instructor_email: "amina@uni.edu".into(),
        });
    }

    wizard.submit().await.expect("submitted");
    let poller = BulkStatusPoller::new(backend.clone(), PollPolicy::default());
    assert_eq!(wizard.follow(&poller).await.expect("followed"), WizardStep::Done);
    assert_eq!(backend.calls_to("get_bulk_creation_status"), 2);
    assert_eq!(wizard.progress().map(|p| p.percent()), Some(100.0));
}
