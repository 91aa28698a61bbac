//! Plain-text views rendered by the console.

use std::fmt::Write as _;

use collabdesk_api_types::BulkCreationStatus;
use serde::Serialize;
use serde_json::Value;

use crate::application::actions::{ActionVerb, DELETE_CONFIRMATION_PHRASE, MIN_DELETE_REASON_CHARS};
use crate::application::bulk_import::BulkProgress;
use crate::application::listing::ListView;
use crate::application::toasts::{Toast, ToastKind};
use crate::domain::entities::Listable;
use crate::domain::roster::Roster;
use crate::domain::types::StatusKey;

const TITLE_WIDTH: usize = 48;

fn clip(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut clipped: String = value.chars().take(width.saturating_sub(3)).collect();
    clipped.push_str("...");
    clipped
}

fn push_row<'a>(out: &mut String, widths: &[usize], cells: impl Iterator<Item = &'a str>) {
    let line = cells
        .zip(widths.iter().copied())
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(line.trim_end());
    out.push('\n');
}

fn render_table(header: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|cell| cell.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &widths, header.iter().copied());
    for row in rows {
        push_row(&mut out, &widths, row.iter().map(String::as_str));
    }
    out
}

/// Text shown when a list page has no rows.
pub fn empty_state(plural: &str, filtered: bool) -> String {
    if filtered {
        format!("No {plural} match the current filters.")
    } else {
        format!("No {plural} yet.")
    }
}

pub fn page_footer<T>(view: &ListView<T>) -> String {
    if view.is_empty() {
        return format!("Page {} of {}", view.current_page, view.total_pages);
    }
    let last = view.first_index() + view.rows.len() - 1;
    format!(
        "Page {} of {} (rows {}-{} of {})",
        view.current_page,
        view.total_pages,
        view.first_index(),
        last,
        view.total_matches
    )
}

/// One page of a list as a table: id, title, status, category, created, actions.
pub fn list_page<T, F>(plural: &str, view: &ListView<T>, verbs: F) -> String
where
    T: Listable,
    F: Fn(&T) -> &'static [ActionVerb],
{
    if view.is_empty() {
        let mut out = empty_state(plural, view.filtered);
        out.push('\n');
        out.push_str(&page_footer(view));
        out.push('\n');
        return out;
    }

    let rows: Vec<Vec<String>> = view
        .rows
        .iter()
        .map(|item| {
            let actions = verbs(item)
                .iter()
                .map(|verb| verb.as_str())
                .collect::<Vec<_>>()
                .join(",");
            vec![
                item.id().to_string(),
                clip(&item.title(), TITLE_WIDTH),
                item.status().key().to_string(),
                item.category().unwrap_or("-").to_string(),
                item.created_at().date().to_string(),
                if actions.is_empty() { "-".into() } else { actions },
            ]
        })
        .collect();

    let mut out = render_table(
        &["ID", "TITLE", "STATUS", "CATEGORY", "CREATED", "ACTIONS"],
        &rows,
    );
    out.push_str(&page_footer(view));
    out.push('\n');
    out
}

fn field_text(value: &Value) -> String {
    match value {
        Value::Null => "-".into(),
        Value::String(text) => text.clone(),
        Value::Object(map) => match map.get("name").or_else(|| map.get("email")) {
            Some(Value::String(name)) => name.clone(),
            _ => value.to_string(),
        },
        other => other.to_string(),
    }
}

/// Every serialized field of one row followed by the actions it offers.
pub fn details<T: Listable + Serialize>(item: &T, verbs: &[ActionVerb]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} \"{}\"", T::ENTITY, item.title());

    let fields = match serde_json::to_value(item) {
        Ok(Value::Object(map)) => map.into_iter().collect::<Vec<_>>(),
        _ => Vec::new(),
    };
    let width = fields.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    for (key, value) in &fields {
        let _ = writeln!(out, "  {key:<width$}  {}", field_text(value));
    }

    let actions = verbs
        .iter()
        .map(|verb| verb.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let _ = writeln!(
        out,
        "  actions: {}",
        if actions.is_empty() { "-" } else { actions.as_str() }
    );
    out
}

/// Fixed consequence text for a verb.
pub fn consequence(verb: ActionVerb, entity: &str) -> String {
    match verb {
        ActionVerb::Publish => format!("The {entity} becomes visible to every platform member."),
        ActionVerb::Unpublish => {
            format!("The {entity} returns to draft and is hidden from members.")
        }
        ActionVerb::Archive => {
            format!("The {entity} is removed from listings but kept on record.")
        }
        ActionVerb::Delete => {
            format!("This permanently removes the {entity}. It cannot be undone.")
        }
        ActionVerb::Activate => format!("The {entity} becomes active and visible again."),
        ActionVerb::Deactivate => {
            format!("The {entity} is suspended until an administrator reactivates it.")
        }
    }
}

pub fn confirmation<T: Listable>(item: &T, verb: ActionVerb) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {} \"{}\"?", verb.label(), T::ENTITY, item.title());
    let _ = writeln!(out, "  {}", consequence(verb, T::ENTITY));
    if verb.is_destructive() {
        let _ = writeln!(
            out,
            "  Requires a reason of at least {MIN_DELETE_REASON_CHARS} characters and the phrase {DELETE_CONFIRMATION_PHRASE}."
        );
    }
    out
}

pub fn progress(progress: &BulkProgress) -> String {
    format!(
        "Creating accounts: {}/{} ({:.2}%), instructors {}/{}, students {}/{}",
        progress.processed(),
        progress.total(),
        progress.percent(),
        progress.processed_instructors,
        progress.total_instructors,
        progress.processed_students,
        progress.total_students
    )
}

/// State, progress and any server error of a bulk creation job.
pub fn job_status(status: &BulkCreationStatus) -> String {
    let mut out = format!(
        "[{}] {}",
        status.status.as_str(),
        progress(&BulkProgress::from(status))
    );
    if let Some(message) = status.error_message.as_deref().filter(|m| !m.trim().is_empty()) {
        let _ = write!(out, ": {message}");
    }
    out
}

pub fn roster(roster: &Roster) -> String {
    let mut out = format!("Instructors ({})\n", roster.instructors().len());
    if !roster.instructors().is_empty() {
        let rows: Vec<Vec<String>> = roster
            .instructors()
            .iter()
            .enumerate()
            .map(|(index, row)| {
                vec![
                    (index + 1).to_string(),
                    format!("{} {}", row.first_name, row.last_name),
                    row.email.clone(),
                    row.institution.clone().unwrap_or_else(|| "-".into()),
                ]
            })
            .collect();
        out.push_str(&render_table(&["#", "NAME", "EMAIL", "INSTITUTION"], &rows));
    }

    let _ = writeln!(out, "Students ({})", roster.students().len());
    if !roster.students().is_empty() {
        let rows: Vec<Vec<String>> = roster
            .students()
            .iter()
            .enumerate()
            .map(|(index, row)| {
                let instructor = if row.assigned_instructor_email.is_empty() {
                    "(unassigned)".to_string()
                } else {
                    row.assigned_instructor_email.clone()
                };
                vec![
                    (index + 1).to_string(),
                    format!("{} {}", row.first_name, row.last_name),
                    row.email.clone(),
                    instructor,
                ]
            })
            .collect();
        out.push_str(&render_table(&["#", "NAME", "EMAIL", "INSTRUCTOR"], &rows));
    }
    out
}

pub fn toast(toast: &Toast) -> String {
    match toast.kind {
        ToastKind::Success => format!("ok: {}", toast.text),
        ToastKind::Error => format!("error: {}", toast.text),
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use collabdesk_api_types::{BlogRecord, BlogStatus, InstructorRow, ParsedRoster, StudentRow};
    use time::macros::datetime;
    use uuid::Uuid;

    use super::*;
    use crate::application::listing::{ListAction, ListState};

    fn blog(title: &str, status: BlogStatus) -> BlogRecord {
        BlogRecord {
            id: Uuid::nil(),
            title: title.into(),
            excerpt: None,
            category: Some("fieldwork".into()),
            status,
            author: None,
            created_at: datetime!(2025-03-14 09:30 UTC),
        }
    }

    fn state() -> ListState<BlogStatus> {
        ListState::new(NonZeroUsize::new(10).expect("page size"))
    }

    #[test]
    fn list_page_renders_rows_and_footer() {
        let items = vec![blog("Sampling the Nile delta", BlogStatus::Draft)];
        let view = state().view(&items);

        let text = list_page("blogs", &view, |_| &[ActionVerb::Publish, ActionVerb::Delete]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            format!(
                "{:<36}  {:<23}  {:<6}  {:<9}  {:<10}  ACTIONS",
                "ID", "TITLE", "STATUS", "CATEGORY", "CREATED"
            )
        );
        assert_eq!(
            lines[1],
            "00000000-0000-0000-0000-000000000000  Sampling the Nile delta  draft   fieldwork  2025-03-14  publish,delete"
        );
        assert_eq!(lines[2], "Page 1 of 1 (rows 1-1 of 1)");
    }

    #[test]
    fn empty_state_depends_on_filters() {
        let items = vec![blog("Sampling the Nile delta", BlogStatus::Draft)];
        let mut list = state();
        list.reduce(ListAction::SetSearch("glacier".into()));

        let text = list_page("blogs", &list.view(&items), |_| &[]);
        assert_eq!(text, "No blogs match the current filters.\nPage 1 of 1\n");

        let text = list_page("blogs", &state().view::<BlogRecord>(&[]), |_| &[]);
        assert_eq!(text, "No blogs yet.\nPage 1 of 1\n");
    }

    #[test]
    fn details_lists_fields_and_actions() {
        let text = details(
            &blog("Sampling the Nile delta", BlogStatus::Draft),
            &[ActionVerb::Publish, ActionVerb::Delete],
        );
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "blog \"Sampling the Nile delta\"");
        assert!(lines.iter().any(|line| line.trim_start().starts_with("category")
            && line.ends_with("fieldwork")));
        assert!(lines.iter().any(|line| line.trim_start().starts_with("excerpt")
            && line.ends_with('-')));
        assert_eq!(lines.last().copied(), Some("  actions: publish, delete"));
    }

    #[test]
    fn long_titles_are_clipped() {
        assert_eq!(clip("short", 10), "short");
        assert_eq!(clip("a much longer title", 10), "a much ...");
    }

    #[test]
    fn delete_confirmation_lists_requirements() {
        let text = confirmation(&blog("Old draft", BlogStatus::Draft), ActionVerb::Delete);
        assert!(text.starts_with("Delete blog \"Old draft\"?"));
        assert!(text.contains("cannot be undone"));
        assert!(text.contains("at least 20 characters and the phrase PERMANENTLY DELETE"));

        let archive = confirmation(&blog("Old draft", BlogStatus::Published), ActionVerb::Archive);
        assert!(!archive.contains("PERMANENTLY DELETE"));
    }

    #[test]
    fn progress_shows_two_decimals() {
        let view = progress(&BulkProgress {
            processed_instructors: 2,
            total_instructors: 5,
            processed_students: 5,
            total_students: 16,
        });
        assert_eq!(
            view,
            "Creating accounts: 7/21 (33.33%), instructors 2/5, students 5/16"
        );
    }

    #[test]
    fn failed_job_status_carries_server_message() {
        let status = BulkCreationStatus {
            status: collabdesk_api_types::BulkCreationState::Failed,
            total_instructors: 1,
            processed_instructors: 1,
            total_students: 3,
            processed_students: 0,
            error_message: Some("SMTP relay unavailable".into()),
        };
        assert_eq!(
            job_status(&status),
            "[Failed] Creating accounts: 1/4 (25.00%), instructors 1/1, students 0/3: SMTP relay unavailable"
        );
    }

    #[test]
    fn roster_marks_unassigned_students() {
        let parsed = Roster::from(ParsedRoster {
            instructors: vec![InstructorRow {
                first_name: "Grace".into(),
                last_name: "Hopper".into(),
                email: "grace@uni.edu".into(),
                institution: None,
            }],
            students: vec![StudentRow {
                first_name: "Alan".into(),
                last_name: "Turing".into(),
                email: "alan@uni.edu".into(),
                assigned_instructor_email: String::new(),
            }],
        });

        let text = roster(&parsed);
        assert!(text.starts_with("Instructors (1)\n"));
        assert!(text.contains("Students (1)\n"));
        assert!(text.contains("(unassigned)"));
    }
}
