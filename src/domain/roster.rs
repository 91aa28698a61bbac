//! Roster of instructors and students assembled during a bulk import.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use collabdesk_api_types::{InstructorRow, StudentRow};

use collabdesk_api_types::{BulkUsersRequest, ParsedRoster};

/// Which of the two roster lists an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RosterList {
    Instructors,
    Students,
}

impl RosterList {
    fn noun(self) -> &'static str {
        match self {
            RosterList::Instructors => "instructor",
            RosterList::Students => "student",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("add at least one instructor or student before submitting")]
    Empty,
    #[error("{} #{} is missing {field}", .list.noun(), .row + 1)]
    MissingField {
        list: RosterList,
        row: usize,
        field: &'static str,
    },
    #[error("{} #{} has an invalid email `{email}`", .list.noun(), .row + 1)]
    InvalidEmail {
        list: RosterList,
        row: usize,
        email: String,
    },
    #[error("duplicate {} email `{email}`", .list.noun())]
    DuplicateEmail { list: RosterList, email: String },
    #[error("student `{student}` is assigned to `{instructor}`, which is not an instructor in this import")]
    UnknownInstructor { student: String, instructor: String },
    #[error("{} #{} does not exist", .list.noun(), .row + 1)]
    NoSuchRow { list: RosterList, row: usize },
}

/// Result of removing an instructor from the roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedInstructor {
    pub instructor: InstructorRow,
    /// Students whose assignment was cleared because it pointed at the removed instructor.
    pub unassigned_students: usize,
}

/// Editable in-memory roster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    instructors: Vec<InstructorRow>,
    students: Vec<StudentRow>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn instructors(&self) -> &[InstructorRow] {
        &self.instructors
    }

    pub fn students(&self) -> &[StudentRow] {
        &self.students
    }

    pub fn is_empty(&self) -> bool {
        self.instructors.is_empty() && self.students.is_empty()
    }

    pub fn add_instructor(&mut self, instructor: InstructorRow) {
        self.instructors.push(instructor);
    }

    pub fn add_student(&mut self, student: StudentRow) {
        self.students.push(student);
    }

    pub fn update_instructor(
        &mut self,
        row: usize,
        instructor: InstructorRow,
    ) -> Result<(), RosterError> {
        let slot = self
            .instructors
            .get_mut(row)
            .ok_or(RosterError::NoSuchRow {
                list: RosterList::Instructors,
                row,
            })?;
        *slot = instructor;
        Ok(())
    }

    pub fn update_student(&mut self, row: usize, student: StudentRow) -> Result<(), RosterError> {
        let slot = self.students.get_mut(row).ok_or(RosterError::NoSuchRow {
            list: RosterList::Students,
            row,
        })?;
        *slot = student;
        Ok(())
    }

    /// Number of students that removing the instructor at `row` would unassign.
    ///
    /// Zero when another row carries the same address, since those
    /// assignments survive the removal.
    pub fn dependents_of(&self, row: usize) -> usize {
        let Some(instructor) = self.instructors.get(row) else {
            return 0;
        };
        if self.shares_email_with_other(row) {
            return 0;
        }
        self.students
            .iter()
            .filter(|student| same_email(&student.assigned_instructor_email, &instructor.email))
            .count()
    }

    fn shares_email_with_other(&self, row: usize) -> bool {
        let Some(instructor) = self.instructors.get(row) else {
            return false;
        };
        self.instructors
            .iter()
            .enumerate()
            .any(|(index, other)| index != row && same_email(&other.email, &instructor.email))
    }

    /// Remove an instructor and clear every assignment that referenced them.
    pub fn remove_instructor(&mut self, row: usize) -> Result<RemovedInstructor, RosterError> {
        if row >= self.instructors.len() {
            return Err(RosterError::NoSuchRow {
                list: RosterList::Instructors,
                row,
            });
        }
        // Another row may still carry the same address; keep those assignments.
        let still_listed = self.shares_email_with_other(row);
        let instructor = self.instructors.remove(row);

        let mut unassigned_students = 0;
        if !still_listed {
            for student in &mut self.students {
                if same_email(&student.assigned_instructor_email, &instructor.email) {
                    student.assigned_instructor_email.clear();
                    unassigned_students += 1;
                }
            }
        }

        Ok(RemovedInstructor {
            instructor,
            unassigned_students,
        })
    }

    pub fn remove_student(&mut self, row: usize) -> Result<StudentRow, RosterError> {
        if row >= self.students.len() {
            return Err(RosterError::NoSuchRow {
                list: RosterList::Students,
                row,
            });
        }
        Ok(self.students.remove(row))
    }

    /// Check required fields, email uniqueness and instructor references.
    pub fn validate(&self) -> Result<(), RosterError> {
        if self.is_empty() {
            return Err(RosterError::Empty);
        }

        let mut instructor_emails = HashSet::new();
        for (row, instructor) in self.instructors.iter().enumerate() {
            check_person(
                RosterList::Instructors,
                row,
                &instructor.first_name,
                &instructor.last_name,
                &instructor.email,
            )?;
            if !instructor_emails.insert(normalize_email(&instructor.email)) {
                return Err(RosterError::DuplicateEmail {
                    list: RosterList::Instructors,
                    email: instructor.email.trim().to_string(),
                });
            }
        }

        let mut student_emails = HashSet::new();
        for (row, student) in self.students.iter().enumerate() {
            check_person(
                RosterList::Students,
                row,
                &student.first_name,
                &student.last_name,
                &student.email,
            )?;
            if !student_emails.insert(normalize_email(&student.email)) {
                return Err(RosterError::DuplicateEmail {
                    list: RosterList::Students,
                    email: student.email.trim().to_string(),
                });
            }
            if student.assigned_instructor_email.trim().is_empty() {
                return Err(RosterError::MissingField {
                    list: RosterList::Students,
                    row,
                    field: "assigned instructor",
                });
            }
            if !instructor_emails.contains(&normalize_email(&student.assigned_instructor_email)) {
                return Err(RosterError::UnknownInstructor {
                    student: student.email.trim().to_string(),
                    instructor: student.assigned_instructor_email.trim().to_string(),
                });
            }
        }

        Ok(())
    }

    /// Validated request body for the bulk creation endpoint.
    pub fn to_request(&self) -> Result<BulkUsersRequest, RosterError> {
        self.validate()?;
        Ok(BulkUsersRequest {
            instructors: self.instructors.clone(),
            students: self.students.clone(),
        })
    }
}

impl From<ParsedRoster> for Roster {
    fn from(parsed: ParsedRoster) -> Self {
        Self {
            instructors: parsed.instructors,
            students: parsed.students,
        }
    }
}

fn check_person(
    list: RosterList,
    row: usize,
    first_name: &str,
    last_name: &str,
    email: &str,
) -> Result<(), RosterError> {
    for (field, value) in [("first name", first_name), ("last name", last_name), ("email", email)] {
        if value.trim().is_empty() {
            return Err(RosterError::MissingField { list, row, field });
        }
    }
    if !looks_like_email(email) {
        return Err(RosterError::InvalidEmail {
            list,
            row,
            email: email.trim().to_string(),
        });
    }
    Ok(())
}

fn looks_like_email(value: &str) -> bool {
    let value = value.trim();
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.contains(char::is_whitespace)
        }
        None => false,
    }
}

fn normalize_email(value: &str) -> String {
    value.trim().to_lowercase()
}

fn same_email(left: &str, right: &str) -> bool {
    !left.trim().is_empty() && normalize_email(left) == normalize_email(right)
}
