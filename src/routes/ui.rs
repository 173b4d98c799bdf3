//! htmx fragments for the student page.
//!
//! The form carries its own state (field values plus the record being
//! edited) with every request, so each handler rebuilds a [`FormController`],
//! performs one action and sends back the re-rendered form. Changes to the
//! table are sent out-of-band: new rows are prepended, edited rows are
//! swapped by id, and deleted rows are swapped for nothing, bringing back the
//! empty-table placeholder once the last one is gone.

use crate::{
    client::{
        api::StudentsApi,
        controller::{DeleteOutcome, EditTarget, FormController, FormFields, SubmitOutcome},
    },
    data::{input::Field, student::StudentRecord},
    maud_conveniences::{alert, simple_form_element, table, table_cell, title},
    routes::students::read_id,
    state::StudentsState,
};
use axum::{
    Form,
    extract::{Path, State, rejection::PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use serde::{Deserialize, Serialize};

pub const FORM_ID: &str = "student_form";
pub const ROWS_ID: &str = "student_rows";
const EMPTY_ROW_ID: &str = "no_students";

fn row_id(id: i64) -> String {
    format!("student-{id}")
}

const fn label(field: Field) -> &'static str {
    match field {
        Field::StudentId => "Student ID",
        Field::FirstName => "First Name",
        Field::LastName => "Last Name",
        Field::MiddleName => "Middle Name (optional)",
    }
}

const fn placeholder(field: Field) -> &'static str {
    match field {
        Field::StudentId => "e.g. 2021-0001",
        Field::FirstName => "First name",
        Field::LastName => "Last name",
        Field::MiddleName => "Middle name",
    }
}

pub fn render_form<A: StudentsApi>(controller: &FormController<A>) -> Markup {
    let editing = controller.editing().id();

    html! {
        div id=(FORM_ID) class="w-full" {
            @if let Some(status) = controller.status() {
                (alert(status, status.is_failure()))
            }
            form hx-post="/ui/submit" hx-target={"#" (FORM_ID)} hx-swap="outerHTML" class="p-4" {
                @if let Some(id) = editing {
                    input type="hidden" name="editing" value=(id);
                }
                div class="grid grid-cols-1 md:grid-cols-2 gap-x-4" {
                    @for field in Field::ALL {
                        (simple_form_element(
                            field.wire_name(),
                            label(field),
                            controller.form().get(field),
                            Some(placeholder(field)),
                            controller.field_error(field),
                        ))
                    }
                }
                div class="flex items-center space-x-4" {
                    button type="submit" class="bg-blue-500 hover:bg-blue-700 font-bold py-2 px-4 rounded focus:outline-none focus:shadow-outline" {
                        @if editing.is_some() { "Update" } @else { "Save" }
                    }
                    @if editing.is_some() {
                        button type="button" hx-post="/ui/cancel" hx-target={"#" (FORM_ID)} hx-swap="outerHTML" class="bg-gray-700 hover:bg-gray-600 text-gray-300 font-bold py-2 px-4 rounded focus:outline-none focus:shadow-outline" {
                            "Cancel"
                        }
                    }
                }
            }
        }
    }
}

/// The values an Edit button sends back, which are exactly what is on screen.
#[derive(Serialize, Deserialize)]
pub struct EditForm {
    id: i64,
    #[serde(default)]
    student_id: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    middle_name: String,
}

impl EditForm {
    fn from_record(record: &StudentRecord) -> Self {
        let FormFields {
            student_id,
            first_name,
            last_name,
            middle_name,
        } = FormFields::from_record(record);

        Self {
            id: record.id,
            student_id,
            first_name,
            last_name,
            middle_name,
        }
    }

    fn into_parts(self) -> (i64, FormFields) {
        let Self {
            id,
            student_id,
            first_name,
            last_name,
            middle_name,
        } = self;

        (
            id,
            FormFields {
                student_id,
                first_name,
                last_name,
                middle_name,
            },
        )
    }
}

pub fn render_row(record: &StudentRecord, swap_oob: bool) -> Markup {
    let edit_vals = serde_json::to_string(&EditForm::from_record(record)).unwrap_or_default();

    html! {
        tr id=(row_id(record.id)) hx-swap-oob=[swap_oob.then_some("true")] {
            (table_cell(&record.student_id))
            (table_cell(&record.first_name))
            (table_cell(&record.last_name))
            (table_cell(record.middle_name.as_deref().unwrap_or_default()))
            (table_cell(html! {
                div class="flex flex-row space-x-2" {
                    button class="bg-slate-600 hover:bg-slate-800 font-bold py-1 px-3 rounded" hx-post="/ui/edit" hx-vals=(edit_vals) hx-target={"#" (FORM_ID)} hx-swap="outerHTML" {
                        "Edit"
                    }
                    button class="bg-red-600 hover:bg-red-800 font-bold py-1 px-3 rounded" hx-delete={"/ui/students/" (record.id)} hx-confirm={"Delete " (record) "?"} hx-target="closest tr" hx-swap="outerHTML" {
                        "Delete"
                    }
                }
            }))
        }
    }
}

fn render_empty_row() -> Markup {
    html! {
        tr id=(EMPTY_ROW_ID) {
            td colspan="5" class="py-3 px-4 text-center italic text-gray-400" {"No students yet."}
        }
    }
}

pub fn render_student_table(records: &[StudentRecord]) -> Markup {
    let rows = html! {
        @for record in records {
            (render_row(record, false))
        }
        @if records.is_empty() {
            (render_empty_row())
        }
    };

    table(
        title("Students"),
        ["Student ID", "First", "Last", "Middle", "Actions"],
        ROWS_ID,
        rows,
    )
}

#[derive(Deserialize)]
pub struct SubmitForm {
    #[serde(default)]
    editing: Option<i64>,
    #[serde(default)]
    student_id: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    middle_name: String,
}

impl SubmitForm {
    fn into_parts(self) -> (FormFields, EditTarget) {
        let Self {
            editing,
            student_id,
            first_name,
            last_name,
            middle_name,
        } = self;

        (
            FormFields {
                student_id,
                first_name,
                last_name,
                middle_name,
            },
            EditTarget::from_id(editing),
        )
    }
}

pub async fn internal_post_submit(
    State(state): State<StudentsState>,
    Form(form): Form<SubmitForm>,
) -> Markup {
    let (fields, editing) = form.into_parts();
    let mut controller = FormController::resume(state.service(), fields, editing);

    let table_change = match controller.submit().await {
        SubmitOutcome::Created(record) => html! {
            template {
                tbody hx-swap-oob={"afterbegin:#" (ROWS_ID)} {
                    (render_row(&record, false))
                }
                tr id=(EMPTY_ROW_ID) hx-swap-oob="delete" {}
            }
        },
        SubmitOutcome::Updated(record) => html! {
            template {
                (render_row(&record, true))
            }
        },
        SubmitOutcome::Rejected | SubmitOutcome::Failed => html! {},
    };

    html! {
        (render_form(&controller))
        (table_change)
    }
}

pub async fn internal_post_edit(
    State(state): State<StudentsState>,
    Form(form): Form<EditForm>,
) -> Markup {
    let (id, fields) = form.into_parts();
    let mut controller = FormController::new(state.service());
    controller.begin_edit(id, fields);
    render_form(&controller)
}

pub async fn internal_post_cancel(State(state): State<StudentsState>) -> Markup {
    let mut controller = FormController::new(state.service());
    controller.cancel();
    render_form(&controller)
}

///htmx has already asked the user to confirm by the time this is called
pub async fn internal_delete_student(
    State(state): State<StudentsState>,
    path: Result<Path<i64>, PathRejection>,
) -> Response {
    let id = match read_id(path) {
        Ok(id) => id,
        Err(e) => {
            debug!(?e, "Refusing to delete a student without a readable ID");
            return StatusCode::NO_CONTENT.into_response();
        }
    };

    let mut controller = FormController::new(state.service());
    controller.request_delete(id);

    match controller.confirm_delete().await {
        DeleteOutcome::Deleted(_) => {
            let now_empty = matches!(state.service().list().await, Ok(records) if records.is_empty());

            //the row itself is swapped for nothing
            let placeholder = html! {
                @if now_empty {
                    template {
                        tbody hx-swap-oob={"beforeend:#" (ROWS_ID)} {
                            (render_empty_row())
                        }
                    }
                }
            };
            placeholder.into_response()
        }
        //htmx leaves the row alone on a 204
        DeleteOutcome::Failed | DeleteOutcome::NothingToConfirm => {
            StatusCode::NO_CONTENT.into_response()
        }
    }
}
