//! State behind the student form and table.
//!
//! A [`FormController`] owns the form's field values, the last list it was
//! given, which record (if any) is being edited, and the feedback shown to
//! the user. Every action makes at most one call to the [`StudentsApi`].

use crate::{
    client::api::StudentsApi,
    data::{
        input::{Field, FieldInput, StudentInput},
        student::StudentRecord,
    },
};
use maud::Render;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormFields {
    #[serde(default)]
    pub student_id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub middle_name: String,
}

impl FormFields {
    pub fn from_record(record: &StudentRecord) -> Self {
        Self {
            student_id: record.student_id.clone(),
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            middle_name: record.middle_name.clone().unwrap_or_default(),
        }
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::StudentId => &self.student_id,
            Field::FirstName => &self.first_name,
            Field::LastName => &self.last_name,
            Field::MiddleName => &self.middle_name,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::StudentId => self.student_id = value,
            Field::FirstName => self.first_name = value,
            Field::LastName => self.last_name = value,
            Field::MiddleName => self.middle_name = value,
        }
    }

    ///all four fields are always sent, with an empty middle name sent as `null`
    pub fn to_input(&self) -> StudentInput {
        StudentInput {
            student_id: FieldInput::text(&self.student_id),
            first_name: FieldInput::text(&self.first_name),
            last_name: FieldInput::text(&self.last_name),
            middle_name: if self.middle_name.is_empty() {
                FieldInput::Null
            } else {
                FieldInput::text(&self.middle_name)
            },
        }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum EditTarget {
    #[default]
    Idle,
    Editing(i64),
}

impl EditTarget {
    pub const fn from_id(id: Option<i64>) -> Self {
        match id {
            Some(id) => Self::Editing(id),
            None => Self::Idle,
        }
    }

    pub const fn id(self) -> Option<i64> {
        match self {
            Self::Idle => None,
            Self::Editing(id) => Some(id),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Status {
    Created,
    Updated,
    CreateFailed,
    UpdateFailed,
}

impl Status {
    pub const fn message(self) -> &'static str {
        match self {
            Self::Created => "Student created",
            Self::Updated => "Student updated",
            Self::CreateFailed => "Error creating student",
            Self::UpdateFailed => "Error updating student",
        }
    }

    pub const fn is_failure(self) -> bool {
        matches!(self, Self::CreateFailed | Self::UpdateFailed)
    }
}

impl Render for Status {
    fn render_to(&self, buffer: &mut String) {
        buffer.push_str(self.message());
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created(StudentRecord),
    Updated(StudentRecord),
    ///field errors are now set, and the form is left as it was
    Rejected,
    Failed,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted(i64),
    Failed,
    NothingToConfirm,
}

#[derive(Debug)]
pub struct FormController<A> {
    api: A,
    form: FormFields,
    records: Vec<StudentRecord>,
    editing: EditTarget,
    field_errors: BTreeMap<Field, String>,
    status: Option<Status>,
    pending_delete: Option<i64>,
}

impl<A: StudentsApi> FormController<A> {
    pub fn new(api: A) -> Self {
        Self::resume(api, FormFields::default(), EditTarget::Idle)
    }

    /// Picks up a form that was already being filled in, without any
    /// knowledge of the list.
    pub fn resume(api: A, form: FormFields, editing: EditTarget) -> Self {
        Self {
            api,
            form,
            records: vec![],
            editing,
            field_errors: BTreeMap::new(),
            status: None,
            pending_delete: None,
        }
    }

    pub const fn form(&self) -> &FormFields {
        &self.form
    }

    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        self.form.set(field, value);
    }

    pub fn records(&self) -> &[StudentRecord] {
        &self.records
    }

    pub const fn editing(&self) -> EditTarget {
        self.editing
    }

    pub const fn field_errors(&self) -> &BTreeMap<Field, String> {
        &self.field_errors
    }

    pub fn field_error(&self, field: Field) -> Option<&str> {
        self.field_errors.get(&field).map(String::as_str)
    }

    pub const fn status(&self) -> Option<Status> {
        self.status
    }

    pub const fn pending_delete(&self) -> Option<i64> {
        self.pending_delete
    }

    pub async fn activate(&mut self) {
        self.records = match self.api.list().await {
            Ok(records) => records,
            Err(e) => {
                error!(?e, "Failed to fetch students");
                vec![]
            }
        };
    }

    pub async fn submit(&mut self) -> SubmitOutcome {
        self.field_errors.clear();
        self.status = None;

        let input = self.form.to_input();
        let (result, failed) = match self.editing {
            EditTarget::Idle => (self.api.create(input).await, Status::CreateFailed),
            EditTarget::Editing(id) => (self.api.update(id, input).await, Status::UpdateFailed),
        };

        let record = match result {
            Ok(record) => record,
            Err(e) => {
                if let Some(errors) = e.field_errors() {
                    self.field_errors = errors
                        .iter()
                        .map(|(field, messages)| (field, messages.join(" ")))
                        .collect();
                    return SubmitOutcome::Rejected;
                }

                warn!(?e, "Student was not saved");
                self.status = Some(failed);
                return SubmitOutcome::Failed;
            }
        };

        self.form = FormFields::default();
        match self.editing {
            EditTarget::Idle => {
                self.records.insert(0, record.clone());
                self.status = Some(Status::Created);
                SubmitOutcome::Created(record)
            }
            EditTarget::Editing(_) => {
                if let Some(existing) = self.records.iter_mut().find(|r| r.id == record.id) {
                    *existing = record.clone();
                }
                self.editing = EditTarget::Idle;
                self.status = Some(Status::Updated);
                SubmitOutcome::Updated(record)
            }
        }
    }

    pub fn edit(&mut self, record: &StudentRecord) {
        self.begin_edit(record.id, FormFields::from_record(record));
    }

    ///for when only the displayed values of a record are at hand
    pub fn begin_edit(&mut self, id: i64, fields: FormFields) {
        self.editing = EditTarget::Editing(id);
        self.form = fields;
        self.field_errors.clear();
        self.status = None;
    }

    pub fn cancel(&mut self) {
        self.editing = EditTarget::Idle;
        self.form = FormFields::default();
        self.field_errors.clear();
        self.status = None;
    }

    /// Nothing is deleted until [`FormController::confirm_delete`] is called.
    pub fn request_delete(&mut self, id: i64) {
        self.pending_delete = Some(id);
    }

    pub fn dismiss_delete(&mut self) {
        self.pending_delete = None;
    }

    pub async fn confirm_delete(&mut self) -> DeleteOutcome {
        let Some(id) = self.pending_delete.take() else {
            return DeleteOutcome::NothingToConfirm;
        };

        match self.api.delete(id).await {
            Ok(()) => {
                self.records.retain(|record| record.id != id);
                DeleteOutcome::Deleted(id)
            }
            Err(e) => {
                error!(?e, id, "Failed to delete student");
                DeleteOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::{StudentsResult, UnexpectedStatusSnafu},
        service::RecordService,
        store::memory::MemoryStudentStore,
    };
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::sync::Arc;

    fn controller() -> FormController<RecordService> {
        FormController::new(RecordService::new(Arc::new(MemoryStudentStore::default())))
    }

    fn fill(controller: &mut FormController<impl StudentsApi>, student_id: &str, first: &str, last: &str) {
        controller.set_field(Field::StudentId, student_id);
        controller.set_field(Field::FirstName, first);
        controller.set_field(Field::LastName, last);
    }

    struct BrokenApi;

    impl BrokenApi {
        fn fail<T>() -> StudentsResult<T> {
            UnexpectedStatusSnafu {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "Error",
            }
            .fail()
        }
    }

    #[async_trait]
    impl StudentsApi for BrokenApi {
        async fn list(&self) -> StudentsResult<Vec<StudentRecord>> {
            Self::fail()
        }

        async fn create(&self, _: StudentInput) -> StudentsResult<StudentRecord> {
            Self::fail()
        }

        async fn update(&self, _: i64, _: StudentInput) -> StudentsResult<StudentRecord> {
            Self::fail()
        }

        async fn delete(&self, _: i64) -> StudentsResult<()> {
            Self::fail()
        }
    }

    #[tokio::test]
    async fn created_records_are_prepended_and_the_form_cleared() {
        let mut controller = controller();
        fill(&mut controller, "2021-0001", "Ana", "Cruz");
        controller.submit().await;
        fill(&mut controller, "2021-0002", "Ben", "Lim");

        let SubmitOutcome::Created(ben) = controller.submit().await else {
            panic!("expected Ben to be created");
        };

        assert_eq!(controller.records()[0], ben);
        assert_eq!(controller.records().len(), 2);
        assert_eq!(controller.form(), &FormFields::default());
        assert_eq!(controller.status(), Some(Status::Created));
        assert!(controller.field_errors().is_empty());
    }

    #[tokio::test]
    async fn validation_errors_keep_the_form() {
        let mut controller = controller();
        fill(&mut controller, "", "", "Cruz");

        assert_eq!(controller.submit().await, SubmitOutcome::Rejected);
        assert_eq!(
            controller.field_error(Field::StudentId),
            Some("The student id field is required.")
        );
        assert!(controller.field_error(Field::FirstName).is_some());
        assert_eq!(controller.form().last_name, "Cruz");
        assert_eq!(controller.status(), None);
        assert!(controller.records().is_empty());

        //errors are cleared by the next submit
        fill(&mut controller, "2021-0001", "Ana", "Cruz");
        assert!(matches!(controller.submit().await, SubmitOutcome::Created(_)));
        assert!(controller.field_errors().is_empty());
    }

    #[tokio::test]
    async fn editing_replaces_the_record_in_place() {
        let mut controller = controller();
        fill(&mut controller, "2021-0001", "Ana", "Cruz");
        controller.submit().await;
        fill(&mut controller, "2021-0002", "Ben", "Lim");
        controller.submit().await;

        let ana = controller.records()[1].clone();
        controller.edit(&ana);
        assert_eq!(controller.editing(), EditTarget::Editing(ana.id));
        assert_eq!(controller.form().first_name, "Ana");

        controller.set_field(Field::MiddleName, "Reyes");
        let SubmitOutcome::Updated(updated) = controller.submit().await else {
            panic!("expected Ana to be updated");
        };

        assert_eq!(updated.id, ana.id);
        assert_eq!(controller.records()[1], updated);
        assert_eq!(controller.records()[1].middle_name.as_deref(), Some("Reyes"));
        assert_eq!(controller.editing(), EditTarget::Idle);
        assert_eq!(controller.status(), Some(Status::Updated));
    }

    #[tokio::test]
    async fn rejected_update_stays_in_editing() {
        let mut controller = controller();
        fill(&mut controller, "2021-0001", "Ana", "Cruz");
        controller.submit().await;

        let ana = controller.records()[0].clone();
        controller.edit(&ana);
        controller.set_field(Field::FirstName, "");

        assert_eq!(controller.submit().await, SubmitOutcome::Rejected);
        assert_eq!(controller.editing(), EditTarget::Editing(ana.id));
        assert!(controller.field_error(Field::FirstName).is_some());

        controller.cancel();
        assert_eq!(controller.editing(), EditTarget::Idle);
        assert_eq!(controller.form(), &FormFields::default());
        assert!(controller.field_errors().is_empty());
    }

    #[tokio::test]
    async fn deleting_needs_confirmation() {
        let mut controller = controller();
        fill(&mut controller, "2021-0001", "Ana", "Cruz");
        controller.submit().await;
        let id = controller.records()[0].id;

        assert_eq!(controller.confirm_delete().await, DeleteOutcome::NothingToConfirm);

        controller.request_delete(id);
        controller.dismiss_delete();
        assert_eq!(controller.confirm_delete().await, DeleteOutcome::NothingToConfirm);
        assert_eq!(controller.records().len(), 1);

        controller.request_delete(id);
        assert_eq!(controller.confirm_delete().await, DeleteOutcome::Deleted(id));
        assert!(controller.records().is_empty());

        //a second delete of the same record is a failure, and nothing else changes
        let status_before = controller.status();
        assert_eq!(status_before, Some(Status::Created));
        controller.request_delete(id);
        assert_eq!(controller.confirm_delete().await, DeleteOutcome::Failed);
        assert_eq!(controller.status(), status_before);
        assert!(controller.field_errors().is_empty());
        assert!(controller.records().is_empty());
    }

    #[tokio::test]
    async fn other_failures_collapse_to_a_generic_status() {
        let mut controller = FormController::new(BrokenApi);
        controller.activate().await;
        assert!(controller.records().is_empty());

        fill(&mut controller, "2021-0001", "Ana", "Cruz");
        assert_eq!(controller.submit().await, SubmitOutcome::Failed);
        assert_eq!(controller.status(), Some(Status::CreateFailed));
        assert!(controller.field_errors().is_empty());
        assert_eq!(controller.form().student_id, "2021-0001");

        controller.begin_edit(3, controller.form().clone());
        assert_eq!(controller.submit().await, SubmitOutcome::Failed);
        assert_eq!(controller.status(), Some(Status::UpdateFailed));
        assert_eq!(controller.editing(), EditTarget::Editing(3));
    }

    #[tokio::test]
    async fn activation_loads_the_list() {
        let service = RecordService::new(Arc::new(MemoryStudentStore::default()));
        let mut seeding = FormController::new(service.clone());
        fill(&mut seeding, "2021-0001", "Ana", "Cruz");
        seeding.submit().await;

        let mut controller = FormController::new(service);
        assert!(controller.records().is_empty());
        controller.activate().await;
        assert_eq!(controller.records().len(), 1);
    }
}
