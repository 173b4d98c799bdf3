//! The record lifecycle: every create, update and delete goes through
//! [`RecordService`], which validates first and only then touches the store.

use crate::{
    data::{
        input::{Field, FieldErrors, FieldInput, Rule, StudentInput},
        student::StudentRecord,
    },
    error::{MissingStudentSnafu, StudentsError, StudentsResult, ValidationSnafu},
    store::StudentStore,
};
use snafu::OptionExt;
use std::sync::Arc;

///`extra` holds failures found outside the per-field checks, like a taken student ID
fn collect_failures<T>(validated: Result<T, FieldErrors>, mut extra: FieldErrors) -> StudentsResult<T> {
    match validated {
        Ok(value) if extra.is_empty() => Ok(value),
        Ok(_) => ValidationSnafu { errors: extra }.fail(),
        Err(errors) => {
            extra.merge(errors);
            ValidationSnafu { errors: extra }.fail()
        }
    }
}

///a write that lost a race on the unique constraint is reported like any other taken student ID
fn duplicate_as_validation(error: StudentsError) -> StudentsError {
    match error {
        StudentsError::DuplicateStudentId { .. } => StudentsError::Validation {
            errors: FieldErrors::single(Field::StudentId, Rule::Unique),
        },
        other => other,
    }
}

#[derive(Clone, Debug)]
pub struct RecordService {
    store: Arc<dyn StudentStore>,
}

impl RecordService {
    pub fn new(store: Arc<dyn StudentStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> StudentsResult<Vec<StudentRecord>> {
        self.store.get_all_newest_first().await
    }

    pub async fn get(&self, id: i64) -> StudentsResult<StudentRecord> {
        self.store
            .get_by_id(id)
            .await?
            .context(MissingStudentSnafu { id })
    }

    pub async fn create(&self, input: StudentInput) -> StudentsResult<StudentRecord> {
        let taken = self.student_id_conflicts(&input.student_id, None).await?;
        let to_be_added = collect_failures(input.validate_new(), taken)?;

        let record = self
            .store
            .insert(to_be_added)
            .await
            .map_err(duplicate_as_validation)?;
        info!(id = record.id, student_id = %record.student_id, "Created student");

        Ok(record)
    }

    pub async fn update(&self, id: i64, input: StudentInput) -> StudentsResult<StudentRecord> {
        snafu::ensure!(
            self.store.get_by_id(id).await?.is_some(),
            MissingStudentSnafu { id }
        );

        let taken = self.student_id_conflicts(&input.student_id, Some(id)).await?;
        let changes = collect_failures(input.validate_changes(), taken)?;

        let record = self
            .store
            .update(id, changes)
            .await
            .map_err(duplicate_as_validation)?
            .context(MissingStudentSnafu { id })?;
        info!(id, "Updated student");

        Ok(record)
    }

    pub async fn delete(&self, id: i64) -> StudentsResult<()> {
        snafu::ensure!(self.store.remove(id).await?, MissingStudentSnafu { id });
        info!(id, "Deleted student");
        Ok(())
    }

    pub async fn close(&self) {
        self.store.close().await;
    }

    async fn student_id_conflicts(
        &self,
        student_id: &FieldInput,
        excluding: Option<i64>,
    ) -> StudentsResult<FieldErrors> {
        let Some(student_id) = student_id.valid_text() else {
            return Ok(FieldErrors::default());
        };

        Ok(if self.store.student_id_taken(&student_id, excluding).await? {
            FieldErrors::single(Field::StudentId, Rule::Unique)
        } else {
            FieldErrors::default()
        })
    }
}
