use crate::{
    data::student::{NewStudent, StudentChanges, StudentRecord},
    error::{DuplicateStudentIdSnafu, StudentsResult},
    store::StudentStore,
};
use async_trait::async_trait;
use std::{cmp::Reverse, collections::BTreeMap};
use time::OffsetDateTime;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct Table {
    last_id: i64,
    rows: BTreeMap<i64, StudentRecord>,
}

impl Table {
    fn holder_of(&self, student_id: &str) -> Option<i64> {
        self.rows
            .values()
            .find(|row| row.student_id == student_id)
            .map(|row| row.id)
    }
}

/// Keeps every record behind one lock, which is what makes the student ID
/// check atomic with the write.
#[derive(Debug, Default)]
pub struct MemoryStudentStore {
    table: Mutex<Table>,
}

#[async_trait]
impl StudentStore for MemoryStudentStore {
    async fn get_all_newest_first(&self) -> StudentsResult<Vec<StudentRecord>> {
        let mut all: Vec<_> = self.table.lock().await.rows.values().cloned().collect();
        all.sort_by_key(|row| Reverse((row.created_at, row.id)));
        Ok(all)
    }

    async fn get_by_id(&self, id: i64) -> StudentsResult<Option<StudentRecord>> {
        Ok(self.table.lock().await.rows.get(&id).cloned())
    }

    async fn student_id_taken(
        &self,
        student_id: &str,
        excluding: Option<i64>,
    ) -> StudentsResult<bool> {
        Ok(self
            .table
            .lock()
            .await
            .holder_of(student_id)
            .is_some_and(|holder| Some(holder) != excluding))
    }

    async fn insert(&self, to_be_added: NewStudent) -> StudentsResult<StudentRecord> {
        let NewStudent {
            student_id,
            first_name,
            last_name,
            middle_name,
        } = to_be_added;

        let mut table = self.table.lock().await;
        snafu::ensure!(
            table.holder_of(&student_id).is_none(),
            DuplicateStudentIdSnafu { student_id }
        );

        table.last_id += 1;
        let now = OffsetDateTime::now_utc();
        let record = StudentRecord {
            id: table.last_id,
            student_id,
            first_name,
            last_name,
            middle_name,
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(record.id, record.clone());

        Ok(record)
    }

    async fn update(
        &self,
        id: i64,
        changes: StudentChanges,
    ) -> StudentsResult<Option<StudentRecord>> {
        let mut table = self.table.lock().await;

        if let Some(student_id) = &changes.student_id {
            snafu::ensure!(
                table.holder_of(student_id).is_none_or(|holder| holder == id),
                DuplicateStudentIdSnafu { student_id }
            );
        }

        let Some(row) = table.rows.get_mut(&id) else {
            return Ok(None);
        };
        changes.apply_to(row);
        row.updated_at = OffsetDateTime::now_utc();

        Ok(Some(row.clone()))
    }

    async fn remove(&self, id: i64) -> StudentsResult<bool> {
        Ok(self.table.lock().await.rows.remove(&id).is_some())
    }
}
