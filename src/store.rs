//! Persistence for student records.
//!
//! The record service only ever talks to a [`StudentStore`], so the
//! relational store can be swapped for the in-memory one in tests or local
//! demos.

use crate::{
    data::student::{NewStudent, StudentChanges, StudentRecord},
    error::StudentsResult,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod memory;
pub mod postgres;

#[async_trait]
pub trait StudentStore: Debug + Send + Sync {
    ///most recently created first, ties broken by the newest `id`
    async fn get_all_newest_first(&self) -> StudentsResult<Vec<StudentRecord>>;
    async fn get_by_id(&self, id: i64) -> StudentsResult<Option<StudentRecord>>;
    async fn student_id_taken(&self, student_id: &str, excluding: Option<i64>)
    -> StudentsResult<bool>;

    /// Fails with `DuplicateStudentId` if another row already holds the
    /// student ID. The check and the write are atomic.
    async fn insert(&self, to_be_added: NewStudent) -> StudentsResult<StudentRecord>;

    /// `Ok(None)` if there is no row with that `id`. Same duplicate handling
    /// as [`StudentStore::insert`].
    async fn update(
        &self,
        id: i64,
        changes: StudentChanges,
    ) -> StudentsResult<Option<StudentRecord>>;

    ///returns whether a row was actually removed
    async fn remove(&self, id: i64) -> StudentsResult<bool>;

    async fn close(&self) {}
}
