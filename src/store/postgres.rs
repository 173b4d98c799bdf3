use crate::{
    config::DbConfig,
    data::student::{NewStudent, StudentChanges, StudentRecord},
    error::{MakeQuerySnafu, MigrateSnafu, OpenDatabaseSnafu, StudentsError, StudentsResult},
    store::StudentStore,
};
use async_trait::async_trait;
use snafu::ResultExt;
use sqlx::{Pool, Postgres, postgres::PgPoolOptions};

const RECORD_COLUMNS: &str =
    "id, student_id, first_name, last_name, middle_name, created_at, updated_at";

/// The unique constraint on `student_id` is what keeps two concurrent
/// writers from both claiming the same student ID.
fn unique_or_query_error(source: sqlx::Error, student_id: &str) -> StudentsError {
    match source {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            StudentsError::DuplicateStudentId {
                student_id: student_id.to_string(),
            }
        }
        source => StudentsError::MakeQuery { source },
    }
}

#[derive(Clone, Debug)]
pub struct PgStudentStore {
    pool: Pool<Postgres>,
}

impl PgStudentStore {
    pub async fn connect(options: PgPoolOptions, config: &DbConfig) -> StudentsResult<Self> {
        let pool = options
            .connect_with(config.connect_options())
            .await
            .context(OpenDatabaseSnafu)?;

        sqlx::migrate!().run(&pool).await.context(MigrateSnafu)?;

        Ok(Self::from_pool(pool))
    }

    pub const fn from_pool(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StudentStore for PgStudentStore {
    async fn get_all_newest_first(&self) -> StudentsResult<Vec<StudentRecord>> {
        sqlx::query_as::<_, StudentRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM public.student_details ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .context(MakeQuerySnafu)
    }

    async fn get_by_id(&self, id: i64) -> StudentsResult<Option<StudentRecord>> {
        sqlx::query_as::<_, StudentRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM public.student_details WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context(MakeQuerySnafu)
    }

    async fn student_id_taken(
        &self,
        student_id: &str,
        excluding: Option<i64>,
    ) -> StudentsResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM public.student_details WHERE student_id = $1 AND ($2::BIGINT IS NULL OR id <> $2))",
        )
        .bind(student_id)
        .bind(excluding)
        .fetch_one(&self.pool)
        .await
        .context(MakeQuerySnafu)
    }

    async fn insert(&self, to_be_added: NewStudent) -> StudentsResult<StudentRecord> {
        let NewStudent {
            student_id,
            first_name,
            last_name,
            middle_name,
        } = to_be_added;

        sqlx::query_as::<_, StudentRecord>(&format!(
            "INSERT INTO public.student_details (student_id, first_name, last_name, middle_name) VALUES ($1, $2, $3, $4) RETURNING {RECORD_COLUMNS}"
        ))
        .bind(&student_id)
        .bind(first_name)
        .bind(last_name)
        .bind(middle_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|source| unique_or_query_error(source, &student_id))
    }

    async fn update(
        &self,
        id: i64,
        changes: StudentChanges,
    ) -> StudentsResult<Option<StudentRecord>> {
        let StudentChanges {
            student_id,
            first_name,
            last_name,
            middle_name,
        } = changes;
        let set_middle_name = middle_name.is_some();
        let attempted_student_id = student_id.clone().unwrap_or_default();

        sqlx::query_as::<_, StudentRecord>(&format!(
            "UPDATE public.student_details SET student_id = COALESCE($2, student_id), first_name = COALESCE($3, first_name), last_name = COALESCE($4, last_name), middle_name = CASE WHEN $5 THEN $6 ELSE middle_name END, updated_at = now() WHERE id = $1 RETURNING {RECORD_COLUMNS}"
        ))
        .bind(id)
        .bind(student_id)
        .bind(first_name)
        .bind(last_name)
        .bind(set_middle_name)
        .bind(middle_name.flatten())
        .fetch_optional(&self.pool)
        .await
        .map_err(|source| unique_or_query_error(source, &attempted_student_id))
    }

    async fn remove(&self, id: i64) -> StudentsResult<bool> {
        let result = sqlx::query("DELETE FROM public.student_details WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context(MakeQuerySnafu)?;
        Ok(result.rows_affected() > 0)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
