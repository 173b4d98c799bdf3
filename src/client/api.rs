use crate::{
    data::{input::{FieldErrors, StudentInput}, student::StudentRecord},
    error::{
        DecodeResponseSnafu, SendRequestSnafu, StudentsResult, UnexpectedStatusSnafu,
        ValidationSnafu,
    },
    service::RecordService,
};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use snafu::ResultExt;

/// The calls the form/table controller makes. Only `Validation` errors are
/// told apart by callers; everything else is a generic failure.
#[async_trait]
pub trait StudentsApi: Send + Sync {
    async fn list(&self) -> StudentsResult<Vec<StudentRecord>>;
    async fn create(&self, input: StudentInput) -> StudentsResult<StudentRecord>;
    async fn update(&self, id: i64, input: StudentInput) -> StudentsResult<StudentRecord>;
    async fn delete(&self, id: i64) -> StudentsResult<()>;
}

#[async_trait]
impl StudentsApi for RecordService {
    async fn list(&self) -> StudentsResult<Vec<StudentRecord>> {
        Self::list(self).await
    }

    async fn create(&self, input: StudentInput) -> StudentsResult<StudentRecord> {
        Self::create(self, input).await
    }

    async fn update(&self, id: i64, input: StudentInput) -> StudentsResult<StudentRecord> {
        Self::update(self, id, input).await
    }

    async fn delete(&self, id: i64) -> StudentsResult<()> {
        Self::delete(self, id).await
    }
}

#[derive(Deserialize)]
struct SavedStudent {
    student: StudentRecord,
}

#[derive(Deserialize)]
struct FailureBody {
    message: String,
    #[serde(default)]
    errors: Option<FieldErrors>,
}

/// Talks to the JSON API over HTTP, always updating with `PATCH`.
#[derive(Clone, Debug)]
pub struct HttpStudentsApi {
    client: Client,
    base_url: String,
}

impl HttpStudentsApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        Self { client, base_url }
    }

    fn students_url(&self) -> String {
        format!("{}/students", self.base_url)
    }

    fn student_url(&self, id: i64) -> String {
        format!("{}/students/{id}", self.base_url)
    }

    async fn check(response: Response) -> StudentsResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.json::<FailureBody>().await.ok();
        if status == StatusCode::UNPROCESSABLE_ENTITY {
            if let Some(errors) = body.as_ref().and_then(|body| body.errors.clone()) {
                return ValidationSnafu { errors }.fail();
            }
        }

        let message = body.map_or_else(
            || status.canonical_reason().unwrap_or("Unknown error").to_string(),
            |body| body.message,
        );
        UnexpectedStatusSnafu { status, message }.fail()
    }
}

#[async_trait]
impl StudentsApi for HttpStudentsApi {
    async fn list(&self) -> StudentsResult<Vec<StudentRecord>> {
        let response = self
            .client
            .get(self.students_url())
            .send()
            .await
            .context(SendRequestSnafu)?;
        Self::check(response)
            .await?
            .json()
            .await
            .context(DecodeResponseSnafu)
    }

    async fn create(&self, input: StudentInput) -> StudentsResult<StudentRecord> {
        let response = self
            .client
            .post(self.students_url())
            .json(&input)
            .send()
            .await
            .context(SendRequestSnafu)?;
        let saved: SavedStudent = Self::check(response)
            .await?
            .json()
            .await
            .context(DecodeResponseSnafu)?;
        Ok(saved.student)
    }

    async fn update(&self, id: i64, input: StudentInput) -> StudentsResult<StudentRecord> {
        let response = self
            .client
            .patch(self.student_url(id))
            .json(&input)
            .send()
            .await
            .context(SendRequestSnafu)?;
        let saved: SavedStudent = Self::check(response)
            .await?
            .json()
            .await
            .context(DecodeResponseSnafu)?;
        Ok(saved.student)
    }

    async fn delete(&self, id: i64) -> StudentsResult<()> {
        let response = self
            .client
            .delete(self.student_url(id))
            .send()
            .await
            .context(SendRequestSnafu)?;
        Self::check(response).await?;
        Ok(())
    }
}
