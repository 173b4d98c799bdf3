use crate::{
    data::{input::StudentInput, student::StudentRecord},
    error::{ActionError, RequestBodySnafu, RequestPathSnafu, StudentAction, StudentsResult},
    state::StudentsState,
};
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use serde::Serialize;
use snafu::ResultExt;

#[derive(Serialize)]
pub struct SavedStudent {
    student: StudentRecord,
    message: &'static str,
}

#[derive(Serialize)]
pub struct Acknowledgement {
    message: &'static str,
}

fn read_body(body: Result<Json<StudentInput>, JsonRejection>) -> StudentsResult<StudentInput> {
    body.map(|Json(input)| input).context(RequestBodySnafu)
}

pub fn read_id(path: Result<Path<i64>, PathRejection>) -> StudentsResult<i64> {
    path.map(|Path(id)| id).context(RequestPathSnafu)
}

pub async fn get_students(
    State(state): State<StudentsState>,
) -> Result<Json<Vec<StudentRecord>>, ActionError> {
    state
        .service()
        .list()
        .await
        .map(Json)
        .map_err(|e| e.during(StudentAction::List))
}

pub async fn get_student(
    State(state): State<StudentsState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<StudentRecord>, ActionError> {
    let fetch = async {
        let id = read_id(path)?;
        state.service().get(id).await
    };

    fetch
        .await
        .map(Json)
        .map_err(|e| e.during(StudentAction::Fetch))
}

pub async fn post_student(
    State(state): State<StudentsState>,
    body: Result<Json<StudentInput>, JsonRejection>,
) -> Result<(StatusCode, Json<SavedStudent>), ActionError> {
    let create = async {
        let input = read_body(body)?;
        state.service().create(input).await
    };

    let student = create.await.map_err(|e| e.during(StudentAction::Create))?;
    Ok((
        StatusCode::CREATED,
        Json(SavedStudent {
            student,
            message: "Student created successfully",
        }),
    ))
}

///serves both `PATCH` and `PUT`, and either way only the fields sent are changed
pub async fn patch_student(
    State(state): State<StudentsState>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<StudentInput>, JsonRejection>,
) -> Result<Json<SavedStudent>, ActionError> {
    let update = async {
        let id = read_id(path)?;
        let input = read_body(body)?;
        state.service().update(id, input).await
    };

    let student = update.await.map_err(|e| e.during(StudentAction::Update))?;
    Ok(Json(SavedStudent {
        student,
        message: "Student updated successfully",
    }))
}

pub async fn delete_student(
    State(state): State<StudentsState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Acknowledgement>, ActionError> {
    let delete = async {
        let id = read_id(path)?;
        state.service().delete(id).await
    };

    delete.await.map_err(|e| e.during(StudentAction::Delete))?;

    Ok(Json(Acknowledgement {
        message: "Student deleted successfully",
    }))
}
