use std::sync::Arc;
use student_records::{
    client::{
        api::{HttpStudentsApi, StudentsApi},
        controller::{DeleteOutcome, EditTarget, FormController, Status, SubmitOutcome},
    },
    data::input::{Field, FieldInput, StudentInput},
    error::StudentsError,
    routes::router,
    state::StudentsState,
    store::memory::MemoryStudentStore,
};
use tokio::net::TcpListener;

async fn serve() -> String {
    let state = StudentsState::from_store(Arc::new(MemoryStudentStore::default()));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });

    format!("http://{address}/")
}

fn fill(controller: &mut FormController<HttpStudentsApi>, student_id: &str, first: &str, last: &str) {
    controller.set_field(Field::StudentId, student_id);
    controller.set_field(Field::FirstName, first);
    controller.set_field(Field::LastName, last);
}

#[tokio::test]
async fn controller_over_http() {
    let base_url = serve().await;
    let mut controller = FormController::new(HttpStudentsApi::new(&base_url));

    controller.activate().await;
    assert!(controller.records().is_empty());

    fill(&mut controller, "2021-0001", "Ana", "Cruz");
    let SubmitOutcome::Created(ana) = controller.submit().await else {
        panic!("expected Ana to be created");
    };
    assert_eq!(ana.middle_name, None);
    assert_eq!(controller.status(), Some(Status::Created));

    fill(&mut controller, "2021-0001", "Ben", "Lim");
    assert_eq!(controller.submit().await, SubmitOutcome::Rejected);
    assert_eq!(
        controller.field_error(Field::StudentId),
        Some("The student id has already been taken.")
    );
    assert_eq!(controller.form().first_name, "Ben");

    controller.set_field(Field::StudentId, "2021-0002");
    let SubmitOutcome::Created(ben) = controller.submit().await else {
        panic!("expected Ben to be created");
    };
    assert_eq!(controller.records()[0], ben);

    controller.edit(&ana);
    controller.set_field(Field::MiddleName, "Reyes");
    let SubmitOutcome::Updated(updated) = controller.submit().await else {
        panic!("expected Ana to be updated");
    };
    assert_eq!(updated.id, ana.id);
    assert_eq!(updated.middle_name.as_deref(), Some("Reyes"));
    assert_eq!(controller.editing(), EditTarget::Idle);

    controller.request_delete(ben.id);
    assert_eq!(controller.confirm_delete().await, DeleteOutcome::Deleted(ben.id));

    let mut fresh = FormController::new(HttpStudentsApi::new(&base_url));
    fresh.activate().await;
    assert_eq!(fresh.records(), [updated]);
}

#[tokio::test]
async fn partial_updates_over_http() {
    let api = HttpStudentsApi::new(serve().await);
    let ana = api
        .create(StudentInput {
            student_id: FieldInput::text("2021-0001"),
            first_name: FieldInput::text("Ana"),
            last_name: FieldInput::text("Cruz"),
            middle_name: FieldInput::text("Reyes"),
        })
        .await
        .unwrap();

    let updated = api
        .update(
            ana.id,
            StudentInput {
                last_name: FieldInput::text("  Santos "),
                ..StudentInput::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.last_name, "Santos");
    assert_eq!(updated.middle_name.as_deref(), Some("Reyes"));

    let cleared = api
        .update(
            ana.id,
            StudentInput {
                middle_name: FieldInput::Null,
                ..StudentInput::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(cleared.middle_name, None);
}

#[tokio::test]
async fn failures_over_http() {
    let api = HttpStudentsApi::new(serve().await);

    let err = api.create(StudentInput::default()).await.unwrap_err();
    let errors = err.field_errors().unwrap();
    assert!(errors.contains(Field::StudentId));
    assert!(errors.contains(Field::FirstName));
    assert!(errors.contains(Field::LastName));

    let err = api.delete(99).await.unwrap_err();
    assert!(matches!(
        err,
        StudentsError::UnexpectedStatus { ref message, .. } if message == "Error deleting student"
    ));
    assert!(err.field_errors().is_none());
}
