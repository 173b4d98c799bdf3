use crate::state::StudentsState;
use axum::{
    Router,
    routing::{delete, get, post},
};
use index::get_index_route;
use students::{delete_student, get_student, get_students, patch_student, post_student};
use ui::{internal_delete_student, internal_post_cancel, internal_post_edit, internal_post_submit};

pub mod index;
pub mod students;
pub mod ui;

pub fn router(state: StudentsState) -> Router {
    Router::new()
        .route("/", get(get_index_route))
        .route("/students", get(get_students).post(post_student))
        .route(
            "/students/{id}",
            get(get_student)
                .patch(patch_student)
                .put(patch_student)
                .delete(delete_student),
        )
        .route("/ui/submit", post(internal_post_submit))
        .route("/ui/edit", post(internal_post_edit))
        .route("/ui/cancel", post(internal_post_cancel))
        .route("/ui/students/{id}", delete(internal_delete_student))
        .with_state(state)
}
