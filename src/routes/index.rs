use crate::{
    client::controller::FormController,
    maud_conveniences::{subtitle, title},
    routes::ui::{render_form, render_student_table},
    state::StudentsState,
};
use axum::extract::State;
use maud::{Markup, html};

pub async fn get_index_route(State(state): State<StudentsState>) -> Markup {
    let mut controller = FormController::new(state.service());
    controller.activate().await;

    state.render(html! {
        div class="flex flex-col space-y-8 w-full max-w-5xl p-8" {
            div class="bg-gray-800 p-8 rounded shadow-md w-full" {
                (title("Student Details"))
                (subtitle("Add a student, or pick one from the list below to edit."))
                (render_form(&controller))
            }
            (render_student_table(controller.records()))
        }
    })
}
