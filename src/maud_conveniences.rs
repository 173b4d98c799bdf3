use maud::{Markup, Render, html};

pub fn table<const N: usize>(
    overall_title: impl Render,
    titles: [&'static str; N],
    tbody_id: &'static str,
    rows: Markup,
) -> Markup {
    html! {
        div class="container mx-auto" {
            (overall_title)
            div class="overflow-x-auto" {
                table class="min-w-full bg-gray-800 rounded shadow-md" {
                    thead class="bg-gray-700" {
                        tr {
                            @for title in titles {
                                th class="py-2 px-4 text-left font-semibold text-gray-300" {(title)}
                            }
                        }
                    }
                    tbody id=(tbody_id) {
                        (rows)
                    }
                }
            }
        }
    }
}

pub fn table_cell(contents: impl Render) -> Markup {
    html! {
        td class="py-2 px-4 border-b border-gray-600 text-gray-200" {(contents)}
    }
}

pub fn title(s: impl Render) -> Markup {
    html! {
        h1 class="text-2xl font-semibold mb-4" {(s)}
    }
}

pub fn subtitle(s: impl Render) -> Markup {
    html! {
        p class="text-sm text-gray-400 mb-4" {(s)}
    }
}

pub fn form_element(id: &'static str, label: &'static str, error: Option<&str>, input: Markup) -> Markup {
    html! {
        div class="mb-4" {
            label for=(id) class="block text-sm font-bold mb-2 text-gray-300" {(label)}
            (input)
            @if let Some(error) = error {
                p class="text-red-400 text-xs italic mt-1" {(error)}
            }
        }
    }
}

pub fn simple_form_element(
    id: &'static str,
    label: &'static str,
    value: &str,
    placeholder: Option<&'static str>,
    error: Option<&str>,
) -> Markup {
    let border = if error.is_some() {
        "border-red-500"
    } else {
        "border-gray-600"
    };

    form_element(
        id,
        label,
        error,
        html! {
            input type="text" id=(id) name=(id) value=(value) placeholder=[placeholder]
                class={"shadow appearance-none border rounded w-full py-2 px-3 leading-tight focus:outline-none focus:shadow-outline bg-gray-700 " (border)};
        },
    )
}

pub fn alert(message: impl Render, is_failure: bool) -> Markup {
    let colours = if is_failure {
        "bg-red-100 border-red-400 text-red-700"
    } else {
        "bg-green-100 border-green-400 text-green-700"
    };

    html! {
        div class={"border px-4 py-3 rounded relative mb-4 " (colours)} role="alert" {
            span {(message)}
        }
    }
}
