use std::rc::Rc;

use commentary_client::Messages;
use yew::prelude::*;

#[derive(Clone, PartialEq, Properties)]
pub struct CommentFormProps {
    pub content: String,
    pub username: String,
    pub char_count: String,
    pub submitting: bool,
    pub error: Option<String>,
    pub messages: Rc<Messages>,
    pub on_content: Callback<String>,
    pub on_username: Callback<String>,
    pub on_submit: Callback<()>,
}

#[function_component(CommentForm)]
pub fn comment_form(p: &CommentFormProps) -> Html {
    let on_content = p.on_content.reform(|e: InputEvent| {
        let elt: web_sys::HtmlTextAreaElement = e.target_unchecked_into();
        elt.value()
    });
    let on_username = p.on_username.reform(|e: Event| {
        let elt: web_sys::HtmlInputElement = e.target_unchecked_into();
        elt.value()
    });
    let on_submit = p.on_submit.reform(|e: SubmitEvent| e.prevent_default());

    html! {
        <form class="comment-form p-3" onsubmit={ on_submit }>
            <input
                type="text"
                class="form-control mb-2"
                placeholder={ p.messages.username_placeholder.clone() }
                aria-label={ p.messages.username_placeholder.clone() }
                value={ p.username.clone() }
                onchange={ on_username }
            />
            <textarea
                class="form-control"
                rows="3"
                placeholder={ p.messages.comment_placeholder.clone() }
                aria-label={ p.messages.comment_placeholder.clone() }
                value={ p.content.clone() }
                oninput={ on_content }
            />
            <div class="d-flex align-items-center mt-2">
                <span class="char-counter text-muted">{ &p.char_count }</span>
                if let Some(error) = &p.error {
                    <span class="comment-error text-danger ms-3" role="alert">{ error }</span>
                }
                <button
                    type="submit"
                    class="btn btn-primary ms-auto"
                    disabled={ p.submitting }
                >
                    if p.submitting {
                        <span class="spinner-border spinner-border-sm me-2"></span>
                        { &p.messages.posting }
                    } else {
                        { &p.messages.submit }
                    }
                </button>
            </div>
        </form>
    }
}
