use std::rc::Rc;

use commentary_client::{api::Comment, display_text, Messages};
use yew::prelude::*;

use crate::util;

/// What takes the place of the comment feed
#[derive(Clone, Debug, PartialEq)]
pub enum FeedContent {
    Loading(String),
    Comments(Rc<Vec<Comment>>),
    Placeholder(String),
    /// Failure that the user can retry from
    Banner(String),
}

#[derive(Clone, PartialEq, Properties)]
pub struct CommentListProps {
    pub feed: FeedContent,
    pub load_more: bool,
    pub messages: Rc<Messages>,
    pub on_load_more: Callback<()>,
    pub on_retry: Callback<()>,
}

#[function_component(CommentList)]
pub fn comment_list(p: &CommentListProps) -> Html {
    let body = match &p.feed {
        FeedContent::Loading(msg) => html! {
            <div class="comments-loading text-center p-3">
                <div class="spinner-border spinner-border-sm me-2" role="status"></div>
                { msg }
            </div>
        },
        FeedContent::Placeholder(msg) => html! {
            <div class="comments-empty text-center text-muted p-3">{ msg }</div>
        },
        FeedContent::Banner(msg) => html! {
            <div class="comments-error alert alert-warning d-flex align-items-center">
                <div class="me-auto">{ msg }</div>
                <button
                    type="button"
                    class="btn btn-outline-secondary btn-sm"
                    onclick={ p.on_retry.reform(|_| ()) }
                >
                    { &p.messages.retry }
                </button>
            </div>
        },
        FeedContent::Comments(comments) => html! {
            <ul class="list-group comments">
                { for comments.iter().map(|c| html! {
                    <li class="list-group-item comment" key={ c.id.0.to_string() }>
                        <div class="comment-header d-flex">
                            <span class="comment-username fw-bold me-auto">
                                { display_text(&c.username) }
                            </span>
                            <time class="comment-date text-muted">
                                { util::format_time(c.created_at) }
                            </time>
                        </div>
                        <div class="comment-content">
                            { display_text(&c.content) }
                        </div>
                    </li>
                }) }
            </ul>
        },
    };

    html! {
        <div class="comment-list">
            { body }
            if p.load_more {
                <button
                    type="button"
                    class="btn btn-light w-100 mt-2 load-more"
                    onclick={ p.on_load_more.reform(|_| ()) }
                >
                    { &p.messages.load_more }
                </button>
            }
        </div>
    }
}
