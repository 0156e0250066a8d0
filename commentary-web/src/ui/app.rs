use std::{rc::Rc, time::Duration};

use commentary_client::{
    api::Comment, sleep_for, ConnState, FeedConfig, FeedController, Messages, View,
};
use futures::channel::oneshot;
use wasm_bindgen::{prelude::Closure, JsCast};
use wasm_bindgen_futures::spawn_local;
use yew::{html::Scope, prelude::*};

use crate::{api, storage::LocalStoragePrefs, ui, util};

type Controller = FeedController<api::RestClient, YewView, LocalStoragePrefs>;

/// Display update requested by the controller
pub enum ViewUpdate {
    Feed(ui::FeedContent),
    LoadMoreVisible(bool),
    Connection(ConnState),
    Submitting(bool),
    Error(Option<String>),
    ResetInput,
    CharCount(String),
    Username(String),
}

/// Forwards everything the controller displays to the `App` component
pub struct YewView(Scope<App>);

impl YewView {
    fn send(&self, u: ViewUpdate) {
        self.0.send_message(AppMsg::View(u));
    }
}

impl View for YewView {
    fn show_loading(&self, message: &str) {
        self.send(ViewUpdate::Feed(ui::FeedContent::Loading(String::from(message))));
    }

    fn show_comments(&self, comments: &[Comment]) {
        self.send(ViewUpdate::Feed(ui::FeedContent::Comments(Rc::new(
            comments.to_vec(),
        ))));
    }

    fn show_placeholder(&self, message: &str) {
        self.send(ViewUpdate::Feed(ui::FeedContent::Placeholder(String::from(
            message,
        ))));
    }

    fn show_banner(&self, message: &str) {
        self.send(ViewUpdate::Feed(ui::FeedContent::Banner(String::from(message))));
    }

    fn set_load_more_visible(&self, visible: bool) {
        self.send(ViewUpdate::LoadMoreVisible(visible));
    }

    fn set_connection_state(&self, state: ConnState) {
        self.send(ViewUpdate::Connection(state));
    }

    fn set_submitting(&self, submitting: bool) {
        self.send(ViewUpdate::Submitting(submitting));
    }

    fn show_error(&self, message: &str) {
        self.send(ViewUpdate::Error(Some(String::from(message))));
    }

    fn clear_error(&self) {
        self.send(ViewUpdate::Error(None));
    }

    fn reset_comment_input(&self) {
        self.send(ViewUpdate::ResetInput);
    }

    fn set_char_count(&self, counter: &str) {
        self.send(ViewUpdate::CharCount(String::from(counter)));
    }

    fn set_username(&self, username: &str) {
        self.send(ViewUpdate::Username(String::from(username)));
    }
}

pub enum AppMsg {
    View(ViewUpdate),

    CommentInput(String),
    UsernameInput(String),
    SubmitClicked,
    SubmitFire(u64),

    LoadMore,
    Retry,
    FeedStopped,

    NetworkChanged(bool),
    Teardown,
}

pub struct App {
    controller: Rc<Controller>,
    messages: Rc<Messages>,

    feed: ui::FeedContent,
    load_more: bool,
    connection_state: ConnState,
    submitting: bool,
    error: Option<String>,
    content: String,
    username: String,
    char_count: String,

    submit_generation: u64,
    feed_running: bool,
    feed_canceller: oneshot::Receiver<()>,
    listeners: Vec<(&'static str, Closure<dyn FnMut(web_sys::Event)>)>,
}

impl App {
    fn start_feed(&mut self, ctx: &Context<Self>) {
        let (cancel, canceller) = oneshot::channel();
        self.feed_canceller.close();
        self.feed_canceller = canceller;
        self.feed_running = true;
        let controller = self.controller.clone();
        ctx.link().send_future(async move {
            if let Err(err) = controller.run(&api::acquire_client, cancel).await {
                tracing::error!(%err, "comment feed stopped");
            }
            AppMsg::FeedStopped
        });
    }

    fn submit(&self) {
        let controller = self.controller.clone();
        let content = self.content.clone();
        let username = self.username.clone();
        spawn_local(async move {
            if let Err(err) = controller.submit(&content, &username).await {
                tracing::debug!(%err, "comment was not posted");
            }
        });
    }

    fn load_page(&self) {
        let controller = self.controller.clone();
        spawn_local(async move {
            if let Err(err) = controller.load_page().await {
                tracing::debug!(%err, "page was not loaded");
            }
        });
    }

    fn listen(
        ctx: &Context<Self>,
        event: &'static str,
        msg: impl Fn() -> AppMsg + 'static,
    ) -> Option<(&'static str, Closure<dyn FnMut(web_sys::Event)>)> {
        let link = ctx.link().clone();
        let closure = Closure::<dyn FnMut(web_sys::Event)>::new(move |_| {
            link.send_message(msg());
        });
        let window = web_sys::window()?;
        if let Err(err) =
            window.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
        {
            tracing::warn!(?err, event, "failed listening to window event");
            return None;
        }
        Some((event, closure))
    }
}

impl Component for App {
    type Message = AppMsg;
    type Properties = ();

    fn create(ctx: &Context<Self>) -> Self {
        let config = FeedConfig {
            messages: Messages::for_language(&util::browser_language()),
            ..FeedConfig::default()
        };
        let messages = Rc::new(config.messages.clone());
        let char_count = config.char_counter(0);
        let controller = Rc::new(FeedController::new(
            config,
            YewView(ctx.link().clone()),
            LocalStoragePrefs,
        ));
        if !util::browser_online() {
            controller.network_changed(false);
        }

        let listeners = [
            Self::listen(ctx, "online", || AppMsg::NetworkChanged(true)),
            Self::listen(ctx, "offline", || AppMsg::NetworkChanged(false)),
            Self::listen(ctx, "beforeunload", || AppMsg::Teardown),
        ]
        .into_iter()
        .flatten()
        .collect();

        let (_, feed_canceller) = oneshot::channel();
        let mut app = App {
            feed: ui::FeedContent::Loading(messages.loading.clone()),
            controller,
            messages,
            load_more: false,
            connection_state: ConnState::Uninitialized,
            submitting: false,
            error: None,
            content: String::new(),
            username: String::new(),
            char_count,
            submit_generation: 0,
            feed_running: false,
            feed_canceller,
            listeners,
        };
        app.start_feed(ctx);
        app
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            AppMsg::View(u) => match u {
                ViewUpdate::Feed(f) => self.feed = f,
                ViewUpdate::LoadMoreVisible(v) => self.load_more = v,
                ViewUpdate::Connection(c) => self.connection_state = c,
                ViewUpdate::Submitting(s) => self.submitting = s,
                ViewUpdate::Error(e) => self.error = e,
                ViewUpdate::ResetInput => self.content.clear(),
                ViewUpdate::CharCount(c) => self.char_count = c,
                ViewUpdate::Username(u) => self.username = u,
            },
            AppMsg::CommentInput(content) => {
                self.controller.comment_input_changed(&content);
                self.content = content;
            }
            AppMsg::UsernameInput(username) => {
                self.controller.username_changed(&username);
                self.username = username;
            }
            AppMsg::SubmitClicked => {
                self.submit_generation += 1;
                let generation = self.submit_generation;
                match self.controller.config().submit_debounce_ms {
                    None => self.submit(),
                    Some(ms) => ctx.link().send_future(async move {
                        sleep_for(Duration::from_millis(ms)).await;
                        AppMsg::SubmitFire(generation)
                    }),
                }
                return false;
            }
            AppMsg::SubmitFire(generation) => {
                // only the last click of a burst goes through
                if generation == self.submit_generation {
                    self.submit();
                }
                return false;
            }
            AppMsg::LoadMore => {
                self.load_page();
                return false;
            }
            AppMsg::Retry => match (self.controller.has_client(), self.feed_running) {
                (true, _) => self.load_page(),
                (false, false) => self.start_feed(ctx),
                (false, true) => tracing::debug!("feed is still starting, not retrying"),
            },
            AppMsg::FeedStopped => {
                self.feed_running = false;
                return false;
            }
            AppMsg::NetworkChanged(online) => {
                self.controller.network_changed(online);
                return false;
            }
            AppMsg::Teardown => {
                self.feed_canceller.close();
                return false;
            }
        }
        true
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        html! {
            <div class="comment-widget">
                <ui::StatusIndicator
                    connection_state={ self.connection_state }
                    messages={ self.messages.clone() }
                />
                <ui::CommentForm
                    content={ self.content.clone() }
                    username={ self.username.clone() }
                    char_count={ self.char_count.clone() }
                    submitting={ self.submitting }
                    error={ self.error.clone() }
                    messages={ self.messages.clone() }
                    on_content={ ctx.link().callback(AppMsg::CommentInput) }
                    on_username={ ctx.link().callback(AppMsg::UsernameInput) }
                    on_submit={ ctx.link().callback(|_| AppMsg::SubmitClicked) }
                />
                <ui::CommentList
                    feed={ self.feed.clone() }
                    load_more={ self.load_more }
                    messages={ self.messages.clone() }
                    on_load_more={ ctx.link().callback(|_| AppMsg::LoadMore) }
                    on_retry={ ctx.link().callback(|_| AppMsg::Retry) }
                />
            </div>
        }
    }

    fn destroy(&mut self, _ctx: &Context<Self>) {
        self.feed_canceller.close();
        if let Some(window) = web_sys::window() {
            for (event, closure) in self.listeners.drain(..) {
                let _ = window
                    .remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
            }
        }
    }
}
