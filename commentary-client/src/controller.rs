use std::sync::Arc;

use chrono::Utc;
use futures::{
    channel::{mpsc, oneshot},
    future, pin_mut, select, stream, FutureExt, StreamExt,
};
use parking_lot::Mutex;

use crate::{
    api::{Comment, DataService, FeedMessage, NewComment, PreferenceStore, SubscriptionId},
    sanitize, sanitize_comment, sleep_for, sleep_until, CommentList, ConnState, Cursor, Error,
    FeedConfig, RenderPolicy, View,
};

/// Hands out the data service client once whatever bootstraps it is done
pub trait ClientSource<D: ?Sized> {
    /// Returns None while the client is not ready yet
    fn try_acquire(&self) -> Option<Arc<D>>;
}

impl<D, F> ClientSource<D> for F
where
    D: ?Sized,
    F: Fn() -> Option<Arc<D>>,
{
    fn try_acquire(&self) -> Option<Arc<D>> {
        self()
    }
}

struct FeedState {
    comments: CommentList,
    cursor: Cursor,
    conn: ConnState,
    loading: bool,
    submitting: bool,
    online: bool,
    subscription: Option<SubscriptionId>,
}

/// Keeps the displayed comment list in sync with the data service
///
/// All operations take `&self` and can be interleaved on a single thread: page loads,
/// submissions and the realtime feed only hold the internal lock between two await points.
pub struct FeedController<D: ?Sized, V, P> {
    config: FeedConfig,
    view: V,
    prefs: P,
    client: Mutex<Option<Arc<D>>>,
    state: Mutex<FeedState>,
    network_sender: mpsc::UnboundedSender<()>,
    network_receiver: Mutex<Option<mpsc::UnboundedReceiver<()>>>,
}

impl<D, V, P> FeedController<D, V, P>
where
    D: ?Sized + DataService,
    V: View,
    P: PreferenceStore,
{
    pub fn new(config: FeedConfig, view: V, prefs: P) -> FeedController<D, V, P> {
        if let Some(username) = prefs.get(&config.username_key) {
            view.set_username(&username);
        }
        view.set_char_count(&config.char_counter(0));
        view.set_connection_state(ConnState::Uninitialized);
        let (network_sender, network_receiver) = mpsc::unbounded();
        FeedController {
            state: Mutex::new(FeedState {
                comments: CommentList::new(),
                cursor: Cursor::new(config.page_size),
                conn: ConnState::Uninitialized,
                loading: false,
                submitting: false,
                online: true,
                subscription: None,
            }),
            config,
            view,
            prefs,
            client: Mutex::new(None),
            network_sender,
            network_receiver: Mutex::new(Some(network_receiver)),
        }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn prefs(&self) -> &P {
        &self.prefs
    }

    pub fn comments(&self) -> Vec<Comment> {
        self.state.lock().comments.to_vec()
    }

    pub fn cursor(&self) -> Cursor {
        self.state.lock().cursor
    }

    pub fn connection_state(&self) -> ConnState {
        self.state.lock().conn
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().loading
    }

    pub fn is_submitting(&self) -> bool {
        self.state.lock().submitting
    }

    pub fn has_client(&self) -> bool {
        self.client.lock().is_some()
    }

    fn client(&self) -> Result<Arc<D>, Error> {
        self.client.lock().clone().ok_or(Error::ClientUnavailable)
    }

    fn is_online(&self) -> bool {
        self.state.lock().online
    }

    fn set_conn_state(&self, conn: ConnState) {
        {
            let mut state = self.state.lock();
            if state.conn == conn {
                return;
            }
            state.conn = conn;
        }
        tracing::info!(?conn, "connection state changed");
        self.view.set_connection_state(conn);
    }

    fn render_comments(&self, comments: &[Comment]) {
        match comments.is_empty() {
            true => self.view.show_placeholder(&self.config.messages.no_comments),
            false => self.view.show_comments(comments),
        }
    }

    /// Acquire the client, load the first page, then follow the realtime feed until `cancel`'s
    /// receiver is dropped or closed
    pub async fn run<S>(&self, source: &S, mut cancel: oneshot::Sender<()>) -> Result<(), Error>
    where
        S: ?Sized + ClientSource<D>,
    {
        let client = self.acquire(source, &mut cancel).await?;
        self.attach(client).await?;
        if let Err(err) = self.load_page().await {
            // already displayed, the user can retry from there
            tracing::warn!(%err, "initial page load failed");
        }
        self.run_realtime(cancel).await;
        Ok(())
    }

    async fn acquire<S>(
        &self,
        source: &S,
        cancel: &mut oneshot::Sender<()>,
    ) -> Result<Arc<D>, Error>
    where
        S: ?Sized + ClientSource<D>,
    {
        let policy = self.config.retry;
        let mut attempt = 0;
        loop {
            if let Some(client) = source.try_acquire() {
                tracing::info!(attempt, "acquired data service client");
                return Ok(client);
            }
            if attempt >= policy.max_retries {
                break;
            }
            attempt += 1;
            tracing::info!(
                attempt,
                max_retries = policy.max_retries,
                "data service client not ready yet, retrying"
            );
            self.set_conn_state(ConnState::Uninitialized);
            self.view.show_banner(&self.config.messages.initializing);
            let delay = sleep_for(policy.delay()).fuse();
            pin_mut!(delay);
            select! {
                _ = cancel.cancellation().fuse() => return Err(Error::ClientUnavailable),
                _ = delay => (),
            }
        }
        tracing::error!(attempts = attempt + 1, "giving up on acquiring the data service client");
        self.view.show_banner(&self.config.messages.init_failed);
        Err(Error::ClientUnavailable)
    }

    /// Probe `client` and start using it
    ///
    /// A failed probe is displayed and not retried.
    pub async fn attach(&self, client: Arc<D>) -> Result<(), Error> {
        self.set_conn_state(ConnState::Connecting);
        let probe = crate::api::Query::probe(&self.config.table);
        if let Err(err) = client.query(&probe).await {
            tracing::error!(%err, "data service liveness probe failed");
            self.set_conn_state(ConnState::Disconnected);
            self.view
                .show_banner(&format!("{}{}", self.config.messages.probe_failed, err));
            return Err(Error::ConnectionProbeFailed(err));
        }
        tracing::info!("data service liveness probe succeeded");
        *self.client.lock() = Some(client);
        Ok(())
    }

    /// Load the page after the current cursor, or do nothing if a load is already in flight
    pub async fn load_page(&self) -> Result<(), Error> {
        let client = self.client()?;
        let _in_flight = match InFlight::start(&self.state, &self.view, Flag::Loading) {
            Some(g) => g,
            None => {
                tracing::debug!("page load already in flight, ignoring");
                return Ok(());
            }
        };
        let (query, first_page) = {
            let state = self.state.lock();
            (
                state.cursor.next_query(&self.config.table),
                state.cursor.offset == 0,
            )
        };

        self.view.set_load_more_visible(false);
        if first_page {
            self.view.show_loading(&self.config.messages.loading);
        }
        tracing::debug!(range = ?query.range, "loading comments page");
        let page = match client.query(&query).await {
            Ok(page) => page,
            Err(err) => {
                tracing::error!(%err, range = ?query.range, "failed loading comments page");
                self.view
                    .show_banner(&format!("{}{}", self.config.messages.load_failed, err));
                let has_more = self.state.lock().cursor.has_more();
                self.view.set_load_more_visible(has_more);
                return Err(Error::QueryFailed(err));
            }
        };

        let hardened = self.config.hardened_sanitize;
        let batch = page
            .comments
            .into_iter()
            .map(|c| sanitize_comment(c, hardened))
            .collect::<Vec<_>>();
        let (comments, has_more) = {
            let mut state = self.state.lock();
            if first_page {
                state.comments.replace(batch);
            } else {
                let received = batch.len();
                let added = state.comments.append(batch);
                if added != received {
                    tracing::debug!(received, added, "page overlapped displayed comments");
                }
            }
            let displayed = state.comments.len();
            state.cursor.advance(displayed, page.total);
            (state.comments.to_vec(), state.cursor.has_more())
        };
        self.render_comments(&comments);
        self.view.set_load_more_visible(has_more);
        Ok(())
    }

    /// Reconcile one comment coming from the realtime feed or from a confirmed insert
    ///
    /// Returns false if the comment was already displayed.
    pub fn receive_insert(&self, comment: Comment) -> bool {
        let comment = sanitize_comment(comment, self.config.hardened_sanitize);
        let id = comment.id;
        let comments = {
            let mut state = self.state.lock();
            if !state.comments.prepend(comment) {
                tracing::debug!(?id, "ignoring already-displayed comment");
                return false;
            }
            state.cursor.record_insert();
            state.comments.to_vec()
        };
        tracing::debug!(?id, "prepended new comment");
        self.render_comments(&comments);
        true
    }

    /// Follow the realtime feed, reconnecting whenever it drops, until `cancel`'s receiver is
    /// dropped or closed
    ///
    /// The subscription and the heartbeat only live as long as this future, so dropping it also
    /// releases them.
    pub async fn run_realtime(&self, mut cancel: oneshot::Sender<()>) {
        let client = match self.client() {
            Ok(c) => c,
            Err(_) => {
                tracing::warn!("realtime feed started without a data service client");
                return;
            }
        };
        let mut network = match NetworkSignals::take(&self.network_receiver) {
            Some(n) => n,
            None => {
                tracing::warn!("realtime feed is already running");
                return;
            }
        };
        let heartbeat_interval = self.config.heartbeat_interval();
        let mut cancellation = cancel.cancellation().fuse();
        let mut first_attempt = true;
        'reconnect: loop {
            match first_attempt {
                true => first_attempt = false,
                false => {
                    let delay = sleep_for(self.config.retry.delay()).fuse();
                    pin_mut!(delay);
                    select! {
                        _ = cancellation => return,
                        _ = delay => (),
                    }
                }
            }

            while !self.is_online() {
                select! {
                    _ = cancellation => return,
                    _ = network.next() => (),
                }
            }

            self.set_conn_state(ConnState::Connecting);
            let sub = match client.subscribe(&self.config.table).await {
                Ok(sub) => sub,
                Err(err) => {
                    tracing::warn!(%err, "failed subscribing to realtime feed");
                    self.set_conn_state(ConnState::Disconnected);
                    continue 'reconnect;
                }
            };
            tracing::info!(id = ?sub.id, "subscribed to realtime feed");
            let _subscription = ActiveSubscription::new(&self.state, client.clone(), sub.id);
            let sub_id = sub.id;
            let mut feed = sub.feed.fuse();
            let mut next_heartbeat = heartbeat_interval.map(|i| Utc::now() + i);

            loop {
                let heartbeat_at = next_heartbeat;
                let heartbeat = async move {
                    match heartbeat_at {
                        Some(t) => sleep_until(t).await,
                        None => future::pending::<()>().await,
                    }
                }
                .fuse();
                pin_mut!(heartbeat);
                select! {
                    _ = cancellation => {
                        tracing::info!("realtime feed torn down");
                        return;
                    }
                    _ = network.next() => {
                        if !self.is_online() {
                            tracing::warn!("network went offline, dropping realtime feed");
                            self.set_conn_state(ConnState::Disconnected);
                            continue 'reconnect;
                        }
                    }
                    msg = feed.next() => match msg {
                        None => {
                            tracing::warn!(err = %Error::SubscriptionDropped, "lost realtime feed");
                            self.set_conn_state(ConnState::Disconnected);
                            continue 'reconnect;
                        }
                        Some(FeedMessage::Insert(c)) => {
                            self.receive_insert(c);
                        }
                        Some(FeedMessage::Status(status)) if status.is_connected() => {
                            self.set_conn_state(ConnState::Connected);
                        }
                        Some(FeedMessage::Status(status)) => {
                            tracing::warn!(?status, "realtime subscription is no longer live");
                            self.set_conn_state(ConnState::Disconnected);
                            continue 'reconnect;
                        }
                    },
                    _ = heartbeat => {
                        next_heartbeat = next_heartbeat.zip(heartbeat_interval).map(|(t, i)| t + i);
                        if self.is_online() {
                            if let Err(err) = client.touch(sub_id).await {
                                tracing::debug!(%err, "heartbeat failed");
                            }
                        }
                    }
                }
            }
        }
    }

    /// Record a browser online/offline notification
    pub fn network_changed(&self, online: bool) {
        let conn = {
            let mut state = self.state.lock();
            if state.online == online {
                return;
            }
            state.online = online;
            state.conn
        };
        tracing::info!(online, "network status changed");
        if !online && conn != ConnState::Uninitialized {
            self.set_conn_state(ConnState::Disconnected);
        }
        // the realtime feed reads the online flag when it starts, so it only needs waking up
        // while running
        if self.network_receiver.lock().is_none() {
            let _ = self.network_sender.unbounded_send(());
        }
    }

    #[cfg(test)]
    pub(crate) fn has_pending_network_signal(&self) -> bool {
        match self.network_receiver.lock().as_mut() {
            Some(receiver) => matches!(receiver.try_next(), Ok(Some(()))),
            None => false,
        }
    }

    /// Validate, sanitize and post a comment, or do nothing if a submission is already in flight
    pub async fn submit(&self, content: &str, username: &str) -> Result<(), Error> {
        if self.is_submitting() {
            tracing::debug!("submission already in flight, ignoring");
            return Ok(());
        }
        let messages = &self.config.messages;

        let content = content.trim();
        if content.is_empty() {
            self.view.show_error(&messages.empty_content);
            return Err(Error::EmptyContent);
        }
        let len = content.chars().count();
        let max = self.config.max_content_chars;
        if len > max {
            self.view.show_error(&messages.content_too_long(max));
            return Err(Error::ContentTooLong { len, max });
        }
        let client = match self.client() {
            Ok(c) => c,
            Err(err) => {
                self.view.show_error(&messages.initializing);
                return Err(err);
            }
        };
        let username = match username.trim() {
            "" => messages.anonymous.as_str(),
            u => u,
        };
        let hardened = self.config.hardened_sanitize;
        let record = NewComment {
            username: sanitize(username, hardened),
            content: sanitize(content, hardened),
        };

        let _in_flight = match InFlight::start(&self.state, &self.view, Flag::Submitting) {
            Some(g) => g,
            None => return Ok(()),
        };
        self.view.clear_error();
        match client.insert(&self.config.table, &record).await {
            Ok(comment) => {
                tracing::info!(id = ?comment.id, "posted comment");
                self.view.reset_comment_input();
                self.view.set_char_count(&self.config.char_counter(0));
                if self.config.render_policy == RenderPolicy::Confirmed {
                    self.receive_insert(comment);
                }
                Ok(())
            }
            Err(err) => {
                tracing::error!(%err, "failed posting comment");
                self.view
                    .show_error(&format!("{}{}", messages.insert_failed, err));
                Err(Error::InsertFailed(err))
            }
        }
    }

    pub fn comment_input_changed(&self, content: &str) {
        self.view
            .set_char_count(&self.config.char_counter(content.chars().count()));
    }

    pub fn username_changed(&self, username: &str) {
        self.prefs.set(&self.config.username_key, username.trim());
    }
}

#[derive(Clone, Copy, Debug)]
enum Flag {
    Loading,
    Submitting,
}

impl Flag {
    fn of(self, state: &mut FeedState) -> &mut bool {
        match self {
            Flag::Loading => &mut state.loading,
            Flag::Submitting => &mut state.submitting,
        }
    }
}

/// Raises an in-flight flag, and lowers it back on drop however the operation ended
struct InFlight<'a, V: View> {
    state: &'a Mutex<FeedState>,
    view: &'a V,
    flag: Flag,
}

impl<'a, V: View> InFlight<'a, V> {
    fn start(state: &'a Mutex<FeedState>, view: &'a V, flag: Flag) -> Option<InFlight<'a, V>> {
        {
            let mut state = state.lock();
            let raised = flag.of(&mut state);
            if *raised {
                return None;
            }
            *raised = true;
        }
        if let Flag::Submitting = flag {
            view.set_submitting(true);
        }
        Some(InFlight { state, view, flag })
    }
}

impl<'a, V: View> Drop for InFlight<'a, V> {
    fn drop(&mut self) {
        *self.flag.of(&mut self.state.lock()) = false;
        if let Flag::Submitting = self.flag {
            self.view.set_submitting(false);
        }
    }
}

/// The one live subscription, unsubscribed on drop
struct ActiveSubscription<'a, D: ?Sized + DataService> {
    state: &'a Mutex<FeedState>,
    client: Arc<D>,
    id: SubscriptionId,
}

impl<'a, D: ?Sized + DataService> ActiveSubscription<'a, D> {
    fn new(state: &'a Mutex<FeedState>, client: Arc<D>, id: SubscriptionId) -> Self {
        let previous = state.lock().subscription.replace(id);
        if let Some(previous) = previous {
            tracing::warn!(?previous, "releasing stale realtime subscription");
            client.unsubscribe(previous);
        }
        ActiveSubscription { state, client, id }
    }
}

impl<'a, D: ?Sized + DataService> Drop for ActiveSubscription<'a, D> {
    fn drop(&mut self) {
        {
            let mut state = self.state.lock();
            if state.subscription == Some(self.id) {
                state.subscription = None;
            }
        }
        self.client.unsubscribe(self.id);
        tracing::debug!(id = ?self.id, "released realtime subscription");
    }
}

/// Borrowed network notification receiver, handed back to the controller on drop
struct NetworkSignals<'a> {
    slot: &'a Mutex<Option<mpsc::UnboundedReceiver<()>>>,
    receiver: mpsc::UnboundedReceiver<()>,
}

impl<'a> NetworkSignals<'a> {
    fn take(slot: &'a Mutex<Option<mpsc::UnboundedReceiver<()>>>) -> Option<NetworkSignals<'a>> {
        let mut receiver = slot.lock().take()?;
        // left over from a previous run
        while let Ok(Some(())) = receiver.try_next() {}
        Some(NetworkSignals { slot, receiver })
    }

    fn next(&mut self) -> stream::Next<'_, mpsc::UnboundedReceiver<()>> {
        self.receiver.next()
    }
}

impl<'a> Drop for NetworkSignals<'a> {
    fn drop(&mut self) {
        let (_, closed) = mpsc::unbounded();
        *self.slot.lock() = Some(std::mem::replace(&mut self.receiver, closed));
    }
}
