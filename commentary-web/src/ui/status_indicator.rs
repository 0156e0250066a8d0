use std::rc::Rc;

use commentary_client::{ConnState, Messages};
use yew::prelude::*;

#[derive(Clone, PartialEq, Properties)]
pub struct StatusIndicatorProps {
    pub connection_state: ConnState,
    pub messages: Rc<Messages>,
}

#[function_component(StatusIndicator)]
pub fn status_indicator(p: &StatusIndicatorProps) -> Html {
    let m = &p.messages;
    let (class, message) = match p.connection_state {
        ConnState::Uninitialized => ("is-uninitialized", &m.status_uninitialized),
        ConnState::Connecting => ("is-connecting", &m.status_connecting),
        ConnState::Connected => ("is-connected", &m.status_connected),
        ConnState::Disconnected => ("is-disconnected", &m.status_disconnected),
    };
    let busy = matches!(
        p.connection_state,
        ConnState::Uninitialized | ConnState::Connecting
    );

    html! {
        <div
            class={ classes!("connection-status", class, "d-flex", "align-items-center") }
            role="status"
        >
            if busy {
                <div class="spinner-border spinner-border-sm m-2"></div>
            } else {
                <div class="status-dot m-2"></div>
            }
            <div>{ message }</div>
        </div>
    }
}
