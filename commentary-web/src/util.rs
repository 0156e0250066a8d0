use std::str::FromStr;

use commentary_client::api::Time;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(inline_js = "
    export function get_timezone() {
        return Intl.DateTimeFormat().resolvedOptions().timeZone;
    }
    export function get_service_url() {
        const c = window.commentaryConfig;
        return c && c.url ? String(c.url) : undefined;
    }
    export function get_service_key() {
        const c = window.commentaryConfig;
        return c && c.key ? String(c.key) : undefined;
    }
")]
extern "C" {
    fn get_timezone() -> String;
    fn get_service_url() -> Option<String>;
    fn get_service_key() -> Option<String>;
}

lazy_static::lazy_static! {
    static ref LOCAL_TZ: chrono_tz::Tz = {
        let name = get_timezone();
        chrono_tz::Tz::from_str(&name).unwrap_or_else(|err| {
            tracing::warn!(%err, name, "host js timezone is not in chrono-tz database, using UTC");
            chrono_tz::UTC
        })
    };
}

pub fn local_tz() -> chrono_tz::Tz {
    *LOCAL_TZ
}

pub fn format_time(t: Time) -> String {
    t.with_timezone(&local_tz())
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

/// Service URL and anonymous key, set by the embedding page as `window.commentaryConfig` or
/// baked in at build time
///
/// Returns None until the page bootstrap has run.
pub fn service_config() -> Option<(String, String)> {
    let url = get_service_url().or_else(|| option_env!("COMMENTARY_URL").map(String::from))?;
    let key = get_service_key().or_else(|| option_env!("COMMENTARY_KEY").map(String::from))?;
    Some((url, key))
}

pub fn browser_language() -> String {
    web_sys::window()
        .and_then(|w| w.navigator().language())
        .unwrap_or_default()
}

pub fn browser_online() -> bool {
    web_sys::window()
        .map(|w| w.navigator().on_line())
        .unwrap_or(true)
}
