//! Server event stream over the browser `EventSource`.
//!
//! `EventSource` cannot send custom headers, so the working directory goes
//! in a `directory` query parameter instead of the directory header.
//! The browser retries a broken connection on its own; here every error
//! ends the stream instead, and the subscriber decides when to reopen.

use futures::stream::{self, StreamExt};
use gloo_net::eventsource::futures::EventSource;
use gloo_net::eventsource::EventSourceError;
use serde_json::Value;
use web_sys::MessageEvent;

use tether_core::ports::EventStream;
use tether_types::{ClientError, Result};

/// URL of the event endpoint, scoped to `directory` when one is given.
pub fn event_stream_url(base_url: &str, directory: Option<&str>) -> String {
    match directory {
        Some(dir) => format!(
            "{}/event?directory={}",
            base_url,
            String::from(js_sys::encode_uri_component(dir))
        ),
        None => format!("{}/event", base_url),
    }
}

/// Open the stream. Opening errors surface as a single `Err` item so the
/// caller goes through its normal reconnect path.
pub fn open(base_url: &str, directory: Option<&str>) -> EventStream {
    let url = event_stream_url(base_url, directory);
    log::debug!("Opening event stream {}", url);

    let mut source = match EventSource::new(&url) {
        Ok(source) => source,
        Err(e) => return failed(format!("{}: {:?}", url, e)),
    };
    let messages = match source.subscribe("message") {
        Ok(messages) => messages,
        Err(e) => return failed(format!("{}: {:?}", url, e)),
    };

    // The closure owns the source; dropping the stream closes the connection.
    Box::pin(messages.map(move |item| {
        let _ = &source;
        decode(item)
    }))
}

fn failed(message: String) -> EventStream {
    Box::pin(stream::once(async move {
        Err(ClientError::EventStream(message))
    }))
}

fn decode(item: std::result::Result<(String, MessageEvent), EventSourceError>) -> Result<Value> {
    let (_, event) = item.map_err(|e| ClientError::EventStream(format!("{:?}", e)))?;
    let data = event
        .data()
        .as_string()
        .ok_or_else(|| ClientError::EventStream("non-text event data".to_string()))?;
    match serde_json::from_str(&data) {
        Ok(value) => Ok(value),
        Err(e) => {
            // Null normalizes to nothing and is dropped.
            log::debug!("Unparseable event ignored: {}", e);
            Ok(Value::Null)
        }
    }
}
