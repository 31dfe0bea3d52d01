//! Realtime change notifications.
//!
//! The realtime service speaks the Phoenix channel protocol over a
//! websocket: a channel is joined with the list of table filters it cares
//! about, kept alive with heartbeats, and then receives one
//! `postgres_changes` frame per matching row change.

use std::cell::Cell;
use std::rc::Rc;

use futures::channel::mpsc;
use futures::future::{AbortHandle, abortable};
use futures::{SinkExt, StreamExt};
use gloo_net::websocket::Message;
use gloo_net::websocket::futures::WebSocket;
use gloo_timers::callback::Interval;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{DbError, Result};

/// Milliseconds between heartbeats; the server drops silent sockets after 60s.
pub const HEARTBEAT_INTERVAL_MS: u32 = 25_000;

const PHOENIX_TOPIC: &str = "phoenix";

/// One frame of the Phoenix channel protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhoenixFrame {
    pub topic: String,
    pub event: String,
    pub payload: Value,
    /// Message reference, echoed back in replies
    #[serde(rename = "ref", default)]
    pub msg_ref: Option<String>,
    /// Reference of the join that opened the channel
    #[serde(default)]
    pub join_ref: Option<String>,
}

impl PhoenixFrame {
    /// Heartbeat keeping the socket alive.
    pub fn heartbeat(msg_ref: String) -> Self {
        Self {
            topic: PHOENIX_TOPIC.to_string(),
            event: "heartbeat".to_string(),
            payload: json!({}),
            msg_ref: Some(msg_ref),
            join_ref: None,
        }
    }

    /// Serialize for the wire.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Which row changes a filter matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    #[serde(rename = "*")]
    All,
    #[serde(rename = "INSERT")]
    Insert,
    #[serde(rename = "UPDATE")]
    Update,
    #[serde(rename = "DELETE")]
    Delete,
}

/// Kind of a single row change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeType {
    Insert,
    Update,
    Delete,
}

/// Table changes a channel subscribes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeFilter {
    pub event: ChangeKind,
    pub schema: String,
    pub table: String,
}

impl ChangeFilter {
    /// Every insert, update and delete on a table.
    pub fn all(schema: &str, table: &str) -> Self {
        Self::new(ChangeKind::All, schema, table)
    }

    pub fn new(event: ChangeKind, schema: &str, table: &str) -> Self {
        Self {
            event,
            schema: schema.to_string(),
            table: table.to_string(),
        }
    }
}

/// A row change pushed by the realtime service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PostgresChange {
    pub schema: String,
    pub table: String,
    #[serde(rename = "type")]
    pub change: ChangeType,
    #[serde(default)]
    pub commit_timestamp: Option<String>,
    /// New row contents (empty for deletes)
    #[serde(default)]
    pub record: Option<Value>,
    /// Previous row contents, as far as the table's replica identity allows
    #[serde(default)]
    pub old_record: Option<Value>,
}

/// A decoded server frame.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// A row changed
    Change(PostgresChange),
    /// The server acknowledged a join or heartbeat
    Ack,
    /// The server refused a request
    Rejected(String),
    /// The channel crashed server-side
    ChannelError,
    /// The channel was closed server-side
    Closed,
    /// Presence, broadcast and system frames the sidebar has no use for
    Other(String),
}

#[derive(Debug, Deserialize)]
struct ChangePayload {
    data: PostgresChange,
}

#[derive(Debug, Deserialize)]
struct SystemPayload {
    status: String,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReplyPayload {
    status: String,
    #[serde(default)]
    response: Value,
}

/// Decode one text frame from the socket.
pub fn decode_frame(text: &str) -> Result<ServerEvent> {
    let frame: PhoenixFrame = serde_json::from_str(text)?;

    let event = match frame.event.as_str() {
        "postgres_changes" => {
            let payload: ChangePayload = serde_json::from_value(frame.payload)?;
            ServerEvent::Change(payload.data)
        }
        "phx_reply" => {
            let reply: ReplyPayload = serde_json::from_value(frame.payload)?;
            if reply.status == "ok" {
                ServerEvent::Ack
            } else {
                let reason = reply
                    .response
                    .get("reason")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| reply.status.clone());
                ServerEvent::Rejected(reason)
            }
        }
        "system" => {
            let system: SystemPayload = serde_json::from_value(frame.payload)?;
            if system.status == "error" {
                ServerEvent::Rejected(system.message.unwrap_or(system.status))
            } else {
                ServerEvent::Other(frame.event)
            }
        }
        "phx_error" => ServerEvent::ChannelError,
        "phx_close" => ServerEvent::Closed,
        other => ServerEvent::Other(other.to_string()),
    };

    Ok(event)
}

/// Monotonic message references shared by one socket.
#[derive(Debug, Clone, Default)]
struct RefCounter(Rc<Cell<u64>>);

impl RefCounter {
    fn next(&self) -> String {
        let value = self.0.get() + 1;
        self.0.set(value);
        value.to_string()
    }
}

/// A named realtime channel, not yet connected.
#[derive(Debug, Clone)]
pub struct RealtimeChannel {
    socket_url: String,
    access_token: String,
    name: String,
    filters: Vec<ChangeFilter>,
}

impl RealtimeChannel {
    pub(crate) fn new(socket_url: String, access_token: String, name: &str) -> Self {
        Self {
            socket_url,
            access_token,
            name: name.to_string(),
            filters: Vec::new(),
        }
    }

    /// Listen for row changes matching a filter.
    pub fn on_postgres_changes(mut self, filter: ChangeFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Topic the channel joins.
    pub fn topic(&self) -> String {
        format!("realtime:{}", self.name)
    }

    pub fn filters(&self) -> &[ChangeFilter] {
        &self.filters
    }

    /// Frame joining the channel with the registered filters.
    pub fn join_frame(&self, join_ref: String) -> PhoenixFrame {
        PhoenixFrame {
            topic: self.topic(),
            event: "phx_join".to_string(),
            payload: json!({
                "config": {
                    "broadcast": { "ack": false, "self": false },
                    "presence": { "key": "" },
                    "postgres_changes": self.filters,
                    "private": false,
                },
                "access_token": self.access_token,
            }),
            msg_ref: Some(join_ref.clone()),
            join_ref: Some(join_ref),
        }
    }

    /// Frame leaving the channel.
    pub fn leave_frame(&self, msg_ref: String, join_ref: String) -> PhoenixFrame {
        PhoenixFrame {
            topic: self.topic(),
            event: "phx_leave".to_string(),
            payload: json!({}),
            msg_ref: Some(msg_ref),
            join_ref: Some(join_ref),
        }
    }

    /// Connect, join, and call `on_change` for every matching row change.
    ///
    /// The connection lives as long as the returned [`Subscription`].
    pub fn subscribe<F>(self, on_change: F) -> Result<Subscription>
    where
        F: Fn(PostgresChange) + 'static,
    {
        let socket =
            WebSocket::open(&self.socket_url).map_err(|e| DbError::Realtime(e.to_string()))?;
        let (mut sink, mut stream) = socket.split();
        let (outbound, mut queue) = mpsc::unbounded::<Outbound>();
        let refs = RefCounter::default();

        let join_ref = refs.next();
        let join = self.join_frame(join_ref.clone()).encode()?;
        outbound
            .unbounded_send(Outbound::Frame(join))
            .map_err(|e| DbError::Realtime(e.to_string()))?;
        tracing::debug!(topic = %self.topic(), filters = self.filters.len(), "joining channel");

        // Writer: drains the outbound queue until asked to close.
        wasm_bindgen_futures::spawn_local(async move {
            while let Some(item) = queue.next().await {
                match item {
                    Outbound::Frame(text) => {
                        if let Err(e) = sink.send(Message::Text(text)).await {
                            tracing::warn!(error = %e, "realtime send failed");
                            break;
                        }
                    }
                    Outbound::Close => {
                        let _ = sink.close().await;
                        break;
                    }
                }
            }
        });

        let topic = self.topic();
        let (reader, reader_handle) = abortable(async move {
            while let Some(message) = stream.next().await {
                let text = match message {
                    Ok(Message::Text(text)) => text,
                    Ok(Message::Bytes(_)) => continue,
                    Err(e) => {
                        tracing::warn!(%topic, error = %e, "realtime socket closed");
                        break;
                    }
                };

                match decode_frame(&text) {
                    Ok(ServerEvent::Change(change)) => {
                        tracing::debug!(%topic, table = %change.table, change = ?change.change, "row changed");
                        on_change(change);
                    }
                    Ok(ServerEvent::Rejected(reason)) => {
                        tracing::warn!(%topic, %reason, "realtime request rejected");
                    }
                    Ok(ServerEvent::ChannelError) => {
                        tracing::warn!(%topic, "realtime channel errored");
                    }
                    Ok(ServerEvent::Closed) => {
                        tracing::debug!(%topic, "realtime channel closed");
                        break;
                    }
                    Ok(ServerEvent::Ack) | Ok(ServerEvent::Other(_)) => {}
                    Err(e) => {
                        tracing::warn!(%topic, error = %e, "undecodable realtime frame");
                    }
                }
            }
        });
        wasm_bindgen_futures::spawn_local(async move {
            let _ = reader.await;
        });

        let heartbeat = {
            let outbound = outbound.clone();
            let refs = refs.clone();
            Interval::new(HEARTBEAT_INTERVAL_MS, move || {
                match PhoenixFrame::heartbeat(refs.next()).encode() {
                    Ok(text) => {
                        let _ = outbound.unbounded_send(Outbound::Frame(text));
                    }
                    Err(e) => tracing::warn!(error = %e, "heartbeat encoding failed"),
                }
            })
        };

        Ok(Subscription {
            channel: self,
            join_ref,
            refs,
            outbound,
            reader: reader_handle,
            _heartbeat: Some(heartbeat),
        })
    }
}

/// Work queued for the socket writer.
#[derive(Debug, Clone, PartialEq)]
enum Outbound {
    Frame(String),
    Close,
}

/// A live channel subscription.
///
/// Dropping it leaves the channel, closes the socket and stops the
/// heartbeat.
pub struct Subscription {
    channel: RealtimeChannel,
    join_ref: String,
    refs: RefCounter,
    outbound: mpsc::UnboundedSender<Outbound>,
    reader: AbortHandle,
    /// Cancelled on drop
    _heartbeat: Option<Interval>,
}

impl Subscription {
    /// Topic of the joined channel.
    pub fn topic(&self) -> String {
        self.channel.topic()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let leave = self
            .channel
            .leave_frame(self.refs.next(), self.join_ref.clone());
        if let Ok(text) = leave.encode() {
            let _ = self.outbound.unbounded_send(Outbound::Frame(text));
        }
        let _ = self.outbound.unbounded_send(Outbound::Close);
        self.reader.abort();
        tracing::debug!(topic = %self.channel.topic(), "left channel");
    }
}
