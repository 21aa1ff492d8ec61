//! Stream lifecycle steps and their structural validators.

use tracing::debug;
use xmpp_parsers::minidom::Element;

use crate::error::NegotiationError;
use crate::features::FeatureSet;
use crate::properties::{PropertyKey, PropertyValue};
use crate::stanza::{self, ns};
use crate::step::StepState;
use crate::transport::{Frame, StreamHeader, Transport, XmppTransport};

const DEFAULT_SERVER: &str = "localhost";

/// Validate a stream-start reply against the active transport mode.
///
/// Non-legacy WebSocket connections must open with the `<open/>` frame and
/// nothing else; every other mode (including legacy WebSocket) must open
/// with a classic stream start.
pub fn assert_stream_start<'a>(
    frame: &'a Frame,
    transport: Transport,
    ws_legacy: bool,
) -> Result<&'a StreamHeader, NegotiationError> {
    match (frame, transport, ws_legacy) {
        (Frame::WsOpen(header), Transport::WebSocket, false) => Ok(header),
        (Frame::WsOpen(_), Transport::WebSocket, true) => Err(NegotiationError::structural(
            "a classic stream start (legacy websocket framing)",
            frame.describe(),
        )),
        (Frame::StreamStart(_), Transport::WebSocket, false) => Err(NegotiationError::structural(
            "a websocket <open/> frame",
            frame.describe(),
        )),
        (Frame::StreamStart(header), _, _) => Ok(header),
        _ => Err(NegotiationError::structural(
            "a stream start",
            frame.describe(),
        )),
    }
}

/// Validate a features reply against the active transport mode.
///
/// Structurally the same table as [`assert_stream_start`], with the bare
/// `<features/>` element taking the place of the `<open/>` frame.
pub fn assert_stream_features<'a>(
    frame: &'a Frame,
    transport: Transport,
    ws_legacy: bool,
) -> Result<&'a Element, NegotiationError> {
    match (frame, transport, ws_legacy) {
        (Frame::WsFeatures(element), Transport::WebSocket, false) => Ok(element),
        (Frame::WsFeatures(_), Transport::WebSocket, true) => Err(NegotiationError::structural(
            "a <stream:features/> element (legacy websocket framing)",
            frame.describe(),
        )),
        (Frame::StreamFeatures(_), Transport::WebSocket, false) => {
            Err(NegotiationError::structural(
                "a websocket <features/> element",
                frame.describe(),
            ))
        }
        (Frame::StreamFeatures(element), _, _) => Ok(element),
        _ => Err(NegotiationError::structural(
            "a features announcement",
            frame.describe(),
        )),
    }
}

/// Open the stream and record the server-announced stream id.
pub async fn start_stream<C: XmppTransport>(
    mut state: StepState<C>,
) -> Result<StepState<C>, NegotiationError> {
    let transport = state.properties.transport();
    let ws_legacy = state.properties.ws_legacy();
    let server = state
        .properties
        .text(&PropertyKey::Server)
        .unwrap_or(DEFAULT_SERVER)
        .to_string();

    let open = if transport == Transport::WebSocket && !ws_legacy {
        stanza::ws_open(&server)
    } else {
        let stream_ns = state
            .properties
            .text(&PropertyKey::StreamNs)
            .unwrap_or(ns::JABBER_CLIENT)
            .to_string();
        stanza::stream_open(&server, &stream_ns)
    };

    state.connection.send(&open).await?;
    let reply = state.connection.receive("stream start").await?;
    let header = assert_stream_start(&reply, transport, ws_legacy)?;

    let stream_id = header.id.clone();
    debug!(%transport, server = %server, stream_id = ?stream_id, "stream opened");
    if let Some(id) = stream_id {
        state
            .properties
            .set(PropertyKey::StreamId, PropertyValue::Text(id));
    }
    Ok(state)
}

/// Receive the features announcement and derive a fresh feature set.
pub async fn stream_features<C: XmppTransport>(
    mut state: StepState<C>,
) -> Result<StepState<C>, NegotiationError> {
    let reply = state.connection.receive("stream features").await?;
    let element = assert_stream_features(
        &reply,
        state.properties.transport(),
        state.properties.ws_legacy(),
    )?;
    state.features = FeatureSet::parse(element);
    debug!(
        starttls = state.features.starttls,
        mechanisms = ?state.features.sasl_mechanisms,
        "parsed stream features"
    );
    Ok(state)
}

/// Restart the stream after a transport transform or authentication:
/// reset the parser, reopen the stream, rediscover features. Any step that
/// changes the transport's security or framing must come through here
/// before any other step runs.
pub(crate) async fn restart<C: XmppTransport>(
    mut state: StepState<C>,
) -> Result<StepState<C>, NegotiationError> {
    state.connection.reset_parser();
    let state = start_stream(state).await?;
    stream_features(state).await
}
