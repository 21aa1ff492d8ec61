//! Transport collaborator contract and the wire frames it delivers.

use std::future::Future;

use serde::{Deserialize, Serialize};
use xmpp_parsers::minidom::Element;

use crate::error::NegotiationError;
use crate::properties::PropertyBag;

/// Transport binding carrying the XML stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transport {
    /// Plain TCP (RFC 6120 framing).
    Tcp,
    /// WebSocket (RFC 7395 framing, unless legacy mode is set).
    WebSocket,
    /// BOSH (XEP-0124).
    Bosh,
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transport::Tcp => write!(f, "tcp"),
            Transport::WebSocket => write!(f, "ws"),
            Transport::Bosh => write!(f, "bosh"),
        }
    }
}

/// Attributes of a stream open announced by the server.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamHeader {
    /// The 'to' attribute (target domain)
    pub to: Option<String>,
    /// The 'from' attribute (source domain)
    pub from: Option<String>,
    /// The 'id' attribute (stream id, set by the server)
    pub id: Option<String>,
    /// The 'version' attribute (should be "1.0")
    pub version: Option<String>,
    /// The 'xml:lang' attribute
    pub lang: Option<String>,
}

/// One parsed unit received from the transport.
///
/// Stream opens are not well-formed standalone XML, so the transport's
/// parser surfaces them as header frames rather than elements; everything
/// that is a complete element arrives as such. The features frames keep the
/// distinction between the prefixed `<stream:features>` of classic framing
/// and the bare `<features>` of the WebSocket binding, which the validators
/// need.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Classic `<stream:stream>` open.
    StreamStart(StreamHeader),
    /// WebSocket `<open/>` frame.
    WsOpen(StreamHeader),
    /// Classic `<stream:features>` announcement.
    StreamFeatures(Element),
    /// WebSocket `<features>` announcement.
    WsFeatures(Element),
    /// Any other complete element.
    Stanza(Element),
}

impl Frame {
    /// Short description for structural-violation diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Frame::StreamStart(_) => "a classic stream start".to_string(),
            Frame::WsOpen(_) => "a websocket <open/> frame".to_string(),
            Frame::StreamFeatures(_) => "a <stream:features/> element".to_string(),
            Frame::WsFeatures(_) => "a websocket <features/> element".to_string(),
            Frame::Stanza(element) => format!("a <{}/> stanza", element.name()),
        }
    }

    /// Unwrap an ordinary stanza, or fail structurally.
    pub fn into_stanza(self, expected: &str) -> Result<Element, NegotiationError> {
        match self {
            Frame::Stanza(element) => Ok(element),
            other => Err(NegotiationError::structural(expected, other.describe())),
        }
    }
}

/// Session transport as seen by the negotiation steps.
///
/// Implementations own the socket, the TLS/compression transforms and the
/// incremental XML parser; the steps only exchange payloads and frames.
/// `receive` is deadline-bound: it resolves with a frame or fails with
/// [`NegotiationError::Timeout`] / [`NegotiationError::TransportFailure`]
/// within the implementation's configured deadline.
///
/// `upgrade_to_tls` and `enable_compression` perform the in-band exchange
/// and swap the underlying socket or codec in place; they must not reopen
/// the stream. The calling step restarts the stream and re-runs feature
/// discovery afterwards.
pub trait XmppTransport: Send {
    /// Write one outbound payload.
    fn send(&mut self, payload: &[u8]) -> impl Future<Output = Result<(), NegotiationError>> + Send;

    /// Await the next frame. `context` labels the exchange for diagnostics.
    fn receive(
        &mut self,
        context: &str,
    ) -> impl Future<Output = Result<Frame, NegotiationError>> + Send;

    /// Perform the StartTLS exchange and wrap the connection.
    fn upgrade_to_tls(
        &mut self,
        properties: &PropertyBag,
    ) -> impl Future<Output = Result<(), NegotiationError>> + Send;

    /// Perform the compression exchange epilogue and wrap the codec.
    fn enable_compression(
        &mut self,
        properties: &PropertyBag,
        method: &str,
    ) -> impl Future<Output = Result<(), NegotiationError>> + Send;

    /// Drop buffered parser state ahead of a stream restart.
    fn reset_parser(&mut self);
}
