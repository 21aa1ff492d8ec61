//! Outbound payload builders shared by the negotiation steps.

use xmpp_parsers::minidom::Element;

use crate::error::NegotiationError;

/// XMPP namespaces used during negotiation.
pub mod ns {
    /// XMPP client namespace
    pub const JABBER_CLIENT: &str = "jabber:client";
    /// XMPP streams namespace
    pub const STREAM: &str = "http://etherx.jabber.org/streams";
    /// WebSocket framing namespace
    pub const FRAMING: &str = "urn:ietf:params:xml:ns:xmpp-framing";
    /// STARTTLS namespace
    pub const TLS: &str = "urn:ietf:params:xml:ns:xmpp-tls";
    /// SASL namespace
    pub const SASL: &str = "urn:ietf:params:xml:ns:xmpp-sasl";
    /// Resource binding namespace
    pub const BIND: &str = "urn:ietf:params:xml:ns:xmpp-bind";
    /// Session namespace
    pub const SESSION: &str = "urn:ietf:params:xml:ns:xmpp-session";
    /// Stream compression namespace
    pub const COMPRESS: &str = "http://jabber.org/protocol/compress";
    /// Stream management namespace
    pub const SM: &str = "urn:xmpp:sm:3";
    /// Message carbons namespace
    pub const CARBONS: &str = "urn:xmpp:carbons:2";
}

/// Classic stream open for TCP, BOSH and legacy WebSocket connections.
///
/// Deliberately not an [`Element`]: the open tag stays unclosed until the
/// session ends.
pub fn stream_open(server: &str, stream_ns: &str) -> Vec<u8> {
    format!(
        "<?xml version='1.0'?>\
        <stream:stream to='{server}' version='1.0' \
        xmlns='{stream_ns}' \
        xmlns:stream='{}'>",
        ns::STREAM
    )
    .into_bytes()
}

/// WebSocket `<open/>` frame (RFC 7395).
pub fn ws_open(server: &str) -> Vec<u8> {
    format!(
        "<open xmlns='{}' to='{server}' version='1.0'/>",
        ns::FRAMING
    )
    .into_bytes()
}

/// Compression activation request (XEP-0138).
pub fn compress_request(method: &str) -> Vec<u8> {
    format!(
        "<compress xmlns='{}'><method>{method}</method></compress>",
        ns::COMPRESS
    )
    .into_bytes()
}

/// Serialize a complete element for sending.
pub fn element_to_bytes(element: &Element) -> Result<Vec<u8>, NegotiationError> {
    let mut payload = Vec::new();
    element.write_to(&mut payload).map_err(|error| {
        NegotiationError::transport(format!("failed to serialize outbound stanza: {error}"))
    })?;
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classic_open_carries_both_namespaces() {
        let open = String::from_utf8(stream_open("example.com", ns::JABBER_CLIENT)).unwrap();
        assert!(open.starts_with("<?xml version='1.0'?>"));
        assert!(open.contains("to='example.com'"));
        assert!(open.contains("xmlns='jabber:client'"));
        assert!(open.contains("xmlns:stream='http://etherx.jabber.org/streams'"));
        assert!(!open.ends_with("/>"));
    }

    #[test]
    fn ws_open_is_a_self_contained_frame() {
        let open = String::from_utf8(ws_open("example.com")).unwrap();
        assert!(open.contains("xmlns='urn:ietf:params:xml:ns:xmpp-framing'"));
        assert!(open.contains("to='example.com'"));
        assert!(open.ends_with("/>"));
    }

    #[test]
    fn compress_request_names_the_method() {
        let request = String::from_utf8(compress_request("zlib")).unwrap();
        assert!(request.contains("<method>zlib</method>"));
        assert!(request.contains("http://jabber.org/protocol/compress"));
    }
}
