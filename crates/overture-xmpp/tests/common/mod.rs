//! Scripted transport shared by the negotiation integration tests.

use std::collections::VecDeque;
use std::str::FromStr;

use overture_xmpp::{Frame, NegotiationError, PropertyBag, StreamHeader, XmppTransport};
use xmpp_parsers::minidom::Element;

/// Transport that replays a fixed script of inbound frames and records
/// everything the steps do to it.
#[derive(Debug)]
pub struct ScriptedTransport {
    script: VecDeque<Frame>,
    pub sent: Vec<String>,
    pub tls_upgrades: u32,
    pub compression_methods: Vec<String>,
    pub parser_resets: u32,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Frame>) -> Self {
        Self {
            script: script.into(),
            sent: Vec::new(),
            tls_upgrades: 0,
            compression_methods: Vec::new(),
            parser_resets: 0,
        }
    }
}

impl XmppTransport for ScriptedTransport {
    async fn send(&mut self, payload: &[u8]) -> Result<(), NegotiationError> {
        self.sent
            .push(String::from_utf8_lossy(payload).into_owned());
        Ok(())
    }

    async fn receive(&mut self, context: &str) -> Result<Frame, NegotiationError> {
        self.script.pop_front().ok_or_else(|| {
            NegotiationError::transport(format!("script exhausted while waiting for {context}"))
        })
    }

    async fn upgrade_to_tls(&mut self, _properties: &PropertyBag) -> Result<(), NegotiationError> {
        self.tls_upgrades += 1;
        Ok(())
    }

    async fn enable_compression(
        &mut self,
        _properties: &PropertyBag,
        method: &str,
    ) -> Result<(), NegotiationError> {
        self.compression_methods.push(method.to_string());
        Ok(())
    }

    fn reset_parser(&mut self) {
        self.parser_resets += 1;
    }
}

pub fn element(xml: &str) -> Element {
    Element::from_str(xml).expect("failed to parse scripted XML")
}

pub fn stream_start(id: Option<&str>) -> Frame {
    Frame::StreamStart(header(id))
}

pub fn ws_open(id: Option<&str>) -> Frame {
    Frame::WsOpen(header(id))
}

fn header(id: Option<&str>) -> StreamHeader {
    StreamHeader {
        id: id.map(str::to_string),
        version: Some("1.0".to_string()),
        ..StreamHeader::default()
    }
}

pub fn classic_features(children: &str) -> Frame {
    Frame::StreamFeatures(element(&format!(
        "<stream:features xmlns:stream='http://etherx.jabber.org/streams'>{children}</stream:features>"
    )))
}

pub fn ws_features(children: &str) -> Frame {
    Frame::WsFeatures(element(&format!(
        "<stream:features xmlns:stream='http://etherx.jabber.org/streams'>{children}</stream:features>"
    )))
}

pub fn stanza(xml: &str) -> Frame {
    Frame::Stanza(element(xml))
}

pub const STARTTLS_FEATURE: &str = "<starttls xmlns='urn:ietf:params:xml:ns:xmpp-tls'/>";
pub const SM_FEATURE: &str = "<sm xmlns='urn:xmpp:sm:3'/>";
pub const BIND_FEATURE: &str = "<bind xmlns='urn:ietf:params:xml:ns:xmpp-bind'/>";
pub const SESSION_FEATURE: &str = "<session xmlns='urn:ietf:params:xml:ns:xmpp-session'/>";
pub const SASL_SUCCESS: &str = "<success xmlns='urn:ietf:params:xml:ns:xmpp-sasl'/>";

pub fn mechanisms_feature(names: &[&str]) -> String {
    let mechanisms: String = names
        .iter()
        .map(|name| format!("<mechanism>{name}</mechanism>"))
        .collect();
    format!("<mechanisms xmlns='urn:ietf:params:xml:ns:xmpp-sasl'>{mechanisms}</mechanisms>")
}

pub fn bind_result(jid: &str) -> Frame {
    stanza(&format!(
        "<iq xmlns='jabber:client' type='result' id='resource-bind'>\
            <bind xmlns='urn:ietf:params:xml:ns:xmpp-bind'>\
                <jid>{jid}</jid>\
            </bind>\
        </iq>"
    ))
}

pub fn iq_result(id: &str) -> Frame {
    stanza(&format!(
        "<iq xmlns='jabber:client' type='result' id='{id}'/>"
    ))
}
