//! Parsed server feature announcements.

use std::collections::BTreeMap;

use xmpp_parsers::minidom::Element;

use crate::properties::PropertyKey;

/// Capabilities advertised by one features announcement.
///
/// A feature set is always derived fresh from exactly one announcement and
/// superseded whenever the stream restarts (StartTLS, compression,
/// post-authentication); it is never merged with a predecessor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureSet {
    /// Offered compression methods, in announcement order; `None` when the
    /// server does not advertise compression at all.
    pub compression: Option<Vec<String>>,
    /// Whether StartTLS is offered.
    pub starttls: bool,
    /// Whether stream management is offered.
    pub stream_management: bool,
    /// Whether advanced message processing is offered.
    pub advanced_message_processing: bool,
    /// Whether client state indication is offered.
    pub client_state_indication: bool,
    /// Advertised SASL mechanism names, in announcement order.
    pub sasl_mechanisms: Vec<String>,
    /// Entity-capabilities attributes, when a capabilities child is present.
    pub caps: Option<BTreeMap<String, String>>,
}

impl FeatureSet {
    /// Parse one features announcement.
    ///
    /// Each capability is extracted independently; presence checks go by
    /// child name regardless of content, and nothing is cross-validated.
    pub fn parse(features: &Element) -> Self {
        let compression = child_by_name(features, "compression").map(|compression| {
            compression
                .children()
                .filter(|child| child.name() == "method")
                .map(|method| method.text())
                .collect()
        });

        let sasl_mechanisms = child_by_name(features, "mechanisms")
            .map(|mechanisms| {
                mechanisms
                    .children()
                    .filter(|child| child.name() == "mechanism")
                    .map(|mechanism| mechanism.text())
                    .collect()
            })
            .unwrap_or_default();

        let caps = child_by_name(features, "c").map(|caps| {
            caps.attrs()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect()
        });

        Self {
            compression,
            starttls: child_by_name(features, "starttls").is_some(),
            stream_management: child_by_name(features, "sm").is_some(),
            advanced_message_processing: child_by_name(features, "amp").is_some(),
            client_state_indication: child_by_name(features, "csi").is_some(),
            sasl_mechanisms,
            caps,
        }
    }

    /// Whether the server advertises the capability a bag key opts in to.
    ///
    /// Keys without a corresponding advertisement always read as false.
    pub fn advertises(&self, key: &PropertyKey) -> bool {
        match key {
            PropertyKey::Compression => self.compression.is_some(),
            PropertyKey::StreamManagement | PropertyKey::StreamResumption => {
                self.stream_management
            }
            PropertyKey::StartTls => self.starttls,
            _ => false,
        }
    }
}

fn child_by_name<'a>(element: &'a Element, name: &str) -> Option<&'a Element> {
    element.children().find(|child| child.name() == name)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn parse_features(xml: &str) -> FeatureSet {
        let element = Element::from_str(xml).expect("failed to parse features XML");
        FeatureSet::parse(&element)
    }

    #[test]
    fn parses_a_typical_pre_auth_announcement() {
        let features = parse_features(
            "<stream:features xmlns:stream='http://etherx.jabber.org/streams'>\
                <starttls xmlns='urn:ietf:params:xml:ns:xmpp-tls'/>\
                <compression xmlns='http://jabber.org/features/compress'>\
                    <method>zlib</method>\
                </compression>\
                <mechanisms xmlns='urn:ietf:params:xml:ns:xmpp-sasl'>\
                    <mechanism>PLAIN</mechanism>\
                    <mechanism>SCRAM-SHA-1</mechanism>\
                </mechanisms>\
            </stream:features>",
        );

        assert!(features.starttls);
        assert_eq!(features.compression, Some(vec!["zlib".to_string()]));
        assert_eq!(
            features.sasl_mechanisms,
            vec!["PLAIN".to_string(), "SCRAM-SHA-1".to_string()]
        );
        assert!(!features.stream_management);
        assert!(!features.advanced_message_processing);
        assert!(!features.client_state_indication);
        assert_eq!(features.caps, None);
    }

    #[test]
    fn an_empty_announcement_yields_the_empty_set() {
        let features = parse_features(
            "<stream:features xmlns:stream='http://etherx.jabber.org/streams'/>",
        );
        assert_eq!(features, FeatureSet::default());
    }

    #[test]
    fn presence_flags_ignore_child_content() {
        let features = parse_features(
            "<stream:features xmlns:stream='http://etherx.jabber.org/streams'>\
                <sm xmlns='urn:xmpp:sm:3'><optional/></sm>\
                <amp xmlns='http://jabber.org/features/amp'/>\
                <csi xmlns='urn:xmpp:csi:0'/>\
            </stream:features>",
        );

        assert!(features.stream_management);
        assert!(features.advanced_message_processing);
        assert!(features.client_state_indication);
        assert!(!features.starttls);
    }

    #[test]
    fn caps_become_an_attribute_map() {
        let features = parse_features(
            "<stream:features xmlns:stream='http://etherx.jabber.org/streams'>\
                <c xmlns='http://jabber.org/protocol/caps' \
                   hash='sha-1' node='https://example.org' ver='dU9LC='/>\
            </stream:features>",
        );

        let caps = features.caps.expect("expected a caps map");
        assert_eq!(caps.get("hash").map(String::as_str), Some("sha-1"));
        assert_eq!(
            caps.get("node").map(String::as_str),
            Some("https://example.org")
        );
        assert_eq!(caps.get("ver").map(String::as_str), Some("dU9LC="));
    }

    #[test]
    fn compression_without_methods_is_still_advertised() {
        let features = parse_features(
            "<stream:features xmlns:stream='http://etherx.jabber.org/streams'>\
                <compression xmlns='http://jabber.org/features/compress'/>\
            </stream:features>",
        );
        assert_eq!(features.compression, Some(Vec::new()));
        assert!(features.advertises(&PropertyKey::Compression));
    }

    #[test]
    fn advertises_maps_resumption_onto_stream_management() {
        let features = parse_features(
            "<stream:features xmlns:stream='http://etherx.jabber.org/streams'>\
                <sm xmlns='urn:xmpp:sm:3'/>\
            </stream:features>",
        );
        assert!(features.advertises(&PropertyKey::StreamManagement));
        assert!(features.advertises(&PropertyKey::StreamResumption));
        assert!(!features.advertises(&PropertyKey::Carbons));
    }
}
