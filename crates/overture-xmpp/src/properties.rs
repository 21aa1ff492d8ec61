//! The ordered property bag threaded through every negotiation step.

use serde::{Deserialize, Serialize};

use crate::transport::Transport;

/// Client policy for an optional capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UsePolicy {
    /// The capability must be negotiated; a server that does not offer it
    /// aborts the pipeline.
    Required,
    /// Use the capability when the server offers it, continue without it
    /// otherwise.
    Optional,
    /// Never negotiate the capability, even when offered.
    Never,
}

/// Known configuration and negotiation-state keys.
///
/// `Custom` is the extension slot for keys this crate does not interpret
/// itself; everything else is typed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    /// Target server domain.
    Server,
    /// Namespace used on the classic stream open (defaults to `jabber:client`).
    StreamNs,
    /// Transport binding in use.
    Transport,
    /// Whether a WebSocket connection uses legacy stream framing.
    WsLegacy,
    /// Requested resource for binding.
    Resource,
    /// SASL mechanism to authenticate with.
    Auth,
    /// Mechanism that actually authenticated the session.
    AuthMethod,
    /// Authentication identity; rewritten after anonymous binding.
    Username,
    /// Authentication secret.
    Password,
    /// Opt-in to stream compression; a textual value pins the method.
    Compression,
    /// Opt-in to message carbons.
    Carbons,
    /// StartTLS policy.
    StartTls,
    /// Opt-in to stream management.
    StreamManagement,
    /// Opt-in to stream management with resumption.
    StreamResumption,
    /// Stream id announced by the server on the last stream open.
    StreamId,
    /// Resumption id handed out by the server.
    SmId,
    /// Extension slot for caller-defined keys.
    Custom(String),
}

/// Value stored under a [`PropertyKey`].
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Text(String),
    Flag(bool),
    Policy(UsePolicy),
    Transport(Transport),
}

impl PropertyValue {
    /// `false` under the negotiation opt-in rules; everything else opts in.
    fn is_truthy(&self) -> bool {
        !matches!(
            self,
            PropertyValue::Flag(false) | PropertyValue::Policy(UsePolicy::Never)
        )
    }
}

/// Ordered key/value carrier for connection parameters and state
/// accumulated during negotiation.
///
/// Updating an existing key replaces its value in place; setting a new key
/// appends it. The relative order of all other keys never changes. Bags are
/// plain values: each step receives one and returns one, so concurrent
/// pipelines share nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyBag {
    entries: Vec<(PropertyKey, PropertyValue)>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert-or-replace under the update law: an existing key keeps its
    /// position and only its value changes; an absent key is appended.
    pub fn set(&mut self, key: PropertyKey, value: PropertyValue) {
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, key: PropertyKey, value: PropertyValue) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &PropertyKey) -> Option<&PropertyValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    /// The textual value under `key`, if it holds one.
    pub fn text(&self, key: &PropertyKey) -> Option<&str> {
        match self.get(key) {
            Some(PropertyValue::Text(value)) => Some(value),
            _ => None,
        }
    }

    /// The boolean value under `key`; absent or non-boolean counts as false.
    pub fn flag(&self, key: &PropertyKey) -> bool {
        matches!(self.get(key), Some(PropertyValue::Flag(true)))
    }

    /// The tri-state policy under `key`; anything but an explicit policy
    /// value counts as [`UsePolicy::Never`].
    pub fn policy(&self, key: &PropertyKey) -> UsePolicy {
        match self.get(key) {
            Some(PropertyValue::Policy(policy)) => *policy,
            _ => UsePolicy::Never,
        }
    }

    /// Whether the bag explicitly opts in to a feature: the key is present
    /// with a non-`false` value. A missing key counts as `false`.
    pub fn opted_in(&self, key: &PropertyKey) -> bool {
        self.get(key).is_some_and(PropertyValue::is_truthy)
    }

    /// The transport binding, defaulting to plain TCP.
    pub fn transport(&self) -> Transport {
        match self.get(&PropertyKey::Transport) {
            Some(PropertyValue::Transport(transport)) => *transport,
            _ => Transport::Tcp,
        }
    }

    /// Whether a WebSocket connection uses legacy stream framing.
    pub fn ws_legacy(&self) -> bool {
        self.flag(&PropertyKey::WsLegacy)
    }

    pub fn keys(&self) -> impl Iterator<Item = &PropertyKey> {
        self.entries.iter().map(|(key, _)| key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bag() -> PropertyBag {
        PropertyBag::new()
            .with(
                PropertyKey::Server,
                PropertyValue::Text("example.com".to_string()),
            )
            .with(
                PropertyKey::Resource,
                PropertyValue::Text("tablet".to_string()),
            )
            .with(PropertyKey::Carbons, PropertyValue::Flag(true))
    }

    #[test]
    fn updating_an_existing_key_preserves_its_position() {
        let mut bag = sample_bag();
        bag.set(
            PropertyKey::Resource,
            PropertyValue::Text("phone".to_string()),
        );

        let keys: Vec<_> = bag.keys().cloned().collect();
        assert_eq!(
            keys,
            vec![
                PropertyKey::Server,
                PropertyKey::Resource,
                PropertyKey::Carbons
            ]
        );
        assert_eq!(bag.text(&PropertyKey::Resource), Some("phone"));
        assert_eq!(bag.len(), 3);
    }

    #[test]
    fn setting_a_new_key_appends_it() {
        let mut bag = sample_bag();
        bag.set(
            PropertyKey::StreamId,
            PropertyValue::Text("abc123".to_string()),
        );

        assert_eq!(bag.len(), 4);
        assert_eq!(bag.keys().last(), Some(&PropertyKey::StreamId));
    }

    #[test]
    fn repeating_the_same_update_is_idempotent() {
        let mut once = sample_bag();
        once.set(
            PropertyKey::StreamId,
            PropertyValue::Text("abc123".to_string()),
        );

        let mut twice = sample_bag();
        twice.set(
            PropertyKey::StreamId,
            PropertyValue::Text("abc123".to_string()),
        );
        twice.set(
            PropertyKey::StreamId,
            PropertyValue::Text("abc123".to_string()),
        );

        assert_eq!(once, twice);
    }

    #[test]
    fn opt_in_requires_a_present_truthy_value() {
        let bag = sample_bag()
            .with(PropertyKey::Compression, PropertyValue::Flag(false))
            .with(
                PropertyKey::StartTls,
                PropertyValue::Policy(UsePolicy::Never),
            );

        assert!(bag.opted_in(&PropertyKey::Carbons));
        assert!(!bag.opted_in(&PropertyKey::Compression));
        assert!(!bag.opted_in(&PropertyKey::StartTls));
        assert!(!bag.opted_in(&PropertyKey::StreamManagement));
    }

    #[test]
    fn policy_defaults_to_never_when_absent() {
        let bag = PropertyBag::new();
        assert_eq!(bag.policy(&PropertyKey::StartTls), UsePolicy::Never);
    }

    #[test]
    fn transport_defaults_to_tcp() {
        let bag = PropertyBag::new();
        assert_eq!(bag.transport(), Transport::Tcp);
        assert!(!bag.ws_legacy());
    }

    #[test]
    fn custom_keys_round_trip() {
        let mut bag = PropertyBag::new();
        bag.set(
            PropertyKey::Custom("deployment".to_string()),
            PropertyValue::Text("staging".to_string()),
        );
        assert_eq!(
            bag.text(&PropertyKey::Custom("deployment".to_string())),
            Some("staging")
        );
    }
}
