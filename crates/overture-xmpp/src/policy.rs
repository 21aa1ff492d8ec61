//! Decision rules for optional feature negotiation.

use crate::error::NegotiationError;
use crate::features::FeatureSet;
use crate::properties::{PropertyBag, PropertyKey, UsePolicy};

/// Decide whether to negotiate StartTLS from client intent and server offer.
///
/// A `Required` intent against a server that does not offer StartTLS is a
/// policy violation, not a quiet downgrade.
pub fn use_ssl(
    properties: &PropertyBag,
    features: &FeatureSet,
) -> Result<bool, NegotiationError> {
    match (properties.policy(&PropertyKey::StartTls), features.starttls) {
        (UsePolicy::Required, true) => Ok(true),
        (UsePolicy::Required, false) => Err(NegotiationError::unavailable(
            "client requires starttls but the server does not advertise it",
        )),
        (UsePolicy::Never, _) => Ok(false),
        (UsePolicy::Optional, true) => Ok(true),
        (UsePolicy::Optional, false) => Ok(false),
    }
}

/// Generic AND-gate: the bag opts in to `key` and the server advertises the
/// matching capability. A missing value on either side counts as `false`.
pub fn can_use(properties: &PropertyBag, key: &PropertyKey, features: &FeatureSet) -> bool {
    properties.opted_in(key) && features.advertises(key)
}

pub fn can_use_compression(properties: &PropertyBag, features: &FeatureSet) -> bool {
    can_use(properties, &PropertyKey::Compression, features)
}

pub fn can_use_stream_management(properties: &PropertyBag, features: &FeatureSet) -> bool {
    can_use(properties, &PropertyKey::StreamManagement, features)
}

pub fn can_use_stream_resumption(properties: &PropertyBag, features: &FeatureSet) -> bool {
    can_use(properties, &PropertyKey::StreamResumption, features)
}

/// Carbons are enabled on client opt-in alone; the server advertisement is
/// not consulted.
pub fn can_use_carbons(properties: &PropertyBag) -> bool {
    properties.opted_in(&PropertyKey::Carbons)
}

/// AMP is driven purely by the server advertisement; there is no client
/// opt-in key.
pub fn can_use_amp(features: &FeatureSet) -> bool {
    features.advanced_message_processing
}
