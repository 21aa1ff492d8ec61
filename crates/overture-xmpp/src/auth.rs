//! SASL authentication step and mechanism construction.

use std::str::FromStr;

use sasl::client::mechanisms::{Anonymous, Plain, Scram};
use sasl::client::Mechanism;
use sasl::common::scram::{Sha1, Sha256};
use sasl::common::{ChannelBinding, Credentials};
use tracing::{debug, warn};
use xmpp_parsers::minidom::Element;
use xmpp_parsers::sasl::{
    Auth, Challenge, Failure, Mechanism as SaslMechanism, Response, Success,
};

use crate::error::NegotiationError;
use crate::features::FeatureSet;
use crate::properties::{PropertyBag, PropertyKey, PropertyValue};
use crate::stanza;
use crate::step::StepState;
use crate::stream;
use crate::transport::XmppTransport;

/// Mechanism used when the caller pins nothing and the server advertises
/// nothing usable.
pub const DEFAULT_MECHANISM: &str = "PLAIN";

/// The anonymous mechanism name, as recorded under `AuthMethod`.
pub const ANONYMOUS_MECHANISM: &str = "ANONYMOUS";

const MECHANISM_PREFERENCE: &[&str] = &["SCRAM-SHA-256", "SCRAM-SHA-1", "PLAIN"];

/// Pick the strongest supported mechanism from a server advertisement.
pub fn select_mechanism(advertised: &[String]) -> Option<&'static str> {
    MECHANISM_PREFERENCE
        .iter()
        .find(|name| advertised.iter().any(|offered| offered == *name))
        .copied()
}

/// Resolve the mechanism to authenticate with.
///
/// A mechanism pinned in the bag must be advertised when the server
/// advertises anything at all; without a pin, preference order decides,
/// falling back to [`DEFAULT_MECHANISM`].
fn resolve_mechanism(
    properties: &PropertyBag,
    features: &FeatureSet,
) -> Result<String, NegotiationError> {
    match properties.text(&PropertyKey::Auth) {
        Some(pinned) => {
            let advertised = &features.sasl_mechanisms;
            if !advertised.is_empty() && !advertised.iter().any(|offered| offered == pinned) {
                return Err(NegotiationError::unavailable(format!(
                    "client requires SASL mechanism {pinned}; server offers: {}",
                    advertised.join(", ")
                )));
            }
            Ok(pinned.to_string())
        }
        None => Ok(select_mechanism(&features.sasl_mechanisms)
            .unwrap_or(DEFAULT_MECHANISM)
            .to_string()),
    }
}

/// Build a SASL client mechanism from the bag's credentials.
pub fn build_mechanism(
    name: &str,
    properties: &PropertyBag,
) -> Result<Box<dyn Mechanism + Send>, NegotiationError> {
    let credentials = Credentials::default()
        .with_username(properties.text(&PropertyKey::Username).unwrap_or_default())
        .with_password(properties.text(&PropertyKey::Password).unwrap_or_default())
        .with_channel_binding(ChannelBinding::Unsupported);

    match name {
        "SCRAM-SHA-256" => Scram::<Sha256>::from_credentials(credentials)
            .map(|mechanism| Box::new(mechanism) as Box<dyn Mechanism + Send>)
            .map_err(|error| {
                NegotiationError::AuthenticationFailed(format!(
                    "failed to initialize SCRAM-SHA-256: {error:?}"
                ))
            }),
        "SCRAM-SHA-1" => Scram::<Sha1>::from_credentials(credentials)
            .map(|mechanism| Box::new(mechanism) as Box<dyn Mechanism + Send>)
            .map_err(|error| {
                NegotiationError::AuthenticationFailed(format!(
                    "failed to initialize SCRAM-SHA-1: {error:?}"
                ))
            }),
        "PLAIN" => Plain::from_credentials(credentials)
            .map(|mechanism| Box::new(mechanism) as Box<dyn Mechanism + Send>)
            .map_err(|error| {
                NegotiationError::AuthenticationFailed(format!(
                    "failed to initialize PLAIN: {error:?}"
                ))
            }),
        ANONYMOUS_MECHANISM => Ok(Box::new(Anonymous::new())),
        other => Err(NegotiationError::unavailable(format!(
            "unsupported SASL mechanism '{other}'"
        ))),
    }
}

pub(crate) fn map_failure(failure: &Failure) -> NegotiationError {
    let condition = format!("{:?}", failure.defined_condition);
    let text = failure.texts.values().next().cloned().unwrap_or_default();

    if text.is_empty() {
        NegotiationError::AuthenticationFailed(condition)
    } else {
        NegotiationError::AuthenticationFailed(format!("{condition}: {text}"))
    }
}

/// Authenticate the stream, then restart it and rediscover features.
///
/// The mechanism comes from the bag's `Auth` key (see
/// [`resolve_mechanism`]); the chosen name is recorded under `AuthMethod`
/// on success. Failures are terminal and never retried.
pub async fn authenticate<C: XmppTransport>(
    mut state: StepState<C>,
) -> Result<StepState<C>, NegotiationError> {
    let mechanism_name = resolve_mechanism(&state.properties, &state.features)?;
    debug!(mechanism = %mechanism_name, "selected SASL mechanism");

    let mut mechanism = build_mechanism(&mechanism_name, &state.properties)?;
    let initial = mechanism.initial();

    let sasl_name = SaslMechanism::from_str(mechanism.name()).map_err(|error| {
        NegotiationError::AuthenticationFailed(format!("invalid SASL mechanism name: {error}"))
    })?;

    let auth = Element::from(Auth {
        mechanism: sasl_name,
        data: initial,
    });
    state
        .connection
        .send(&stanza::element_to_bytes(&auth)?)
        .await?;

    loop {
        let reply = state.connection.receive("SASL negotiation").await?;
        let element = reply.into_stanza("a SASL challenge, success or failure")?;

        if let Ok(challenge) = Challenge::try_from(element.clone()) {
            let data = mechanism.response(&challenge.data).map_err(|error| {
                NegotiationError::AuthenticationFailed(format!(
                    "SASL challenge-response failed: {error:?}"
                ))
            })?;
            let response = Element::from(Response { data });
            state
                .connection
                .send(&stanza::element_to_bytes(&response)?)
                .await?;
        } else if let Ok(success) = Success::try_from(element.clone()) {
            if let Err(error) = mechanism.success(&success.data) {
                warn!(error = ?error, "server signature verification failed");
                return Err(NegotiationError::AuthenticationFailed(format!(
                    "server signature verification failed: {error:?}"
                )));
            }

            debug!("SASL authentication succeeded");
            state.properties.set(
                PropertyKey::AuthMethod,
                PropertyValue::Text(mechanism_name),
            );
            return stream::restart(state).await;
        } else if let Ok(failure) = Failure::try_from(element.clone()) {
            debug!(condition = ?failure.defined_condition, "SASL authentication failed");
            return Err(map_failure(&failure));
        } else {
            return Err(NegotiationError::structural(
                "a SASL challenge, success or failure",
                format!("a <{}/> stanza", element.name()),
            ));
        }
    }
}
