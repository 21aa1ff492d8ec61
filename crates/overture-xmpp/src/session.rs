//! Terminal steps: resource binding and legacy session establishment.

use tracing::debug;
use xmpp_parsers::bind::BindQuery;
use xmpp_parsers::iq::Iq;
use xmpp_parsers::minidom::Element;

use crate::auth::ANONYMOUS_MECHANISM;
use crate::error::NegotiationError;
use crate::predicates;
use crate::properties::{PropertyKey, PropertyValue};
use crate::stanza::{self, ns};
use crate::step::StepState;
use crate::transport::XmppTransport;

const BIND_REQUEST_ID: &str = "resource-bind";
const SESSION_REQUEST_ID: &str = "session-request";

/// Resource bound when the bag names none.
pub const DEFAULT_RESOURCE: &str = "overture";

/// Bind a resource and, after anonymous authentication, adopt the
/// server-assigned username.
pub async fn bind<C: XmppTransport>(
    mut state: StepState<C>,
) -> Result<StepState<C>, NegotiationError> {
    let resource = state
        .properties
        .text(&PropertyKey::Resource)
        .unwrap_or(DEFAULT_RESOURCE)
        .to_string();

    let request = Iq::from_set(BIND_REQUEST_ID, BindQuery::new(Some(resource)));
    state
        .connection
        .send(&stanza::element_to_bytes(&Element::from(request))?)
        .await?;

    let reply = state.connection.receive("resource binding").await?;
    let element = reply.into_stanza("a resource-bind result")?;
    let jid = predicates::bind_result_jid(&element, BIND_REQUEST_ID).ok_or_else(|| {
        NegotiationError::structural(
            "a resource-bind result",
            format!("a <{}/> stanza", element.name()),
        )
    })?;

    debug!(jid = %jid, "resource bound");

    if state.properties.text(&PropertyKey::AuthMethod) == Some(ANONYMOUS_MECHANISM) {
        if let Some(username) = jid.node() {
            state.properties.set(
                PropertyKey::Username,
                PropertyValue::Text(username.to_string()),
            );
        }
    }
    Ok(state)
}

/// Establish a legacy session (RFC 3921) and require a positive IQ result.
pub async fn session<C: XmppTransport>(
    mut state: StepState<C>,
) -> Result<StepState<C>, NegotiationError> {
    state.connection.send(&build_session_iq()).await?;
    let reply = state.connection.receive("session establishment").await?;
    let element = reply.into_stanza("an IQ result establishing the session")?;
    if !predicates::is_iq_result_with_id(&element, SESSION_REQUEST_ID) {
        return Err(NegotiationError::structural(
            "an IQ result establishing the session",
            format!("a <{}/> stanza", element.name()),
        ));
    }
    debug!("legacy session established");
    Ok(state)
}

fn build_session_iq() -> Vec<u8> {
    format!(
        "<iq xmlns='{}' type='set' id='{SESSION_REQUEST_ID}'>\
         <session xmlns='{}'/>\
         </iq>",
        ns::JABBER_CLIENT,
        ns::SESSION
    )
    .into_bytes()
}
