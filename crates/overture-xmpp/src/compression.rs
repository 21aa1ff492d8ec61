//! Stream compression negotiation (XEP-0138).

use tracing::debug;

use crate::error::NegotiationError;
use crate::policy::can_use_compression;
use crate::predicates;
use crate::properties::{PropertyBag, PropertyKey, PropertyValue};
use crate::stanza;
use crate::step::StepState;
use crate::stream;
use crate::transport::XmppTransport;

/// Activate compression when both sides agree; pass through untouched
/// otherwise.
pub async fn maybe_use_compression<C: XmppTransport>(
    state: StepState<C>,
) -> Result<StepState<C>, NegotiationError> {
    if !can_use_compression(&state.properties, &state.features) {
        return Ok(state);
    }
    use_compression(state).await
}

/// Run the compression exchange, transform the connection, and restart the
/// stream. Like TLS, the transform invalidates prior feature
/// advertisements.
pub async fn use_compression<C: XmppTransport>(
    mut state: StepState<C>,
) -> Result<StepState<C>, NegotiationError> {
    let offered = state.features.compression.clone().unwrap_or_default();
    let method = select_method(&state.properties, &offered).ok_or_else(|| {
        NegotiationError::unavailable(format!(
            "no acceptable compression method; server offers: {}",
            offered.join(", ")
        ))
    })?;

    state
        .connection
        .send(&stanza::compress_request(&method))
        .await?;
    let reply = state.connection.receive("compression activation").await?;
    let element = reply.into_stanza("a <compressed/> acknowledgement")?;
    if !predicates::is_compressed(&element) {
        return Err(NegotiationError::structural(
            "a <compressed/> acknowledgement",
            format!("a <{}/> stanza", element.name()),
        ));
    }

    state
        .connection
        .enable_compression(&state.properties, &method)
        .await?;
    debug!(method = %method, "stream compression enabled, restarting stream");
    stream::restart(state).await
}

/// The client's pinned method when it names one, otherwise the server's
/// first offer. A pinned method the server does not offer yields nothing.
fn select_method(properties: &PropertyBag, offered: &[String]) -> Option<String> {
    match properties.get(&PropertyKey::Compression) {
        Some(PropertyValue::Text(preferred)) => {
            offered.iter().find(|method| *method == preferred).cloned()
        }
        _ => offered.first().cloned(),
    }
}
