//! Stream management enablement (XEP-0198).

use tracing::debug;
use xmpp_parsers::minidom::Element;
use xmpp_parsers::sm::Enable;

use crate::error::NegotiationError;
use crate::policy::{can_use_stream_management, can_use_stream_resumption};
use crate::predicates::{self, SmEnabled};
use crate::properties::{PropertyKey, PropertyValue};
use crate::stanza;
use crate::step::StepState;
use crate::transport::XmppTransport;

/// Enable stream management (without resumption) when both sides agree;
/// pass through untouched otherwise.
pub async fn maybe_stream_management<C: XmppTransport>(
    state: StepState<C>,
) -> Result<StepState<C>, NegotiationError> {
    if !can_use_stream_management(&state.properties, &state.features) {
        return Ok(state);
    }
    stream_management(state).await
}

/// Send `<enable/>` and require the `<enabled/>` acknowledgement.
pub async fn stream_management<C: XmppTransport>(
    mut state: StepState<C>,
) -> Result<StepState<C>, NegotiationError> {
    let enabled = enable_exchange(&mut state, Enable::new()).await?;
    debug!(resume = enabled.resume, "stream management enabled");
    Ok(state)
}

/// Enable stream management with resumption when both sides agree; pass
/// through untouched otherwise.
pub async fn maybe_stream_resumption<C: XmppTransport>(
    state: StepState<C>,
) -> Result<StepState<C>, NegotiationError> {
    if !can_use_stream_resumption(&state.properties, &state.features) {
        return Ok(state);
    }
    stream_resumption(state).await
}

/// Send `<enable resume='true'/>`, require an `<enabled/>` that asserts
/// resumption, and record the resumption id. A reply without an id is an
/// error, never a silently absent value.
pub async fn stream_resumption<C: XmppTransport>(
    mut state: StepState<C>,
) -> Result<StepState<C>, NegotiationError> {
    let enabled = enable_exchange(&mut state, Enable::new().with_resume()).await?;
    if !enabled.resume {
        return Err(NegotiationError::structural(
            "a stream-management <enabled/> asserting resume",
            "an <enabled/> without the resume flag".to_string(),
        ));
    }
    let id = enabled.id.ok_or_else(|| {
        NegotiationError::structural(
            "a stream-management <enabled/> carrying a resumption id",
            "an <enabled/> without an id attribute".to_string(),
        )
    })?;

    debug!(smid = %id, "stream resumption enabled");
    state
        .properties
        .set(PropertyKey::SmId, PropertyValue::Text(id));
    Ok(state)
}

async fn enable_exchange<C: XmppTransport>(
    state: &mut StepState<C>,
    enable: Enable,
) -> Result<SmEnabled, NegotiationError> {
    let request = Element::from(enable);
    state
        .connection
        .send(&stanza::element_to_bytes(&request)?)
        .await?;

    let reply = state
        .connection
        .receive("stream management enablement")
        .await?;
    let element = reply.into_stanza("a stream-management <enabled/>")?;
    predicates::sm_enabled(&element).ok_or_else(|| {
        NegotiationError::structural(
            "a stream-management <enabled/>",
            format!("a <{}/> stanza", element.name()),
        )
    })
}
