//! Message carbons enablement (XEP-0280).

use tracing::debug;

use crate::error::NegotiationError;
use crate::policy::can_use_carbons;
use crate::predicates;
use crate::stanza::ns;
use crate::step::StepState;
use crate::transport::XmppTransport;

const CARBONS_ENABLE_IQ_ID: &str = "carbons-enable";

/// Enable carbons when the client opted in; pass through untouched
/// otherwise. Carbons negotiation never consults the feature set.
pub async fn maybe_use_carbons<C: XmppTransport>(
    state: StepState<C>,
) -> Result<StepState<C>, NegotiationError> {
    if !can_use_carbons(&state.properties) {
        return Ok(state);
    }
    use_carbons(state).await
}

/// Send the carbons enable request and require a positive IQ result.
pub async fn use_carbons<C: XmppTransport>(
    mut state: StepState<C>,
) -> Result<StepState<C>, NegotiationError> {
    state.connection.send(&build_enable_iq()).await?;
    let reply = state.connection.receive("carbons activation").await?;
    let element = reply.into_stanza("an IQ result enabling carbons")?;
    if !predicates::is_iq_result_with_id(&element, CARBONS_ENABLE_IQ_ID) {
        return Err(NegotiationError::structural(
            "an IQ result enabling carbons",
            format!("a <{}/> stanza", element.name()),
        ));
    }
    debug!("message carbons enabled");
    Ok(state)
}

fn build_enable_iq() -> Vec<u8> {
    format!(
        "<iq xmlns='{}' type='set' id='{CARBONS_ENABLE_IQ_ID}'>\
         <enable xmlns='{}'/>\
         </iq>",
        ns::JABBER_CLIENT,
        ns::CARBONS
    )
    .into_bytes()
}
