//! StartTLS negotiation.

use tracing::debug;

use crate::error::NegotiationError;
use crate::policy::use_ssl;
use crate::step::StepState;
use crate::stream;
use crate::transport::XmppTransport;

/// Upgrade to TLS when policy and server offer agree; pass through
/// untouched otherwise.
///
/// TLS invalidates every prior feature advertisement, so a successful
/// upgrade restarts the stream and rediscovers features before returning.
pub async fn maybe_use_ssl<C: XmppTransport>(
    mut state: StepState<C>,
) -> Result<StepState<C>, NegotiationError> {
    if !use_ssl(&state.properties, &state.features)? {
        return Ok(state);
    }

    state.connection.upgrade_to_tls(&state.properties).await?;
    debug!("transport upgraded to TLS, restarting stream");
    stream::restart(state).await
}
