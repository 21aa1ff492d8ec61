//! # overture-xmpp
//!
//! Client-side XMPP session establishment following RFC 6120/7395: stream
//! opening, feature discovery, StartTLS, compression, SASL authentication,
//! stream management, resource binding and legacy session establishment.
//!
//! ## Architecture
//!
//! - **Pipeline**: negotiation phases are uniform [`step::NegotiationStep`]s
//!   threading a `(connection, properties, features)` state; callers supply
//!   the step order
//! - **Property bag**: an ordered, position-preserving key/value carrier for
//!   connection parameters and negotiation state
//! - **Decision functions**: tri-state StartTLS policy plus opt-in/offer
//!   AND-gates deciding whether each optional feature runs
//! - **Validators**: strict stream-start/features shape checks across the
//!   TCP, BOSH and (legacy) WebSocket framing modes
//!
//! Transport I/O, XML parsing and the TLS/compression transforms live
//! behind the [`transport::XmppTransport`] trait; this crate only drives
//! the exchanges.

pub mod auth;
pub mod carbons;
pub mod compression;
pub mod config;
pub mod error;
pub mod features;
pub mod policy;
pub mod predicates;
pub mod properties;
pub mod session;
pub mod stanza;
pub mod step;
pub mod stream;
pub mod stream_management;
pub mod tls;
pub mod transport;

pub use config::SessionConfig;
pub use error::NegotiationError;
pub use features::FeatureSet;
pub use properties::{PropertyBag, PropertyKey, PropertyValue, UsePolicy};
pub use step::{NegotiationStep, Pipeline, StepState};
pub use transport::{Frame, StreamHeader, Transport, XmppTransport};
