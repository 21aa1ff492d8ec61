//! Typed connection configuration lowering into the property bag.

use serde::{Deserialize, Serialize};

use crate::properties::{PropertyBag, PropertyKey, PropertyValue, UsePolicy};
use crate::transport::Transport;

/// Connection parameters for one session.
///
/// A convenience surface over [`PropertyBag`]: the bag stays the canonical
/// carrier threaded through the pipeline, and callers that want keys this
/// struct does not model can set them on the lowered bag directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub username: String,
    pub password: String,
    pub server: String,
    pub resource: Option<String>,
    pub transport: Transport,
    pub ws_legacy: bool,
    pub starttls: UsePolicy,
    pub compression: bool,
    pub carbons: bool,
    pub stream_management: bool,
    pub stream_resumption: bool,
}

impl SessionConfig {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        server: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            server: server.into(),
            resource: None,
            transport: Transport::Tcp,
            ws_legacy: false,
            starttls: UsePolicy::Optional,
            compression: false,
            carbons: false,
            stream_management: false,
            stream_resumption: false,
        }
    }

    /// Lower into the initial property bag for a pipeline run.
    pub fn into_properties(self) -> PropertyBag {
        let mut bag = PropertyBag::new()
            .with(PropertyKey::Server, PropertyValue::Text(self.server))
            .with(PropertyKey::Username, PropertyValue::Text(self.username))
            .with(PropertyKey::Password, PropertyValue::Text(self.password))
            .with(
                PropertyKey::Transport,
                PropertyValue::Transport(self.transport),
            )
            .with(PropertyKey::StartTls, PropertyValue::Policy(self.starttls));

        if self.ws_legacy {
            bag.set(PropertyKey::WsLegacy, PropertyValue::Flag(true));
        }
        if let Some(resource) = self.resource {
            bag.set(PropertyKey::Resource, PropertyValue::Text(resource));
        }
        if self.compression {
            bag.set(PropertyKey::Compression, PropertyValue::Flag(true));
        }
        if self.carbons {
            bag.set(PropertyKey::Carbons, PropertyValue::Flag(true));
        }
        if self.stream_management {
            bag.set(PropertyKey::StreamManagement, PropertyValue::Flag(true));
        }
        if self.stream_resumption {
            bag.set(PropertyKey::StreamResumption, PropertyValue::Flag(true));
        }
        bag
    }
}
