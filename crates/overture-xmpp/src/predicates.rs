//! Structural checks over received stanzas.

use xmpp_parsers::bind::BindResponse;
use xmpp_parsers::iq::{Iq, IqType};
use xmpp_parsers::jid::Jid;
use xmpp_parsers::minidom::Element;
use xmpp_parsers::sm::{Enabled, ResumeAttr};

/// True when the element is an IQ of type `result`.
pub fn is_iq_result(element: &Element) -> bool {
    element.name() == "iq" && element.attr("type") == Some("result")
}

/// True when the element is an IQ result answering the given request id.
pub fn is_iq_result_with_id(element: &Element, id: &str) -> bool {
    is_iq_result(element) && element.attr("id") == Some(id)
}

/// Extract the bound JID from a resource-bind result answering `id`.
pub fn bind_result_jid(element: &Element, id: &str) -> Option<Jid> {
    let iq = Iq::try_from(element.clone()).ok()?;
    if iq.id != id {
        return None;
    }
    match iq.payload {
        IqType::Result(Some(payload)) => {
            let bind = BindResponse::try_from(payload).ok()?;
            Some(bind.into())
        }
        _ => None,
    }
}

/// Parsed stream-management `<enabled/>` acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmEnabled {
    pub resume: bool,
    pub id: Option<String>,
}

/// Extract the stream-management enablement acknowledgement, if that is
/// what arrived.
pub fn sm_enabled(element: &Element) -> Option<SmEnabled> {
    let enabled = Enabled::try_from(element.clone()).ok()?;
    Some(SmEnabled {
        resume: enabled.resume == ResumeAttr::True,
        id: enabled.id.map(|id| id.0),
    })
}

/// True when the element acknowledges compression activation.
pub fn is_compressed(element: &Element) -> bool {
    element.name() == "compressed"
}
