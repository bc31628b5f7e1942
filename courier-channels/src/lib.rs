//! Transport boundary for Courier.
//!
//! This crate is pure I/O: it models inbound transport events, classifies
//! raw message content into `(text, kind)`, and exposes the `ChannelTransport`
//! seam the bridge sends replies through. Socket lifecycle, authentication and
//! pairing live in the external socket-gateway sidecar.

mod classify;
mod socket;
mod traits;
mod types;

pub use classify::{
    CaptionedContent, Classified, DocumentContent, ExtendedTextContent, MessageContent,
    MessageKind, classify,
};
pub use socket::SocketGatewayTransport;
pub use traits::ChannelTransport;
pub use types::{DeliveryKind, InboundEvent, MessageId, Presence, SenderId, SentReceipt};
