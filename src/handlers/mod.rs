//! Route controllers: extract identity and request parts, call the matching
//! service operation, hand back the envelope. No entity logic lives here.

pub mod channel;
pub mod channel_link;
pub mod media;
pub mod media_tag;
pub mod minister;
