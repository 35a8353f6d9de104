pub mod builder;
pub mod codec;
pub mod message;

pub use builder::MessageBuilder;
pub use codec::{WireCodec, decode, encode};
pub use message::{Message, WirePayload};
