//! Core library for the Contactline bot: a messaging-transport layer and
//! the relay engine that connects end users with a single operator.

pub mod channel;
pub mod relay;
