//! Infrastructure layer: concrete repository and transport implementations,
//! the message codec, and wire DTOs.

pub mod codec;
pub mod dto;
pub mod message_pusher;
pub mod repository;
