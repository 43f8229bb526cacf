//! Transport layer: HTTP and wire-format details (serialization/deserialization).

mod messages;
mod report;

pub use messages::{
    decode_error_response, decode_message_response, encode_message_form, messages_path,
};
