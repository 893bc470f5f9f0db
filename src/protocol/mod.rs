//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Frame Format
//!
//! ```text
//! ┌────────────────────┬─────┬──────────────────────────────┐
//! │ decimal byte length│  ,  │   UTF-8 JSON body            │
//! └────────────────────┴─────┴──────────────────────────────┘
//! ```
//!
//! The length counts the bytes of the body only. There is no upper bound;
//! readers keep reading until the declared length has arrived.
//!
//! ### Requests
//! - `{"method":"insert","key":"k","value":<any>}`
//! - `{"method":"lookup","key":"k"}`
//! - `{"method":"remove","key":"k"}`
//! - `{"method":"scan","regex":"^k.*"}`
//!
//! ### Responses
//! `{"status":"Success"|"Failure"|"Invalid Request","result":..,"error":..}`

mod codec;
mod request;
mod response;

pub use codec::{
    encode_frame, encode_request, encode_response, parse_length, read_frame, write_frame,
    FrameDecoder, MAX_HEADER_LEN,
};
pub use request::{Method, Request, RequestBody};
pub use response::{Response, Status, NOT_FOUND};
