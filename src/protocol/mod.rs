//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Frame Format
//! Every request and every response is a frame: arbitrary bytes followed
//! by the four-byte delimiter. The payload never contains the delimiter
//! (file bytes travel base64-encoded).
//! ```text
//! ┌──────────────────────────────────┬──────────────┐
//! │            Payload               │ \r\n\r\n (4) │
//! └──────────────────────────────────┴──────────────┘
//! ```
//!
//! ### Requests (verb is case-insensitive)
//! - `LIST`
//! - `GET <filename>`
//! - `DELETE <filename>`
//! - `UPLOAD <filename> <base64>`
//!
//! ### Responses (compact JSON)
//! - `{"status":"OK","data":["a.txt","b.png"]}`
//! - `{"status":"OK","data":"a.txt uploaded"}`
//! - `{"status":"OK","data_namafile":"a.txt","data_file":"<base64>"}`
//! - `{"status":"ERROR","data":"file not found: a.txt"}`
//!
//! One exchange per connection: the server closes after responding.

mod command;
mod response;
mod codec;
mod frame;

pub use command::{Command, Verb};
pub use response::{Body, Response, Status};
pub use codec::{
    decode_command, decode_response, encode_command, encode_response,
    read_response, write_command, write_response, DELIMITER,
};
pub use frame::{FrameReader, FrameState};
