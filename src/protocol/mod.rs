//! Protocol Module
//!
//! Defines the text protocol spoken between clients and the server.
//!
//! ### Commands
//! | Wire form        | Effect                                     |
//! |------------------|--------------------------------------------|
//! | `KEYS`           | all keys, sorted                           |
//! | `SET key value`  | insert or overwrite                        |
//! | `GET key`        | value of key                               |
//! | `DEL key`        | remove key                                 |
//! | `RKEY`           | secondary list joined by `", "`            |
//! | `RSET value`     | append to the secondary list               |
//! | `RGET value`     | find value in the secondary list           |
//! | `RDEL value`     | remove first equal value from the list     |
//! | `RECOVER`        | rebuild the database from its journal      |
//! | `PING`           | health check                               |
//!
//! Command names are case-insensitive.

mod command;
mod response;
mod codec;

pub use command::{execute_line, Command, CommandType};
pub use response::{Payload, Response};
pub use codec::{
    decode_response, encode_response, read_frame, read_response, write_command, write_response,
    Line, LineDecoder, DEFAULT_READ_BUFFER_SIZE, LINE_TERMINATOR, RESPONSE_BUFFER_SIZE,
    RESPONSE_TERMINATOR,
};
