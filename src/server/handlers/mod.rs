//! HTTP request handlers for the web server.

mod api;
mod error;
mod serial_numbers;

pub use api::health;
pub use error::not_found;
pub use serial_numbers::{
    create_serial_number, delete_serial_number, get_serial_number, list_serial_numbers,
    lookup_serial, update_serial_number,
};
