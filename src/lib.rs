//! Object wrappers over the Google Drive, Sheets and Slides APIs.
//!
//! Responses are bound to resource types ([`drive::File`],
//! [`sheets::Spreadsheet`], [`slides::Presentation`], ...). Spreadsheets and
//! presentations collect edit requests locally and send them in a single
//! batch update on [`Deferred::update`] or at the end of [`with_updates`].

pub mod a1;
mod auth;
pub mod casing;
pub mod config;
pub mod drive;
pub mod error;
mod resource;
pub mod sheets;
pub mod slides;
pub mod updates;

pub use config::{Config, Credentials, GoogleConfig};
pub use drive::DriveClient;
pub use error::{Error, Result};
pub use sheets::SheetsClient;
pub use slides::SlidesClient;
pub use updates::{BatchUpdate, Deferred, UpdateQueue, with_updates};
