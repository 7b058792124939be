//! URL handling module for Jobtrawl
//!
//! This module resolves hrefs found on listing pages against the site base address
//! and computes the keys the scheduler uses to drop duplicate requests.

mod normalize;
mod resolve;

pub use normalize::request_key;
pub use resolve::{resolve_href, resolve_link};
