#![forbid(unsafe_code)]

//! Shared pieces of the Sigtuna XML canonicalization library: the error
//! taxonomy and the W3C algorithm/namespace URI constants.

pub mod algorithm;
pub mod error;
pub mod ns;

pub use error::{Error, Result};
