//! Shared fixtures of the unit tests
mod common;
mod transport;

pub(crate) use common::*;
pub(crate) use transport::*;
