//! Small terminal companion for drinking enough water. Keeps a tally of today's glasses that
//! survives restarts and starts over every day, and can nag you on a fixed interval until you
//! close it.
//!

pub mod cli;
pub mod fs;
pub mod intake;
pub mod notification;
pub mod reminder;
pub mod storage;
pub mod utils;
