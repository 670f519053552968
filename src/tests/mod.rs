//! Unit tests for the transcode loop
//!
//! `support` holds the scripted encoder and the journaling reader and
//! writer the loop tests run against.

pub mod support;
