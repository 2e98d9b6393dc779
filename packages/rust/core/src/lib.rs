//! Core transcript conversion and merge engine for convarchive.
//!
//! Forward direction (`pipeline::convert`):
//! transcript JSON → [`extract`] → [`dedup`] → [`pairing`] → [`writer`].
//!
//! Reverse direction (`pipeline::merge`):
//! pair files → [`locator`] → [`assembler`] → merged markdown.

pub mod assembler;
pub mod dedup;
pub mod extract;
pub mod locator;
pub mod maintenance;
pub mod pairing;
pub mod pipeline;
pub mod writer;
