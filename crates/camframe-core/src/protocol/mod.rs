//! Frame protocol decoding.
//!
//! The protocol follows a layered structure:
//! - `layout`: tags, markers and field positions (source of truth)
//! - `reader`: safe field access and header conventions
//! - `parser`: domain-level decoding of the header line
//! - `writer`: the sender-side serialization, used for fixtures
//! - `error`: explicit, actionable errors
//!
//! Parsers are pure and contain no I/O; sources and the capture driver handle
//! reading and aggregation.

pub mod category;
pub mod frame;
pub(crate) mod scan;
