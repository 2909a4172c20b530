//! The only surviving piece of the original statement-parser module graph:
//! the SSTable-style VInt codec, reused here for the `Duration` CQL type's
//! three variable-length component integers.

pub mod vint;
