//! Checksum engine.
//!
//! `compute` is a pure function over a byte slice. `validate_frame` locates
//! the checksum field and the covered range inside a complete frame using
//! the persisted offset conventions (see `layout`), which assume a one-byte
//! header and a one-byte tail whatever markers the protocol declares.

mod compute;
pub mod error;
pub mod layout;
mod validate;

pub use compute::{compute, sum8, xor8};
pub use error::ChecksumError;
pub use validate::{ChecksumCheck, try_validate, validate_frame};
