//! Shared low-level utilities: newtyped indices, a bit-vector set, an
//! append-only worklist queue, and CLI option parsing.

pub mod bit_vec;
pub mod chunked_queue;
pub mod index;
pub mod options;
