//! Host-facing primitives: subprocess execution and invoking identity.

pub mod executor;
pub mod identity;

#[cfg(test)]
pub(crate) mod testing;
