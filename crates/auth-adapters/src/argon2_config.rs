//! Argon2 parameters.
//!
//! Release and debug builds use `Argon2::default()` (Argon2id, 19 MiB,
//! 2 iterations). Unit tests use a 1 MiB / 1 iteration instance so the
//! suite stays fast. Those parameters must never reach production.

use argon2::Argon2;
#[cfg(test)]
use argon2::{Algorithm, Params, Version};

#[inline]
pub(crate) fn argon2_instance() -> Argon2<'static> {
    #[cfg(test)]
    {
        let params = Params::new(1024, 1, 1, None).expect("valid Argon2 params for tests");
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    }

    #[cfg(not(test))]
    {
        Argon2::default()
    }
}
