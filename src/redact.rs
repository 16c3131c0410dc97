//! Redaction for secret signing material.
//!
//! Account handles carry private keys. They may only be serialized into the
//! ledger's durable store, never into logs or structured output — wrap them
//! in [`Redacted`] anywhere they could be formatted.

use std::fmt::{self, Debug, Display};

/// Wrapper whose `Debug`, `Display`, and `Serialize` output is always
/// `"<redacted>"`. The inner value is reachable only through
/// [`Redacted::expose`].
pub struct Redacted<T>(T);

impl<T> Redacted<T> {
    pub fn new(value: T) -> Self {
        Redacted(value)
    }

    /// Access the wrapped secret. Call sites are the audit trail: anything
    /// invoking this is handling key material.
    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl<T> Debug for Redacted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

impl<T> Display for Redacted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

impl<T> serde::Serialize for Redacted<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        "<redacted>".serialize(serializer)
    }
}
