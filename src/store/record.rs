//! Typed records stored in named collections.

use serde::{de::DeserializeOwned, Serialize};

/// Field every stored record is keyed by.
pub const ID_FIELD: &str = "id";

/// A record type bound to one collection.
///
/// Records are kept as JSON objects inside the store so that criteria can
/// address fields by name; the serialized form must contain a string
/// [`ID_FIELD`].
pub trait Record: Serialize + DeserializeOwned {
    /// Name of the collection holding records of this type.
    const COLLECTION: &'static str;

    fn id(&self) -> &str;
}
