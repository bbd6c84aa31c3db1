//! Tri-state fields for partial updates.
//!
//! A JSON body distinguishes a key that was never sent, a key sent as `null`
//! and a key sent with a value. `Patch<T>` keeps all three apart so a merge
//! only touches what the caller actually supplied. Fields must be marked
//! `#[serde(default)]` for a missing key to come out as [`Patch::Absent`].

use serde::{Deserialize, Deserializer};

pub(crate) const NULL_NOT_ALLOWED: &str = "must not be null";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Patch<T> {
    Absent,
    Null,
    Value(T),
}

impl<T> Patch<T> {
    /// Collapses the patch of a non-nullable field: `Null` is rejected.
    pub(crate) fn into_required(self) -> Result<Option<T>, &'static str> {
        match self {
            Patch::Absent => Ok(None),
            Patch::Null => Err(NULL_NOT_ALLOWED),
            Patch::Value(value) => Ok(Some(value)),
        }
    }

    /// Merges into a nullable field: `Null` clears it, `Absent` leaves it be.
    pub(crate) fn apply_to(self, target: &mut Option<T>) {
        match self {
            Patch::Absent => {}
            Patch::Null => *target = None,
            Patch::Value(value) => *target = Some(value),
        }
    }
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Absent
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Patch::Value(value),
            None => Patch::Null,
        }
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Patch::from)
    }
}

/// Overwrites `target` when a new value was supplied.
pub(crate) fn merge<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}
