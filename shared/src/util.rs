use serde::{Deserialize, Deserializer};

/// Deserialize `null` as `T::default()`.
///
/// The backend sends `null` for blank optional columns (phone, image) where
/// the client treats them as empty strings.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
