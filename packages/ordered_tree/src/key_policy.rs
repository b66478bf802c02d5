/// Extracts the ordering key from a stored value.
///
/// The tree stores whole values and consults this policy whenever it needs
/// to compare two of them; the policy decides which part of the value is the
/// key. Sets key on the entire value ([`Identity`]), maps store `(key,
/// mapped)` pairs and key on the first element ([`PairFirst`]).
pub trait KeyExtract<V> {
    /// The key type values are ordered by.
    type Key: ?Sized;

    /// Borrows the key out of a stored value.
    fn key(value: &V) -> &Self::Key;
}

/// The whole value is the key (set-flavored trees).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Identity;

impl<V> KeyExtract<V> for Identity {
    type Key = V;

    fn key(value: &V) -> &V {
        value
    }
}

/// The first element of a pair is the key (map-flavored trees).
///
/// # Example
///
/// ```
/// use ordered_tree::{KeyExtract, PairFirst};
///
/// let entry = ("key", 42);
/// assert_eq!(PairFirst::key(&entry), &"key");
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PairFirst;

impl<K, M> KeyExtract<(K, M)> for PairFirst {
    type Key = K;

    fn key(value: &(K, M)) -> &K {
        &value.0
    }
}
