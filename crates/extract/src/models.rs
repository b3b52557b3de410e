//! Recording metadata derived from a filename.

/// Structured metadata for a single recording.
///
/// Every field is an opaque string: none of the references are checked for
/// being numeric, so suffixes such as `14a` or `2a` survive byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Metadata {
    /// First token, e.g. `MB3`.
    pub volume: String,
    /// Second token, e.g. `14a`.
    pub page: String,
    /// Third token, before the separator.
    pub siman: String,
    /// Third token, after the separator.
    pub seif: String,
    /// Remaining tokens joined by single spaces, minus any configured extension.
    pub title: String,
}
impl AsRef<Metadata> for Metadata {
    fn as_ref(&self) -> &Metadata {
        self
    }
}
