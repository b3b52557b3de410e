/// Separates the siman from the seif in the third filename token.
pub const DEFAULT_SEPARATOR: char = ':';

/// Extensions stripped from the end of a title when no others are configured.
/// Matching is case-sensitive.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".mp3"];
