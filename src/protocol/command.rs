//! Command line construction.

/// Fields of the song currently playing, including its `file` URI.
pub const CURRENT_SONG: &str = "currentsong";

/// Builds a request for the cover art chunk of `uri` starting at `offset`.
///
/// The URI is embedded verbatim between double quotes. It must not contain
/// unescaped quotes or the request will be malformed.
#[must_use]
pub fn albumart(uri: &str, offset: usize) -> String {
    format!("albumart \"{uri}\" {offset}")
}

/// Joins command line words into a single protocol command.
///
/// A trailing newline is removed so that the executor appends exactly one.
#[must_use]
pub fn join<S: AsRef<str>>(words: &[S]) -> String {
    let command = words
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(" ");

    match command.strip_suffix('\n') {
        Some(trimmed) => trimmed.to_owned(),
        None => command,
    }
}
