//! Canonical hashing of a directory structure.

use std::collections::{BTreeMap, HashMap};
use std::io;

use anyhow::Result;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE;
use serde::Serialize;
use serde_json::ser::Formatter;
use sha2::{Digest, Sha256};

/// JSON with `", "` / `": "` separators.
///
/// Drive folder hashes predate this implementation, so the serialization
/// must render byte-for-byte the way the original pinning tool did, spacing
/// included - otherwise every already-pinned `ImmutableGoogleDriveFolder`
/// would stop matching its folder.
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }

    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }
}

/// Reduce a directory listing to a URL-safe base64 SHA-256 digest.
///
/// Input maps each file path to its best available content hash (or a
/// modification timestamp when the provider has none). Entries are sorted by
/// path and serialized with [`SpacedFormatter`] before hashing, so the
/// result is stable under insertion order and agrees with previously pinned
/// folder hashes.
pub fn dir_hash(entries: &HashMap<String, String>) -> Result<String> {
    let sorted: BTreeMap<&str, &str> =
        entries.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();

    let mut canonical = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut canonical, SpacedFormatter);
    sorted.serialize(&mut serializer)?;

    let digest = Sha256::digest(&canonical);
    Ok(URL_SAFE.encode(digest))
}
