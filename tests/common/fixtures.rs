//! Trigger payload and archive fixtures

use serde_json::json;
use std::io::{Cursor, Write};

/// Wrap a submission message in the pub/sub envelope
pub fn envelope(message: &serde_json::Value) -> Vec<u8> {
    json!({
        "Records": [
            { "Sns": { "Message": message.to_string() } }
        ]
    })
    .to_string()
    .into_bytes()
}

/// Envelope carrying a complete submission
pub fn submission_payload(id: &str, email: &str, url: &str) -> Vec<u8> {
    envelope(&json!({
        "id": id,
        "email": email,
        "submission_url": url,
    }))
}

/// A stored (uncompressed) ZIP archive holding the given files
pub fn zip_archive(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options =
        zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, content) in files {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// A well-formed ZIP archive with no entries
pub fn empty_zip_archive() -> Vec<u8> {
    zip_archive(&[])
}
