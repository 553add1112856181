//! Upload content checks: size limit and content-sniffed MIME type.
//!
//! The declared `Content-Type` and the file extension are never trusted;
//! only the leading bytes of the file decide its type.

use std::borrow::Cow;
use std::io::{self, Cursor, Read, Seek, SeekFrom};

use mime_guess::mime::{self, Mime};
use validator::ValidationError;

use crate::constants::{MAX_UPLOAD_SIZE, SNIFF_LEN, SUPPORTED_MIME_TYPES};
use crate::modules::upload::{model::UploadedFile, schema::Priority};

const PDF_MAGIC: &[u8] = b"%PDF-";
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

/// Reads up to [`SNIFF_LEN`] bytes from the current position, detects the
/// content type, and seeks back to where the reader started.
pub fn sniff_mime<R: Read + Seek>(reader: &mut R) -> io::Result<Mime> {
    let start = reader.stream_position()?;

    let mut prefix = Vec::with_capacity(SNIFF_LEN);
    reader.by_ref().take(SNIFF_LEN as u64).read_to_end(&mut prefix)?;
    reader.seek(SeekFrom::Start(start))?;

    Ok(detect(&prefix))
}

fn detect(prefix: &[u8]) -> Mime {
    if prefix.is_empty() {
        return "application/x-empty".parse().unwrap_or(mime::APPLICATION_OCTET_STREAM);
    }
    if prefix.starts_with(PDF_MAGIC) {
        return mime::APPLICATION_PDF;
    }
    if prefix.starts_with(JPEG_MAGIC) {
        return mime::IMAGE_JPEG;
    }
    if prefix.starts_with(PNG_MAGIC) {
        return mime::IMAGE_PNG;
    }
    if prefix.starts_with(b"GIF87a") || prefix.starts_with(b"GIF89a") {
        return mime::IMAGE_GIF;
    }
    if prefix.starts_with(ZIP_MAGIC) {
        return "application/zip".parse().unwrap_or(mime::APPLICATION_OCTET_STREAM);
    }
    if !is_text(prefix) {
        return mime::APPLICATION_OCTET_STREAM;
    }

    let head = String::from_utf8_lossy(&prefix[..prefix.len().min(64)]).trim_start().to_ascii_lowercase();
    if head.starts_with("<!doctype html") || head.starts_with("<html") {
        mime::TEXT_HTML
    } else if head.starts_with("<?xml") {
        mime::TEXT_XML
    } else {
        mime::TEXT_PLAIN
    }
}

/// UTF-16 with a byte order mark, or any 8-bit text (ASCII, UTF-8,
/// Latin-1, Windows-1252) free of NUL and other binary control bytes.
/// Since only bytes are checked, a UTF-8 sequence cut off by the end of the
/// prefix still counts as text.
fn is_text(prefix: &[u8]) -> bool {
    if prefix.starts_with(UTF16_LE_BOM) || prefix.starts_with(UTF16_BE_BOM) {
        return true;
    }
    prefix.iter().all(|&b| is_text_byte(b))
}

fn is_text_byte(b: u8) -> bool {
    // BEL through CR, and ESC, show up in real text files
    matches!(b, 0x07..=0x0D | 0x1B) || (b >= 0x20 && b != 0x7F)
}

pub fn is_supported(mime: &Mime) -> bool {
    SUPPORTED_MIME_TYPES.contains(&mime.essence_str())
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// Field validator for the uploaded file.
pub fn validate_file(file: &UploadedFile) -> Result<(), ValidationError> {
    if file.size > MAX_UPLOAD_SIZE {
        return Err(invalid("file_size", "File size too large"));
    }

    let sniffed = sniff_mime(&mut Cursor::new(&file.bytes))
        .map_err(|_| invalid("file_unreadable", "The submitted file could not be read"))?;

    if !is_supported(&sniffed) {
        log::info!(
            "Rejected upload '{}': sniffed type {} is not supported",
            file.filename,
            sniffed
        );
        return Err(invalid("file_type", "Unsupported file type"));
    }

    if let Some(guessed) = mime_guess::from_path(&file.filename).first() {
        if guessed.essence_str() != sniffed.essence_str() {
            log::warn!(
                "Upload '{}' looks like {} by name but contains {}",
                file.filename,
                guessed,
                sniffed
            );
        }
    }

    Ok(())
}

pub fn validate_priority(priority: i16) -> Result<(), ValidationError> {
    match Priority::new(priority) {
        Some(_) => Ok(()),
        None => Err(invalid(
            "priority_choice",
            "Select a valid choice. That choice is not one of the available choices.",
        )),
    }
}
