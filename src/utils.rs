//! HTTP header helpers for artifact responses

use std::path::Path;

/// MIME type for a downloaded artifact, by file extension
///
/// Unknown or missing extensions fall back to `application/octet-stream`.
///
/// # Examples
///
/// ```
/// use audio_dl::utils::content_type_for;
///
/// assert_eq!(content_type_for("Song.m4a"), "audio/mp4");
/// assert_eq!(content_type_for("Song.MP3"), "audio/mpeg");
/// assert_eq!(content_type_for("notes"), "application/octet-stream");
/// ```
pub fn content_type_for(filename: &str) -> &'static str {
    let ext = Path::new(filename)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase());

    match ext.as_deref() {
        Some("m4a") | Some("mp4") => "audio/mp4",
        Some("mp3") => "audio/mpeg",
        Some("webm") => "audio/webm",
        Some("opus") => "audio/opus",
        Some("ogg") | Some("oga") => "audio/ogg",
        Some("zip") => "application/zip",
        _ => "application/octet-stream",
    }
}

/// `Content-Disposition: attachment` value for an arbitrary file name
///
/// The plain `filename` parameter carries an ASCII fallback with quotes,
/// backslashes and control characters replaced; `filename*` carries the exact
/// name percent-encoded per RFC 5987.
///
/// # Examples
///
/// ```
/// use audio_dl::utils::content_disposition;
///
/// assert_eq!(
///     content_disposition("Café \"Live\".mp3"),
///     "attachment; filename=\"Caf_ _Live_.mp3\"; filename*=UTF-8''Caf%C3%A9%20%22Live%22.mp3"
/// );
/// ```
pub fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    )
}
