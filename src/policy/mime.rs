//! File-extension → content-type lookup.

/// Lower-cased extension of the last path segment, if it has one.
pub fn extension(path: &str) -> Option<String> {
    let segment = path.rsplit('/').next().unwrap_or(path);
    let (_, ext) = segment.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Content type for a recognized extension.
pub fn content_type_for(path: &str) -> Option<&'static str> {
    let ext = extension(path)?;
    let mime = match ext.as_str() {
        // text
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "txt" => "text/plain; charset=utf-8",
        "csv" => "text/csv; charset=utf-8",
        "md" => "text/markdown; charset=utf-8",
        "vtt" => "text/vtt; charset=utf-8",
        "xml" => "application/xml",
        "json" | "map" => "application/json",
        "webmanifest" => "application/manifest+json",
        "wasm" => "application/wasm",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        // images
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "bmp" => "image/bmp",
        // audio / video
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "ogv" => "video/ogg",
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "ogg" | "oga" => "audio/ogg",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        "m3u8" => "application/vnd.apple.mpegurl",
        "ts" => "video/mp2t",
        "mpd" => "application/dash+xml",
        // fonts
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "eot" => "application/vnd.ms-fontobject",
        _ => return None,
    };
    Some(mime)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension() {
        assert_eq!(extension("/video.mp4").as_deref(), Some("mp4"));
        assert_eq!(extension("/a.b/C.TAR.GZ").as_deref(), Some("gz"));
        assert_eq!(extension("/dir.d/file"), None);
        assert_eq!(extension("/trailing."), None);
        assert_eq!(extension("/"), None);
    }

    #[test]
    fn test_known_types() {
        assert_eq!(content_type_for("/video.mp4"), Some("video/mp4"));
        assert_eq!(content_type_for("/fonts/x.woff2"), Some("font/woff2"));
        assert_eq!(content_type_for("/IMG.JPG"), Some("image/jpeg"));
    }

    #[test]
    fn test_unknown_extension() {
        assert_eq!(content_type_for("/blob.unknownext"), None);
        assert_eq!(content_type_for("/no-extension"), None);
    }
}
