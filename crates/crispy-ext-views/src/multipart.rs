//! `multipart/form-data` request bodies.
//!
//! Forms that carry a file field render with
//! `enctype="multipart/form-data"`; [`parse_multipart`] turns such a body
//! back into [`FormData`] and [`Files`]. Part bodies are sliced as bytes so
//! binary uploads come through unchanged.

use crispy_ext_core::{CrispyError, CrispyResult};
use crispy_ext_forms::data::{Files, FormData, UploadedFile};

/// Largest accepted single upload (2.5 MB).
pub const FILE_UPLOAD_MAX_MEMORY_SIZE: usize = 2_621_440;

/// The fields and files of a parsed multipart body.
#[derive(Debug, Clone, Default)]
pub struct MultipartData {
    /// Plain form fields.
    pub fields: FormData,
    /// Uploaded files. A repeated file field keeps the last upload.
    pub files: Files,
}

/// Extracts the boundary from a `multipart/form-data` content type.
///
/// ```
/// use crispy_ext_views::multipart::extract_boundary;
///
/// assert_eq!(extract_boundary("multipart/form-data; boundary=\"xyz\""), Some("xyz"));
/// assert_eq!(extract_boundary("multipart/form-data"), None);
/// ```
pub fn extract_boundary(content_type: &str) -> Option<&str> {
    content_type.split(';').find_map(|param| {
        let boundary = param.trim().strip_prefix("boundary=")?.trim_matches('"');
        (!boundary.is_empty()).then_some(boundary)
    })
}

/// Parses a `multipart/form-data` body.
///
/// Parts without a `name` are ignored, as are file inputs submitted with
/// no file selected.
pub fn parse_multipart(body: &[u8], boundary: &str) -> CrispyResult<MultipartData> {
    let delimiter = format!("--{boundary}");
    let mut data = MultipartData::default();

    for part in split_parts(body, delimiter.as_bytes()) {
        let part = trim_line_break_end(trim_line_break_start(part));
        let Some((headers, content)) = split_headers(part) else {
            continue;
        };

        let headers = String::from_utf8_lossy(headers);
        let mut name = None;
        let mut filename = None;
        let mut content_type = "text/plain".to_string();
        for line in headers.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            if key.trim().eq_ignore_ascii_case("content-disposition") {
                name = header_param(value, "name");
                filename = header_param(value, "filename");
            } else if key.trim().eq_ignore_ascii_case("content-type") {
                content_type = value.to_string();
            }
        }

        let Some(name) = name else {
            continue;
        };

        match filename {
            Some(filename) => {
                if filename.is_empty() && content.is_empty() {
                    continue;
                }
                if content.len() > FILE_UPLOAD_MAX_MEMORY_SIZE {
                    return Err(CrispyError::BadRequest(format!(
                        "File '{filename}' exceeds maximum upload size of {FILE_UPLOAD_MAX_MEMORY_SIZE} bytes"
                    )));
                }
                data.files
                    .insert(name, UploadedFile::new(filename, content_type, content));
            }
            None => data
                .fields
                .append(name, String::from_utf8_lossy(content).into_owned()),
        }
    }

    tracing::debug!(
        fields = data.fields.len(),
        files = data.files.len(),
        "Parsed multipart body"
    );
    Ok(data)
}

/// The slices between delimiters, stopping at the closing delimiter.
fn split_parts<'a>(body: &'a [u8], delimiter: &[u8]) -> Vec<&'a [u8]> {
    let mut parts = Vec::new();
    let Some(first) = find(body, delimiter, 0) else {
        return parts;
    };
    let mut start = first + delimiter.len();
    while let Some(next) = find(body, delimiter, start) {
        let part = &body[start..next];
        if part.starts_with(b"--") {
            break;
        }
        parts.push(part);
        start = next + delimiter.len();
    }
    parts
}

fn split_headers(part: &[u8]) -> Option<(&[u8], &[u8])> {
    if let Some(pos) = find(part, b"\r\n\r\n", 0) {
        Some((&part[..pos], &part[pos + 4..]))
    } else {
        find(part, b"\n\n", 0).map(|pos| (&part[..pos], &part[pos + 2..]))
    }
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}

fn trim_line_break_start(part: &[u8]) -> &[u8] {
    part.strip_prefix(b"\r\n")
        .or_else(|| part.strip_prefix(b"\n"))
        .unwrap_or(part)
}

fn trim_line_break_end(part: &[u8]) -> &[u8] {
    part.strip_suffix(b"\r\n")
        .or_else(|| part.strip_suffix(b"\n"))
        .unwrap_or(part)
}

/// Reads `param` from a header value such as
/// `form-data; name="photo"; filename="me.png"`.
fn header_param(value: &str, param: &str) -> Option<String> {
    value.split(';').skip(1).find_map(|pair| {
        let (key, val) = pair.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case(param)
            .then(|| val.trim().trim_matches('"').to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_boundary() {
        assert_eq!(
            extract_boundary("multipart/form-data; boundary=----WebKitFormBoundary"),
            Some("----WebKitFormBoundary")
        );
        assert_eq!(extract_boundary("multipart/form-data; boundary="), None);
    }

    #[test]
    fn test_fields_and_file() {
        let body = "--b\r\n\
             Content-Disposition: form-data; name=\"name\"\r\n\
             \r\n\
             Ada\r\n\
             --b\r\n\
             Content-Disposition: form-data; name=\"photo-0-image\"; filename=\"me.png\"\r\n\
             Content-Type: image/png\r\n\
             \r\n\
             PNGDATA\r\n\
             --b--\r\n";
        let data = parse_multipart(body.as_bytes(), "b").unwrap();
        assert_eq!(data.fields.get("name"), Some("Ada"));
        let file = &data.files["photo-0-image"];
        assert_eq!(file.name, "me.png");
        assert_eq!(file.content_type, "image/png");
        assert_eq!(file.content, b"PNGDATA");
    }

    #[test]
    fn test_repeated_field_keeps_all_values() {
        let body = "--b\r\nContent-Disposition: form-data; name=\"tag\"\r\n\r\na\r\n\
             --b\r\nContent-Disposition: form-data; name=\"tag\"\r\n\r\nb\r\n--b--\r\n";
        let data = parse_multipart(body.as_bytes(), "b").unwrap();
        assert_eq!(data.fields.get_list("tag"), &["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_filename_before_name() {
        let body = "--b\r\nContent-Disposition: form-data; filename=\"x.txt\"; name=\"doc\"\r\n\r\nhi\r\n--b--";
        let data = parse_multipart(body.as_bytes(), "b").unwrap();
        assert_eq!(data.files["doc"].name, "x.txt");
    }

    #[test]
    fn test_binary_content_is_preserved() {
        let mut body = b"--b\r\nContent-Disposition: form-data; name=\"f\"; filename=\"a.bin\"\r\n\r\n".to_vec();
        body.extend_from_slice(&[0xff, 0x00, 0xfe, b'\r', b'\n', 0x01]);
        body.extend_from_slice(b"\r\n--b--\r\n");
        let data = parse_multipart(&body, "b").unwrap();
        assert_eq!(data.files["f"].content, vec![0xff, 0x00, 0xfe, b'\r', b'\n', 0x01]);
    }

    #[test]
    fn test_empty_file_input_is_skipped() {
        let body = "--b\r\nContent-Disposition: form-data; name=\"f\"; filename=\"\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n\r\n--b--\r\n";
        let data = parse_multipart(body.as_bytes(), "b").unwrap();
        assert!(data.files.is_empty());
    }

    #[test]
    fn test_lf_line_endings() {
        let body = "--b\nContent-Disposition: form-data; name=\"name\"\n\nAda\n--b--\n";
        let data = parse_multipart(body.as_bytes(), "b").unwrap();
        assert_eq!(data.fields.get("name"), Some("Ada"));
    }

    #[test]
    fn test_part_without_name_is_ignored() {
        let body = "--b\r\nContent-Type: text/plain\r\n\r\nstray\r\n--b--\r\n";
        let data = parse_multipart(body.as_bytes(), "b").unwrap();
        assert!(data.fields.is_empty());
    }

    #[test]
    fn test_oversized_upload_is_rejected() {
        let mut body = b"--b\r\nContent-Disposition: form-data; name=\"f\"; filename=\"big.bin\"\r\n\r\n".to_vec();
        body.extend(std::iter::repeat(b'x').take(FILE_UPLOAD_MAX_MEMORY_SIZE + 1));
        body.extend_from_slice(b"\r\n--b--\r\n");
        let err = parse_multipart(&body, "b").unwrap_err();
        assert!(matches!(err, CrispyError::BadRequest(ref m) if m.contains("big.bin")));
    }

    #[test]
    fn test_empty_body() {
        let data = parse_multipart(b"", "b").unwrap();
        assert!(data.fields.is_empty());
        assert!(data.files.is_empty());
    }
}
