use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Liveness route.
pub const HEALTH_ROUTE: &str = "/";

/// Multipart upload route.
pub const UPLOAD_ROUTE: &str = "/upload";

/// Stored-file listing route; `/files/{filename}` downloads one file.
pub const FILES_ROUTE: &str = "/files";

/// Multipart field carrying the uploaded file.
pub const FILE_FIELD: &str = "file";

/// `status` value of a successful upload.
pub const STATUS_SUCCESS: &str = "success";

/// `status` value of a failed request.
pub const STATUS_ERROR: &str = "error";

/// `status` value reported by the liveness route.
pub const STATUS_RUNNING: &str = "backend running";

/// Default server port.
pub const DEFAULT_PORT: u16 = 8000;

/// Characters escaped in a stored name used as a URL path segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encodes `name` for use as a single URL path segment.
pub fn encode_path_segment(name: &str) -> String {
    utf8_percent_encode(name, PATH_SEGMENT).to_string()
}

/// Path of the download route for `filename`.
///
/// The name is percent-encoded so stored names with spaces or reserved
/// characters in their extension still form a valid URL path.
pub fn file_route(filename: &str) -> String {
    format!("{FILES_ROUTE}/{}", encode_path_segment(filename))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_route_plain_name() {
        assert_eq!(
            file_route("report_20240301_101530123.pdf"),
            "/files/report_20240301_101530123.pdf"
        );
    }

    #[test]
    fn file_route_encodes_reserved() {
        assert_eq!(file_route("a b.t#x"), "/files/a%20b.t%23x");
        assert_eq!(file_route("../x"), "/files/..%2Fx");
    }

    #[test]
    fn encode_path_segment_keeps_unreserved() {
        assert_eq!(encode_path_segment("a-b_c.d~e"), "a-b_c.d~e");
    }

    #[test]
    fn file_route_encodes_utf8_bytes() {
        assert_eq!(file_route("é"), "/files/%C3%A9");
    }
}
