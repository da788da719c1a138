use std::io::Read;

use axum::http::{header, HeaderMap};
use flate2::read::GzDecoder;

use backend_domain::IngestError;

/// Decompresses gzip bodies. The decompressed size is held to `max_bytes`, the
/// same cap the compressed body already passed.
pub fn maybe_gunzip(headers: &HeaderMap, body: &[u8], max_bytes: u64) -> Result<Vec<u8>, IngestError> {
    let gzip = headers
        .get(header::CONTENT_ENCODING)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.trim().eq_ignore_ascii_case("gzip"));
    if !gzip {
        return Ok(body.to_vec());
    }

    let mut out = Vec::new();
    GzDecoder::new(body)
        .take(max_bytes.saturating_add(1))
        .read_to_end(&mut out)
        .map_err(|_| IngestError::InvalidJson)?;
    if out.len() as u64 > max_bytes {
        return Err(IngestError::BodyTooLarge);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).expect("write");
        encoder.finish().expect("finish")
    }

    fn gzip_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_ENCODING, HeaderValue::from_static("gzip"));
        headers
    }

    #[test]
    fn plain_bodies_pass_through() {
        let body = br#"{"game":"mhs"}"#;
        assert_eq!(maybe_gunzip(&HeaderMap::new(), body, 1024).expect("plain"), body);
    }

    #[test]
    fn gzip_bodies_are_decompressed() {
        let body = br#"{"game":"mhs"}"#;
        let decoded = maybe_gunzip(&gzip_headers(), &gzip(body), 1024).expect("gzip");
        assert_eq!(decoded, body);
    }

    #[test]
    fn decompressed_size_is_capped() {
        let body = vec![b' '; 4096];
        assert_eq!(
            maybe_gunzip(&gzip_headers(), &gzip(&body), 1024),
            Err(IngestError::BodyTooLarge)
        );
    }

    #[test]
    fn corrupt_gzip_is_invalid_json() {
        assert_eq!(
            maybe_gunzip(&gzip_headers(), b"not gzip", 1024),
            Err(IngestError::InvalidJson)
        );
    }
}
