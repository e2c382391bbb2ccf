//! Public download URL template.

/// Build `https://<host>/<bucket>/o/<encoded path>?alt=media&token=<token>`.
///
/// The object path is percent-encoded as a single segment, so `/` becomes
/// `%2F`. A `host` that already carries a scheme (e.g. `http://localhost:8080/v0/b`)
/// is used as-is.
pub fn download_url(host: &str, bucket: &str, object_path: &str, token: &str) -> String {
    let host = host.trim_end_matches('/');
    let base = if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    };

    format!(
        "{}/{}/o/{}?alt=media&token={}",
        base,
        bucket,
        urlencoding::encode(object_path),
        urlencoding::encode(token)
    )
}
