/// Strip every occurrence of `secret` from `message`, replacing it with a
/// fixed marker.
///
/// Used to sanitize vendor error bodies before they are stored in
/// `error_detail` or logged, per the credential-redaction requirement on
/// Provider Adapter failures.
#[must_use]
pub fn redact_credentials(message: &str, secrets: &[&str]) -> String {
    let mut redacted = message.to_owned();
    for secret in secrets {
        if secret.is_empty() {
            continue;
        }
        redacted = redacted.replace(secret, "[redacted]");
    }
    redacted
}
