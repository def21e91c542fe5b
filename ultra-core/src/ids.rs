/// Generate a fresh opaque correlation id.
///
/// Used when a caller does not supply one on `PipelineRequest`.
#[must_use]
pub fn new_correlation_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
