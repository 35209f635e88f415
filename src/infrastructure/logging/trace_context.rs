/// Trace ID generation for one survey run
pub struct TraceContext;

impl TraceContext {
    /// New trace ID (UUID v4)
    pub fn new_trace_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }
}
