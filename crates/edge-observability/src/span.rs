//! W3C trace context propagation.

use edge_core::RequestId;

/// Trace context for distributed tracing.
///
/// Compatible with W3C Trace Context format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceContext {
    /// The trace ID (128-bit, hex encoded).
    pub trace_id: String,
    /// The span ID (64-bit, hex encoded).
    pub span_id: String,
    /// Parent span ID if this is a child span.
    pub parent_span_id: Option<String>,
    /// Whether this trace is sampled.
    pub sampled: bool,
}

impl TraceContext {
    /// Create a new root trace context.
    pub fn new() -> Self {
        Self {
            trace_id: generate_trace_id(),
            span_id: generate_span_id(),
            parent_span_id: None,
            sampled: true,
        }
    }

    /// Create a child span from this context.
    pub fn child(&self) -> Self {
        Self {
            trace_id: self.trace_id.clone(),
            span_id: generate_span_id(),
            parent_span_id: Some(self.span_id.clone()),
            sampled: self.sampled,
        }
    }

    /// Continue an incoming trace, or start a new one when the header is
    /// missing or malformed.
    pub fn from_header(header: Option<&str>) -> Self {
        header
            .and_then(Self::from_traceparent)
            .map(|parent| parent.child())
            .unwrap_or_default()
    }

    /// Parse from W3C traceparent header.
    ///
    /// Format: `{version}-{trace_id}-{span_id}-{flags}`
    /// Example: `00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01`
    pub fn from_traceparent(header: &str) -> Option<Self> {
        let parts: Vec<&str> = header.trim().split('-').collect();
        let [version, trace_id, span_id, flags] = parts.as_slice() else {
            return None;
        };

        // Only version 00 is defined.
        if *version != "00" {
            return None;
        }
        if !is_hex_id(trace_id, 32) || !is_hex_id(span_id, 16) {
            return None;
        }
        let flags = u8::from_str_radix(flags, 16).ok()?;

        Some(Self {
            trace_id: trace_id.to_ascii_lowercase(),
            span_id: span_id.to_ascii_lowercase(),
            parent_span_id: None,
            sampled: flags & 0x01 != 0,
        })
    }

    /// Format as W3C traceparent header.
    pub fn to_traceparent(&self) -> String {
        let flags = if self.sampled { "01" } else { "00" };
        format!("00-{}-{}-{}", self.trace_id, self.span_id, flags)
    }

    /// Request ID correlated with this trace.
    pub fn request_id(&self) -> RequestId {
        RequestId::from_string(self.trace_id.clone())
    }
}

impl Default for TraceContext {
    fn default() -> Self {
        Self::new()
    }
}

/// All-zero ids are invalid per the W3C format.
fn is_hex_id(id: &str, len: usize) -> bool {
    id.len() == len
        && id.bytes().all(|b| b.is_ascii_hexdigit())
        && id.bytes().any(|b| b != b'0')
}

fn generate_trace_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

fn generate_span_id() -> String {
    let (high, _) = uuid::Uuid::new_v4().as_u64_pair();
    format!("{:016x}", high)
}
