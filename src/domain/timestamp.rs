use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

pub fn now_utc_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .expect("RFC3339 formatting for UTC timestamp should never fail")
}

/// Validates and canonicalizes an RFC 3339 timestamp supplied by a caller.
pub fn normalize_datetime(value: Option<&str>) -> Option<String> {
    let raw = value?.trim();
    if raw.is_empty() {
        return None;
    }
    OffsetDateTime::parse(raw, &Rfc3339)
        .ok()
        .and_then(|ts| ts.format(&Rfc3339).ok())
}
