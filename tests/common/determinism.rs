//! Fixed timestamps for reproducible persistence tests

use chrono::{DateTime, Duration, Utc};
use devtools_ext::{ToolStateRecord, ToolStates};

/// Fixed timestamp for testing (2024-01-01 00:00:00 UTC)
pub const TEST_TIMESTAMP: &str = "2024-01-01T00:00:00Z";

/// Get a fixed chrono DateTime for testing
pub fn test_now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(TEST_TIMESTAMP)
        .expect("Invalid test timestamp")
        .with_timezone(&Utc)
}

/// A record stamped `days` after [`TEST_TIMESTAMP`]
pub fn record_at(days: i64, tool_states: ToolStates, last_selected_tool: Option<&str>) -> ToolStateRecord {
    let mut record = ToolStateRecord::new(tool_states, last_selected_tool.map(String::from));
    record.updated_at = test_now() + Duration::days(days);
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_timestamp() {
        let ts = test_now();
        assert_eq!(ts.year(), 2024);
        assert_eq!(ts.month(), 1);
        assert_eq!(ts.day(), 1);
    }

    #[test]
    fn test_record_at_offsets_from_fixed_time() {
        let record = record_at(3, ToolStates::new(), Some("screenshot"));
        assert_eq!(record.updated_at.day(), 4);
        assert_eq!(record.last_selected_tool.as_deref(), Some("screenshot"));
    }
}
