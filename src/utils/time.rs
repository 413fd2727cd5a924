use chrono::{DateTime, Utc};

/// Current time truncated to the millisecond precision the document store keeps,
/// so a record read back compares equal to the one that was written.
pub fn now() -> DateTime<Utc> {
    bson::DateTime::now().to_chrono()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn now_has_millisecond_precision() {
        assert_eq!(now().nanosecond() % 1_000_000, 0);
    }
}
