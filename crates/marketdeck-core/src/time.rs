use chrono::{DateTime, Utc};

/// Reading speed used for read-time estimates.
pub const WORDS_PER_MINUTE: usize = 200;

/// Coarse "how long ago" label for a publish time.
///
/// Recent times snap to fixed buckets (5, 15 min; 1, 2, 6, 12 hours; 1, 2
/// days); anything in the future reads "Just now".
pub fn relative(published: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(published);
    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    match () {
        _ if minutes < 5 => "Just now".to_string(),
        _ if minutes < 10 => "5 min ago".to_string(),
        _ if minutes < 30 => "15 min ago".to_string(),
        _ if minutes < 60 => format!("{minutes} min ago"),
        _ if hours < 2 => "1 hour ago".to_string(),
        _ if hours < 6 => "2 hours ago".to_string(),
        _ if hours < 12 => "6 hours ago".to_string(),
        _ if hours < 24 => "12 hours ago".to_string(),
        _ if days < 2 => "1 day ago".to_string(),
        _ if days < 3 => "2 days ago".to_string(),
        _ => format!("{days} days ago"),
    }
}

/// [`relative`] for an optional timestamp; a missing one reads "Just now".
pub fn relative_opt(published: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    published.map_or_else(|| "Just now".to_string(), |at| relative(at, now))
}

/// Estimated minutes to read `content`, at least one.
pub fn read_minutes(content: &str) -> u32 {
    let words = content.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE).max(1) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn ago(minutes: i64) -> String {
        let now = Utc::now();
        relative(now - Duration::minutes(minutes), now)
    }

    #[test]
    fn buckets() {
        assert_eq!(ago(0), "Just now");
        assert_eq!(ago(4), "Just now");
        assert_eq!(ago(7), "5 min ago");
        assert_eq!(ago(29), "15 min ago");
        assert_eq!(ago(45), "45 min ago");
        assert_eq!(ago(61), "1 hour ago");
        assert_eq!(ago(2 * 60), "2 hours ago");
        assert_eq!(ago(4 * 60), "2 hours ago");
        assert_eq!(ago(6 * 60), "6 hours ago");
        assert_eq!(ago(13 * 60), "12 hours ago");
        assert_eq!(ago(30 * 60), "1 day ago");
        assert_eq!(ago(50 * 60), "2 days ago");
        assert_eq!(ago(10 * 24 * 60), "10 days ago");
    }

    #[test]
    fn the_future_is_just_now() {
        assert_eq!(ago(-90), "Just now");
        assert_eq!(relative_opt(None, Utc::now()), "Just now");
    }

    #[test]
    fn read_time_rounds_up() {
        assert_eq!(read_minutes(""), 1);
        assert_eq!(read_minutes("one two three"), 1);
        assert_eq!(read_minutes(&"word ".repeat(200)), 1);
        assert_eq!(read_minutes(&"word ".repeat(201)), 2);
        assert_eq!(read_minutes(&"word ".repeat(1000)), 5);
    }
}
