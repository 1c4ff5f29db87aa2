use chrono::{DateTime, Utc};
use rand::Rng;

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// `<prefix>_<millis>_<random>`; unique enough for a single writer.
pub fn new_id(prefix: &str) -> String {
    let suffix: u32 = rand::rng().random_range(0..0x10000);
    format!("{}_{}_{:04x}", prefix, now().timestamp_millis(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_id_shape() {
        let id = new_id("post");
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "post");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 4);
    }
}
