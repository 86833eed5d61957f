pub const PACE_PLACEHOLDER: &str = "-:--";

/// Formats the average pace of a run as `m:ss` per kilometer.
pub fn format_pace(distance_km: f64, duration_min: u32) -> String {
    if !distance_km.is_finite() || distance_km <= 0.0 {
        return PACE_PLACEHOLDER.to_string();
    }

    let pace = f64::from(duration_min) / distance_km;
    let mut minutes = pace.floor() as u64;
    let mut seconds = ((pace - pace.floor()) * 60.0).round() as u64;
    if seconds == 60 {
        minutes += 1;
        seconds = 0;
    }

    format!("{minutes}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pace_whole_minutes() {
        assert_eq!(format_pace(10.0, 50), "5:00");
    }

    #[test]
    fn pace_zero_distance_is_placeholder() {
        assert_eq!(format_pace(0.0, 30), "-:--");
    }

    #[test]
    fn pace_fractional_minutes() {
        assert_eq!(format_pace(5.0, 27), "5:24");
        assert_eq!(format_pace(20.5, 110), "5:22");
    }

    #[test]
    fn pace_carries_rounded_seconds() {
        // 5.999 min/km rounds to 60 seconds
        assert_eq!(format_pace(1000.0, 5999), "6:00");
    }
}
