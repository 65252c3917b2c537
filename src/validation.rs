// Validation utilities module
// Provides custom validation functions for domain-specific rules

use validator::ValidationError;

/// Validates a venue-local wall-clock time in "HH:mm" format (00:00 - 23:59)
pub fn validate_hhmm(value: &str) -> Result<(), ValidationError> {
    if parse_hhmm(value).is_some() {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_time_format"))
    }
}

/// Parses "HH:mm" into (hour, minute). Returns None for malformed input.
pub fn parse_hhmm(value: &str) -> Option<(u32, u32)> {
    let (h, m) = value.split_once(':')?;
    if h.len() != 2 || m.len() != 2 {
        return None;
    }
    let hour: u32 = h.parse().ok()?;
    let minute: u32 = m.parse().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some((hour, minute))
}

/// Validates that a room type is one of the accepted values
/// Valid values: "small", "medium", "large", "vip" (case-insensitive)
pub fn validate_room_type(room_type: &str) -> Result<(), ValidationError> {
    let valid_types = ["small", "medium", "large", "vip"];
    if valid_types.contains(&room_type.to_lowercase().as_str()) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_room_type"))
    }
}

/// Validates that a discount percentage is between 0 and 100
pub fn validate_percentage(value: f64) -> Result<(), ValidationError> {
    if !(0.0..=100.0).contains(&value) {
        Err(ValidationError::new("percentage_out_of_range"))
    } else {
        Ok(())
    }
}

/// Validates that a quantity is strictly positive
pub fn validate_positive_quantity(quantity: i64) -> Result<(), ValidationError> {
    if quantity <= 0 {
        Err(ValidationError::new("quantity_must_be_positive"))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hhmm_valid() {
        assert_eq!(parse_hhmm("00:00"), Some((0, 0)));
        assert_eq!(parse_hhmm("09:30"), Some((9, 30)));
        assert_eq!(parse_hhmm("23:59"), Some((23, 59)));
    }

    #[test]
    fn test_parse_hhmm_invalid() {
        assert_eq!(parse_hhmm("24:00"), None);
        assert_eq!(parse_hhmm("12:60"), None);
        assert_eq!(parse_hhmm("9:30"), None);
        assert_eq!(parse_hhmm("0930"), None);
        assert_eq!(parse_hhmm("ab:cd"), None);
        assert_eq!(parse_hhmm(""), None);
    }

    #[test]
    fn test_validate_hhmm() {
        assert!(validate_hhmm("10:00").is_ok());
        assert!(validate_hhmm("25:00").is_err());
    }

    #[test]
    fn test_validate_room_type() {
        assert!(validate_room_type("vip").is_ok());
        assert!(validate_room_type("VIP").is_ok());
        assert!(validate_room_type("penthouse").is_err());
    }

    #[test]
    fn test_validate_percentage() {
        assert!(validate_percentage(0.0).is_ok());
        assert!(validate_percentage(100.0).is_ok());
        assert!(validate_percentage(100.5).is_err());
        assert!(validate_percentage(-1.0).is_err());
    }
}
