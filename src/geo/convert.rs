//! Conversion of positional template tokens to decimal degrees

use crate::error::{Error, Result};
use crate::types::GeoPoint;

/// Convert filtered positional tokens to a position.
///
/// - fewer than two tokens: `Ok(None)`
/// - exactly two numeric tokens: `(lat, lon)` as written
/// - otherwise exactly two compass letters (`N`/`S`/`E`/`W`) are required;
///   numbers before the first letter are latitude degree/minute/second,
///   numbers between the letters are longitude components
///
/// Any other compass-letter count is a [`Error::ParseAmbiguity`].
pub fn convert(tokens: &[&str]) -> Result<Option<GeoPoint>> {
    if tokens.len() < 2 {
        return Ok(None);
    }

    if tokens.len() == 2 {
        if let (Some(lat), Some(lon)) = (parse_number(tokens[0]), parse_number(tokens[1])) {
            return Ok(Some(GeoPoint::new(lat, lon)));
        }
    }

    let letters: Vec<(usize, f64)> = tokens
        .iter()
        .enumerate()
        .filter_map(|(i, t)| compass_sign(t).map(|sign| (i, sign)))
        .collect();

    let &[(first, lat_sign), (second, lon_sign)] = letters.as_slice() else {
        return Err(Error::ParseAmbiguity {
            compass_count: letters.len(),
        });
    };

    let (Some(lat), Some(lon)) = (
        degrees(&tokens[..first]),
        degrees(&tokens[first + 1..second]),
    ) else {
        return Ok(None);
    };

    Ok(Some(GeoPoint::new(lat_sign * lat, lon_sign * lon)))
}

/// Parse a number, accepting `,` as the decimal separator
fn parse_number(token: &str) -> Option<f64> {
    token
        .trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

fn compass_sign(token: &str) -> Option<f64> {
    match token.trim() {
        "N" | "n" | "E" | "e" => Some(1.0),
        "S" | "s" | "W" | "w" => Some(-1.0),
        _ => None,
    }
}

/// Sum degree, minute and second components; `None` when no number is present
fn degrees(tokens: &[&str]) -> Option<f64> {
    let mut parts = tokens.iter().filter_map(|t| parse_number(t));
    let deg = parts.next()?;
    let min = parts.next().unwrap_or(0.0);
    let sec = parts.next().unwrap_or(0.0);
    Some(deg + min / 60.0 + sec / 3600.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_degrees_with_compass() {
        let point = convert(&["40", "N", "70", "W"]).unwrap().unwrap();
        assert_eq!(point, GeoPoint::new(40.0, -70.0));
    }

    #[test]
    fn test_degrees_minutes_seconds() {
        let point = convert(&["51", "30", "0", "N", "0", "7", "0", "W"])
            .unwrap()
            .unwrap();
        assert!(approx(point.lat, 51.5));
        assert!(approx(point.lon, -0.116_666_666_666_666_67));
    }

    #[test]
    fn test_two_plain_numbers() {
        let point = convert(&["12.5", "45.2"]).unwrap().unwrap();
        assert_eq!(point, GeoPoint::new(12.5, 45.2));
    }

    #[test]
    fn test_comma_decimal_separator() {
        let point = convert(&["48,8566", "N", "2,3522", "E"]).unwrap().unwrap();
        assert!(approx(point.lat, 48.8566));
        assert!(approx(point.lon, 2.3522));
    }

    #[test]
    fn test_missing_components_default_to_zero() {
        let point = convert(&["33", "52", "S", "151", "12", "30", "E"])
            .unwrap()
            .unwrap();
        assert!(approx(point.lat, -(33.0 + 52.0 / 60.0)));
        assert!(approx(point.lon, 151.0 + 12.0 / 60.0 + 30.0 / 3600.0));
    }

    #[test]
    fn test_lowercase_compass_letters() {
        let point = convert(&["1", "s", "2", "w"]).unwrap().unwrap();
        assert_eq!(point, GeoPoint::new(-1.0, -2.0));
    }

    #[test]
    fn test_three_compass_letters_is_ambiguous() {
        let err = convert(&["40", "N", "70", "W", "5", "E"]).unwrap_err();
        assert!(matches!(err, Error::ParseAmbiguity { compass_count: 3 }));
    }

    #[test]
    fn test_one_compass_letter_is_ambiguous() {
        let err = convert(&["40", "N", "70"]).unwrap_err();
        assert!(matches!(err, Error::ParseAmbiguity { compass_count: 1 }));
    }

    #[test]
    fn test_too_few_tokens() {
        assert_eq!(convert(&[]).unwrap(), None);
        assert_eq!(convert(&["40"]).unwrap(), None);
    }

    #[test]
    fn test_letters_without_numbers() {
        assert_eq!(convert(&["N", "W"]).unwrap(), None);
    }

    #[test]
    fn test_non_numeric_pair_falls_through_to_compass_rule() {
        let err = convert(&["abc", "def"]).unwrap_err();
        assert!(matches!(err, Error::ParseAmbiguity { compass_count: 0 }));
    }
}
