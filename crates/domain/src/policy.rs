//! Integrity rules applied before a mutation reaches the store
//!
//! These are pure functions; the entity services decide when to run them.

use crate::error::ServiceError;

/// Message attached to `total_area` when the sub-areas exceed it
pub const AREA_SUM_MESSAGE: &str =
    "the sum of arable and vegetation area cannot exceed total area";

/// Strip every non-digit character from a tax identifier
///
/// `"123.456.789-01"` becomes `"12345678901"`.
pub fn normalize_document(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Check that a farm's arable and vegetation areas fit inside its total area
pub fn check_farm_areas(
    total_area: f64,
    arable_area: f64,
    vegetation_area: f64,
) -> Result<(), ServiceError> {
    for (field, value) in [
        ("total_area", total_area),
        ("arable_area", arable_area),
        ("vegetation_area", vegetation_area),
    ] {
        if !value.is_finite() {
            return Err(ServiceError::validation(field, "must be a finite number"));
        }
        if value < 0.0 {
            return Err(ServiceError::validation(field, "must not be negative"));
        }
    }

    if arable_area + vegetation_area > total_area {
        return Err(ServiceError::validation("total_area", AREA_SUM_MESSAGE));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_punctuation() {
        assert_eq!(normalize_document("123.456.789-01"), "12345678901");
        assert_eq!(normalize_document("12.345.678/0001-95"), "12345678000195");
    }

    #[test]
    fn test_normalize_keeps_digits_in_order() {
        let inputs = ["", "abc", " 9 8-7 ", "0a1b2c3", "12345678901", "١٢٣4"];
        for input in inputs {
            let out = normalize_document(input);
            assert!(out.chars().all(|c| c.is_ascii_digit()), "{input:?} -> {out:?}");
            let expected: String = input.chars().filter(char::is_ascii_digit).collect();
            assert_eq!(out, expected);
        }
        assert_eq!(normalize_document(" 9 8-7 "), "987");
        assert_eq!(normalize_document("١٢٣4"), "4");
    }

    #[test]
    fn test_areas_within_total_pass() {
        let cases = [
            (100.0, 60.0, 40.0),
            (100.0, 0.0, 0.0),
            (0.0, 0.0, 0.0),
            (150.0, 120.0, 30.0),
            (100.5, 80.0, 20.5),
        ];
        for (total, arable, vegetation) in cases {
            assert!(
                check_farm_areas(total, arable, vegetation).is_ok(),
                "{total}/{arable}/{vegetation}"
            );
        }
    }

    #[test]
    fn test_areas_exceeding_total_fail_on_total_area() {
        let cases = [(100.0, 70.0, 50.0), (0.0, 0.1, 0.0), (10.0, 5.0, 5.01)];
        for (total, arable, vegetation) in cases {
            let err = check_farm_areas(total, arable, vegetation).unwrap_err();
            match err {
                ServiceError::Validation { field, message } => {
                    assert_eq!(field, "total_area");
                    assert_eq!(message, AREA_SUM_MESSAGE);
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn test_negative_area_names_field() {
        let err = check_farm_areas(100.0, 10.0, -1.0).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation {
                field: "vegetation_area",
                ..
            }
        ));

        let err = check_farm_areas(f64::NAN, 10.0, 1.0).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation {
                field: "total_area",
                ..
            }
        ));
    }
}
