//! Draft validation.
//!
//! An explicit function returning a structured error list; the API layer
//! attaches the list to a problem-details response verbatim.

use serde::Serialize;

use super::EventDraft;

/// A single field-level violation with a machine-readable code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub code: String,
    pub message: String,
}

impl FieldError {
    pub fn new(
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

fn required(field: &str) -> FieldError {
    FieldError::new(field, "required", format!("{field} is required"))
}

/// Validates a draft against the cross-field rules. Returns one error per
/// violated field; an empty list means the draft is valid. Field names in
/// the result are wire names. Never mutates the input.
pub fn validate(draft: &EventDraft) -> Vec<FieldError> {
    let mut errors = Vec::new();

    match &draft.name {
        Some(name) if !name.trim().is_empty() => {}
        _ => errors.push(required("name")),
    }
    match &draft.description {
        Some(description) if !description.trim().is_empty() => {}
        _ => errors.push(required("description")),
    }

    if draft.begin_enrollment_date_time.is_none() {
        errors.push(required("beginEnrollmentDateTime"));
    }
    if draft.close_enrollment_date_time.is_none() {
        errors.push(required("closeEnrollmentDateTime"));
    }
    if draft.begin_event_date_time.is_none() {
        errors.push(required("beginEventDateTime"));
    }
    if draft.end_event_date_time.is_none() {
        errors.push(required("endEventDateTime"));
    }

    match draft.base_price {
        None => errors.push(required("basePrice")),
        Some(base_price) if base_price < 0 => errors.push(FieldError::new(
            "basePrice",
            "negative",
            "basePrice cannot be negative",
        )),
        Some(_) => {}
    }
    match draft.max_price {
        None => errors.push(required("maxPrice")),
        Some(max_price) if max_price < 0 => errors.push(FieldError::new(
            "maxPrice",
            "negative",
            "maxPrice cannot be negative",
        )),
        Some(_) => {}
    }
    match draft.limit_of_enrollment {
        None => errors.push(required("limitOfEnrollment")),
        Some(limit) if limit <= 0 => errors.push(FieldError::new(
            "limitOfEnrollment",
            "not_positive",
            "limitOfEnrollment must be positive",
        )),
        Some(_) => {}
    }

    // maxPrice == 0 means unlimited, auction-style pricing.
    if let (Some(base_price), Some(max_price)) = (draft.base_price, draft.max_price) {
        if max_price != 0 && base_price > max_price {
            errors.push(FieldError::new(
                "basePrice",
                "wrong_prices",
                "basePrice cannot exceed a non-zero maxPrice",
            ));
            errors.push(FieldError::new(
                "maxPrice",
                "wrong_prices",
                "maxPrice must be zero or at least basePrice",
            ));
        }
    }

    if let (Some(begin), Some(close)) = (
        draft.begin_enrollment_date_time,
        draft.close_enrollment_date_time,
    ) {
        if close < begin {
            errors.push(FieldError::new(
                "closeEnrollmentDateTime",
                "wrong_enrollment_window",
                "closeEnrollmentDateTime cannot precede beginEnrollmentDateTime",
            ));
        }
    }

    if let (Some(begin), Some(end)) = (draft.begin_event_date_time, draft.end_event_date_time) {
        if end < begin {
            errors.push(FieldError::new(
                "endEventDateTime",
                "wrong_event_window",
                "endEventDateTime cannot precede beginEventDateTime",
            ));
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 1, 12, 0, 0).unwrap()
    }

    fn valid_draft() -> EventDraft {
        let t = base_time();
        EventDraft {
            name: Some("Spring REST API study".to_string()),
            description: Some("REST API development with event enrollment".to_string()),
            begin_enrollment_date_time: Some(t),
            close_enrollment_date_time: Some(t + Duration::days(7)),
            begin_event_date_time: Some(t + Duration::days(14)),
            end_event_date_time: Some(t + Duration::days(15)),
            location: Some("Gangnam station D2 startup factory".to_string()),
            base_price: Some(100),
            max_price: Some(200),
            limit_of_enrollment: Some(100),
        }
    }

    fn codes_for<'a>(errors: &'a [FieldError], field: &str) -> Vec<&'a str> {
        errors
            .iter()
            .filter(|e| e.field == field)
            .map(|e| e.code.as_str())
            .collect()
    }

    #[test]
    fn test_valid_draft_passes() {
        assert!(validate(&valid_draft()).is_empty());
    }

    #[test]
    fn test_empty_draft_reports_every_required_field() {
        let errors = validate(&EventDraft::default());

        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        for field in [
            "name",
            "description",
            "beginEnrollmentDateTime",
            "closeEnrollmentDateTime",
            "beginEventDateTime",
            "endEventDateTime",
            "basePrice",
            "maxPrice",
            "limitOfEnrollment",
        ] {
            assert!(fields.contains(&field), "missing required error for {field}");
        }
        assert!(errors.iter().all(|e| e.code == "required"));
    }

    #[test]
    fn test_blank_name_is_rejected() {
        let draft = EventDraft {
            name: Some("   ".to_string()),
            ..valid_draft()
        };

        let errors = validate(&draft);

        assert_eq!(codes_for(&errors, "name"), vec!["required"]);
    }

    #[test]
    fn test_base_price_above_max_price_is_rejected_on_both_fields() {
        let draft = EventDraft {
            base_price: Some(10_000),
            max_price: Some(200),
            ..valid_draft()
        };

        let errors = validate(&draft);

        assert_eq!(codes_for(&errors, "basePrice"), vec!["wrong_prices"]);
        assert_eq!(codes_for(&errors, "maxPrice"), vec!["wrong_prices"]);
    }

    #[test]
    fn test_zero_max_price_allows_any_base_price() {
        let draft = EventDraft {
            base_price: Some(10_000),
            max_price: Some(0),
            ..valid_draft()
        };

        assert!(validate(&draft).is_empty());
    }

    #[test]
    fn test_close_enrollment_before_begin_is_rejected() {
        let t = base_time();
        let draft = EventDraft {
            begin_enrollment_date_time: Some(t),
            close_enrollment_date_time: Some(t - Duration::hours(1)),
            ..valid_draft()
        };

        let errors = validate(&draft);

        assert_eq!(
            codes_for(&errors, "closeEnrollmentDateTime"),
            vec!["wrong_enrollment_window"]
        );
    }

    #[test]
    fn test_close_enrollment_equal_to_begin_is_allowed() {
        let t = base_time();
        let draft = EventDraft {
            begin_enrollment_date_time: Some(t),
            close_enrollment_date_time: Some(t),
            ..valid_draft()
        };

        assert!(validate(&draft).is_empty());
    }

    #[test]
    fn test_event_window_end_before_begin_is_rejected() {
        let t = base_time();
        let draft = EventDraft {
            begin_event_date_time: Some(t + Duration::days(2)),
            end_event_date_time: Some(t + Duration::days(1)),
            ..valid_draft()
        };

        let errors = validate(&draft);

        assert_eq!(
            codes_for(&errors, "endEventDateTime"),
            vec!["wrong_event_window"]
        );
    }

    #[test]
    fn test_negative_prices_and_zero_limit_are_rejected() {
        let draft = EventDraft {
            base_price: Some(-1),
            max_price: Some(-5),
            limit_of_enrollment: Some(0),
            ..valid_draft()
        };

        let errors = validate(&draft);

        assert_eq!(codes_for(&errors, "basePrice"), vec!["negative"]);
        assert_eq!(codes_for(&errors, "maxPrice"), vec!["negative"]);
        assert_eq!(codes_for(&errors, "limitOfEnrollment"), vec!["not_positive"]);
    }

    #[test]
    fn test_validate_does_not_mutate_input() {
        let draft = valid_draft();
        let before = draft.clone();

        let _ = validate(&draft);

        assert_eq!(draft, before);
    }
}
