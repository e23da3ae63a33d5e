use bigdecimal::BigDecimal;
use std::fmt;

use crate::domain::{Network, Product, PurchaseKind, PurchaseRequest, ValidatedPurchase};

pub const PHONE_NUMBER_LEN: usize = 11;
pub const DISPLAY_NAME_MAX_LEN: usize = 120;
pub const PLAN_CODE_MAX_LEN: usize = 64;
pub const EMAIL_MAX_LEN: usize = 254;
/// Minor units per base currency unit (kobo per naira).
pub const MINOR_UNITS: i64 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

pub fn sanitize_string(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !ch.is_control())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn validate_required(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }

    Ok(())
}

pub fn validate_max_len(field: &'static str, value: &str, max_len: usize) -> ValidationResult {
    if value.chars().count() > max_len {
        return Err(ValidationError::new(
            field,
            format!("must be at most {} characters", max_len),
        ));
    }

    Ok(())
}

pub fn validate_phone_number(phone: &str) -> ValidationResult {
    let phone = phone.trim();
    validate_required("recipient_phone", phone)?;

    if phone.len() != PHONE_NUMBER_LEN || !phone.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(ValidationError::new(
            "recipient_phone",
            format!("must be exactly {} digits", PHONE_NUMBER_LEN),
        ));
    }

    Ok(())
}

pub fn parse_network(network: &str) -> Result<Network, ValidationError> {
    network.parse::<Network>().map_err(|_| {
        let allowed = Network::ALL
            .iter()
            .map(|n| n.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        ValidationError::new("network", format!("must be one of: {}", allowed))
    })
}

/// Drops trailing fractional zeros while keeping whole amounts at scale 0,
/// so `1500`, `1500.00` and `1.5e3` all render as `1500`.
pub fn canonical_amount(amount: &BigDecimal) -> BigDecimal {
    let normalized = amount.normalized();
    let (_, scale) = normalized.as_bigint_and_exponent();
    if scale < 0 {
        normalized.with_scale(0)
    } else {
        normalized
    }
}

pub fn validate_positive_amount(field: &'static str, amount: &BigDecimal) -> ValidationResult {
    if amount <= &BigDecimal::from(0) {
        return Err(ValidationError::new(field, "must be greater than zero"));
    }

    Ok(())
}

/// Amounts sent to the payment gateway are whole minor units.
pub fn validate_minor_unit_precision(field: &'static str, amount: &BigDecimal) -> ValidationResult {
    let minor = amount * BigDecimal::from(MINOR_UNITS);
    if minor != minor.with_scale(0) {
        return Err(ValidationError::new(
            field,
            "must have at most two decimal places",
        ));
    }

    Ok(())
}

pub fn validate_email(email: &str) -> ValidationResult {
    let email = email.trim();
    validate_required("email", email)?;
    validate_max_len("email", email, EMAIL_MAX_LEN)?;

    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(ValidationError::new("email", "must be a valid email address")),
    }
}

/// Checks every field of a purchase and produces the validated form the
/// orchestrator works with. Nothing here performs I/O.
pub fn validate_purchase(request: &PurchaseRequest) -> Result<ValidatedPurchase, ValidationError> {
    let network = parse_network(&request.network)?;

    validate_phone_number(&request.recipient_phone)?;
    validate_positive_amount("cost", &request.cost)?;

    let display_name = sanitize_string(&request.display_name);
    validate_required("display_name", &display_name)?;
    validate_max_len("display_name", &display_name, DISPLAY_NAME_MAX_LEN)?;

    let plan_code = request
        .plan_code
        .as_deref()
        .map(str::trim)
        .filter(|code| !code.is_empty());

    let product = match (request.kind, plan_code) {
        (PurchaseKind::Airtime, None) => Product::Airtime,
        (PurchaseKind::Airtime, Some(_)) => {
            return Err(ValidationError::new(
                "plan_code",
                "is only accepted for data purchases",
            ))
        }
        (PurchaseKind::Data, Some(code)) => {
            validate_max_len("plan_code", code, PLAN_CODE_MAX_LEN)?;
            Product::Data {
                plan_code: code.to_string(),
            }
        }
        (PurchaseKind::Data, None) => {
            return Err(ValidationError::new(
                "plan_code",
                "is required for data purchases",
            ))
        }
    };

    Ok(ValidatedPurchase {
        network,
        recipient_phone: request.recipient_phone.trim().to_string(),
        cost: canonical_amount(&request.cost),
        display_name,
        product,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn airtime_request() -> PurchaseRequest {
        PurchaseRequest {
            kind: PurchaseKind::Airtime,
            network: "mtn".to_string(),
            recipient_phone: "08031234567".to_string(),
            cost: BigDecimal::from(500),
            display_name: "MTN Airtime ₦500".to_string(),
            plan_code: None,
        }
    }

    #[test]
    fn validates_required_field() {
        assert!(validate_required("field", "value").is_ok());
        assert!(validate_required("field", "   ").is_err());
    }

    #[test]
    fn validates_max_len() {
        assert!(validate_max_len("field", "abc", 3).is_ok());
        assert!(validate_max_len("field", "abcd", 3).is_err());
    }

    #[test]
    fn sanitizes_string() {
        assert_eq!(sanitize_string("  hello\tworld  "), "hello world");
        assert_eq!(sanitize_string(" \n "), "");
        assert_eq!(sanitize_string("ab\u{0000}cd\u{0007}"), "abcd");
    }

    #[test]
    fn validates_phone_number() {
        assert!(validate_phone_number("08031234567").is_ok());
        assert!(validate_phone_number(" 08031234567 ").is_ok());
        assert!(validate_phone_number("0803123456").is_err());
        assert!(validate_phone_number("080312345678").is_err());
        assert!(validate_phone_number("0803123456a").is_err());
        assert!(validate_phone_number("").is_err());
    }

    #[test]
    fn validates_positive_amount() {
        let positive = BigDecimal::from_str("1.23").expect("valid decimal");
        assert!(validate_positive_amount("cost", &positive).is_ok());
        assert!(validate_positive_amount("cost", &BigDecimal::from(0)).is_err());
        assert!(validate_positive_amount("cost", &BigDecimal::from(-1)).is_err());
    }

    #[test]
    fn canonicalizes_amounts() {
        let from_float = BigDecimal::try_from(500.5f64).unwrap();
        assert_eq!(canonical_amount(&from_float).to_string(), "500.5");
        assert_eq!(canonical_amount(&BigDecimal::from(1500)).to_string(), "1500");
        assert_eq!(
            canonical_amount(&BigDecimal::from_str("1500.00").unwrap()).to_string(),
            "1500"
        );
    }

    #[test]
    fn validates_minor_unit_precision() {
        let ok = BigDecimal::from_str("100.25").unwrap();
        let too_precise = BigDecimal::from_str("100.255").unwrap();
        assert!(validate_minor_unit_precision("amount", &ok).is_ok());
        assert!(validate_minor_unit_precision("amount", &too_precise).is_err());
    }

    #[test]
    fn validates_email() {
        assert!(validate_email("ada@example.com").is_ok());
        assert!(validate_email("ada.example.com").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ada@localhost").is_err());
    }

    #[test]
    fn accepts_airtime_purchase() {
        let validated = validate_purchase(&airtime_request()).expect("valid request");
        assert_eq!(validated.network, Network::Mtn);
        assert_eq!(validated.product, Product::Airtime);
        assert_eq!(validated.display_name, "MTN Airtime ₦500");
    }

    #[test]
    fn rejects_data_purchase_without_plan_code() {
        let mut request = airtime_request();
        request.kind = PurchaseKind::Data;

        let err = validate_purchase(&request).unwrap_err();
        assert_eq!(err.field, "plan_code");

        request.plan_code = Some("   ".to_string());
        assert_eq!(validate_purchase(&request).unwrap_err().field, "plan_code");
    }

    #[test]
    fn rejects_airtime_purchase_with_plan_code() {
        let mut request = airtime_request();
        request.plan_code = Some("MTN-1GB".to_string());
        assert_eq!(validate_purchase(&request).unwrap_err().field, "plan_code");
    }

    #[test]
    fn rejects_unknown_network_and_non_positive_cost() {
        let mut request = airtime_request();
        request.network = "VODAFONE".to_string();
        assert_eq!(validate_purchase(&request).unwrap_err().field, "network");

        let mut request = airtime_request();
        request.cost = BigDecimal::from(0);
        assert_eq!(validate_purchase(&request).unwrap_err().field, "cost");
    }
}
