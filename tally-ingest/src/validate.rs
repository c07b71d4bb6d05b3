//! Row Validator: genuine movement vs. header, footer or noise.

use tally_core::{BankProfile, Field, MovementRecord};

/// Alphanumeric characters in the description and reference.
pub fn description_strength(record: &MovementRecord) -> usize {
    let count = |s: &str| s.chars().filter(|c| c.is_alphanumeric()).count();
    count(&record.description) + record.reference.as_deref().map_or(0, count)
}

/// At least one amount field parses under the full grammar.
pub fn has_valid_amount(record: &MovementRecord, profile: &BankProfile) -> bool {
    [Field::Debit, Field::Credit, Field::Balance, Field::SettlementBalance]
        .into_iter()
        .any(|f| record.amount_value(f, profile.require_decimals).is_some())
}

/// Description or date text matches a boilerplate pattern.
pub fn is_noise(record: &MovementRecord, profile: &BankProfile) -> bool {
    profile.is_noise(&record.description) || (!record.date.is_empty() && profile.is_noise(&record.date))
}

/// Accept a record as a transaction.
///
/// Requires an exact date, a valid amount and a description of at least
/// `description.min_chars` alphanumerics (waived by `allow_empty`). With
/// `lenient_date` configured, a present but unreadable date is tolerated
/// when the amount is valid and the description is at least
/// `lenient_date.min_description_chars` strong.
pub fn is_transaction(record: &MovementRecord, profile: &BankProfile) -> bool {
    if is_noise(record, profile) || !has_valid_amount(record, profile) {
        return false;
    }

    let strength = description_strength(record);
    if profile.date.is_exact(&record.date) {
        return profile.description.allow_empty || strength >= profile.description.min_chars;
    }

    match &profile.lenient_date {
        Some(lenient) => !record.date.trim().is_empty() && strength >= lenient.min_description_chars,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::{builtin_config, builtin_profile};
    use tally_core::LenientDate;

    fn record(date: &str, desc: &str, debit: Option<&str>) -> MovementRecord {
        MovementRecord {
            date: date.into(),
            description: desc.into(),
            debit: debit.map(String::from),
            ..MovementRecord::default()
        }
    }

    #[test]
    fn test_accepts_complete_movement() {
        let p = builtin_profile("bbva_mx").unwrap();
        assert!(is_transaction(&record("02/ENE", "tienda A", Some("150.00")), &p));
    }

    #[test]
    fn test_rejects_missing_parts() {
        let p = builtin_profile("bbva_mx").unwrap();
        assert!(!is_transaction(&record("", "tienda A", Some("150.00")), &p));
        assert!(!is_transaction(&record("02/ENE", "tienda A", None), &p));
        assert!(!is_transaction(&record("02/ENE", "tienda A", Some("00912")), &p));
        assert!(!is_transaction(&record("02/ENE", "-", Some("150.00")), &p));
    }

    #[test]
    fn test_rejects_noise() {
        let p = builtin_profile("bbva_mx").unwrap();
        let r = record("02/ENE", "Estimado Cliente, su estado de cuenta", Some("150.00"));
        assert!(!is_transaction(&r, &p));
    }

    #[test]
    fn test_allow_empty_description() {
        let mut cfg = builtin_config("bbva_mx").unwrap();
        cfg.description.allow_empty = true;
        let p = BankProfile::from_config(&cfg).unwrap();
        assert!(is_transaction(&record("02/ENE", "", Some("150.00")), &p));
    }

    #[test]
    fn test_reference_counts_towards_description() {
        let p = builtin_profile("bbva_mx").unwrap();
        let mut r = record("02/ENE", "", Some("150.00"));
        r.reference = Some("Ref. 0091234".into());
        assert!(is_transaction(&r, &p));
    }

    #[test]
    fn test_lenient_date() {
        let mut cfg = builtin_config("bbva_mx").unwrap();
        cfg.lenient_date = None;
        let strict = BankProfile::from_config(&cfg).unwrap();
        cfg.lenient_date = Some(LenientDate::default());
        let lenient = BankProfile::from_config(&cfg).unwrap();

        let strong = record("O2/EN3", "PAGO TARJETA", Some("150.00"));
        let weak = record("O2/EN3", "PAGO", Some("150.00"));
        let dateless = record("", "PAGO TARJETA", Some("150.00"));

        assert!(!is_transaction(&strong, &strict));
        assert!(is_transaction(&strong, &lenient));
        assert!(!is_transaction(&weak, &lenient));
        assert!(!is_transaction(&dateless, &lenient));
    }
}
