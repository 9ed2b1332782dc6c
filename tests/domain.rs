use chrono::{Datelike, Timelike};

use omma_sync::domain::{CategoryGroup, LicenseCategory, LicenseRecord, parse_expiry};

#[test]
fn every_category_has_stable_names() {
    for category in LicenseCategory::ALL {
        assert!(!category.display_name().is_empty());
        assert!(!category.url_encoded_name().is_empty());
        assert_eq!(category.display_name(), category.display_name());
        assert_eq!(category.url_encoded_name(), category.url_encoded_name());
    }
}

#[test]
fn encoded_names_match_display_names() {
    for category in LicenseCategory::ALL {
        let decoded = category.url_encoded_name().replace("%20", " ");
        assert_eq!(decoded, category.display_name());
    }
}

#[test]
fn group_slugs_cover_their_categories() {
    assert_eq!(CategoryGroup::Grower.category(), LicenseCategory::Grower);
    assert_eq!(
        CategoryGroup::GrowerIndoor.category(),
        LicenseCategory::GrowerIndoor
    );
    assert_eq!(
        CategoryGroup::GrowerOutdoor.category(),
        LicenseCategory::GrowerOutdoor
    );
    assert_eq!(
        CategoryGroup::Dispensary.category(),
        LicenseCategory::Dispensary
    );
    assert_eq!(
        CategoryGroup::Education.category(),
        LicenseCategory::EducationFacility
    );
    assert_eq!(
        CategoryGroup::Processor.category(),
        LicenseCategory::Processor
    );
    assert_eq!(
        CategoryGroup::Laboratory.category(),
        LicenseCategory::TestingLaboratory
    );
    assert_eq!(
        CategoryGroup::Waste.category(),
        LicenseCategory::WasteDisposal
    );
}

#[test]
fn expiry_parses_to_midnight() {
    let parsed = parse_expiry("2025-03-15").unwrap();
    assert_eq!(
        (parsed.year(), parsed.month(), parsed.day()),
        (2025, 3, 15)
    );
    assert_eq!((parsed.hour(), parsed.minute(), parsed.second()), (0, 0, 0));
}

#[test]
fn record_round_trips_through_bson() {
    let raw = r#"{
        "licenseNumber": "PAAA-7777-8888",
        "licenseType": "Processor",
        "licenseExpiryDate": "2026-01-31",
        "discloseAddress": false
    }"#;
    let record: LicenseRecord = serde_json::from_str(raw).unwrap();
    let document = bson::to_document(&record).unwrap();
    assert_eq!(document.get_str("licenseNumber").unwrap(), "PAAA-7777-8888");
    assert_eq!(document.get_str("licenseType").unwrap(), "Processor");

    let decoded: LicenseRecord = bson::from_document(document).unwrap();
    assert_eq!(decoded.license_number, record.license_number);
    assert!(decoded.expiration.is_none());
}
