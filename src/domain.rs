use std::fmt;

use bson::DateTime;
use chrono::{NaiveDate, NaiveTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LicenseCategory {
    Dispensary,
    EducationFacility,
    Grower,
    GrowerIndoor,
    GrowerOutdoor,
    Processor,
    TestingLaboratory,
    Transporter,
    WasteDisposal,
}

impl LicenseCategory {
    pub const ALL: [LicenseCategory; 9] = [
        LicenseCategory::Dispensary,
        LicenseCategory::EducationFacility,
        LicenseCategory::Grower,
        LicenseCategory::GrowerIndoor,
        LicenseCategory::GrowerOutdoor,
        LicenseCategory::Processor,
        LicenseCategory::TestingLaboratory,
        LicenseCategory::Transporter,
        LicenseCategory::WasteDisposal,
    ];

    pub fn categories(exclude: &[LicenseCategory]) -> Vec<LicenseCategory> {
        Self::ALL
            .iter()
            .copied()
            .filter(|category| !exclude.contains(category))
            .collect()
    }

    pub fn display_name(self) -> &'static str {
        match self {
            LicenseCategory::Dispensary => "Dispensary",
            LicenseCategory::EducationFacility => "Education Facility",
            LicenseCategory::Grower => "Grower",
            LicenseCategory::GrowerIndoor => "Grower Indoor",
            LicenseCategory::GrowerOutdoor => "Grower Outdoor",
            LicenseCategory::Processor => "Processor",
            LicenseCategory::TestingLaboratory => "Testing Laboratory",
            LicenseCategory::Transporter => "Transporter",
            LicenseCategory::WasteDisposal => "Waste Disposal Facility",
        }
    }

    pub fn url_encoded_name(self) -> &'static str {
        match self {
            LicenseCategory::Dispensary => "Dispensary",
            LicenseCategory::EducationFacility => "Education%20Facility",
            LicenseCategory::Grower => "Grower",
            LicenseCategory::GrowerIndoor => "Grower%20Indoor",
            LicenseCategory::GrowerOutdoor => "Grower%20Outdoor",
            LicenseCategory::Processor => "Processor",
            LicenseCategory::TestingLaboratory => "Testing%20Laboratory",
            LicenseCategory::Transporter => "Transporter",
            LicenseCategory::WasteDisposal => "Waste%20Disposal%20Facility",
        }
    }
}

impl fmt::Display for LicenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CategoryGroup {
    Grower,
    GrowerIndoor,
    GrowerOutdoor,
    Dispensary,
    Education,
    Processor,
    Laboratory,
    Waste,
}

impl CategoryGroup {
    pub fn category(self) -> LicenseCategory {
        match self {
            CategoryGroup::Grower => LicenseCategory::Grower,
            CategoryGroup::GrowerIndoor => LicenseCategory::GrowerIndoor,
            CategoryGroup::GrowerOutdoor => LicenseCategory::GrowerOutdoor,
            CategoryGroup::Dispensary => LicenseCategory::Dispensary,
            CategoryGroup::Education => LicenseCategory::EducationFacility,
            CategoryGroup::Processor => LicenseCategory::Processor,
            CategoryGroup::Laboratory => LicenseCategory::TestingLaboratory,
            CategoryGroup::Waste => LicenseCategory::WasteDisposal,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseRecord {
    #[serde(default)]
    pub license_number: String,
    #[serde(default)]
    pub legal_name: String,
    #[serde(default)]
    pub trade_name: String,
    #[serde(default)]
    pub license_type: String,
    #[serde(default)]
    pub street_address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub county: String,
    #[serde(default)]
    pub license_expiry_date: String,
    #[serde(default)]
    pub zip: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub hours: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source_name: Option<String>,
    #[serde(default)]
    pub disclose_address: bool,
    #[serde(default, rename = "Expiration")]
    pub expiration: Option<DateTime>,
    #[serde(default, rename = "AsOfDate")]
    pub as_of_date: Option<DateTime>,
}

impl LicenseRecord {
    // A malformed expiry date leaves `expiration` unset; the record is still
    // persisted.
    pub fn normalize(&mut self, as_of: chrono::DateTime<Utc>) {
        self.as_of_date = Some(DateTime::from_chrono(as_of));
        self.expiration = match parse_expiry(&self.license_expiry_date) {
            Some(date) => Some(DateTime::from_chrono(date)),
            None => {
                warn!(
                    "unparseable licenseExpiryDate '{}' for license {}",
                    self.license_expiry_date, self.license_number
                );
                None
            }
        };
    }
}

pub fn parse_expiry(raw: &str) -> Option<chrono::DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    Some(date.and_time(NaiveTime::MIN).and_utc())
}
