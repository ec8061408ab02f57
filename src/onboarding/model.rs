//! Plan and draft data models collected by the onboarding wizard.

use std::collections::BTreeSet;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Pricing tier selected on the plan page.
///
/// Unknown codes are kept verbatim so a draft written by a newer front end
/// still round-trips; they carry zero limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Tier {
    Tier1,
    Tier2,
    Tier3,
    Enterprise,
    Unrecognized(String),
}

impl Tier {
    /// Seat and facility allowance for this tier.
    pub fn limits(&self) -> PlanLimits {
        let (seats, facilities) = match self {
            Self::Tier1 => (50, 1),
            Self::Tier2 => (100, 1),
            Self::Tier3 => (300, 2),
            Self::Enterprise => (500, 5),
            Self::Unrecognized(_) => (0, 0),
        };
        PlanLimits { seats, facilities }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Tier1 => "tier1",
            Self::Tier2 => "tier2",
            Self::Tier3 => "tier3",
            Self::Enterprise => "enterprise",
            Self::Unrecognized(code) => code.as_str(),
        }
    }
}

impl From<&str> for Tier {
    fn from(code: &str) -> Self {
        match code {
            "tier1" => Self::Tier1,
            "tier2" => Self::Tier2,
            "tier3" => Self::Tier3,
            "enterprise" => Self::Enterprise,
            other => Self::Unrecognized(other.to_string()),
        }
    }
}

impl From<String> for Tier {
    fn from(code: String) -> Self {
        Self::from(code.as_str())
    }
}

impl From<Tier> for String {
    fn from(tier: Tier) -> Self {
        match tier {
            Tier::Unrecognized(code) => code,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Billing cadence chosen alongside the tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    Monthly,
    #[default]
    Annual,
}

/// Seat and facility allowance of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlanLimits {
    pub seats: u32,
    pub facilities: u32,
}

/// The plan the organization signed up for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSelection {
    pub tier: Tier,
    pub seats: u32,
    pub facilities: u32,
    pub billing: BillingCycle,
}

impl PlanSelection {
    /// Build a selection whose limits come from the tier table.
    pub fn new(tier: Tier, billing: BillingCycle) -> Self {
        let PlanLimits { seats, facilities } = tier.limits();
        Self {
            tier,
            seats,
            facilities,
            billing,
        }
    }

    pub fn limits(&self) -> PlanLimits {
        PlanLimits {
            seats: self.seats,
            facilities: self.facilities,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationDraft {
    pub name: String,
    pub address: String,
    pub phone_number: String,
    pub industry: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nature_of_work: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abn: Option<String>,
    pub organization_size: String,
}

/// Owner account details. The password stays wrapped until it is written
/// to the draft store or handed to the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountDraft {
    pub name: String,
    pub email: String,
    #[serde(serialize_with = "expose_password", deserialize_with = "wrap_password")]
    pub password: SecretString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl AccountDraft {
    pub fn new(name: &str, email: &str, password: &str) -> Self {
        Self {
            name: name.to_string(),
            email: email.to_string(),
            password: SecretString::from(password),
            phone: None,
        }
    }

    pub fn with_phone(mut self, phone: &str) -> Self {
        self.phone = Some(phone.to_string());
        self
    }
}

impl PartialEq for AccountDraft {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.email == other.email
            && self.password.expose_secret() == other.password.expose_secret()
            && self.phone == other.phone
    }
}

impl Eq for AccountDraft {}

fn expose_password<S: Serializer>(password: &SecretString, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(password.expose_secret())
}

fn wrap_password<'de, D: Deserializer<'de>>(d: D) -> Result<SecretString, D::Error> {
    String::deserialize(d).map(SecretString::from)
}

/// A sub-area of a facility with its own emergency planning representative.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Microsite {
    pub id: String,
    pub name: String,
    pub address: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub site_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epc_representative: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupants: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityDraft {
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub postcode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_occupancy: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facility_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point_of_contact_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_occupant_ids: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub microsites: Option<Vec<Microsite>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_table() {
        let cases = [
            ("tier1", 50, 1),
            ("tier2", 100, 1),
            ("tier3", 300, 2),
            ("enterprise", 500, 5),
        ];
        for (code, seats, facilities) in cases {
            let limits = Tier::from(code).limits();
            assert_eq!(limits, PlanLimits { seats, facilities }, "limits for {code}");
        }
    }

    #[test]
    fn unknown_tier_has_zero_limits() {
        for code in ["", "tier4", "Tier1", "free"] {
            let tier = Tier::from(code);
            assert_eq!(tier, Tier::Unrecognized(code.to_string()));
            assert_eq!(tier.limits(), PlanLimits::default());
        }
    }

    #[test]
    fn tier_serializes_as_code() {
        assert_eq!(serde_json::to_string(&Tier::Tier3).unwrap(), "\"tier3\"");
        assert_eq!(
            serde_json::to_string(&Tier::Unrecognized("gold".into())).unwrap(),
            "\"gold\""
        );
        let parsed: Tier = serde_json::from_str("\"enterprise\"").unwrap();
        assert_eq!(parsed, Tier::Enterprise);
    }

    #[test]
    fn billing_defaults_to_annual() {
        assert_eq!(BillingCycle::default(), BillingCycle::Annual);
        let monthly: BillingCycle = serde_json::from_str("\"monthly\"").unwrap();
        assert_eq!(monthly, BillingCycle::Monthly);
    }

    #[test]
    fn plan_selection_derives_limits() {
        let plan = PlanSelection::new(Tier::Enterprise, BillingCycle::Monthly);
        assert_eq!(plan.seats, 500);
        assert_eq!(plan.facilities, 5);
        assert_eq!(plan.limits(), PlanLimits { seats: 500, facilities: 5 });
    }

    #[test]
    fn account_password_is_redacted_in_debug() {
        let account = AccountDraft::new("Dana", "dana@example.com", "hunter22");
        let debug = format!("{account:?}");
        assert!(!debug.contains("hunter22"));

        let json = serde_json::to_value(&account).unwrap();
        assert_eq!(json["password"], "hunter22");
        assert!(json.get("phone").is_none());
    }

    #[test]
    fn facility_uses_camel_case_fields() {
        let facility = FacilityDraft {
            name: "Head Office".into(),
            postcode: "3000".into(),
            max_occupancy: Some(120),
            point_of_contact_id: Some("occ-1".into()),
            microsites: Some(vec![Microsite {
                id: "m1".into(),
                name: "Level 2".into(),
                site_type: Some("floor".into()),
                ..Default::default()
            }]),
            ..Default::default()
        };
        let json = serde_json::to_value(&facility).unwrap();
        assert_eq!(json["maxOccupancy"], 120);
        assert_eq!(json["pointOfContactId"], "occ-1");
        assert_eq!(json["microsites"][0]["type"], "floor");
        assert!(json.get("email").is_none());
    }
}
