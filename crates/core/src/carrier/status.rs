//! Status text normalization.

use std::fmt;

/// Status assigned to a shipment before its first successful check.
pub const PENDING_FIRST_CHECK: &str = "Pending first check";

/// Status providers report when they cannot determine anything.
pub const UNKNOWN_STATUS: &str = "Unknown";

/// Closed vocabulary that raw carrier statuses are mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCategory {
    Delivered,
    OutForDelivery,
    InTransit,
    AtFacility,
    DepartedFacility,
    PickedUp,
    LabelCreated,
    Exception,
    Returned,
}

impl StatusCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusCategory::Delivered => "Delivered",
            StatusCategory::OutForDelivery => "Out for Delivery",
            StatusCategory::InTransit => "In Transit",
            StatusCategory::AtFacility => "At Facility",
            StatusCategory::DepartedFacility => "Departed Facility",
            StatusCategory::PickedUp => "Picked Up",
            StatusCategory::LabelCreated => "Label Created",
            StatusCategory::Exception => "Exception",
            StatusCategory::Returned => "Returned",
        }
    }

    /// Categorize a raw status, if any rule matches.
    pub fn classify(raw: &str) -> Option<Self> {
        let lower = raw.to_lowercase();
        RULES
            .iter()
            .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
            .map(|(_, category)| *category)
    }
}

impl fmt::Display for StatusCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered rules; the first rule with a matching keyword wins.
const RULES: &[(&[&str], StatusCategory)] = &[
    (&["delivered"], StatusCategory::Delivered),
    (&["out for delivery"], StatusCategory::OutForDelivery),
    (&["in transit", "on the way"], StatusCategory::InTransit),
    (&["arrived", "at facility"], StatusCategory::AtFacility),
    (&["departed", "left facility"], StatusCategory::DepartedFacility),
    (&["picked up", "shipment picked up"], StatusCategory::PickedUp),
    (&["shipping label", "label created"], StatusCategory::LabelCreated),
    (&["exception", "delay"], StatusCategory::Exception),
    (&["return"], StatusCategory::Returned),
];

/// Map a raw carrier status onto its category name.
///
/// Unmatched text is returned unchanged.
pub fn normalize_status(raw: &str) -> String {
    match StatusCategory::classify(raw) {
        Some(category) => category.as_str().to_string(),
        None => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_inputs_are_fixed_points() {
        for category in [
            StatusCategory::Delivered,
            StatusCategory::OutForDelivery,
            StatusCategory::InTransit,
            StatusCategory::AtFacility,
            StatusCategory::DepartedFacility,
            StatusCategory::PickedUp,
            StatusCategory::LabelCreated,
            StatusCategory::Exception,
            StatusCategory::Returned,
        ] {
            assert_eq!(normalize_status(category.as_str()), category.as_str());
        }
    }

    #[test]
    fn test_keyword_matching() {
        assert_eq!(normalize_status("Your package was DELIVERED at 10:14"), "Delivered");
        assert_eq!(normalize_status("Out For Delivery Today"), "Out for Delivery");
        assert_eq!(normalize_status("On the way to destination"), "In Transit");
        assert_eq!(normalize_status("Arrived at UPS Facility"), "At Facility");
        assert_eq!(normalize_status("Left facility in Memphis, TN"), "Departed Facility");
        assert_eq!(normalize_status("Shipment picked up"), "Picked Up");
        assert_eq!(normalize_status("Shipping Label Created"), "Label Created");
        assert_eq!(normalize_status("Weather delay"), "Exception");
        assert_eq!(normalize_status("Returning to sender"), "Returned");
    }

    #[test]
    fn test_first_rule_wins() {
        // "delivered" outranks "out for delivery"
        assert_eq!(normalize_status("Out for delivery - delivered"), "Delivered");
        // "arrived" outranks "departed"
        assert_eq!(normalize_status("Departed after it arrived"), "At Facility");
    }

    #[test]
    fn test_unmatched_text_passes_through() {
        assert_eq!(normalize_status(UNKNOWN_STATUS), UNKNOWN_STATUS);
        assert_eq!(normalize_status("Awaiting customs"), "Awaiting customs");
        assert_eq!(normalize_status(""), "");
    }

    #[test]
    fn test_normalize_is_stable() {
        let raw = "Package in transit to next facility";
        let once = normalize_status(raw);
        assert_eq!(once, "In Transit");
        assert_eq!(normalize_status(&once), once);
    }
}
