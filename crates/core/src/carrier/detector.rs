//! URL-based carrier detection and tracking number extraction.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use url::Url;

use super::Carrier;

/// Query parameter names carriers commonly use for the tracking number.
const TRACKING_PARAMS: &[&str] = &[
    "tracknum",
    "tracknumbers",
    "tracking",
    "trackingNumber",
    "trackNums",
    "trkNum",
];

struct CarrierPatterns {
    carrier: Carrier,
    hosts: Vec<Regex>,
    tracking_numbers: Vec<Regex>,
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("carrier pattern must compile"))
        .collect()
}

/// Ordered pattern table. Detection walks it front to back, first match wins.
static PATTERNS: Lazy<Vec<CarrierPatterns>> = Lazy::new(|| {
    vec![
        CarrierPatterns {
            carrier: Carrier::Ups,
            hosts: compile(&[r"(?i)ups\.com", r"(?i)ups\.com/track"]),
            tracking_numbers: compile(&[r"(?i)\b1Z[A-Z0-9]{16}\b"]),
        },
        CarrierPatterns {
            carrier: Carrier::Fedex,
            hosts: compile(&[r"(?i)fedex\.com"]),
            tracking_numbers: compile(&[r"\b\d{12,22}\b", r"\b\d{15}\b"]),
        },
        CarrierPatterns {
            carrier: Carrier::Usps,
            hosts: compile(&[r"(?i)usps\.com", r"(?i)tools\.usps\.com"]),
            tracking_numbers: compile(&[r"\b9[0-9]{15,21}\b", r"(?i)\b[A-Z]{2}\d{9}US\b"]),
        },
        CarrierPatterns {
            carrier: Carrier::Dhl,
            hosts: compile(&[r"(?i)dhl\.com"]),
            tracking_numbers: compile(&[r"\b\d{10,11}\b", r"(?i)\b[A-Z]{3}\d{7}\b"]),
        },
        CarrierPatterns {
            carrier: Carrier::Amazon,
            hosts: compile(&[r"(?i)amazon\.com", r"(?i)amazon\.com.*progress-tracker"]),
            tracking_numbers: compile(&[r"(?i)TBA\d{12,}"]),
        },
        CarrierPatterns {
            carrier: Carrier::Ontrac,
            hosts: compile(&[r"(?i)ontrac\.com"]),
            tracking_numbers: compile(&[r"(?i)\bC\d{14}\b", r"(?i)\bD\d{14}\b"]),
        },
        CarrierPatterns {
            carrier: Carrier::Lasership,
            hosts: compile(&[r"(?i)lasership\.com"]),
            tracking_numbers: compile(&[r"(?i)\b1LS\d{12}\b", r"(?i)\bLX\d{10}\b"]),
        },
    ]
});

static TRACK_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)track(?:ing)?[/=]([A-Za-z0-9]+)").expect("track path pattern must compile")
});

/// Detect the carrier for a tracking URL.
///
/// Returns [`Carrier::Unknown`] when no host pattern matches.
pub fn detect_carrier(url: &str) -> Carrier {
    let normalized = url.to_lowercase();
    PATTERNS
        .iter()
        .find(|p| p.hosts.iter().any(|re| re.is_match(&normalized)))
        .map(|p| p.carrier)
        .unwrap_or(Carrier::Unknown)
}

/// Extract a tracking number from a tracking URL.
///
/// Tries, in order: well-known query parameters, a `track=`/`tracking/` path
/// segment, the carrier's own number shapes, then every carrier's shapes.
/// Returns `None` for URLs that do not parse.
pub fn extract_tracking_number(url: &str, carrier: Carrier) -> Option<String> {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::debug!("Cannot extract tracking number from {:?}: {}", url, e);
            return None;
        }
    };

    for name in TRACKING_PARAMS {
        let value = parsed
            .query_pairs()
            .find(|(key, _)| key == *name)
            .map(|(_, value)| value.into_owned());
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            return Some(value);
        }
    }

    if let Some(captures) = TRACK_PATH.captures(url) {
        return Some(captures[1].to_string());
    }

    let own = PATTERNS.iter().filter(|p| p.carrier == carrier);
    if let Some(found) = first_match(own, url) {
        return Some(found);
    }

    first_match(PATTERNS.iter(), url)
}

fn first_match<'a>(
    patterns: impl Iterator<Item = &'a CarrierPatterns>,
    url: &str,
) -> Option<String> {
    patterns
        .flat_map(|p| p.tracking_numbers.iter())
        .find_map(|re| re.find(url).map(|m| m.as_str().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_major_carriers() {
        assert_eq!(
            detect_carrier("https://www.ups.com/track?tracknum=1Z999AA10123456784"),
            Carrier::Ups
        );
        assert_eq!(
            detect_carrier("https://www.fedex.com/fedextrack/?trknbr=123456789012"),
            Carrier::Fedex
        );
        assert_eq!(
            detect_carrier("https://tools.usps.com/go/TrackConfirmAction?tLabels=9400"),
            Carrier::Usps
        );
        assert_eq!(
            detect_carrier("https://www.dhl.com/en/express/tracking.html?AWB=1234567890"),
            Carrier::Dhl
        );
        assert_eq!(
            detect_carrier("https://www.amazon.com/progress-tracker/package/ref=ppx"),
            Carrier::Amazon
        );
        assert_eq!(detect_carrier("https://www.ontrac.com/tracking"), Carrier::Ontrac);
        assert_eq!(
            detect_carrier("https://www.lasership.com/track/1LS123456789012"),
            Carrier::Lasership
        );
    }

    #[test]
    fn test_detect_is_case_insensitive() {
        assert_eq!(detect_carrier("HTTPS://WWW.UPS.COM/TRACK"), Carrier::Ups);
    }

    #[test]
    fn test_detect_unknown() {
        assert_eq!(detect_carrier("https://example.org/parcel/42"), Carrier::Unknown);
        assert_eq!(detect_carrier(""), Carrier::Unknown);
    }

    #[test]
    fn test_extract_from_query_param() {
        let url = "https://www.ups.com/track?loc=en_US&tracknum=1Z999AA10123456784";
        assert_eq!(
            extract_tracking_number(url, Carrier::Ups).as_deref(),
            Some("1Z999AA10123456784")
        );

        let url = "https://tools.usps.com/go/TrackConfirmAction?trackingNumber=ABC123";
        assert_eq!(
            extract_tracking_number(url, Carrier::Usps).as_deref(),
            Some("ABC123")
        );
    }

    #[test]
    fn test_extract_skips_empty_param() {
        let url = "https://www.ups.com/status?tracknum=&trkNum=XYZ789";
        assert_eq!(
            extract_tracking_number(url, Carrier::Ups).as_deref(),
            Some("XYZ789")
        );
    }

    #[test]
    fn test_extract_from_path() {
        let url = "https://www.lasership.com/track/1LS123456789012";
        assert_eq!(
            extract_tracking_number(url, Carrier::Lasership).as_deref(),
            Some("1LS123456789012")
        );
    }

    #[test]
    fn test_extract_carrier_shape() {
        let url = "https://www.ups.com/status/1Z999AA10123456784/details";
        assert_eq!(
            extract_tracking_number(url, Carrier::Ups).as_deref(),
            Some("1Z999AA10123456784")
        );
    }

    #[test]
    fn test_extract_falls_back_to_any_carrier_shape() {
        let url = "https://example.org/parcel/TBA123456789012?ref=mail";
        assert_eq!(
            extract_tracking_number(url, Carrier::Unknown).as_deref(),
            Some("TBA123456789012")
        );
    }

    #[test]
    fn test_extract_none() {
        assert_eq!(
            extract_tracking_number("https://example.org/orders", Carrier::Unknown),
            None
        );
        assert_eq!(extract_tracking_number("not a url", Carrier::Ups), None);
    }

    #[test]
    fn test_extract_is_deterministic() {
        let url = "https://www.fedex.com/en-us/details/123456789012345";
        let first = extract_tracking_number(url, Carrier::Fedex);
        let second = extract_tracking_number(url, Carrier::Fedex);
        assert_eq!(first, second);
        assert_eq!(first.as_deref(), Some("123456789012345"));
    }
}
