//! Carrier identification.
//!
//! Pure mapping from a tracking URL to a carrier and tracking number, and from
//! free-text carrier status strings to a closed set of status categories.

mod detector;
mod status;
mod types;

pub use detector::{detect_carrier, extract_tracking_number};
pub use status::{normalize_status, StatusCategory, PENDING_FIRST_CHECK, UNKNOWN_STATUS};
pub use types::Carrier;
