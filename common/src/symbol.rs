//! Symbol value types and payload classification
//!
//! Decoders that only return text (QR grids decoded by rqrr) rely on
//! `SymbolType::classify` to recover the value type from well-known payload schemes.

use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SymbolType {
    Url,
    Text,
    Email,
    Phone,
    Wifi,
    ContactInfo,
    Product,
    Isbn,
    Sms,
    Geo,
    CalendarEvent,
    DriverLicense,
    #[default]
    Unknown,
}

impl SymbolType {
    /// Label shown in the result dialog.
    pub fn display_name(&self) -> &'static str {
        match self {
            SymbolType::Url => "URL",
            SymbolType::Text => "Text",
            SymbolType::Email => "Email",
            SymbolType::Phone => "Phone",
            SymbolType::Wifi => "WiFi",
            SymbolType::ContactInfo => "Contact Info",
            SymbolType::Product => "Product",
            SymbolType::Isbn => "ISBN",
            SymbolType::Sms => "SMS",
            SymbolType::Geo => "Geo Point",
            SymbolType::CalendarEvent => "Calendar Event",
            SymbolType::DriverLicense => "Driver License",
            SymbolType::Unknown => "Unknown",
        }
    }

    /// Infer the value type from a decoded payload.
    pub fn classify(payload: &str) -> SymbolType {
        let trimmed = payload.trim();
        if trimmed.is_empty() {
            return SymbolType::Unknown;
        }

        lazy_static::lazy_static! {
            // ISBN-13 (Bookland EAN)
            static ref ISBN_RE: Regex = Regex::new(r"^97[89]\d{10}$").unwrap();
            // EAN-8 / UPC-A / EAN-13
            static ref PRODUCT_RE: Regex = Regex::new(r"^(\d{8}|\d{12}|\d{13})$").unwrap();
            // AAMVA header: "@" + LF + RS + CR + "ANSI "
            static ref DRIVER_LICENSE_RE: Regex = Regex::new(r"^@\s*\n?.{0,2}ANSI ").unwrap();
        }

        let lower = trimmed.to_ascii_lowercase();
        let starts = |prefixes: &[&str]| prefixes.iter().any(|p| lower.starts_with(p));

        if starts(&["http://", "https://"]) {
            SymbolType::Url
        } else if starts(&["mailto:", "matmsg:"]) {
            SymbolType::Email
        } else if starts(&["tel:"]) {
            SymbolType::Phone
        } else if starts(&["wifi:"]) {
            SymbolType::Wifi
        } else if starts(&["begin:vcard", "mecard:"]) {
            SymbolType::ContactInfo
        } else if starts(&["smsto:", "sms:", "mmsto:"]) {
            SymbolType::Sms
        } else if starts(&["geo:"]) {
            SymbolType::Geo
        } else if starts(&["begin:vevent", "begin:vcalendar"]) {
            SymbolType::CalendarEvent
        } else if DRIVER_LICENSE_RE.is_match(trimmed) {
            SymbolType::DriverLicense
        } else if ISBN_RE.is_match(trimmed) {
            SymbolType::Isbn
        } else if PRODUCT_RE.is_match(trimmed) {
            SymbolType::Product
        } else {
            SymbolType::Text
        }
    }
}

impl std::fmt::Display for SymbolType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}
