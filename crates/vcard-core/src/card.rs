//! vCard 3.0 text generation.
//!
//! Field values are written verbatim: commas, semicolons and newlines are not
//! escaped, so a value containing them may be split by strict importers.

use crate::contact::ContactFields;

const BEGIN: &str = "BEGIN:VCARD";
const VERSION: &str = "VERSION:3.0";
const END: &str = "END:VCARD";

/// Base name used when a contact name has no sluggable characters.
pub const DEFAULT_BASE_NAME: &str = "contact";

/// Extension of generated card files.
pub const CARD_EXTENSION: &str = "vcf";

/// Media type served with card downloads.
pub const CARD_CONTENT_TYPE: &str = "text/vcard";

/// Renders the card text for `fields`.
///
/// Optional lines appear in the order ORG, TITLE, EMAIL, TEL, URL and only
/// when the corresponding value is present and non-empty.
#[must_use]
pub fn format_card(fields: &ContactFields) -> String {
    let mut lines = vec![
        BEGIN.to_string(),
        VERSION.to_string(),
        format!("FN:{}", fields.name),
    ];

    if let Some(company) = present(fields.company.as_deref()) {
        lines.push(format!("ORG:{company}"));
    }
    if let Some(title) = present(fields.title.as_deref()) {
        lines.push(format!("TITLE:{title}"));
    }
    if let Some(email) = present(fields.email.as_deref()) {
        lines.push(format!("EMAIL:{email}"));
    }
    if let Some(phone) = present(fields.phone.as_deref()) {
        lines.push(format!("TEL:{}", normalize_phone(phone)));
    }
    if let Some(website) = present(fields.website.as_deref()) {
        lines.push(format!("URL:{}", normalize_website(website)));
    }

    lines.push(END.to_string());
    lines.join("\n")
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// International numbers (leading `+`) are kept as typed; anything else loses
/// spaces, hyphens and parentheses. No further validation is done.
#[must_use]
pub fn normalize_phone(phone: &str) -> String {
    let trimmed = phone.trim();
    if trimmed.starts_with('+') {
        return trimmed.to_string();
    }
    trimmed
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect()
}

/// Prefixes `https://` unless the value already carries an http(s) scheme.
#[must_use]
pub fn normalize_website(website: &str) -> String {
    if website.starts_with("http://") || website.starts_with("https://") {
        website.to_string()
    } else {
        format!("https://{website}")
    }
}

/// Lowercase ASCII slug of `name`, or [`DEFAULT_BASE_NAME`] when nothing
/// survives transliteration.
#[must_use]
pub fn file_stem(name: &str) -> String {
    let stem = slug::slugify(name);
    if stem.is_empty() {
        DEFAULT_BASE_NAME.to_string()
    } else {
        stem
    }
}

/// Download filename for a contact's card, e.g. `john-doe.vcf`.
#[must_use]
pub fn card_filename(name: &str) -> String {
    format!("{}.{CARD_EXTENSION}", file_stem(name))
}
