//! Contact records and the raw fields they are built from.

use serde::{Deserialize, Serialize};

use crate::card;

/// Raw contact details as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactFields {
    pub name: String,
    pub company: Option<String>,
    pub title: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
}

impl ContactFields {
    /// Trims every value and drops optional values that end up empty.
    #[must_use]
    pub fn normalized(self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        Self {
            name: self.name.trim().to_string(),
            company: clean(self.company),
            title: clean(self.title),
            email: clean(self.email),
            phone: clean(self.phone),
            website: clean(self.website),
        }
    }
}

/// A stored contact together with its derived card text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactRecord {
    pub id: String,
    #[serde(flatten)]
    pub fields: ContactFields,
    pub card_text: String,
}

impl ContactRecord {
    /// Builds a record, deriving the card text from `fields`.
    ///
    /// The formatter is pure, so rebuilding from stored fields always yields
    /// the same text.
    #[must_use]
    pub fn new(id: String, fields: ContactFields) -> Self {
        let card_text = card::format_card(&fields);
        Self {
            id,
            fields,
            card_text,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.fields.name
    }

    /// Download filename of the card, e.g. `john-doe.vcf`.
    #[must_use]
    pub fn card_filename(&self) -> String {
        card::card_filename(&self.fields.name)
    }

    /// Slug used for every file derived from this contact.
    #[must_use]
    pub fn file_stem(&self) -> String {
        card::file_stem(&self.fields.name)
    }
}
