//! Picks the minutes document out of a meeting's document links.

use serde::Deserialize;
use tracing::debug;

use crate::model::DocumentLink;

/// Language of the published minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    English,
    French,
}

impl Locale {
    pub fn name(self) -> &'static str {
        match self {
            Locale::English => "English",
            Locale::French => "French",
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Locale::English => "en",
            Locale::French => "fr",
        }
    }

    /// True when `tag` is this locale's name or ISO code, ignoring ASCII case.
    pub fn matches(self, tag: &str) -> bool {
        let tag = tag.trim();
        tag.eq_ignore_ascii_case(self.name()) || tag.eq_ignore_ascii_case(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentCriteria {
    pub doc_type: String,
    pub format: String,
    pub locale: Locale,
}

impl Default for DocumentCriteria {
    fn default() -> Self {
        Self {
            doc_type: "PostMinutes".to_string(),
            format: "HTML".to_string(),
            locale: Locale::English,
        }
    }
}

impl DocumentCriteria {
    pub fn accepts(&self, link: &DocumentLink) -> bool {
        link.doc_type == self.doc_type && link.format == self.format && self.language_matches(link)
    }

    // eScribe links often carry no language field; the URL then has `lang=English`.
    fn language_matches(&self, link: &DocumentLink) -> bool {
        match link.language.as_deref() {
            Some(lang) => self.locale.matches(lang),
            None => link.url.contains(self.locale.name()),
        }
    }
}

/// First link in list order that satisfies `criteria`, or `None` when the
/// meeting has no minutes published yet.
pub fn locate_minutes<'a>(
    documents: &'a [DocumentLink],
    criteria: &DocumentCriteria,
) -> Option<&'a DocumentLink> {
    let found = documents.iter().find(|link| criteria.accepts(link));
    debug!(
        candidates = documents.len(),
        found = found.is_some(),
        doc_type = %criteria.doc_type,
        "Located minutes document"
    );
    found
}
