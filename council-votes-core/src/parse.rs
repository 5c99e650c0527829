//! Vote extraction from eScribe minutes markup.
//!
//! Each `.AgendaItemContainer` becomes one [`Motion`]. Inside it the parser
//! reads the title link, the `.MotionResult` text and the `.MotionVoters`
//! table, whose rows pair a `.VoterVote` label with a comma-separated
//! `.VotesUsers` cell. Anything that does not fit that shape is skipped
//! without error.

use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use std::sync::LazyLock;
use tracing::debug;

use crate::model::{Motion, Vote, VoteValue};

static AGENDA_ITEM: LazyLock<Selector> = LazyLock::new(|| selector(".AgendaItemContainer"));
static TITLE: LazyLock<Selector> = LazyLock::new(|| selector(".AgendaItemTitle a"));
static RESULT: LazyLock<Selector> = LazyLock::new(|| selector(".MotionResult"));
static VOTERS: LazyLock<Selector> = LazyLock::new(|| selector(".MotionVoters"));
static ROW: LazyLock<Selector> = LazyLock::new(|| selector("tr"));
static LABEL: LazyLock<Selector> = LazyLock::new(|| selector(".VoterVote"));
static NAMES: LazyLock<Selector> = LazyLock::new(|| selector(".VotesUsers"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid CSS")
}

/// How a voter-row label is turned into a [`VoteValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelPolicy {
    /// Label starts with `For` or `Against`, exact case.
    #[default]
    Prefix,
    /// As `Prefix`, ignoring ASCII case.
    PrefixIgnoreCase,
}

impl LabelPolicy {
    /// Leading whitespace is ignored. `None` for anything else (e.g. `Abstain`).
    pub fn classify(self, label: &str) -> Option<VoteValue> {
        let label = label.trim_start();
        [VoteValue::For, VoteValue::Against]
            .into_iter()
            .find(|value| self.starts_with(label, value.as_str()))
    }

    fn starts_with(self, label: &str, prefix: &str) -> bool {
        match self {
            LabelPolicy::Prefix => label.starts_with(prefix),
            LabelPolicy::PrefixIgnoreCase => label
                .get(..prefix.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(prefix)),
        }
    }
}

/// Parses every motion in the document, in document order.
pub fn parse_votes(html: &str, policy: LabelPolicy) -> Vec<Motion> {
    let document = Html::parse_document(html);
    let motions: Vec<Motion> = document
        .select(&AGENDA_ITEM)
        .map(|item| parse_item(item, policy))
        .collect();
    debug!(motions = motions.len(), "Parsed minutes document");
    motions
}

fn parse_item(item: ElementRef<'_>, policy: LabelPolicy) -> Motion {
    let title = item.select(&TITLE).next().map(trimmed_text);
    let result = item.select(&RESULT).next().map(trimmed_text);

    let mut votes = Vec::new();
    if let Some(table) = item.select(&VOTERS).next() {
        for row in table.select(&ROW) {
            let (Some(label), Some(names)) =
                (row.select(&LABEL).next(), row.select(&NAMES).next())
            else {
                continue;
            };
            let label = label.text().collect::<String>();
            let Some(value) = policy.classify(&label) else {
                debug!(label = %label.trim(), "Skipping voter row with unrecognised label");
                continue;
            };
            let names = names.text().collect::<String>();
            votes.extend(split_names(&names).map(|councillor| Vote { councillor, value }));
        }
    }

    Motion::new(title, result, votes)
}

fn trimmed_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn split_names(cell: &str) -> impl Iterator<Item = String> + '_ {
    cell.split(',')
        .map(|name| name.trim().trim_matches(',').trim())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: Option<&str>, result: &str, rows: &[(&str, &str)]) -> String {
        let title = title
            .map(|t| format!(r##"<div class="AgendaItemTitle"><a href="#">{t}</a></div>"##))
            .unwrap_or_default();
        let rows: String = rows
            .iter()
            .map(|(label, names)| {
                format!(
                    r#"<tr><td class="VoterVote">{label}</td><td class="VotesUsers">{names}</td></tr>"#
                )
            })
            .collect();
        format!(
            r#"<div class="AgendaItemContainer">{title}<div class="MotionResult">{result}</div><table class="MotionVoters">{rows}</table></div>"#
        )
    }

    fn page(items: &[String]) -> String {
        format!("<html><body>{}</body></html>", items.concat())
    }

    #[test]
    fn missing_title_keeps_votes_and_counts() {
        let html = page(&[item(None, "Carried", &[("For", "A, B"), ("Against", "C")])]);
        let motions = parse_votes(&html, LabelPolicy::Prefix);

        assert_eq!(motions.len(), 1);
        let motion = &motions[0];
        assert_eq!(motion.title(), None);
        assert_eq!(motion.result(), Some("Carried"));
        assert_eq!(motion.for_count(), 2);
        assert_eq!(motion.against_count(), 1);
        let votes: Vec<(&str, VoteValue)> = motion
            .votes()
            .iter()
            .map(|v| (v.councillor.as_str(), v.value))
            .collect();
        assert_eq!(
            votes,
            vec![
                ("A", VoteValue::For),
                ("B", VoteValue::For),
                ("C", VoteValue::Against)
            ]
        );
    }

    #[test]
    fn unrecognised_label_contributes_nothing() {
        let html = page(&[item(
            Some("Item"),
            "Carried",
            &[("For", "A"), ("Abstain", "X, Y"), ("Against", "B")],
        )]);
        let motion = &parse_votes(&html, LabelPolicy::Prefix)[0];
        assert_eq!(motion.votes().len(), 2);
        assert_eq!(motion.for_count(), 1);
        assert_eq!(motion.against_count(), 1);
        assert!(motion.votes().iter().all(|v| v.councillor != "X"));
    }

    #[test]
    fn label_prefix_is_case_sensitive_by_default() {
        let html = page(&[item(
            Some("Item"),
            "Lost",
            &[("for (2)", "A, B"), ("Against (1)", "C")],
        )]);
        let motion = &parse_votes(&html, LabelPolicy::Prefix)[0];
        assert_eq!(motion.for_count(), 0);
        assert_eq!(motion.against_count(), 1);

        let motion = &parse_votes(&html, LabelPolicy::PrefixIgnoreCase)[0];
        assert_eq!(motion.for_count(), 2);
    }

    #[test]
    fn empty_names_cell_contributes_zero_votes() {
        let html = page(&[item(Some("Item"), "Carried", &[("For", "  "), ("Against", "C,")])]);
        let motion = &parse_votes(&html, LabelPolicy::Prefix)[0];
        assert_eq!(motion.for_count(), 0);
        assert_eq!(motion.names_for(VoteValue::Against), vec!["C"]);
    }

    #[test]
    fn row_without_names_cell_is_skipped() {
        let html = page(&[r#"<div class="AgendaItemContainer"><div class="MotionResult">Carried</div><table class="MotionVoters"><tr><td class="VoterVote">For</td></tr><tr><td class="VoterVote">Against</td><td class="VotesUsers">Z</td></tr></table></div>"#.to_string()]);
        let motion = &parse_votes(&html, LabelPolicy::Prefix)[0];
        assert_eq!(motion.votes().len(), 1);
        assert_eq!(motion.against_count(), 1);
    }

    #[test]
    fn repeated_labels_accumulate() {
        let html = page(&[item(Some("Item"), "Carried", &[("For", "A"), ("For", "B")])]);
        let motion = &parse_votes(&html, LabelPolicy::Prefix)[0];
        assert_eq!(motion.names_for(VoteValue::For), vec!["A", "B"]);
        assert_eq!(motion.for_count(), 2);
    }

    #[test]
    fn container_without_voter_table_still_yields_a_motion() {
        let html = page(&[
            r#"<div class="AgendaItemContainer"><div class="AgendaItemTitle"><a>Receipt of reports</a></div></div>"#.to_string(),
            item(Some("Second"), "Carried", &[("For", "A")]),
        ]);
        let motions = parse_votes(&html, LabelPolicy::Prefix);
        assert_eq!(motions.len(), 2);
        assert_eq!(motions[0].title(), Some("Receipt of reports"));
        assert_eq!(motions[0].result(), None);
        assert!(motions[0].votes().is_empty());
        assert_eq!(motions[1].title(), Some("Second"));
    }

    #[test]
    fn document_without_containers_yields_nothing() {
        let html = "<html><body><p>No minutes</p></body></html>";
        assert!(parse_votes(html, LabelPolicy::Prefix).is_empty());
        assert!(parse_votes("", LabelPolicy::Prefix).is_empty());
    }

    #[test]
    fn classify_ignores_leading_whitespace_only() {
        assert_eq!(LabelPolicy::Prefix.classify("  For:"), Some(VoteValue::For));
        assert_eq!(LabelPolicy::Prefix.classify("Against (11)"), Some(VoteValue::Against));
        assert_eq!(LabelPolicy::Prefix.classify("Abstain"), None);
        assert_eq!(LabelPolicy::Prefix.classify("Fo"), None);
        assert_eq!(LabelPolicy::PrefixIgnoreCase.classify("AGAINST"), Some(VoteValue::Against));
    }
}
