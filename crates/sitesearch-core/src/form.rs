//! The advanced search form: its fields and how a submission is read.
//!
//! Submissions arrive as key/value pairs (query string or urlencoded body):
//!
//! | Key | Meaning |
//! |-----|---------|
//! | `+` | all of these words |
//! | `quote` | exact phrase |
//! | `any` | at least one of these words |
//! | `-` | none of these words |
//! | `sortby` | `Relevance`, `LastUpdated` or `PageTitle` |
//! | `From`, `To` | `YYYY-MM-DD`, or split as `From[day]`, `From[month]`, `From[year]` |
//! | `OnlyShow[<section>]` | restrict to a section (the key names it) |
//! | `OnlyShow[]` | restrict to a section (the value names it) |
//! | `start` | result offset |

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::SearchError;
use crate::filter::DateRange;
use crate::query::KeywordInput;
use crate::scope::ScopeSelection;
use crate::sort::SortKey;

/// A parsed form submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchForm {
    pub keywords: KeywordInput,
    pub sort_by: Option<String>,
    pub dates: DateRange,
    pub only_show: ScopeSelection,
    pub start: usize,
}

#[derive(Default)]
struct DateParts {
    whole: Option<String>,
    day: Option<String>,
    month: Option<String>,
    year: Option<String>,
}

impl DateParts {
    fn set(&mut self, part: Option<&str>, value: &str) {
        let value = Some(value.trim().to_string()).filter(|v| !v.is_empty());
        match part {
            None => self.whole = value,
            Some("day") => self.day = value,
            Some("month") => self.month = value,
            Some("year") => self.year = value,
            Some(_) => {}
        }
    }

    fn resolve(self, field: &'static str) -> Result<Option<NaiveDate>, SearchError> {
        if let Some(whole) = self.whole {
            return NaiveDate::parse_from_str(&whole, "%Y-%m-%d")
                .map(Some)
                .map_err(|_| SearchError::InvalidDate {
                    field,
                    value: whole,
                });
        }

        match (self.year, self.month, self.day) {
            (None, None, None) => Ok(None),
            (Some(y), Some(m), Some(d)) => {
                let joined = format!("{}-{}-{}", y, m, d);
                let parsed = match (y.parse::<i32>(), m.parse::<u32>(), d.parse::<u32>()) {
                    (Ok(y), Ok(m), Ok(d)) => NaiveDate::from_ymd_opt(y, m, d),
                    _ => None,
                };
                parsed.map(Some).ok_or(SearchError::InvalidDate {
                    field,
                    value: joined,
                })
            }
            (y, m, d) => Err(SearchError::InvalidDate {
                field,
                value: format!(
                    "{}-{}-{}",
                    y.unwrap_or_default(),
                    m.unwrap_or_default(),
                    d.unwrap_or_default()
                ),
            }),
        }
    }
}

/// Split `Name[part]` into `("Name", Some("part"))`.
fn split_bracket(key: &str) -> (&str, Option<&str>) {
    match key.find('[') {
        Some(open) if key.ends_with(']') => (&key[..open], Some(&key[open + 1..key.len() - 1])),
        _ => (key, None),
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

impl SearchForm {
    /// Read a submission. Unknown keys are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, SearchError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut form = SearchForm::default();
        let mut from = DateParts::default();
        let mut to = DateParts::default();

        for (key, value) in pairs {
            let value = value.as_ref();
            match split_bracket(key.as_ref()) {
                ("+", None) => form.keywords.all_words = non_empty(value),
                ("quote", None) => form.keywords.exact_phrase = non_empty(value),
                ("any", None) => form.keywords.any_words = non_empty(value),
                ("-", None) => form.keywords.without_words = non_empty(value),
                ("sortby", None) => form.sort_by = non_empty(value),
                ("From", part) => from.set(part, value),
                ("To", part) => to.set(part, value),
                ("OnlyShow", Some("")) => {
                    if !value.trim().is_empty() {
                        form.only_show.sections.push(value.trim().to_string());
                    }
                }
                ("OnlyShow", Some(section)) => {
                    form.only_show.sections.push(section.to_string());
                }
                ("start", None) => {
                    let trimmed = value.trim();
                    if !trimmed.is_empty() {
                        // Offsets are bound as SQL integers, so they must fit in i64.
                        form.start = trimmed
                            .parse::<usize>()
                            .ok()
                            .filter(|start| i64::try_from(*start).is_ok())
                            .ok_or_else(|| SearchError::InvalidStart(value.to_string()))?;
                    }
                }
                _ => {}
            }
        }

        form.dates = DateRange {
            from: from.resolve("From")?,
            to: to.resolve("To")?,
        };
        Ok(form)
    }

    pub fn sort_key(&self) -> SortKey {
        SortKey::resolve(self.sort_by.as_deref())
    }
}

/// Name of the form's submit action.
pub const SUBMIT_ACTION: (&str, &str) = ("results", "Go");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Options,
    Date,
}

#[derive(Debug, Clone, Serialize)]
pub struct FormField {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<(&'static str, &'static str)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldGroup {
    pub id: &'static str,
    pub heading: &'static str,
    pub fields: Vec<FormField>,
}

fn text(name: &'static str, label: &'static str) -> FormField {
    FormField {
        name,
        label,
        kind: FieldKind::Text,
        options: Vec::new(),
        default: None,
    }
}

fn date(name: &'static str) -> FormField {
    FormField {
        name,
        label: name,
        kind: FieldKind::Date,
        options: Vec::new(),
        default: None,
    }
}

/// Field groups the form offers, in display order.
pub fn form_fields() -> Vec<FieldGroup> {
    vec![
        FieldGroup {
            id: "AdvancedSearchForm_SearchBy",
            heading: "SEARCH BY",
            fields: vec![
                text("+", "All Words"),
                text("quote", "Exact Phrase"),
                text("any", "At Least One Of the Words"),
                text("-", "Without the Words"),
            ],
        },
        FieldGroup {
            id: "AdvancedSearchForm_SortBy",
            heading: "SORT RESULTS BY",
            fields: vec![FormField {
                name: "sortby",
                label: "",
                kind: FieldKind::Options,
                options: SortKey::ALL.iter().map(|k| (k.key(), k.label())).collect(),
                default: Some(SortKey::Relevance.key()),
            }],
        },
        FieldGroup {
            id: "AdvancedSearchForm_ChooseDate",
            heading: "LAST UPDATED",
            fields: vec![date("From"), date("To")],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(pairs: &[(&str, &str)]) -> Result<SearchForm, SearchError> {
        SearchForm::from_pairs(pairs.iter().copied())
    }

    #[test]
    fn test_keyword_fields() {
        let form = parse(&[("+", "alpha beta"), ("quote", "x y"), ("any", ""), ("-", "z")]).unwrap();
        assert_eq!(form.keywords.all_words.as_deref(), Some("alpha beta"));
        assert_eq!(form.keywords.exact_phrase.as_deref(), Some("x y"));
        assert_eq!(form.keywords.any_words, None);
        assert_eq!(form.keywords.without_words.as_deref(), Some("z"));
    }

    #[test]
    fn test_only_show_keys_and_values() {
        let form = parse(&[
            ("OnlyShow[products,blog]", "on"),
            ("OnlyShow[]", "about"),
            ("OnlyShow[]", " "),
        ])
        .unwrap();
        assert_eq!(form.only_show.sections, vec!["products,blog", "about"]);
        let segments: Vec<&str> = form.only_show.segments().collect();
        assert_eq!(segments, vec!["products", "blog", "about"]);
    }

    #[test]
    fn test_whole_and_split_dates() {
        let form = parse(&[
            ("From", "2024-01-15"),
            ("To[day]", "3"),
            ("To[month]", "2"),
            ("To[year]", "2024"),
        ])
        .unwrap();
        assert_eq!(form.dates.from, NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(form.dates.to, NaiveDate::from_ymd_opt(2024, 2, 3));
    }

    #[test]
    fn test_blank_dates_are_absent() {
        let form = parse(&[("From", ""), ("To[day]", ""), ("To[month]", ""), ("To[year]", "")]).unwrap();
        assert_eq!(form.dates, DateRange::default());
    }

    #[test]
    fn test_bad_dates_rejected() {
        let err = parse(&[("From", "2024-13-01")]).unwrap_err();
        assert!(matches!(err, SearchError::InvalidDate { field: "From", .. }));

        let err = parse(&[("To'; DROP TABLE site_tree; --", "x"), ("To", "yesterday")]).unwrap_err();
        assert!(matches!(err, SearchError::InvalidDate { field: "To", .. }));

        let err = parse(&[("From[day]", "1")]).unwrap_err();
        assert!(matches!(err, SearchError::InvalidDate { field: "From", .. }));
    }

    #[test]
    fn test_start_offset() {
        assert_eq!(parse(&[("start", "20")]).unwrap().start, 20);
        assert!(matches!(
            parse(&[("start", "-1")]).unwrap_err(),
            SearchError::InvalidStart(_)
        ));
    }

    #[test]
    fn test_start_offset_must_fit_sql_integer() {
        let max = i64::MAX.to_string();
        let form = parse(&[("start", max.as_str())]).unwrap();
        assert_eq!(form.start as u64, i64::MAX as u64);
        assert!(matches!(
            parse(&[("start", "9223372036854775808")]).unwrap_err(),
            SearchError::InvalidStart(_)
        ));
        assert!(matches!(
            parse(&[("start", "18446744073709551615")]).unwrap_err(),
            SearchError::InvalidStart(_)
        ));
    }

    #[test]
    fn test_sort_key_defaults() {
        assert_eq!(parse(&[]).unwrap().sort_key(), SortKey::Relevance);
        assert_eq!(
            parse(&[("sortby", "PageTitle")]).unwrap().sort_key(),
            SortKey::PageTitle
        );
    }

    #[test]
    fn test_form_fields_layout() {
        let groups = form_fields();
        assert_eq!(groups.len(), 3);
        let names: Vec<&str> = groups[0].fields.iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["+", "quote", "any", "-"]);
        assert_eq!(groups[1].fields[0].options.len(), 3);
        assert_eq!(groups[1].fields[0].default, Some("Relevance"));
    }
}
