//! Boolean query model for the engine query syntax.
//!
//! [`parse_keywords`](crate::query::parse_keywords) emits strings such as
//! `+rust "async io" tokio* -python`. Engines read them back through
//! [`BooleanQuery::parse`] into Must / Should / MustNot clauses, the same
//! occurrence model a full-text engine uses:
//!
//! - at least one Must clause: every Must clause has to match, Should
//!   clauses only add relevance.
//! - no Must clause: at least one Should clause has to match.
//! - any matching MustNot clause rejects the document.
//! - a query with no positive clause matches nothing.

/// How a clause takes part in matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occur {
    Must,
    Should,
    MustNot,
}

/// The text a clause matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    /// A bare word. `prefix` is set for a trailing `*`.
    Word { text: String, prefix: bool },
    /// A double-quoted phrase.
    Phrase(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub occur: Occur,
    pub term: Term,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BooleanQuery {
    pub clauses: Vec<Clause>,
}

impl BooleanQuery {
    /// Parse an engine query string. Never fails: stray operators and
    /// empty words are dropped, an unterminated phrase runs to the end.
    pub fn parse(query: &str) -> Self {
        let mut clauses = Vec::new();
        let mut chars = query.chars().peekable();

        loop {
            while chars.next_if(|c| c.is_whitespace()).is_some() {}
            let Some(&first) = chars.peek() else { break };

            let occur = match first {
                '+' => {
                    chars.next();
                    Occur::Must
                }
                '-' => {
                    chars.next();
                    Occur::MustNot
                }
                _ => Occur::Should,
            };

            if chars.next_if_eq(&'"').is_some() {
                let mut phrase = String::new();
                for c in chars.by_ref() {
                    if c == '"' {
                        break;
                    }
                    phrase.push(c);
                }
                // A prefix marker after a phrase has no meaning here.
                while chars.next_if_eq(&'*').is_some() {}
                if !phrase.trim().is_empty() {
                    clauses.push(Clause {
                        occur,
                        term: Term::Phrase(phrase.trim().to_string()),
                    });
                }
                continue;
            }

            let mut word = String::new();
            while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                word.push(c);
            }
            let prefix = word.ends_with('*');
            let text = word.trim_end_matches('*');
            if !text.is_empty() {
                clauses.push(Clause {
                    occur,
                    term: Term::Word {
                        text: text.to_string(),
                        prefix,
                    },
                });
            }
        }

        Self { clauses }
    }

    pub fn has_positive(&self) -> bool {
        self.clauses.iter().any(|c| c.occur != Occur::MustNot)
    }

    pub fn by_occur(&self, occur: Occur) -> impl Iterator<Item = &Term> + '_ {
        self.clauses
            .iter()
            .filter(move |c| c.occur == occur)
            .map(|c| &c.term)
    }

    /// Whether `text` satisfies the query.
    pub fn matches(&self, text: &str) -> bool {
        self.score(text).is_some()
    }

    /// Relevance of `text` against the query: the number of positive clause
    /// occurrences, or `None` when the document does not match.
    pub fn score(&self, text: &str) -> Option<f64> {
        if !self.has_positive() {
            return None;
        }
        let doc = tokenize(text);

        let mut must_seen = false;
        let mut should_hit = false;
        let mut score = 0usize;

        for clause in &self.clauses {
            let hits = occurrences(&doc, &clause.term);
            match clause.occur {
                Occur::Must => {
                    must_seen = true;
                    if hits == 0 {
                        return None;
                    }
                    score += hits;
                }
                Occur::Should => {
                    if hits > 0 {
                        should_hit = true;
                        score += hits;
                    }
                }
                Occur::MustNot => {
                    if hits > 0 {
                        return None;
                    }
                }
            }
        }

        (must_seen || should_hit).then_some(score as f64)
    }
}

/// Lowercased alphanumeric tokens, the way a unicode61-style tokenizer
/// splits text.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn occurrences(doc: &[String], term: &Term) -> usize {
    let (needle, prefix) = match term {
        Term::Word { text, prefix } => (tokenize(text), *prefix),
        Term::Phrase(text) => (tokenize(text), false),
    };
    if needle.is_empty() || needle.len() > doc.len() {
        return 0;
    }

    let last = needle.len() - 1;
    doc.windows(needle.len())
        .filter(|window| {
            window.iter().zip(&needle).enumerate().all(|(i, (d, n))| {
                if prefix && i == last {
                    d.starts_with(n.as_str())
                } else {
                    d == n
                }
            })
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, prefix: bool) -> Term {
        Term::Word {
            text: text.to_string(),
            prefix,
        }
    }

    #[test]
    fn test_parse_operators() {
        let q = BooleanQuery::parse("+rust \"async io\" tokio* -python");
        assert_eq!(
            q.clauses,
            vec![
                Clause { occur: Occur::Must, term: word("rust", false) },
                Clause { occur: Occur::Should, term: Term::Phrase("async io".into()) },
                Clause { occur: Occur::Should, term: word("tokio", true) },
                Clause { occur: Occur::MustNot, term: word("python", false) },
            ]
        );
    }

    #[test]
    fn test_parse_drops_stray_operators() {
        let q = BooleanQuery::parse("+ - * \"\"");
        assert!(q.clauses.is_empty());
    }

    #[test]
    fn test_parse_unterminated_phrase() {
        let q = BooleanQuery::parse("\"open ended");
        assert_eq!(q.by_occur(Occur::Should).count(), 1);
        assert_eq!(q.clauses[0].term, Term::Phrase("open ended".into()));
    }

    #[test]
    fn test_must_requires_all() {
        let q = BooleanQuery::parse("+alpha +beta");
        assert!(q.matches("Alpha and beta"));
        assert!(!q.matches("alpha only"));
    }

    #[test]
    fn test_should_requires_one_without_must() {
        let q = BooleanQuery::parse("red green");
        assert!(q.matches("a green field"));
        assert!(!q.matches("a blue field"));
    }

    #[test]
    fn test_should_optional_with_must() {
        let q = BooleanQuery::parse("+alpha gamma");
        assert!(q.matches("alpha"));
        assert!(q.score("alpha gamma").unwrap() > q.score("alpha").unwrap());
    }

    #[test]
    fn test_must_not_rejects() {
        let q = BooleanQuery::parse("+alpha -beta");
        assert!(!q.matches("alpha beta"));
    }

    #[test]
    fn test_negative_only_matches_nothing() {
        let q = BooleanQuery::parse("-beta");
        assert!(!q.matches("alpha"));
    }

    #[test]
    fn test_prefix_and_phrase() {
        let q = BooleanQuery::parse("deploy*");
        assert!(q.matches("Deployment notes"));

        let q = BooleanQuery::parse("\"hello world\"");
        assert!(q.matches("Hello, world!"));
        assert!(!q.matches("world hello"));
    }
}
