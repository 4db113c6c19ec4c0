use chrono::NaiveDate;

use super::{first_occurrence, next_occurrence, RecurrenceRule, RuleError};

/// Upper bound on the number of dates a preview returns.
pub const MAX_PREVIEW_OCCURRENCES: usize = 12;

/// Lazily walks the occurrences of a rule. Stops after the end date or after
/// yielding an error.
pub struct Occurrences<'a> {
    rule: &'a RecurrenceRule,
    state: Cursor,
}

enum Cursor {
    Start(NaiveDate),
    After(NaiveDate),
    Done,
}

impl<'a> Occurrences<'a> {
    pub fn from_first(rule: &'a RecurrenceRule) -> Result<Occurrences<'a>, RuleError> {
        Ok(Occurrences::starting_at(rule, first_occurrence(rule)?))
    }

    /// `start` is yielded as is, even if the rule would not fire on it.
    pub fn starting_at(rule: &'a RecurrenceRule, start: NaiveDate) -> Occurrences<'a> {
        Occurrences {
            rule,
            state: Cursor::Start(start),
        }
    }
}

impl Iterator for Occurrences<'_> {
    type Item = Result<NaiveDate, RuleError>;

    fn next(&mut self) -> Option<Self::Item> {
        let next = match self.state {
            Cursor::Done => return None,
            Cursor::Start(start) => Ok(Some(start).filter(|start| self.rule.allows(start))),
            Cursor::After(previous) => next_occurrence(self.rule, previous),
        };

        match next {
            Ok(Some(date)) => {
                self.state = Cursor::After(date);
                Some(Ok(date))
            }
            Ok(None) => {
                self.state = Cursor::Done;
                None
            }
            Err(error) => {
                self.state = Cursor::Done;
                Some(Err(error))
            }
        }
    }
}

/// Up to `count` upcoming dates of `rule`, capped at
/// [`MAX_PREVIEW_OCCURRENCES`], starting at `from` or at the rule's first
/// occurrence.
pub fn preview_occurrences(
    rule: &RecurrenceRule,
    count: usize,
    from: Option<NaiveDate>,
) -> Result<Vec<NaiveDate>, RuleError> {
    let occurrences = match from {
        Some(from) => Occurrences::starting_at(rule, from),
        None => Occurrences::from_first(rule)?,
    };

    occurrences
        .take(count.min(MAX_PREVIEW_OCCURRENCES))
        .collect()
}
