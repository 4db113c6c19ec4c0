use std::fmt::{Display, Formatter};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::amounts::{CurrencyIdent, Figure};
use crate::rule::{first_occurrence, next_occurrence, RecurrenceRule, RuleError};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl Display for ItemId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        ItemId(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Expense,
    Income,
}

/// Scheduling state of a recurring item, persisted as one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub next_occurrence: NaiveDate,
    pub last_generated_date: Option<NaiveDate>,
    pub is_active: bool,
}

impl Schedule {
    /// Schedule of a freshly created item. A rule whose first occurrence is
    /// already past its end date starts inactive.
    pub fn for_new_rule(rule: &RecurrenceRule) -> Result<Schedule, RuleError> {
        let next_occurrence = first_occurrence(rule)?;
        Ok(Schedule {
            next_occurrence,
            last_generated_date: None,
            is_active: rule.allows(&next_occurrence),
        })
    }

    pub fn status(&self, rule: &RecurrenceRule, today: &NaiveDate) -> ItemStatus {
        if self.is_active {
            return if self.next_occurrence <= *today {
                ItemStatus::ActiveCurrent
            } else {
                ItemStatus::ActiveFuture
            };
        }

        // A pending `next_occurrence` still counts as work left, even when it
        // is the rule's last one.
        let past_end_date = rule.end_date.map_or(false, |end_date| end_date < *today);
        let stale = !rule.allows(&self.next_occurrence);
        let last_one_generated = self.last_generated_date == Some(self.next_occurrence)
            && matches!(next_occurrence(rule, self.next_occurrence), Ok(None));
        if past_end_date || stale || last_one_generated {
            ItemStatus::Exhausted
        } else {
            ItemStatus::Paused
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    /// Has at least one occurrence due.
    ActiveCurrent,
    /// Active, nothing due yet.
    ActiveFuture,
    /// Inactive because no occurrence is left.
    Exhausted,
    /// Inactive by the owner's choice.
    Paused,
}

impl Display for ItemStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ItemStatus::ActiveCurrent => "Due",
            ItemStatus::ActiveFuture => "Upcoming",
            ItemStatus::Exhausted => "Ended",
            ItemStatus::Paused => "Paused",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeOutcome {
    Resumed { next_occurrence: NaiveDate },
    /// Nothing to resume; the schedule is left as it was.
    AlreadyActive { next_occurrence: NaiveDate },
    /// The rule has no occurrence left after today; the item stays inactive.
    Exhausted,
}

/// An expense or income that repeats following `rule`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringItem {
    pub id: ItemId,
    pub kind: ItemKind,
    pub account_id: String,
    pub user_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub amount: Figure,
    pub currency: CurrencyIdent,
    pub rule: RecurrenceRule,
    #[serde(flatten)]
    pub schedule: Schedule,
}

impl RecurringItem {
    pub fn status(&self, today: &NaiveDate) -> ItemStatus {
        self.schedule.status(&self.rule, today)
    }

    pub fn pause(&mut self) {
        self.schedule.is_active = false;
    }

    /// Reactivates the item on the owner's request. Occurrences missed while
    /// paused are skipped: the item restarts at its first occurrence if that is
    /// still ahead, otherwise at the first occurrence after `today`. Active
    /// items keep their due occurrences.
    pub fn resume(&mut self, today: NaiveDate) -> Result<ResumeOutcome, RuleError> {
        if self.schedule.is_active {
            return Ok(ResumeOutcome::AlreadyActive {
                next_occurrence: self.schedule.next_occurrence,
            });
        }

        let first = first_occurrence(&self.rule)?;
        let next = if first < today {
            next_occurrence(&self.rule, today)?
        } else {
            Some(first).filter(|first| self.rule.allows(first))
        };

        match next {
            Some(next_occurrence) => {
                self.schedule.next_occurrence = next_occurrence;
                self.schedule.is_active = true;
                Ok(ResumeOutcome::Resumed { next_occurrence })
            }
            None => {
                self.schedule.is_active = false;
                Ok(ResumeOutcome::Exhausted)
            }
        }
    }

    /// Replaces the rule and restarts the schedule at the new rule's first
    /// occurrence. Whether the item is active is left unchanged.
    pub fn change_rule(&mut self, rule: RecurrenceRule) -> Result<(), RuleError> {
        self.schedule.next_occurrence = first_occurrence(&rule)?;
        self.rule = rule;
        Ok(())
    }
}
