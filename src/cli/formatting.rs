use chrono::{Datelike, NaiveDate};
use comfy_table::Table;

use crate::catch_up::PassReport;
use crate::item::{ItemId, ItemKind, ItemStatus, RecurringItem, ResumeOutcome};

pub fn format_items(items: &[RecurringItem], today: &NaiveDate) -> String {
    let mut components = vec![title(&format!("Recurring items on {}", today))];

    let content = if items.is_empty() {
        "No recurring items in this vault".to_string()
    } else {
        let mut table = Table::new();
        table.set_header(vec![
            "Id",
            "Name",
            "Kind",
            "Amount",
            "Schedule",
            "Next occurrence",
            "Status",
        ]);
        for item in items {
            table.add_row(vec![
                item.id.to_string(),
                item.name.clone(),
                kind_label(item.kind).to_string(),
                format!("{} {}", item.amount, item.currency),
                item.rule.to_string(),
                item.schedule.next_occurrence.to_string(),
                item.status(today).to_string(),
            ]);
        }
        table.to_string()
    };
    components.push(content);

    finish(components)
}

pub fn format_preview(item: &RecurringItem, dates: &[NaiveDate]) -> String {
    let mut components = vec![title(&format!("{}: {}", item.name, item.rule))];

    let content = if dates.is_empty() {
        "No upcoming occurrences".to_string()
    } else {
        let mut table = Table::new();
        table.set_header(vec!["#", "Date", "Weekday"]);
        for (position, date) in dates.iter().enumerate() {
            table.add_row(vec![
                (position + 1).to_string(),
                date.to_string(),
                date.weekday().to_string(),
            ]);
        }
        table.to_string()
    };
    components.push(content);

    finish(components)
}

pub fn format_pass_reports(
    today: &NaiveDate,
    results: &[(ItemId, Result<PassReport, String>)],
) -> String {
    let mut components = vec![title(&format!("Generated transactions up to {}", today))];

    let content = if results.is_empty() {
        "No recurring items in this vault".to_string()
    } else {
        let mut table = Table::new();
        table.set_header(vec!["Item", "Generated", "Errors", "Next occurrence", "Status"]);
        for (id, result) in results {
            let row = match result {
                Ok(report) => vec![
                    id.to_string(),
                    report.generated.to_string(),
                    report.errors.to_string(),
                    report.final_next_occurrence.to_string(),
                    report_status(report).to_string(),
                ],
                Err(error) => vec![
                    id.to_string(),
                    "-".to_string(),
                    "-".to_string(),
                    "-".to_string(),
                    error.clone(),
                ],
            };
            table.add_row(row);
        }
        table.to_string()
    };
    components.push(content);

    finish(components)
}

pub fn format_paused(item: &RecurringItem) -> String {
    finish(vec![title(&format!("Paused {}", item.name))])
}

pub fn format_resumed(item: &RecurringItem, outcome: &ResumeOutcome) -> String {
    let message = match outcome {
        ResumeOutcome::Resumed { next_occurrence } => {
            format!("Resumed {}, next occurrence on {}", item.name, next_occurrence)
        }
        ResumeOutcome::AlreadyActive { next_occurrence } => {
            format!("{} is already active, next occurrence on {}", item.name, next_occurrence)
        }
        ResumeOutcome::Exhausted => {
            format!("{} has no occurrence left and stays inactive", item.name)
        }
    };
    finish(vec![title(&message)])
}

pub fn format_added(item: &RecurringItem) -> String {
    finish(vec![
        title(&format!("Added {}, repeating {}", item.name, item.rule)),
        next_occurrence_line(item),
    ])
}

pub fn format_rule_changed(item: &RecurringItem) -> String {
    finish(vec![
        title(&format!("{} now repeats {}", item.name, item.rule)),
        next_occurrence_line(item),
    ])
}

fn next_occurrence_line(item: &RecurringItem) -> String {
    if item.schedule.is_active {
        format!("Next occurrence: {}", item.schedule.next_occurrence)
    } else {
        format!(
            "Next occurrence: {} (inactive)",
            item.schedule.next_occurrence
        )
    }
}

fn report_status(report: &PassReport) -> &'static str {
    if report.errors > 0 {
        return "Stopped on error";
    }
    match report.status {
        ItemStatus::Paused => "Paused",
        ItemStatus::Exhausted => "Ended",
        _ if report.more_due => "More due",
        _ => "Up to date",
    }
}

fn kind_label(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::Expense => "Expense",
        ItemKind::Income => "Income",
    }
}

fn finish(mut components: Vec<String>) -> String {
    components.push(format!("Release: {}", env!("RELEASE")));
    components.join("\n\n")
}

fn title(string: &str) -> String {
    let string_length = string.chars().count();
    string.to_string() + "\n" + &"=".repeat(string_length)
}
