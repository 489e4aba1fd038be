use std::fmt::Write;

use chrono::{Duration, NaiveDate};

use crate::models::{CurrentEntryData, CurrentSchedule, DayItem, Language, Notice, SchoolDay};
use crate::timing::{gap_minutes, period_duration, period_start};

/// A day item together with how it should be presented.
#[derive(Debug, Clone)]
pub struct DisplayItem<'a> {
    pub item: &'a DayItem,
    pub hidden: bool,
    /// Other items of the same kind starting in the same period.
    pub concurrent: Vec<&'a DayItem>,
    /// Free minutes until the next item starts.
    pub break_after: Option<i64>,
}

fn same_kind(a: &DayItem, b: &DayItem) -> bool {
    matches!(
        (a, b),
        (DayItem::Entry(_), DayItem::Entry(_)) | (DayItem::Notice(_), DayItem::Notice(_))
    )
}

/// Collapses items that start together. Of concurrent entries only the last
/// one is shown; of concurrent ad-hoc notices only the most recently created.
pub fn layout_day(items: &[DayItem]) -> Vec<DisplayItem<'_>> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let concurrent: Vec<&DayItem> = items
                .iter()
                .enumerate()
                .filter(|(other_index, other)| {
                    *other_index != index
                        && same_kind(item, other)
                        && other.first_period() == item.first_period()
                })
                .map(|(_, other)| other)
                .collect();
            let next = items.get(index + 1);

            let hidden = match item {
                DayItem::Notice(notice) => concurrent.iter().any(|other| match other {
                    DayItem::Notice(other) => other.created_at > notice.created_at,
                    DayItem::Entry(_) => false,
                }),
                DayItem::Entry(_) => {
                    !concurrent.is_empty()
                        && next.map(DayItem::first_period) == Some(item.first_period())
                }
            };

            DisplayItem {
                item,
                hidden,
                concurrent,
                break_after: gap_minutes(
                    item.periods().last().copied(),
                    next.map(DayItem::first_period),
                    false,
                ),
            }
        })
        .collect()
}

fn format_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

fn period_label(periods: &[i32]) -> String {
    periods
        .iter()
        .map(i32::to_string)
        .collect::<Vec<_>>()
        .join("-")
}

fn time_label(periods: &[i32]) -> String {
    let start = periods.first().and_then(|period| period_start(*period));
    let duration = period_duration(periods);
    match (start, duration) {
        (Some(start), Some(minutes)) => format!(
            "{}-{}",
            start.format("%H:%M"),
            (start + Duration::minutes(minutes)).format("%H:%M")
        ),
        (Some(start), None) => start.format("%H:%M").to_string(),
        (None, _) => "--:--".to_string(),
    }
}

fn changed(old: Option<&str>, new: &str) -> String {
    match old {
        Some(old) if old != new => format!("~~{}~~ -> {}", old, new),
        _ => new.to_string(),
    }
}

fn describe_entry(entry: &CurrentEntryData, concurrent: &[&DayItem]) -> String {
    let static_data = &entry.static_data;
    let notice = entry.dynamic_data.as_ref();

    let name = match notice.and_then(|n| n.new_subject.as_deref()) {
        Some(new_subject) => changed(Some(entry.display_name()), new_subject),
        None => entry.display_name().to_string(),
    };
    let teacher = changed(
        notice.and_then(|n| n.old_teacher.as_deref()),
        notice
            .and_then(|n| n.teacher.as_deref())
            .unwrap_or(&static_data.teacher),
    );
    let room = changed(
        notice.and_then(|n| n.old_room.as_deref()),
        notice
            .and_then(|n| n.room.as_deref())
            .unwrap_or(&static_data.room),
    );

    let mut line = format!(
        "{} P{} {} ({}) {}",
        time_label(&static_data.periods),
        period_label(&static_data.periods),
        name,
        teacher,
        room
    );
    if let Some(tint) = entry.effective_tint() {
        let _ = write!(line, " [{}]", tint.as_str());
    }
    if let Some(status) = notice.and_then(|n| n.localized_type.as_deref()) {
        let _ = write!(line, " - {}", status);
    }
    if !concurrent.is_empty() {
        let subjects: Vec<&str> = concurrent
            .iter()
            .filter_map(|item| item.as_entry())
            .map(|other| other.static_data.subject.as_str())
            .collect();
        let _ = write!(line, " ({}+ {})", concurrent.len(), subjects.join(", "));
    }
    line
}

fn describe_notice(notice: &Notice) -> String {
    let mut line = format!(
        "{} P{} {}",
        time_label(&notice.periods),
        period_label(&notice.periods),
        notice.description
    );
    if let Some(subject) = &notice.subject {
        let _ = write!(line, " in {}", subject);
    }
    if let Some(room) = &notice.room {
        let _ = write!(line, " {}", room);
    }
    if let Some(kind) = &notice.localized_type {
        let _ = write!(line, " - {}", kind);
    }
    line
}

pub fn build_report(class: &str, lang: Language, schedule: &CurrentSchedule) -> String {
    let mut output = String::new();
    let title = match lang {
        Language::De => "Stundenplan",
        Language::En => "Timetable",
    };

    let _ = writeln!(output, "# {} {}", class, title);
    let _ = writeln!(
        output,
        "{} - {} ({})",
        format_date(schedule.dates.mon),
        format_date(schedule.dates.fri),
        schedule.week_type.as_str().to_uppercase()
    );

    for day in SchoolDay::ALL {
        let items = schedule.day(day);
        let _ = writeln!(output);
        let _ = writeln!(
            output,
            "## {} {}",
            day.name(lang),
            format_date(schedule.dates.day(day))
        );

        if items.is_empty() {
            let _ = writeln!(output, "No lessons.");
            continue;
        }

        if let Some(first) = items.first() {
            if let Some(buffer) = gap_minutes(Some(1), Some(first.first_period()), true) {
                let _ = writeln!(output, "  ~ {}min", buffer);
            }
        }

        for display in layout_day(items).iter().filter(|display| !display.hidden) {
            let line = match display.item {
                DayItem::Entry(entry) => describe_entry(entry, &display.concurrent),
                DayItem::Notice(notice) => describe_notice(notice),
            };
            let _ = writeln!(output, "- {}", line);
            if let Some(minutes) = display.break_after {
                let _ = writeln!(output, "  ~ {}min", minutes);
            }
        }
    }

    output
}

pub fn build_json(schedule: &CurrentSchedule) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(schedule)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{ad_hoc, entry, subject, window};
    use crate::merge::general_data;
    use crate::models::{NoticeKind, Tint, WeekScope, WeekType};

    fn as_item(static_data: crate::models::ScheduleEntry) -> DayItem {
        DayItem::Entry(CurrentEntryData {
            general_data: general_data(
                &[subject("m", "Math", Tint::Blue)],
                &static_data.subject,
                Language::En,
            ),
            static_data,
            dynamic_data: None,
        })
    }

    #[test]
    fn only_last_concurrent_entry_is_shown() {
        let items = vec![
            as_item(entry("f", &[3, 4], SchoolDay::Mon, WeekScope::Both)),
            as_item(entry("la", &[3, 4], SchoolDay::Mon, WeekScope::Both)),
            as_item(entry("m", &[5], SchoolDay::Mon, WeekScope::Both)),
        ];
        let layout = layout_day(&items);

        let hidden: Vec<bool> = layout.iter().map(|d| d.hidden).collect();
        assert_eq!(hidden, vec![true, false, false]);
        assert_eq!(layout[1].concurrent.len(), 1);
        assert_eq!(layout[1].break_after, Some(30));
        assert_eq!(layout[2].break_after, None);
    }

    #[test]
    fn newest_concurrent_notice_wins() {
        let older = ad_hoc("Assembly", SchoolDay::Tue, &[5, 6], 1);
        let newer = ad_hoc("Assembly moved", SchoolDay::Tue, &[5, 6], 9);
        let items = vec![DayItem::Notice(newer), DayItem::Notice(older)];

        let hidden: Vec<bool> = layout_day(&items).iter().map(|d| d.hidden).collect();
        assert_eq!(hidden, vec![false, true]);
    }

    #[test]
    fn report_lists_days_breaks_and_changes() {
        let mut schedule = CurrentSchedule::new(WeekType::B, window());
        let mut math = match as_item(entry("m", &[3, 4], SchoolDay::Mon, WeekScope::Both)) {
            DayItem::Entry(entry) => entry,
            DayItem::Notice(_) => unreachable!(),
        };
        let mut change = ad_hoc("", SchoolDay::Mon, &[3, 4], 0);
        change.kind = NoticeKind::NewRoom;
        change.old_room = Some("A101".to_string());
        change.room = Some("B204".to_string());
        change.localized_type = Some("Room change".to_string());
        math.dynamic_data = Some(change);
        schedule.mon.push(DayItem::Entry(math));
        schedule.mon.push(DayItem::Notice(ad_hoc("Assembly", SchoolDay::Mon, &[6], 0)));

        let report = build_report("10c", Language::En, &schedule);
        assert!(report.starts_with("# 10c Timetable\n19.10.2026 - 23.10.2026 (B)"));
        assert!(report.contains("## Monday 19.10.2026"));
        assert!(report.contains("  ~ 120min"));
        assert!(report.contains(
            "- 09:45-11:15 P3-4 Math (m-teacher) ~~A101~~ -> B204 [blue] - Room change"
        ));
        assert!(report.contains("  ~ 75min"));
        assert!(report.contains("- 12:30-13:15 P6 Assembly\n"));
        assert!(report.contains("## Friday 23.10.2026\nNo lessons."));
    }

    #[test]
    fn german_report_uses_german_labels() {
        let schedule = CurrentSchedule::new(WeekType::A, window());
        let report = build_report("Q1", Language::De, &schedule);
        assert!(report.starts_with("# Q1 Stundenplan"));
        assert!(report.contains("## Mittwoch 21.10.2026"));
    }

    #[test]
    fn json_uses_document_field_names() {
        let mut schedule = CurrentSchedule::new(WeekType::A, window());
        schedule
            .tue
            .push(as_item(entry("m", &[1], SchoolDay::Tue, WeekScope::A)));

        let json = build_json(&schedule).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["weekType"], "a");
        assert_eq!(value["dates"]["mon"], "2026-10-19");
        assert_eq!(value["tue"][0]["staticData"]["weekDay"], "tue");
        assert_eq!(value["tue"][0]["generalData"]["tint"], "blue");
        assert!(value["tue"][0]["dynamicData"].is_null());
    }
}
