use std::collections::HashSet;

use tracing::debug;

use crate::models::{
    AccountData, CurrentEntryData, DayItem, GeneralData, Language, Notice, ScheduleEntry,
    SchoolDay, SubjectInfo,
};

/// Reconciles one weekday: static entries plus opted-in additional entries,
/// minus ignored subjects, matched with notices and displaced by ad-hoc
/// notices. The result is ordered by first period.
pub fn merge_day(
    day: SchoolDay,
    entries: &[ScheduleEntry],
    notices: &[Notice],
    subjects: &[SubjectInfo],
    account: &AccountData,
    additional_pool: &[ScheduleEntry],
) -> Vec<DayItem> {
    let additional = additional_pool
        .iter()
        .filter(|entry| entry.week_day == day && !account.ignores(&entry.subject));

    let mut seen = HashSet::new();
    let mut resolved: Vec<CurrentEntryData> = entries
        .iter()
        .filter(|entry| entry.week_day == day)
        .chain(additional)
        .filter(|entry| seen.insert(entry.id))
        .filter(|entry| !account.ignores(&entry.subject))
        .map(|entry| CurrentEntryData {
            static_data: entry.clone(),
            general_data: general_data(subjects, &entry.subject, account.lang),
            dynamic_data: matching_notice(entry, day, notices).cloned(),
        })
        .collect();

    let ad_hoc: Vec<&Notice> = notices
        .iter()
        .filter(|notice| notice.kind.is_ad_hoc() && notice.school_day() == Some(day))
        .collect();

    for notice in &ad_hoc {
        resolved.retain_mut(|entry| match narrowed_periods(&entry.static_data.periods, notice) {
            None => true,
            Some(periods) if periods.is_empty() => {
                debug!(
                    day = day.key(),
                    subject = %entry.static_data.subject,
                    event = %notice.description,
                    "entry fully displaced by ad-hoc notice"
                );
                false
            }
            Some(periods) => {
                entry.static_data.periods = periods;
                true
            }
        });
    }

    let mut items: Vec<DayItem> = resolved
        .into_iter()
        .map(DayItem::Entry)
        .chain(ad_hoc.into_iter().cloned().map(DayItem::Notice))
        .collect();
    items.sort_by_key(DayItem::first_period);
    items
}

pub fn general_data(subjects: &[SubjectInfo], subject: &str, lang: Language) -> Option<GeneralData> {
    subjects
        .iter()
        .find(|info| info.abbreviation == subject)
        .map(|info| GeneralData {
            name: info.name_for(lang).to_string(),
            tint: info.tint,
        })
}

/// First notice, in the given order, for the same subject, the identical
/// period list and the same weekday. Duplicate matches in the source data
/// resolve to whichever comes first.
pub fn matching_notice<'a>(
    entry: &ScheduleEntry,
    day: SchoolDay,
    notices: &'a [Notice],
) -> Option<&'a Notice> {
    notices.iter().find(|notice| {
        notice.subject.as_deref() == Some(entry.subject.as_str())
            && notice.periods == entry.periods
            && notice.school_day() == Some(day)
    })
}

/// Periods left to an entry overlapped by an ad-hoc notice, or `None` when
/// the notice does not touch the entry.
///
/// Only periods before the notice start survive, plus periods after the
/// notice end when the notice spans more than one period.
pub fn narrowed_periods(periods: &[i32], notice: &Notice) -> Option<Vec<i32>> {
    let start = notice.periods.iter().copied().min()?;
    let end = notice.periods.iter().copied().max()?;

    if !periods.iter().any(|period| (start..=end).contains(period)) {
        return None;
    }

    let spans = end > start;
    Some(
        periods
            .iter()
            .copied()
            .filter(|&period| period < start || (spans && period > end))
            .collect(),
    )
}
