//! Builders shared by the unit tests. Dates fall in the week of 2026-10-19.

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use crate::models::{
    AccountData, Language, Notice, NoticeKind, ScheduleEntry, SchoolDay, SubjectInfo, Tint,
    WeekScope, WeekType,
};
use crate::window::WeekWindow;

pub const CLASS: &str = "10c";

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 21).unwrap()
}

pub fn window() -> WeekWindow {
    WeekWindow::resolve(today()).unwrap()
}

pub fn entry(subject: &str, periods: &[i32], day: SchoolDay, scope: WeekScope) -> ScheduleEntry {
    ScheduleEntry {
        id: Uuid::new_v4(),
        subject: subject.to_string(),
        teacher: format!("{}-teacher", subject),
        room: "A101".to_string(),
        periods: periods.to_vec(),
        week_day: day,
        week_type: scope,
        affected_class: CLASS.to_string(),
    }
}

pub fn notice(
    kind: NoticeKind,
    subject: Option<&str>,
    day: SchoolDay,
    periods: &[i32],
    week_type: WeekType,
    created_minute: u32,
) -> Notice {
    Notice {
        id: Uuid::new_v4(),
        affected_class: CLASS.to_string(),
        subject: subject.map(str::to_string),
        date: window().day(day),
        periods: periods.to_vec(),
        kind,
        room: None,
        old_room: None,
        teacher: None,
        old_teacher: None,
        new_subject: None,
        old_subject: None,
        description: "notice".to_string(),
        week_type,
        created_at: Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
            + Duration::minutes(i64::from(created_minute)),
        localized_type: None,
    }
}

pub fn ad_hoc(description: &str, day: SchoolDay, periods: &[i32], created_minute: u32) -> Notice {
    let mut notice = notice(
        NoticeKind::Unknown,
        None,
        day,
        periods,
        WeekType::A,
        created_minute,
    );
    notice.description = description.to_string();
    notice
}

pub fn subject(abbreviation: &str, name: &str, tint: Tint) -> SubjectInfo {
    SubjectInfo {
        abbreviation: abbreviation.to_string(),
        name_en: name.to_string(),
        name_de: None,
        tint,
    }
}

pub fn account(ignored: &[&str], additional: &[&str]) -> AccountData {
    AccountData {
        id: Uuid::new_v4(),
        affected_class: CLASS.to_string(),
        lang: Language::En,
        ignored: ignored.iter().map(|s| s.to_string()).collect(),
        additional: additional.iter().map(|s| s.to_string()).collect(),
    }
}
