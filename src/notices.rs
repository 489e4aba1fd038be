use tracing::debug;

use crate::models::{Language, Notice, NoticeKind, SchoolDay, WeekType};
use crate::store::ScheduleStore;
use crate::window::WeekWindow;

/// Notices for the active window together with the week variant they imply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeSelection {
    /// Newest first by creation time.
    pub notices: Vec<Notice>,
    pub week_type: WeekType,
}

pub fn localized_type(kind: &NoticeKind, lang: Language) -> String {
    let label = match (lang, kind) {
        (_, NoticeKind::Other(code)) => return code.clone(),
        (Language::En, NoticeKind::Cancelled) => "Cancelled",
        (Language::En, NoticeKind::LikelyCancelled) => "Likely cancelled",
        (Language::En, NoticeKind::NewRoom) => "Room change",
        (Language::En, NoticeKind::NewTeacher) => "Substitute teacher",
        (Language::En, NoticeKind::DiffSubject) => "Subject change",
        (Language::En, NoticeKind::Unknown) => "Special event",
        (Language::De, NoticeKind::Cancelled) => "Entfall",
        (Language::De, NoticeKind::LikelyCancelled) => "Vermutlich Entfall",
        (Language::De, NoticeKind::NewRoom) => "Raumänderung",
        (Language::De, NoticeKind::NewTeacher) => "Vertretung",
        (Language::De, NoticeKind::DiffSubject) => "Fachänderung",
        (Language::De, NoticeKind::Unknown) => "Sonderveranstaltung",
    };
    label.to_string()
}

pub fn is_relevant(notice: &Notice, window: &WeekWindow, ignored: &[String]) -> bool {
    if SchoolDay::of_date(notice.date).is_none() || !window.contains(notice.date) {
        return false;
    }

    match &notice.subject {
        Some(subject) => !ignored.contains(subject),
        None => true,
    }
}

/// Keeps relevant notices, attaches their localized type and orders them
/// newest first. Notices with equal creation times keep their input order.
pub fn filter_relevant(
    notices: Vec<Notice>,
    window: &WeekWindow,
    ignored: &[String],
    lang: Language,
) -> Vec<Notice> {
    let mut relevant: Vec<Notice> = notices
        .into_iter()
        .filter(|notice| is_relevant(notice, window, ignored))
        .map(|mut notice| {
            notice.localized_type = Some(localized_type(&notice.kind, lang));
            notice
        })
        .collect();

    relevant.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    relevant
}

/// Newest relevant notice wins, then the window-wide fallback, then week A.
pub fn week_type_of(relevant: &[Notice], fallback: Option<&Notice>) -> WeekType {
    relevant
        .first()
        .or(fallback)
        .map(|notice| notice.week_type)
        .unwrap_or_default()
}

pub async fn select_notices<S>(
    store: &S,
    class: &str,
    ignored: &[String],
    lang: Language,
    window: &WeekWindow,
) -> anyhow::Result<NoticeSelection>
where
    S: ScheduleStore + ?Sized,
{
    let fetched = store.list_notices(class, window, ignored).await?;
    let fetched_count = fetched.len();
    let notices = filter_relevant(fetched, window, ignored, lang);
    debug!(
        class,
        fetched = fetched_count,
        relevant = notices.len(),
        "notices filtered for window"
    );

    let week_type = if notices.is_empty() {
        let fallback = store.latest_notice(window).await?;
        if fallback.is_none() {
            debug!(class, "no notice in window, defaulting to week a");
        }
        week_type_of(&notices, fallback.as_ref())
    } else {
        week_type_of(&notices, None)
    };

    Ok(NoticeSelection { notices, week_type })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::{NaiveDate, TimeZone, Utc};
    use uuid::Uuid;

    fn window() -> WeekWindow {
        WeekWindow::resolve(NaiveDate::from_ymd_opt(2026, 10, 21).unwrap()).unwrap()
    }

    fn notice(day: u32, subject: Option<&str>, week_type: WeekType, created_hour: u32) -> Notice {
        Notice {
            id: Uuid::new_v4(),
            affected_class: "10c".to_string(),
            subject: subject.map(str::to_string),
            date: NaiveDate::from_ymd_opt(2026, 10, day).unwrap(),
            periods: vec![1, 2],
            kind: NoticeKind::Cancelled,
            room: None,
            old_room: None,
            teacher: None,
            old_teacher: None,
            new_subject: None,
            old_subject: None,
            description: String::new(),
            week_type,
            created_at: Utc.with_ymd_and_hms(2026, 10, 18, created_hour, 0, 0).unwrap(),
            localized_type: None,
        }
    }

    #[test]
    fn unknown_codes_pass_through_localization() {
        let kind = NoticeKind::from_code("roomSwap");
        assert_eq!(localized_type(&kind, Language::De), "roomSwap");
        assert_eq!(localized_type(&NoticeKind::Cancelled, Language::De), "Entfall");
        assert_eq!(localized_type(&NoticeKind::NewRoom, Language::En), "Room change");
    }

    #[test]
    fn relevance_respects_window_and_ignore_list() {
        let ignored = vec!["d".to_string()];
        let window = window();

        assert!(is_relevant(&notice(19, Some("m"), WeekType::A, 1), &window, &ignored));
        assert!(is_relevant(&notice(23, None, WeekType::A, 1), &window, &ignored));
        assert!(!is_relevant(&notice(20, Some("d"), WeekType::A, 1), &window, &ignored));
        assert!(!is_relevant(&notice(18, Some("m"), WeekType::A, 1), &window, &ignored));
        assert!(!is_relevant(&notice(24, Some("m"), WeekType::A, 1), &window, &ignored));
    }

    #[test]
    fn filtered_notices_are_newest_first_and_localized() {
        let notices = vec![
            notice(19, Some("m"), WeekType::A, 1),
            notice(22, Some("e"), WeekType::B, 9),
            notice(20, Some("ph"), WeekType::A, 4),
        ];
        let relevant = filter_relevant(notices, &window(), &[], Language::En);

        let hours: Vec<u32> = relevant
            .iter()
            .map(|n| n.created_at.format("%H").to_string().parse().unwrap())
            .collect();
        assert_eq!(hours, vec![9, 4, 1]);
        assert!(relevant
            .iter()
            .all(|n| n.localized_type.as_deref() == Some("Cancelled")));
    }

    #[test]
    fn week_type_defaults_to_a() {
        assert_eq!(week_type_of(&[], None), WeekType::A);
        let fallback = notice(20, None, WeekType::B, 3);
        assert_eq!(week_type_of(&[], Some(&fallback)), WeekType::B);
    }

    #[tokio::test]
    async fn later_notice_determines_week_type() {
        let store = MemoryStore {
            notices: vec![
                notice(20, Some("m"), WeekType::A, 2),
                notice(19, Some("e"), WeekType::B, 11),
            ],
            ..MemoryStore::default()
        };

        let selection = select_notices(&store, "10c", &[], Language::En, &window())
            .await
            .unwrap();
        assert_eq!(selection.notices.len(), 2);
        assert_eq!(selection.week_type, WeekType::B);
    }

    #[tokio::test]
    async fn falls_back_to_any_class_in_window() {
        let mut other_class = notice(21, Some("m"), WeekType::B, 5);
        other_class.affected_class = "7a".to_string();
        let ignored_subject = notice(21, Some("d"), WeekType::A, 3);
        let store = MemoryStore {
            notices: vec![other_class, ignored_subject],
            ..MemoryStore::default()
        };

        let ignored = vec!["d".to_string()];
        let selection = select_notices(&store, "10c", &ignored, Language::En, &window())
            .await
            .unwrap();
        assert!(selection.notices.is_empty());
        assert_eq!(selection.week_type, WeekType::B);
    }

    #[tokio::test]
    async fn no_notices_anywhere_means_week_a() {
        let stale = notice(12, Some("m"), WeekType::B, 5);
        let store = MemoryStore {
            notices: vec![stale],
            ..MemoryStore::default()
        };

        let selection = select_notices(&store, "10c", &[], Language::De, &window())
            .await
            .unwrap();
        assert!(selection.notices.is_empty());
        assert_eq!(selection.week_type, WeekType::A);
    }
}
