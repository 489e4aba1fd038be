//! Read interface the reconciliation engine needs from its storage backend.
//!
//! The Postgres implementation lives in `db`; `MemoryStore` serves fixture
//! files and tests.

use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;

use crate::models::{AccountData, Notice, ScheduleEntry, SubjectInfo, WeekType};
use crate::window::WeekWindow;

#[async_trait]
pub trait ScheduleStore: Send + Sync {
    /// Static entries of a class. With a week filter only entries scheduled in
    /// that week (including `both`) are returned.
    async fn list_schedule_entries(
        &self,
        class: &str,
        week: Option<WeekType>,
    ) -> anyhow::Result<Vec<ScheduleEntry>>;

    /// Notices of a class dated inside the window, newest first by creation
    /// time. Notices naming an excluded subject are left out.
    async fn list_notices(
        &self,
        class: &str,
        window: &WeekWindow,
        excluded_subjects: &[String],
    ) -> anyhow::Result<Vec<Notice>>;

    /// Most recently created notice inside the window, for any class.
    async fn latest_notice(&self, window: &WeekWindow) -> anyhow::Result<Option<Notice>>;

    async fn list_subject_info(&self) -> anyhow::Result<Vec<SubjectInfo>>;

    async fn list_entries_by_subjects(
        &self,
        subjects: &[String],
    ) -> anyhow::Result<Vec<ScheduleEntry>>;
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MemoryStore {
    pub entries: Vec<ScheduleEntry>,
    pub notices: Vec<Notice>,
    pub subjects: Vec<SubjectInfo>,
    pub accounts: Vec<AccountData>,
}

impl MemoryStore {
    /// Loads a JSON fixture with `entries`, `notices`, `subjects` and `accounts`.
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read fixture {}", path.display()))?;
        let store: MemoryStore = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse fixture {}", path.display()))?;
        Ok(store)
    }

    pub fn account(&self, id: uuid::Uuid) -> Option<&AccountData> {
        self.accounts.iter().find(|account| account.id == id)
    }
}

#[async_trait]
impl ScheduleStore for MemoryStore {
    async fn list_schedule_entries(
        &self,
        class: &str,
        week: Option<WeekType>,
    ) -> anyhow::Result<Vec<ScheduleEntry>> {
        Ok(self
            .entries
            .iter()
            .filter(|entry| entry.affected_class == class)
            .filter(|entry| week.map_or(true, |week| entry.week_type.applies_to(week)))
            .cloned()
            .collect())
    }

    async fn list_notices(
        &self,
        class: &str,
        window: &WeekWindow,
        excluded_subjects: &[String],
    ) -> anyhow::Result<Vec<Notice>> {
        let mut notices: Vec<Notice> = self
            .notices
            .iter()
            .filter(|notice| notice.affected_class == class && window.contains(notice.date))
            .filter(|notice| {
                notice
                    .subject
                    .as_ref()
                    .map_or(true, |subject| !excluded_subjects.contains(subject))
            })
            .cloned()
            .collect();
        notices.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notices)
    }

    async fn latest_notice(&self, window: &WeekWindow) -> anyhow::Result<Option<Notice>> {
        Ok(self
            .notices
            .iter()
            .filter(|notice| window.contains(notice.date))
            .max_by_key(|notice| notice.created_at)
            .cloned())
    }

    async fn list_subject_info(&self) -> anyhow::Result<Vec<SubjectInfo>> {
        Ok(self.subjects.clone())
    }

    async fn list_entries_by_subjects(
        &self,
        subjects: &[String],
    ) -> anyhow::Result<Vec<ScheduleEntry>> {
        Ok(self
            .entries
            .iter()
            .filter(|entry| subjects.contains(&entry.subject))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use uuid::Uuid;

    use super::*;
    use crate::models::NoticeKind;

    fn demo() -> MemoryStore {
        serde_json::from_str(include_str!("../demos/week.json")).unwrap()
    }

    fn demo_window() -> WeekWindow {
        WeekWindow::resolve(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()).unwrap()
    }

    #[test]
    fn demo_fixture_parses() {
        let store = demo();
        assert_eq!(store.subjects.len(), 7);
        assert_eq!(store.notices[1].kind, NoticeKind::NewRoom);
        assert!(store.notices[0].localized_type.is_none());

        let account = store
            .account(Uuid::parse_str("6f1c2b1e-8d0a-4c53-9a9e-2f7d1c0b5a11").unwrap())
            .unwrap();
        assert_eq!(account.additional, vec!["f".to_string()]);
        assert!(store.account(Uuid::nil()).is_none());
    }

    #[tokio::test]
    async fn week_filter_keeps_both_variant_entries() {
        let store = demo();
        let week_a = store
            .list_schedule_entries("10c", Some(WeekType::A))
            .await
            .unwrap();
        let subjects: Vec<&str> = week_a.iter().map(|e| e.subject.as_str()).collect();
        assert_eq!(subjects, vec!["m", "d", "e", "g", "kathrel"]);

        let all = store.list_schedule_entries("10c", None).await.unwrap();
        assert_eq!(all.len(), 6);
    }

    #[tokio::test]
    async fn notices_come_newest_first_without_excluded_subjects() {
        let store = demo();
        let notices = store
            .list_notices("10c", &demo_window(), &["g".to_string()])
            .await
            .unwrap();
        let descriptions: Vec<&str> = notices.iter().map(|n| n.description.as_str()).collect();
        assert_eq!(descriptions, vec!["Teacher ill", "Assembly"]);

        let latest = store.latest_notice(&demo_window()).await.unwrap().unwrap();
        assert_eq!(latest.description, "Teacher ill");

        let next_week = WeekWindow::resolve(NaiveDate::from_ymd_opt(2026, 10, 26).unwrap()).unwrap();
        assert!(store.latest_notice(&next_week).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn additional_subjects_span_classes() {
        let entries = demo()
            .list_entries_by_subjects(&["f".to_string()])
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].affected_class, "Q1");
    }
}
