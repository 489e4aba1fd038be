use chrono::NaiveDate;
use tracing::info;

use crate::merge::merge_day;
use crate::models::{AccountData, CurrentSchedule, ScheduleEntry, SchoolDay, WeekType};
use crate::notices::select_notices;
use crate::store::ScheduleStore;
use crate::window::WeekWindow;

/// Builds the effective schedule of the account's class for the school week
/// around `today`.
///
/// Returns `Ok(None)` when the class has no static entries at all and
/// `edit_mode` is off. A week whose variant has no lessons yields empty days.
/// In edit mode notices are skipped and every static entry of the class is
/// returned regardless of week variant or the account's subject preferences.
pub async fn create_current_schedule<S>(
    store: &S,
    account: &AccountData,
    edit_mode: bool,
    today: NaiveDate,
) -> anyhow::Result<Option<CurrentSchedule>>
where
    S: ScheduleStore + ?Sized,
{
    let window = WeekWindow::resolve(today)?;
    let class = account.affected_class.as_str();

    if edit_mode {
        let entries = store.list_schedule_entries(class, None).await?;
        let subjects = store.list_subject_info().await?;
        let unfiltered = AccountData {
            ignored: Vec::new(),
            additional: Vec::new(),
            ..account.clone()
        };

        let mut schedule = CurrentSchedule::new(WeekType::default(), window);
        for day in SchoolDay::ALL {
            *schedule.day_mut(day) = merge_day(day, &entries, &[], &subjects, &unfiltered, &[]);
        }
        info!(class, entries = entries.len(), "loaded schedule for editing");
        return Ok(Some(schedule));
    }

    let stored = store.list_schedule_entries(class, None).await?;
    if stored.is_empty() {
        info!(class, "no static schedule for class");
        return Ok(None);
    }

    let selection = select_notices(store, class, &account.ignored, account.lang, &window).await?;
    let entries: Vec<ScheduleEntry> = stored
        .into_iter()
        .filter(|entry| entry.week_type.applies_to(selection.week_type))
        .collect();

    let subjects = store.list_subject_info().await?;
    let additional = if account.additional.is_empty() {
        Vec::new()
    } else {
        store.list_entries_by_subjects(&account.additional).await?
    };

    let mut schedule = CurrentSchedule::new(selection.week_type, window);
    for day in SchoolDay::ALL {
        *schedule.day_mut(day) = merge_day(
            day,
            &entries,
            &selection.notices,
            &subjects,
            account,
            &additional,
        );
    }

    info!(
        class,
        week_type = %schedule.week_type,
        mon = %window.mon,
        fri = %window.fri,
        notices = selection.notices.len(),
        "current schedule reconciled"
    );
    Ok(Some(schedule))
}
