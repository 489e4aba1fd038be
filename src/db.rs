use anyhow::Context;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::{debug, info};
use uuid::Uuid;

use crate::account::validate_class;
use crate::error::ValidationError;
use crate::models::{
    AccountData, Language, Notice, NoticeKind, ScheduleEntry, SchoolDay, SubjectInfo, Tint,
    WeekScope, WeekType,
};
use crate::store::ScheduleStore;
use crate::timing::{parse_periods, validate_periods};
use crate::window::WeekWindow;

const ENTRY_COLUMNS: &str =
    "id, subject, teacher, room, periods, week_day, week_type, affected_class";
const NOTICE_COLUMNS: &str = "id, affected_class, subject, notice_date, periods, kind, room, \
     old_room, teacher, old_teacher, new_subject, old_subject, description, week_type, created_at";

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

fn entry_from_row(row: &PgRow) -> anyhow::Result<ScheduleEntry> {
    let week_type: String = row.try_get("week_type")?;
    Ok(ScheduleEntry {
        id: row.try_get("id")?,
        subject: row.try_get("subject")?,
        teacher: row.try_get("teacher")?,
        room: row.try_get("room")?,
        periods: row.try_get("periods")?,
        week_day: SchoolDay::from_number(row.try_get("week_day")?)?,
        week_type: week_type.parse()?,
        affected_class: row.try_get("affected_class")?,
    })
}

fn notice_from_row(row: &PgRow) -> anyhow::Result<Notice> {
    let kind: String = row.try_get("kind")?;
    let week_type: String = row.try_get("week_type")?;
    Ok(Notice {
        id: row.try_get("id")?,
        affected_class: row.try_get("affected_class")?,
        subject: row.try_get("subject")?,
        date: row.try_get("notice_date")?,
        periods: row.try_get("periods")?,
        kind: NoticeKind::from_code(&kind),
        room: row.try_get("room")?,
        old_room: row.try_get("old_room")?,
        teacher: row.try_get("teacher")?,
        old_teacher: row.try_get("old_teacher")?,
        new_subject: row.try_get("new_subject")?,
        old_subject: row.try_get("old_subject")?,
        description: row.try_get("description")?,
        week_type: week_type.parse()?,
        created_at: row.try_get("created_at")?,
        localized_type: None,
    })
}

fn subject_from_row(row: &PgRow) -> anyhow::Result<SubjectInfo> {
    let tint: String = row.try_get("tint")?;
    Ok(SubjectInfo {
        abbreviation: row.try_get("abbreviation")?,
        name_en: row.try_get("name_en")?,
        name_de: row.try_get("name_de")?,
        tint: tint.parse::<Tint>().unwrap_or_else(|err| {
            debug!(%err, "falling back to default tint");
            Tint::default()
        }),
    })
}

fn account_from_row(row: &PgRow) -> anyhow::Result<AccountData> {
    let lang: String = row.try_get("lang")?;
    Ok(AccountData {
        id: row.try_get("id")?,
        affected_class: row.try_get("affected_class")?,
        lang: lang.parse()?,
        ignored: row.try_get("ignored")?,
        additional: row.try_get("additional")?,
    })
}

/// Postgres-backed read interface for the reconciliation engine.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScheduleStore for PgStore {
    async fn list_schedule_entries(
        &self,
        class: &str,
        week: Option<WeekType>,
    ) -> anyhow::Result<Vec<ScheduleEntry>> {
        let query = format!(
            "SELECT {ENTRY_COLUMNS} FROM timetable.schedule_entries \
             WHERE affected_class = $1 \
             AND ($2::text IS NULL OR week_type = $2 OR week_type = 'both') \
             ORDER BY week_day, periods[1]"
        );
        let rows = sqlx::query(&query)
            .bind(class)
            .bind(week.map(WeekType::as_str))
            .fetch_all(&self.pool)
            .await
            .context("failed to fetch schedule entries")?;

        rows.iter().map(entry_from_row).collect()
    }

    async fn list_notices(
        &self,
        class: &str,
        window: &WeekWindow,
        excluded_subjects: &[String],
    ) -> anyhow::Result<Vec<Notice>> {
        let query = format!(
            "SELECT {NOTICE_COLUMNS} FROM timetable.notices \
             WHERE affected_class = $1 \
             AND notice_date BETWEEN $2 AND $3 \
             AND (subject IS NULL OR NOT (subject = ANY($4))) \
             ORDER BY created_at DESC"
        );
        let rows = sqlx::query(&query)
            .bind(class)
            .bind(window.mon)
            .bind(window.fri)
            .bind(excluded_subjects)
            .fetch_all(&self.pool)
            .await
            .context("failed to fetch notices")?;

        rows.iter().map(notice_from_row).collect()
    }

    async fn latest_notice(&self, window: &WeekWindow) -> anyhow::Result<Option<Notice>> {
        let query = format!(
            "SELECT {NOTICE_COLUMNS} FROM timetable.notices \
             WHERE notice_date BETWEEN $1 AND $2 \
             ORDER BY created_at DESC LIMIT 1"
        );
        let row = sqlx::query(&query)
            .bind(window.mon)
            .bind(window.fri)
            .fetch_optional(&self.pool)
            .await
            .context("failed to fetch latest notice")?;

        row.as_ref().map(notice_from_row).transpose()
    }

    async fn list_subject_info(&self) -> anyhow::Result<Vec<SubjectInfo>> {
        let rows = sqlx::query(
            "SELECT abbreviation, name_en, name_de, tint FROM timetable.subject_info \
             ORDER BY abbreviation",
        )
        .fetch_all(&self.pool)
        .await
        .context("failed to fetch subject info")?;

        rows.iter().map(subject_from_row).collect()
    }

    async fn list_entries_by_subjects(
        &self,
        subjects: &[String],
    ) -> anyhow::Result<Vec<ScheduleEntry>> {
        let query = format!(
            "SELECT {ENTRY_COLUMNS} FROM timetable.schedule_entries \
             WHERE subject = ANY($1) \
             ORDER BY week_day, periods[1]"
        );
        let rows = sqlx::query(&query)
            .bind(subjects)
            .fetch_all(&self.pool)
            .await
            .context("failed to fetch additional subject entries")?;

        rows.iter().map(entry_from_row).collect()
    }
}

pub fn validate_entry(entry: &ScheduleEntry) -> Result<(), ValidationError> {
    validate_class(&entry.affected_class)?;
    validate_periods(&entry.periods)
}

pub async fn insert_entry(pool: &PgPool, entry: &ScheduleEntry) -> anyhow::Result<()> {
    validate_entry(entry)?;
    sqlx::query(
        r#"
        INSERT INTO timetable.schedule_entries
        (id, subject, teacher, room, periods, week_day, week_type, affected_class)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (id) DO UPDATE
        SET subject = EXCLUDED.subject, teacher = EXCLUDED.teacher, room = EXCLUDED.room,
            periods = EXCLUDED.periods, week_day = EXCLUDED.week_day,
            week_type = EXCLUDED.week_type, affected_class = EXCLUDED.affected_class
        "#,
    )
    .bind(entry.id)
    .bind(&entry.subject)
    .bind(&entry.teacher)
    .bind(&entry.room)
    .bind(&entry.periods)
    .bind(entry.week_day.number())
    .bind(entry.week_type.as_str())
    .bind(&entry.affected_class)
    .execute(pool)
    .await
    .context("failed to write schedule entry")?;

    Ok(())
}

/// Returns `false` when no entry with that id exists.
pub async fn update_entry(pool: &PgPool, entry: &ScheduleEntry) -> anyhow::Result<bool> {
    validate_entry(entry)?;
    let result = sqlx::query(
        r#"
        UPDATE timetable.schedule_entries
        SET subject = $2, teacher = $3, room = $4, periods = $5,
            week_day = $6, week_type = $7, affected_class = $8
        WHERE id = $1
        "#,
    )
    .bind(entry.id)
    .bind(&entry.subject)
    .bind(&entry.teacher)
    .bind(&entry.room)
    .bind(&entry.periods)
    .bind(entry.week_day.number())
    .bind(entry.week_type.as_str())
    .bind(&entry.affected_class)
    .execute(pool)
    .await
    .context("failed to update schedule entry")?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete_entry(pool: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM timetable.schedule_entries WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context("failed to delete schedule entry")?;

    Ok(result.rows_affected() > 0)
}

pub async fn fetch_account(pool: &PgPool, id: Uuid) -> anyhow::Result<Option<AccountData>> {
    let row = sqlx::query(
        "SELECT id, affected_class, lang, ignored, additional FROM timetable.accounts WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("failed to fetch account")?;

    row.as_ref().map(account_from_row).transpose()
}

pub async fn upsert_account(pool: &PgPool, account: &AccountData) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO timetable.accounts (id, affected_class, lang, ignored, additional)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (id) DO UPDATE
        SET affected_class = EXCLUDED.affected_class, lang = EXCLUDED.lang,
            ignored = EXCLUDED.ignored, additional = EXCLUDED.additional, updated_at = now()
        "#,
    )
    .bind(account.id)
    .bind(&account.affected_class)
    .bind(account.lang.as_str())
    .bind(&account.ignored)
    .bind(&account.additional)
    .execute(pool)
    .await
    .context("failed to write account")?;

    Ok(())
}

#[derive(serde::Deserialize)]
struct CsvRow {
    id: Option<Uuid>,
    subject: String,
    teacher: String,
    room: String,
    periods: String,
    week_day: i16,
    week_type: String,
    affected_class: String,
}

/// Reads and validates schedule entries from CSV. Errors name the file line
/// of the offending record, counting the header as line 1.
pub fn parse_entries_csv<R: std::io::Read>(input: R) -> anyhow::Result<Vec<(u64, ScheduleEntry)>> {
    let mut reader = csv::Reader::from_reader(input);
    let headers = reader.headers()?.clone();
    let mut record = csv::StringRecord::new();
    let mut entries = Vec::new();

    while reader.read_record(&mut record)? {
        let line = record.position().map_or(0, |position| position.line());
        let row: CsvRow = record
            .deserialize(Some(&headers))
            .with_context(|| format!("line {line}: malformed record"))?;
        let entry = ScheduleEntry {
            id: row.id.unwrap_or_else(Uuid::new_v4),
            subject: row.subject.trim().to_lowercase(),
            teacher: row.teacher,
            room: row.room,
            periods: parse_periods(&row.periods)
                .with_context(|| format!("line {line}: bad periods"))?,
            week_day: SchoolDay::from_number(row.week_day)
                .with_context(|| format!("line {line}: bad week day"))?,
            week_type: row
                .week_type
                .parse::<WeekScope>()
                .with_context(|| format!("line {line}: bad week type"))?,
            affected_class: row.affected_class.trim().to_string(),
        };
        validate_entry(&entry).with_context(|| format!("line {line}: invalid entry"))?;
        entries.push((line, entry));
    }

    Ok(entries)
}

pub async fn import_entries_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let entries = parse_entries_csv(file)
        .with_context(|| format!("failed to read {}", csv_path.display()))?;

    for (line, entry) in &entries {
        insert_entry(pool, entry)
            .await
            .with_context(|| format!("line {line}: failed to import"))?;
    }

    info!(written = entries.len(), path = %csv_path.display(), "imported schedule entries");
    Ok(entries.len())
}

const SEED_SUBJECTS: &[(&str, &str, &str, &str)] = &[
    ("m", "Math", "Mathe", "blue"),
    ("d", "German", "Deutsch", "green"),
    ("e", "English", "Englisch", "red"),
    ("ph", "Physics", "Physik", "purple"),
    ("sp", "Sports", "Sport", "orange"),
    ("f", "French", "Französisch", "blue"),
    ("ku", "Art", "Kunst", "yellow"),
    ("ch", "Chemistry", "Chemie", "green"),
    ("mu", "Music", "Musik", "gray"),
    ("bio", "Biology", "Biologie", "green"),
    ("g", "History", "Geschichte", "yellow"),
    ("kathrel", "Religion", "Religion", "purple"),
    ("powi", "Politics", "Politik", "orange"),
    ("kl", "Class council", "KL", "gray"),
    ("dw", "Digital World", "Digitale Welt", "yellow"),
    ("nawi", "Science", "Nawi", "green"),
];

pub const SEED_ACCOUNT_ID: &str = "6f1c2b1e-8d0a-4c53-9a9e-2f7d1c0b5a11";

/// Loads reference subjects, a two-variant timetable for class 10c, notices
/// for the week around `today` and a demo account.
pub async fn seed(pool: &PgPool, today: NaiveDate) -> anyhow::Result<()> {
    for &(abbreviation, name_en, name_de, tint) in SEED_SUBJECTS {
        sqlx::query(
            r#"
            INSERT INTO timetable.subject_info (abbreviation, name_en, name_de, tint)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (abbreviation) DO UPDATE
            SET name_en = EXCLUDED.name_en, name_de = EXCLUDED.name_de, tint = EXCLUDED.tint
            "#,
        )
        .bind(abbreviation)
        .bind(name_en)
        .bind(name_de)
        .bind(tint)
        .execute(pool)
        .await?;
    }

    let entries = vec![
        ("0b9f7f0e-3c55-4f0a-a0a1-000000000001", "m", "Kre", "A101", "1-2", 1, "both", "10c"),
        ("0b9f7f0e-3c55-4f0a-a0a1-000000000002", "d", "Hol", "A101", "3-4", 1, "both", "10c"),
        ("0b9f7f0e-3c55-4f0a-a0a1-000000000003", "e", "Bay", "B012", "5-6", 1, "a", "10c"),
        ("0b9f7f0e-3c55-4f0a-a0a1-000000000004", "ph", "Stu", "N203", "5-6", 1, "b", "10c"),
        ("0b9f7f0e-3c55-4f0a-a0a1-000000000005", "sp", "Wal", "Gym", "1-2", 2, "both", "10c"),
        ("0b9f7f0e-3c55-4f0a-a0a1-000000000006", "g", "Fen", "A104", "3-4", 2, "both", "10c"),
        ("0b9f7f0e-3c55-4f0a-a0a1-000000000007", "ch", "Lor", "N105", "5-7", 3, "both", "10c"),
        ("0b9f7f0e-3c55-4f0a-a0a1-000000000008", "m", "Kre", "A101", "1-2", 3, "both", "10c"),
        ("0b9f7f0e-3c55-4f0a-a0a1-000000000009", "bio", "Ahr", "N110", "3-4", 4, "both", "10c"),
        ("0b9f7f0e-3c55-4f0a-a0a1-000000000010", "kathrel", "Sch", "A201", "5", 4, "both", "10c"),
        ("0b9f7f0e-3c55-4f0a-a0a1-000000000011", "powi", "Nie", "A203", "1-2", 5, "both", "10c"),
        ("0b9f7f0e-3c55-4f0a-a0a1-000000000012", "f", "Dub", "B105", "8-9", 2, "both", "Q1"),
    ];

    for (id, subject, teacher, room, periods, week_day, week_type, class) in entries {
        let entry = ScheduleEntry {
            id: Uuid::parse_str(id)?,
            subject: subject.to_string(),
            teacher: teacher.to_string(),
            room: room.to_string(),
            periods: parse_periods(periods)?,
            week_day: SchoolDay::from_number(week_day)?,
            week_type: week_type.parse::<WeekScope>()?,
            affected_class: class.to_string(),
        };
        insert_entry(pool, &entry).await?;
    }

    let window = WeekWindow::resolve(today)?;
    let notices = vec![
        (
            "5d1e0c7a-71b2-4f4e-9c1d-000000000001",
            Some("m"),
            SchoolDay::Mon,
            vec![1, 2],
            "cancelled",
            None,
            None,
            "Teacher ill",
        ),
        (
            "5d1e0c7a-71b2-4f4e-9c1d-000000000002",
            Some("g"),
            SchoolDay::Tue,
            vec![3, 4],
            "newRoom",
            Some("B204"),
            Some("A104"),
            "Room swap",
        ),
        (
            "5d1e0c7a-71b2-4f4e-9c1d-000000000003",
            None,
            SchoolDay::Wed,
            vec![5, 6],
            "unknown",
            Some("Aula"),
            None,
            "Assembly",
        ),
    ];

    for (id, subject, day, periods, kind, room, old_room, description) in notices {
        sqlx::query(
            r#"
            INSERT INTO timetable.notices
            (id, affected_class, subject, notice_date, periods, kind, room, old_room,
             description, week_type, created_at)
            VALUES ($1, '10c', $2, $3, $4, $5, $6, $7, $8, 'a', $9)
            ON CONFLICT (id) DO UPDATE
            SET notice_date = EXCLUDED.notice_date, created_at = EXCLUDED.created_at
            "#,
        )
        .bind(Uuid::parse_str(id)?)
        .bind(subject)
        .bind(window.day(day))
        .bind(periods)
        .bind(kind)
        .bind(room)
        .bind(old_room)
        .bind(description)
        .bind(Utc::now())
        .execute(pool)
        .await?;
    }

    let account = AccountData {
        id: Uuid::parse_str(SEED_ACCOUNT_ID)?,
        affected_class: "10c".to_string(),
        lang: Language::En,
        ignored: vec!["kathrel".to_string()],
        additional: vec!["f".to_string()],
    };
    upsert_account(pool, &account).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::entry;

    #[test]
    fn entries_need_a_known_class_and_contiguous_periods() {
        let mut math = entry("m", &[3, 4], SchoolDay::Mon, WeekScope::Both);
        assert_eq!(validate_entry(&math), Ok(()));

        math.periods = vec![3, 5];
        assert_eq!(
            validate_entry(&math),
            Err(ValidationError::NonContiguousPeriods(vec![3, 5]))
        );

        math.periods = vec![3];
        math.affected_class = "4a".to_string();
        assert!(matches!(
            validate_entry(&math),
            Err(ValidationError::InvalidClass(_))
        ));
    }

    #[test]
    fn seed_rows_are_valid() {
        for &(abbreviation, _, _, tint) in SEED_SUBJECTS {
            assert!(tint.parse::<Tint>().is_ok(), "bad tint for {abbreviation}");
        }
        assert!(Uuid::parse_str(SEED_ACCOUNT_ID).is_ok());
    }

    #[test]
    fn csv_errors_name_the_file_line() {
        let input = "id,subject,teacher,room,periods,week_day,week_type,affected_class\n\
                     ,M,Kre,A101,1-2,1,both,10c\n\
                     ,d,Hol,A101,4-3,1,both,10c\n";
        let error = parse_entries_csv(input.as_bytes()).unwrap_err();
        assert_eq!(error.to_string(), "line 3: bad periods");
    }

    #[test]
    fn csv_rows_become_validated_entries() {
        let input = "id,subject,teacher,room,periods,week_day,week_type,affected_class\n\
                     0b9f7f0e-3c55-4f0a-a0a1-000000000001, M ,Kre,A101,1-2,1,both,10c\n\
                     ,ph,Stu,N203,5,2,b,10c\n";
        let entries = parse_entries_csv(input.as_bytes()).unwrap();

        let lines: Vec<u64> = entries.iter().map(|(line, _)| *line).collect();
        assert_eq!(lines, vec![2, 3]);
        let (_, math) = &entries[0];
        assert_eq!(math.subject, "m");
        assert_eq!(math.periods, vec![1, 2]);
        assert_eq!(math.id, Uuid::parse_str("0b9f7f0e-3c55-4f0a-a0a1-000000000001").unwrap());
        let (_, physics) = &entries[1];
        assert_eq!(physics.week_day, SchoolDay::Tue);
        assert_eq!(physics.week_type, WeekScope::B);

        let bad_class = "id,subject,teacher,room,periods,week_day,week_type,affected_class\n\
                         ,m,Kre,A101,1,1,both,4a\n";
        let error = parse_entries_csv(bad_class.as_bytes()).unwrap_err();
        assert_eq!(error.to_string(), "line 2: invalid entry");
    }
}
