use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::window::WeekWindow;

/// One of the two alternating timetable variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekType {
    #[default]
    A,
    B,
}

impl WeekType {
    pub fn as_str(self) -> &'static str {
        match self {
            WeekType::A => "a",
            WeekType::B => "b",
        }
    }
}

impl FromStr for WeekType {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "a" => Ok(WeekType::A),
            "b" => Ok(WeekType::B),
            _ => Err(ValidationError::InvalidWeekType(value.to_string())),
        }
    }
}

impl fmt::Display for WeekType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which week variants a static entry is scheduled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekScope {
    A,
    B,
    Both,
}

impl WeekScope {
    pub fn applies_to(self, week: WeekType) -> bool {
        match self {
            WeekScope::Both => true,
            WeekScope::A => week == WeekType::A,
            WeekScope::B => week == WeekType::B,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WeekScope::A => "a",
            WeekScope::B => "b",
            WeekScope::Both => "both",
        }
    }
}

impl FromStr for WeekScope {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "a" => Ok(WeekScope::A),
            "b" => Ok(WeekScope::B),
            "both" => Ok(WeekScope::Both),
            _ => Err(ValidationError::InvalidWeekType(value.to_string())),
        }
    }
}

/// A weekday on which classes take place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchoolDay {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
}

impl SchoolDay {
    pub const ALL: [SchoolDay; 5] = [
        SchoolDay::Mon,
        SchoolDay::Tue,
        SchoolDay::Wed,
        SchoolDay::Thu,
        SchoolDay::Fri,
    ];

    /// ISO day number, Monday = 1.
    pub fn number(self) -> i16 {
        match self {
            SchoolDay::Mon => 1,
            SchoolDay::Tue => 2,
            SchoolDay::Wed => 3,
            SchoolDay::Thu => 4,
            SchoolDay::Fri => 5,
        }
    }

    pub fn from_number(number: i16) -> Result<Self, ValidationError> {
        match number {
            1 => Ok(SchoolDay::Mon),
            2 => Ok(SchoolDay::Tue),
            3 => Ok(SchoolDay::Wed),
            4 => Ok(SchoolDay::Thu),
            5 => Ok(SchoolDay::Fri),
            other => Err(ValidationError::InvalidSchoolDay(other)),
        }
    }

    /// `None` for Saturday and Sunday.
    pub fn from_weekday(weekday: Weekday) -> Option<Self> {
        match weekday {
            Weekday::Mon => Some(SchoolDay::Mon),
            Weekday::Tue => Some(SchoolDay::Tue),
            Weekday::Wed => Some(SchoolDay::Wed),
            Weekday::Thu => Some(SchoolDay::Thu),
            Weekday::Fri => Some(SchoolDay::Fri),
            Weekday::Sat | Weekday::Sun => None,
        }
    }

    pub fn of_date(date: NaiveDate) -> Option<Self> {
        Self::from_weekday(date.weekday())
    }

    pub fn key(self) -> &'static str {
        match self {
            SchoolDay::Mon => "mon",
            SchoolDay::Tue => "tue",
            SchoolDay::Wed => "wed",
            SchoolDay::Thu => "thu",
            SchoolDay::Fri => "fri",
        }
    }

    pub fn name(self, lang: Language) -> &'static str {
        match (lang, self) {
            (Language::En, SchoolDay::Mon) => "Monday",
            (Language::En, SchoolDay::Tue) => "Tuesday",
            (Language::En, SchoolDay::Wed) => "Wednesday",
            (Language::En, SchoolDay::Thu) => "Thursday",
            (Language::En, SchoolDay::Fri) => "Friday",
            (Language::De, SchoolDay::Mon) => "Montag",
            (Language::De, SchoolDay::Tue) => "Dienstag",
            (Language::De, SchoolDay::Wed) => "Mittwoch",
            (Language::De, SchoolDay::Thu) => "Donnerstag",
            (Language::De, SchoolDay::Fri) => "Freitag",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    De,
}

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::De => "de",
        }
    }
}

impl FromStr for Language {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "de" => Ok(Language::De),
            _ => Err(ValidationError::UnsupportedLanguage(value.to_string())),
        }
    }
}

/// Visual category used when rendering a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tint {
    #[default]
    Default,
    Red,
    Orange,
    Blue,
    Green,
    Pink,
    Purple,
    Yellow,
    Gray,
    White,
    Clear,
}

impl Tint {
    pub fn as_str(self) -> &'static str {
        match self {
            Tint::Default => "default",
            Tint::Red => "red",
            Tint::Orange => "orange",
            Tint::Blue => "blue",
            Tint::Green => "green",
            Tint::Pink => "pink",
            Tint::Purple => "purple",
            Tint::Yellow => "yellow",
            Tint::Gray => "gray",
            Tint::White => "white",
            Tint::Clear => "clear",
        }
    }
}

impl FromStr for Tint {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let tint = match value.trim().to_ascii_lowercase().as_str() {
            "default" => Tint::Default,
            "red" => Tint::Red,
            "orange" => Tint::Orange,
            "blue" => Tint::Blue,
            "green" => Tint::Green,
            "pink" => Tint::Pink,
            "purple" => Tint::Purple,
            "yellow" => Tint::Yellow,
            "gray" | "grey" => Tint::Gray,
            "white" => Tint::White,
            "clear" => Tint::Clear,
            _ => return Err(ValidationError::UnknownTint(value.to_string())),
        };
        Ok(tint)
    }
}

/// Machine-readable notice type. Codes outside the known set are kept as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NoticeKind {
    Cancelled,
    LikelyCancelled,
    NewRoom,
    NewTeacher,
    DiffSubject,
    Unknown,
    Other(String),
}

impl NoticeKind {
    pub fn code(&self) -> &str {
        match self {
            NoticeKind::Cancelled => "cancelled",
            NoticeKind::LikelyCancelled => "likelyCancelled",
            NoticeKind::NewRoom => "newRoom",
            NoticeKind::NewTeacher => "newTeacher",
            NoticeKind::DiffSubject => "diffSubject",
            NoticeKind::Unknown => "unknown",
            NoticeKind::Other(code) => code,
        }
    }

    pub fn from_code(code: &str) -> Self {
        match code {
            "cancelled" => NoticeKind::Cancelled,
            "likelyCancelled" => NoticeKind::LikelyCancelled,
            "newRoom" => NoticeKind::NewRoom,
            "newTeacher" => NoticeKind::NewTeacher,
            "diffSubject" => NoticeKind::DiffSubject,
            "unknown" => NoticeKind::Unknown,
            other => NoticeKind::Other(other.to_string()),
        }
    }

    /// Ad-hoc notices describe events with no backing static entry.
    pub fn is_ad_hoc(&self) -> bool {
        matches!(self, NoticeKind::Unknown)
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(self, NoticeKind::Cancelled | NoticeKind::LikelyCancelled)
    }
}

impl From<String> for NoticeKind {
    fn from(code: String) -> Self {
        NoticeKind::from_code(&code)
    }
}

impl From<NoticeKind> for String {
    fn from(kind: NoticeKind) -> Self {
        kind.code().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub id: Uuid,
    pub subject: String,
    pub teacher: String,
    pub room: String,
    pub periods: Vec<i32>,
    pub week_day: SchoolDay,
    pub week_type: WeekScope,
    pub affected_class: String,
}

impl ScheduleEntry {
    pub fn first_period(&self) -> i32 {
        self.periods.first().copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub id: Uuid,
    pub affected_class: String,
    pub subject: Option<String>,
    pub date: NaiveDate,
    pub periods: Vec<i32>,
    #[serde(rename = "type")]
    pub kind: NoticeKind,
    pub room: Option<String>,
    pub old_room: Option<String>,
    pub teacher: Option<String>,
    pub old_teacher: Option<String>,
    pub new_subject: Option<String>,
    pub old_subject: Option<String>,
    pub description: String,
    pub week_type: WeekType,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub localized_type: Option<String>,
}

impl Notice {
    pub fn first_period(&self) -> i32 {
        self.periods.first().copied().unwrap_or(0)
    }

    pub fn school_day(&self) -> Option<SchoolDay> {
        SchoolDay::of_date(self.date)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectInfo {
    pub abbreviation: String,
    pub name_en: String,
    pub name_de: Option<String>,
    pub tint: Tint,
}

impl SubjectInfo {
    pub fn name_for(&self, lang: Language) -> &str {
        match lang {
            Language::De => self.name_de.as_deref().unwrap_or(&self.name_en),
            Language::En => &self.name_en,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountData {
    pub id: Uuid,
    pub affected_class: String,
    pub lang: Language,
    pub ignored: Vec<String>,
    pub additional: Vec<String>,
}

impl AccountData {
    pub fn ignores(&self, subject: &str) -> bool {
        self.ignored.iter().any(|ignored| ignored == subject)
    }
}

/// Display metadata resolved from [`SubjectInfo`] for the account's language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralData {
    pub name: String,
    pub tint: Tint,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentEntryData {
    pub static_data: ScheduleEntry,
    pub general_data: Option<GeneralData>,
    pub dynamic_data: Option<Notice>,
}

impl CurrentEntryData {
    pub fn display_name(&self) -> &str {
        self.general_data
            .as_ref()
            .map(|general| general.name.as_str())
            .unwrap_or(&self.static_data.subject)
    }

    /// Cancelled lessons render without their subject tint.
    pub fn effective_tint(&self) -> Option<Tint> {
        match &self.dynamic_data {
            Some(notice) if notice.kind.is_cancellation() => None,
            _ => self.general_data.as_ref().map(|general| general.tint),
        }
    }
}

/// One element of a day's reconciled sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DayItem {
    Entry(CurrentEntryData),
    Notice(Notice),
}

impl DayItem {
    pub fn first_period(&self) -> i32 {
        match self {
            DayItem::Entry(entry) => entry.static_data.first_period(),
            DayItem::Notice(notice) => notice.first_period(),
        }
    }

    pub fn periods(&self) -> &[i32] {
        match self {
            DayItem::Entry(entry) => &entry.static_data.periods,
            DayItem::Notice(notice) => &notice.periods,
        }
    }

    pub fn as_entry(&self) -> Option<&CurrentEntryData> {
        match self {
            DayItem::Entry(entry) => Some(entry),
            DayItem::Notice(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentSchedule {
    pub week_type: WeekType,
    pub dates: WeekWindow,
    pub mon: Vec<DayItem>,
    pub tue: Vec<DayItem>,
    pub wed: Vec<DayItem>,
    pub thu: Vec<DayItem>,
    pub fri: Vec<DayItem>,
}

impl CurrentSchedule {
    pub fn new(week_type: WeekType, dates: WeekWindow) -> Self {
        Self {
            week_type,
            dates,
            mon: Vec::new(),
            tue: Vec::new(),
            wed: Vec::new(),
            thu: Vec::new(),
            fri: Vec::new(),
        }
    }

    pub fn day(&self, day: SchoolDay) -> &[DayItem] {
        match day {
            SchoolDay::Mon => &self.mon,
            SchoolDay::Tue => &self.tue,
            SchoolDay::Wed => &self.wed,
            SchoolDay::Thu => &self.thu,
            SchoolDay::Fri => &self.fri,
        }
    }

    pub fn day_mut(&mut self, day: SchoolDay) -> &mut Vec<DayItem> {
        match day {
            SchoolDay::Mon => &mut self.mon,
            SchoolDay::Tue => &mut self.tue,
            SchoolDay::Wed => &mut self.wed,
            SchoolDay::Thu => &mut self.thu,
            SchoolDay::Fri => &mut self.fri,
        }
    }
}
