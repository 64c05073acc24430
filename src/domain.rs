use std::fmt::{Display, Formatter};

use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use rand::{Rng, distributions::Alphanumeric, thread_rng};
use serde::{Deserialize, Serialize};

const ID_LEN: usize = 8;

pub const MIN_VISIBLE_FRACTION: f64 = 0.05;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    Validation(String),
    InvalidState(String),
}

impl Display for DomainError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainError::Validation(message) => write!(f, "validation failed: {message}"),
            DomainError::InvalidState(message) => write!(f, "invalid state: {message}"),
        }
    }
}

impl std::error::Error for DomainError {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub tag_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

impl Task {
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }

    pub fn span(&self, now: DateTime<Utc>) -> Duration {
        self.end_time.unwrap_or(now) - self.start_time
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayRecord {
    pub date: NaiveDate,
    pub tasks: Vec<Task>,
    pub day_start_time: DateTime<Utc>,
    pub day_end_time: Option<DateTime<Utc>>,
}

impl DayRecord {
    pub fn is_open(&self) -> bool {
        self.day_end_time.is_none()
    }

    pub fn date_key(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    pub fn span(&self, now: DateTime<Utc>) -> Duration {
        self.day_end_time.unwrap_or(now) - self.day_start_time
    }

    pub fn current_task(&self) -> Option<&Task> {
        self.tasks.last().filter(|task| task.is_open())
    }

    // Closing the still-open predecessor at the newcomer's start time keeps
    // adjacent tasks gap-free and at most one task open.
    fn close_then_append(&mut self, task: Task) -> &Task {
        if let Some(open) = self.tasks.last_mut().filter(|task| task.is_open()) {
            open.end_time = Some(task.start_time);
        }
        self.tasks.push(task);
        self.tasks.last().expect("task list cannot be empty after append")
    }
}

#[derive(Debug, Clone)]
pub struct TagRegistry {
    tags: Vec<Tag>,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self { tags: Vec::new() }
    }

    pub fn from_saved(tags: Vec<Tag>) -> Self {
        Self { tags }
    }

    pub fn all(&self) -> &[Tag] {
        &self.tags
    }

    pub fn find(&self, id: &str) -> Option<&Tag> {
        self.tags.iter().find(|tag| tag.id == id)
    }

    pub fn create(&mut self, name: String, color: String) -> Result<&Tag, DomainError> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::Validation("tag name is required".to_string()));
        }

        self.tags.push(Tag {
            id: generate_id(),
            name,
            color,
        });
        Ok(self.tags.last().expect("tag list cannot be empty after append"))
    }

    pub fn search(&self, term: &str) -> impl Iterator<Item = &Tag> {
        let needle = term.to_lowercase();
        self.tags
            .iter()
            .filter(move |tag| tag.name.to_lowercase().contains(&needle))
    }

    pub fn resolve(&self, reference: &str) -> Option<&Tag> {
        self.find(reference).or_else(|| {
            self.tags
                .iter()
                .find(|tag| tag.name.eq_ignore_ascii_case(reference))
        })
    }
}

#[derive(Debug, Clone)]
pub struct DayTimeline {
    day: Option<DayRecord>,
}

impl DayTimeline {
    pub fn new() -> Self {
        Self { day: None }
    }

    // Cold-start resumption: only a record whose end time is still open can
    // become the active day again.
    pub fn resume(saved: Option<DayRecord>) -> Self {
        Self {
            day: saved.filter(|day| day.is_open()),
        }
    }

    pub fn active_day(&self) -> Option<&DayRecord> {
        self.day.as_ref()
    }

    pub fn current_task(&self) -> Option<&Task> {
        self.day.as_ref().and_then(|day| day.current_task())
    }

    pub fn start_day(&mut self, now: DateTime<Utc>) -> Result<&DayRecord, DomainError> {
        if let Some(day) = &self.day {
            return Err(DomainError::InvalidState(format!(
                "day {} is already open",
                day.date_key()
            )));
        }

        let record = DayRecord {
            date: day_for_timestamp(now),
            tasks: Vec::new(),
            day_start_time: now,
            day_end_time: None,
        };
        Ok(self.day.insert(record))
    }

    pub fn end_day(&mut self, now: DateTime<Utc>) -> Result<DayRecord, DomainError> {
        let mut day = self
            .day
            .take()
            .ok_or_else(|| DomainError::InvalidState("no active day to end".to_string()))?;

        day.day_end_time = Some(now);
        for task in &mut day.tasks {
            if task.is_open() {
                task.end_time = Some(now);
            }
        }

        Ok(day)
    }

    pub fn submit_task(
        &mut self,
        title: String,
        description: String,
        tag_id: Option<String>,
        editing_task_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<&Task, DomainError> {
        let day = self.day.as_mut().ok_or_else(|| {
            DomainError::InvalidState("no active day: start one before logging tasks".to_string())
        })?;

        let tag_id = match tag_id {
            Some(tag_id) if !tag_id.trim().is_empty() => tag_id,
            _ => {
                return Err(DomainError::Validation(
                    "a tag selection is required".to_string(),
                ));
            }
        };

        if let Some(task_id) = editing_task_id {
            if let Some(index) = day.tasks.iter().position(|task| task.id == task_id) {
                let task = &mut day.tasks[index];
                task.title = title;
                task.description = description;
                task.tag_id = tag_id;
                return Ok(&day.tasks[index]);
            }
        }

        let task = Task {
            id: generate_id(),
            title,
            description,
            tag_id,
            start_time: now,
            end_time: None,
        };
        Ok(day.close_then_append(task))
    }
}

pub fn height_fraction(task: &Task, day: &DayRecord, now: DateTime<Utc>) -> f64 {
    let total = day.span(now);
    if total <= Duration::zero() {
        return MIN_VISIBLE_FRACTION;
    }

    let span = task.span(now);
    let raw = span.num_milliseconds() as f64 / total.num_milliseconds() as f64;
    raw.clamp(MIN_VISIBLE_FRACTION, 1.0)
}

pub fn day_for_timestamp(timestamp: DateTime<Utc>) -> NaiveDate {
    timestamp.with_timezone(&Local).date_naive()
}

pub fn generate_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_LEN)
        .map(char::from)
        .collect()
}

pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.num_seconds().max(0);
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

pub fn format_clock(timestamp: DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};

    use super::{DayTimeline, DomainError, MIN_VISIBLE_FRACTION, TagRegistry, height_fraction};

    fn at(hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, hour, minute, second).unwrap()
    }

    fn open_day_with_task(timeline: &mut DayTimeline) {
        timeline.start_day(at(9, 0, 0)).expect("day should start");
        timeline
            .submit_task("Write".to_string(), String::new(), Some("tag-a".to_string()), None, at(9, 0, 0))
            .expect("first task should start");
    }

    #[test]
    fn submitting_tasks_keeps_zero_gap_adjacency() {
        let mut timeline = DayTimeline::new();
        open_day_with_task(&mut timeline);

        timeline
            .submit_task("Email".to_string(), String::new(), Some("tag-b".to_string()), None, at(9, 10, 0))
            .expect("second task should start");
        timeline
            .submit_task("Review".to_string(), String::new(), Some("tag-a".to_string()), None, at(9, 45, 0))
            .expect("third task should start");

        let day = timeline.active_day().expect("day should be open");
        assert_eq!(day.tasks.len(), 3);
        for pair in day.tasks.windows(2) {
            assert_eq!(pair[0].end_time, Some(pair[1].start_time));
        }

        let open_count = day.tasks.iter().filter(|task| task.is_open()).count();
        assert_eq!(open_count, 1);
        assert_eq!(timeline.current_task().map(|task| task.title.as_str()), Some("Review"));
    }

    #[test]
    fn rejects_task_without_tag_selection() {
        let mut timeline = DayTimeline::new();
        open_day_with_task(&mut timeline);

        let missing = timeline.submit_task("Email".to_string(), String::new(), None, None, at(9, 10, 0));
        assert!(matches!(missing, Err(DomainError::Validation(_))));

        let blank =
            timeline.submit_task("Email".to_string(), String::new(), Some("  ".to_string()), None, at(9, 10, 0));
        assert!(matches!(blank, Err(DomainError::Validation(_))));

        let day = timeline.active_day().expect("day should be open");
        assert_eq!(day.tasks.len(), 1);
        assert!(day.tasks[0].is_open());
    }

    #[test]
    fn rejects_task_when_no_day_is_open() {
        let mut timeline = DayTimeline::new();
        let result =
            timeline.submit_task("Write".to_string(), String::new(), Some("tag-a".to_string()), None, at(9, 0, 0));
        assert!(matches!(result, Err(DomainError::InvalidState(_))));
    }

    #[test]
    fn edit_path_updates_fields_in_place() {
        let mut timeline = DayTimeline::new();
        open_day_with_task(&mut timeline);
        timeline
            .submit_task("Email".to_string(), String::new(), Some("tag-b".to_string()), None, at(9, 10, 0))
            .expect("second task should start");

        let first_id = timeline.active_day().expect("day should be open").tasks[0].id.clone();
        timeline
            .submit_task(
                "Write notes".to_string(),
                "morning block".to_string(),
                Some("tag-c".to_string()),
                Some(first_id.as_str()),
                at(11, 0, 0),
            )
            .expect("edit should apply");

        let day = timeline.active_day().expect("day should be open");
        assert_eq!(day.tasks.len(), 2);
        let edited = &day.tasks[0];
        assert_eq!(edited.title, "Write notes");
        assert_eq!(edited.description, "morning block");
        assert_eq!(edited.tag_id, "tag-c");
        assert_eq!(edited.start_time, at(9, 0, 0));
        assert_eq!(edited.end_time, Some(at(9, 10, 0)));
    }

    #[test]
    fn unmatched_editing_id_falls_back_to_creating() {
        let mut timeline = DayTimeline::new();
        open_day_with_task(&mut timeline);

        timeline
            .submit_task(
                "Email".to_string(),
                String::new(),
                Some("tag-b".to_string()),
                Some("not-a-task"),
                at(9, 10, 0),
            )
            .expect("unmatched edit should create");

        let day = timeline.active_day().expect("day should be open");
        assert_eq!(day.tasks.len(), 2);
        assert_eq!(day.tasks[0].end_time, Some(at(9, 10, 0)));
    }

    #[test]
    fn end_day_closes_trailing_task() {
        let mut timeline = DayTimeline::new();
        open_day_with_task(&mut timeline);
        timeline
            .submit_task("Email".to_string(), String::new(), Some("tag-b".to_string()), None, at(9, 10, 0))
            .expect("second task should start");

        let closed = timeline.end_day(at(10, 0, 0)).expect("day should end");
        assert_eq!(closed.day_end_time, Some(at(10, 0, 0)));
        assert!(closed.tasks.iter().all(|task| !task.is_open()));
        assert_eq!(closed.tasks[1].end_time, Some(at(10, 0, 0)));
        assert!(timeline.active_day().is_none());
        assert!(timeline.current_task().is_none());
    }

    #[test]
    fn end_day_without_active_day_is_invalid() {
        let mut timeline = DayTimeline::new();
        assert!(matches!(timeline.end_day(at(10, 0, 0)), Err(DomainError::InvalidState(_))));
    }

    #[test]
    fn start_day_twice_is_invalid() {
        let mut timeline = DayTimeline::new();
        timeline.start_day(at(9, 0, 0)).expect("day should start");
        assert!(matches!(timeline.start_day(at(9, 5, 0)), Err(DomainError::InvalidState(_))));

        let day = timeline.active_day().expect("day should be open");
        assert_eq!(day.day_start_time, at(9, 0, 0));
    }

    #[test]
    fn resume_restores_open_day_with_its_current_task() {
        let mut timeline = DayTimeline::new();
        open_day_with_task(&mut timeline);
        timeline
            .submit_task("Email".to_string(), String::new(), Some("tag-b".to_string()), None, at(9, 10, 0))
            .expect("second task should start");

        let saved = timeline.active_day().expect("day should be open").clone();
        let resumed = DayTimeline::resume(Some(saved));
        assert_eq!(resumed.current_task().map(|task| task.title.as_str()), Some("Email"));
    }

    #[test]
    fn resume_ignores_closed_day() {
        let mut timeline = DayTimeline::new();
        open_day_with_task(&mut timeline);
        let closed = timeline.end_day(at(17, 0, 0)).expect("day should end");

        let resumed = DayTimeline::resume(Some(closed));
        assert!(resumed.active_day().is_none());
    }

    #[test]
    fn current_task_reflects_day_progress() {
        let mut timeline = DayTimeline::new();
        assert!(timeline.current_task().is_none());

        timeline.start_day(at(9, 0, 0)).expect("day should start");
        assert!(timeline.active_day().is_some());
        assert!(timeline.current_task().is_none());

        timeline
            .submit_task("Write".to_string(), String::new(), Some("tag-a".to_string()), None, at(9, 0, 0))
            .expect("task should start");
        assert!(timeline.current_task().is_some());
    }

    #[test]
    fn height_fraction_matches_elapsed_share() {
        let mut timeline = DayTimeline::new();
        timeline.start_day(at(9, 0, 0)).expect("day should start");
        timeline
            .submit_task("Write".to_string(), String::new(), Some("tag-a".to_string()), None, at(9, 0, 0))
            .expect("first task should start");
        timeline
            .submit_task("Email".to_string(), String::new(), Some("tag-b".to_string()), None, at(9, 10, 0))
            .expect("second task should start");
        let day = timeline.end_day(at(10, 0, 0)).expect("day should end");

        let later = at(23, 0, 0);
        let first = height_fraction(&day.tasks[0], &day, later);
        let second = height_fraction(&day.tasks[1], &day, later);
        assert!((first - 600.0 / 3600.0).abs() < 1e-12);
        assert!((second - 3000.0 / 3600.0).abs() < 1e-12);
    }

    #[test]
    fn height_fraction_clamps_short_tasks_to_minimum() {
        let mut timeline = DayTimeline::new();
        timeline.start_day(at(9, 0, 0)).expect("day should start");
        timeline
            .submit_task("Blink".to_string(), String::new(), Some("tag-a".to_string()), None, at(9, 0, 0))
            .expect("first task should start");
        timeline
            .submit_task("Work".to_string(), String::new(), Some("tag-b".to_string()), None, at(9, 0, 1))
            .expect("second task should start");
        let day = timeline.end_day(at(17, 0, 0)).expect("day should end");

        let fraction = height_fraction(&day.tasks[0], &day, at(17, 0, 0));
        assert!((fraction - MIN_VISIBLE_FRACTION).abs() < 1e-12);
    }

    #[test]
    fn zero_span_day_projects_minimum_fraction() {
        let mut timeline = DayTimeline::new();
        timeline.start_day(at(9, 0, 0)).expect("day should start");
        timeline
            .submit_task("Write".to_string(), String::new(), Some("tag-a".to_string()), None, at(9, 0, 0))
            .expect("task should start");

        let day = timeline.active_day().expect("day should be open");
        let fraction = height_fraction(&day.tasks[0], day, at(9, 0, 0));
        assert!((fraction - MIN_VISIBLE_FRACTION).abs() < 1e-12);
    }

    #[test]
    fn open_task_fraction_tracks_clock() {
        let mut timeline = DayTimeline::new();
        timeline.start_day(at(9, 0, 0)).expect("day should start");
        timeline
            .submit_task("Write".to_string(), String::new(), Some("tag-a".to_string()), None, at(9, 30, 0))
            .expect("task should start");

        let day = timeline.active_day().expect("day should be open");
        let earlier = height_fraction(&day.tasks[0], day, at(10, 0, 0));
        let later = height_fraction(&day.tasks[0], day, at(12, 0, 0));
        assert!((earlier - 0.5).abs() < 1e-12);
        assert!(later > earlier);
    }

    #[test]
    fn create_tag_requires_name() {
        let mut registry = TagRegistry::new();
        let result = registry.create("   ".to_string(), "#ff0000".to_string());
        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert!(registry.all().is_empty());
    }

    #[test]
    fn duplicate_tag_names_get_distinct_ids() {
        let mut registry = TagRegistry::new();
        let first = registry
            .create("Focus".to_string(), "#ff0000".to_string())
            .expect("tag should be created")
            .id
            .clone();
        let second = registry
            .create("Focus".to_string(), "#00ff00".to_string())
            .expect("tag should be created")
            .id
            .clone();

        assert_ne!(first, second);
        assert_eq!(registry.find(&first).map(|tag| tag.color.as_str()), Some("#ff0000"));
        assert_eq!(registry.find(&second).map(|tag| tag.color.as_str()), Some("#00ff00"));
    }

    #[test]
    fn earlier_tags_survive_later_creates_unchanged() {
        let mut registry = TagRegistry::new();
        let focus = registry
            .create("Focus".to_string(), "#ff0000".to_string())
            .expect("tag should be created")
            .id
            .clone();
        for index in 0..5 {
            registry
                .create(format!("Tag {index}"), "#123456".to_string())
                .expect("tag should be created");
        }

        let tag = registry.find(&focus).expect("first tag should still resolve");
        assert_eq!(tag.name, "Focus");
        assert_eq!(tag.color, "#ff0000");
    }

    #[test]
    fn search_matches_case_insensitive_substrings() {
        let mut registry = TagRegistry::new();
        registry
            .create("Deep Work".to_string(), "#336699".to_string())
            .expect("tag should be created");
        registry
            .create("Meetings".to_string(), "#996633".to_string())
            .expect("tag should be created");
        registry
            .create("Workout".to_string(), "#669933".to_string())
            .expect("tag should be created");

        let hits = registry.search("work").map(|tag| tag.name.as_str()).collect::<Vec<_>>();
        assert_eq!(hits, vec!["Deep Work", "Workout"]);

        let everything = registry.search("").count();
        assert_eq!(everything, 3);

        assert_eq!(registry.search("meet").count(), 1);
        assert_eq!(registry.search("nothing").count(), 0);
    }

    #[test]
    fn resolve_accepts_id_or_name() {
        let mut registry = TagRegistry::new();
        let id = registry
            .create("Focus".to_string(), "#ff0000".to_string())
            .expect("tag should be created")
            .id
            .clone();

        assert_eq!(registry.resolve(&id).map(|tag| tag.name.as_str()), Some("Focus"));
        assert_eq!(registry.resolve("focus").map(|tag| tag.id.as_str()), Some(id.as_str()));
        assert!(registry.resolve("unknown").is_none());
    }
}
