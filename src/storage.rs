use std::fmt::{Display, Formatter};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{DayRecord, Tag};

#[derive(Debug)]
pub enum StorageError {
    Io(std::io::Error),
    JsonDecode(serde_json::Error),
    JsonEncode(serde_json::Error),
    TomlDecode(toml::de::Error),
    TomlEncode(toml::ser::Error),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(err) => write!(f, "io error: {err}"),
            StorageError::JsonDecode(err) => write!(f, "failed to parse day record: {err}"),
            StorageError::JsonEncode(err) => write!(f, "failed to encode day record: {err}"),
            StorageError::TomlDecode(err) => write!(f, "failed to parse tag registry: {err}"),
            StorageError::TomlEncode(err) => write!(f, "failed to encode tag registry: {err}"),
        }
    }
}

impl std::error::Error for StorageError {}

pub trait TimelineStore {
    fn save_day(&self, day: &DayRecord) -> Result<(), StorageError>;
    fn load_day(&self, date: NaiveDate) -> Result<Option<DayRecord>, StorageError>;
    fn list_days(&self) -> Result<Vec<NaiveDate>, StorageError>;
    fn save_tags(&self, tags: &[Tag]) -> Result<(), StorageError>;
    fn load_tags(&self) -> Result<Vec<Tag>, StorageError>;

    fn load_open_day(&self) -> Result<Option<DayRecord>, StorageError> {
        // Days close in key order, so only the newest stored record can still
        // be open.
        let Some(newest) = self.list_days()?.into_iter().next_back() else {
            return Ok(None);
        };
        Ok(self.load_day(newest)?.filter(|day| day.is_open()))
    }
}

#[derive(Serialize, Deserialize)]
struct TagFile {
    tags: Vec<Tag>,
}

pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn days_dir(&self) -> PathBuf {
        self.root.join("days")
    }

    fn day_path(&self, date: NaiveDate) -> PathBuf {
        self.days_dir().join(format!("{}.json", date.format("%Y-%m-%d")))
    }

    fn tags_path(&self) -> PathBuf {
        self.root.join("tags.toml")
    }
}

impl TimelineStore for FileStore {
    fn save_day(&self, day: &DayRecord) -> Result<(), StorageError> {
        fs::create_dir_all(self.days_dir()).map_err(StorageError::Io)?;
        let blob = serde_json::to_string_pretty(day).map_err(StorageError::JsonEncode)?;
        fs::write(self.day_path(day.date), blob).map_err(StorageError::Io)
    }

    fn load_day(&self, date: NaiveDate) -> Result<Option<DayRecord>, StorageError> {
        let raw = match fs::read_to_string(self.day_path(date)) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StorageError::Io(err)),
        };

        serde_json::from_str(&raw).map(Some).map_err(StorageError::JsonDecode)
    }

    fn list_days(&self) -> Result<Vec<NaiveDate>, StorageError> {
        let entries = match fs::read_dir(self.days_dir()) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(StorageError::Io(err)),
        };

        let mut dates = Vec::new();
        for entry in entries {
            let entry = entry.map_err(StorageError::Io)?;
            let name = entry.file_name();
            let Some(stem) = Path::new(&name).file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            if let Ok(date) = NaiveDate::parse_from_str(stem, "%Y-%m-%d") {
                dates.push(date);
            }
        }

        dates.sort_unstable();
        Ok(dates)
    }

    fn save_tags(&self, tags: &[Tag]) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root).map_err(StorageError::Io)?;
        let file = TagFile { tags: tags.to_vec() };
        let blob = toml::to_string_pretty(&file).map_err(StorageError::TomlEncode)?;
        fs::write(self.tags_path(), blob).map_err(StorageError::Io)
    }

    fn load_tags(&self) -> Result<Vec<Tag>, StorageError> {
        let raw = match fs::read_to_string(self.tags_path()) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(StorageError::Io(err)),
        };

        let file: TagFile = toml::from_str(&raw).map_err(StorageError::TomlDecode)?;
        Ok(file.tags)
    }
}
