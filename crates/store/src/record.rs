use maildex_filter::FrequencyMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::SystemTime;

/// The persisted unit: one cleaned document plus its frequency index.
///
/// `file_path` is the path relative to the watched root and acts as
/// the natural key; a healthy store holds at most one record per path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub file_name: String,
    pub file_path: String,
    pub cleaned_content: String,
    pub frequency_map: FrequencyMap,
    pub indexed_at_unix_ms: u64,
}

impl IndexRecord {
    /// Build a record stamped with the current time.
    pub fn new(
        file_path: impl Into<String>,
        cleaned_content: impl Into<String>,
        frequency_map: FrequencyMap,
    ) -> Self {
        let file_path = file_path.into();
        let file_name = Path::new(&file_path)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_path.clone());
        Self {
            file_name,
            file_path,
            cleaned_content: cleaned_content.into(),
            frequency_map,
            indexed_at_unix_ms: unix_now_ms(),
        }
    }
}

/// Milliseconds since the unix epoch; zero if the clock is before it.
pub fn unix_now_ms() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|dur| dur.as_millis() as u64)
        .unwrap_or(0)
}
