use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted description of one uploaded video, stored as
/// `metadata/<id>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub id: String,
    pub filename: String,
    pub title: String,
    pub description: String,
    pub duration: f64,
    #[serde(alias = "createdAt")]
    pub created_at: DateTime<Utc>,
    pub tags: Vec<String>,
}

/// Untrusted form fields that accompany an upload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadMetadata {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_uses_snake_case_keys() {
        let record = VideoRecord {
            id: "1700000000_abc".to_string(),
            filename: "1700000000_abc.mp4".to_string(),
            title: "Hello".to_string(),
            description: String::new(),
            duration: 12.5,
            created_at: Utc::now(),
            tags: vec!["ojibwe".to_string()],
        };

        let json = serde_json::to_value(&record).unwrap();
        for key in [
            "id",
            "filename",
            "title",
            "description",
            "duration",
            "created_at",
            "tags",
        ] {
            assert!(json.get(key).is_some(), "missing key {key}");
        }
    }

    #[test]
    fn record_accepts_camel_case_timestamp() {
        let json = r#"{
            "id": "a",
            "filename": "a.mp4",
            "title": "",
            "description": "",
            "duration": 0,
            "createdAt": "2024-05-01T12:00:00Z",
            "tags": []
        }"#;

        let record: VideoRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.created_at.to_rfc3339(), "2024-05-01T12:00:00+00:00");
    }
}
