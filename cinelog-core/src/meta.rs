use serde::{Deserialize, Serialize};

/// Descriptive metadata for a title as served by the catalog.
///
/// Only the fields the instrumentation needs are modelled; unknown fields in
/// the catalog payload are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    #[serde(default)]
    pub id: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub release_info: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub videos: Vec<Video>,
}

/// One entry of a series' episode list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub season: u64,
    #[serde(default, alias = "number")]
    pub episode: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub released: Option<String>,
}

impl Meta {
    pub fn new(name: impl Into<String>, release_info: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            release_info: release_info.into(),
            ..Default::default()
        }
    }

    /// `"<name> (<release info>)"`, the form written to request logs.
    pub fn media_name(&self) -> String {
        format!("{} ({})", self.name, self.release_info)
    }

    /// Find an episode in the series' video list.
    pub fn find_video(&self, season: u64, episode: u64) -> Option<&Video> {
        self.videos
            .iter()
            .find(|video| video.season == season && video.episode == episode)
    }
}
