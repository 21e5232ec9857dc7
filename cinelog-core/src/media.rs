use std::{fmt, str::FromStr};

use crate::error::ParseError;

/// Suffix the stream routes append to the id segment.
const JSON_SUFFIX: &str = ".json";

/// Whether a title is a standalone work or part of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Movie,
    Series,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Series => "series",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(MediaKind::Movie),
            "series" => Ok(MediaKind::Series),
            other => Err(ParseError::UnknownKind(other.to_string())),
        }
    }
}

/// A title addressed by a stream request.
///
/// Episodic ids arrive as `<series>:<season>:<episode>`, e.g. `tt0944947:2:5`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MediaRef {
    Movie {
        id: String,
    },
    Episode {
        series_id: String,
        season: u64,
        episode: u64,
    },
}

impl MediaRef {
    pub fn movie(id: impl Into<String>) -> Self {
        MediaRef::Movie { id: id.into() }
    }

    pub fn episode(series_id: impl Into<String>, season: u64, episode: u64) -> Self {
        MediaRef::Episode {
            series_id: series_id.into(),
            season,
            episode,
        }
    }

    /// Build a reference from optional path parameters.
    ///
    /// Absent and empty parameters are treated the same way.
    pub fn from_params(kind: Option<&str>, id: Option<&str>) -> Result<Self, ParseError> {
        match (kind, id) {
            (Some(kind), Some(id)) if !kind.is_empty() && !id.is_empty() => Self::parse(kind, id),
            _ => Err(ParseError::MissingParams),
        }
    }

    /// Parse the `type` and `id` path parameters of a stream request.
    ///
    /// Season and episode numbers are any non-negative integers that fit in
    /// a `u64`.
    pub fn parse(kind: &str, id: &str) -> Result<Self, ParseError> {
        let id = id.strip_suffix(JSON_SUFFIX).unwrap_or(id);
        if id.is_empty() {
            return Err(ParseError::MissingParams);
        }

        match kind.parse::<MediaKind>()? {
            MediaKind::Movie => Ok(Self::movie(id)),
            MediaKind::Series => {
                let parts: Vec<&str> = id.split(':').collect();
                let [series_id, season, episode] = parts.as_slice() else {
                    return Err(ParseError::EpisodeShape(id.to_string()));
                };
                let season = season
                    .parse::<u64>()
                    .map_err(|_| ParseError::Season(season.to_string()))?;
                let episode = episode
                    .parse::<u64>()
                    .map_err(|_| ParseError::Episode(episode.to_string()))?;
                Ok(Self::episode(*series_id, season, episode))
            }
        }
    }

    pub fn kind(&self) -> MediaKind {
        match self {
            MediaRef::Movie { .. } => MediaKind::Movie,
            MediaRef::Episode { .. } => MediaKind::Series,
        }
    }

    /// The catalog id used for the lookup (the series id for episodes).
    pub fn primary_id(&self) -> &str {
        match self {
            MediaRef::Movie { id } => id,
            MediaRef::Episode { series_id, .. } => series_id,
        }
    }

    pub fn season(&self) -> Option<u64> {
        match self {
            MediaRef::Movie { .. } => None,
            MediaRef::Episode { season, .. } => Some(*season),
        }
    }

    pub fn episode_number(&self) -> Option<u64> {
        match self {
            MediaRef::Movie { .. } => None,
            MediaRef::Episode { episode, .. } => Some(*episode),
        }
    }
}

impl fmt::Display for MediaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaRef::Movie { id } => write!(f, "movie:{id}"),
            MediaRef::Episode {
                series_id,
                season,
                episode,
            } => write!(f, "series:{series_id}:{season}:{episode}"),
        }
    }
}
