//! Classification of stream request paths.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

/// `[/<config>]/stream/{movie|series}/<id>.json[?query]`, where `<config>` is
/// the base64url user configuration segment.
static STREAM_ROUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^/(?:(?P<config>[A-Za-z0-9\-_]+={0,2})/)?stream/(?P<type>movie|series)/(?P<id>.+)\.json(?:\?.*)?$",
    )
    .expect("stream route pattern is valid")
});

/// A path that addresses the stream resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRoute<'a> {
    pub kind: &'a str,
    /// Percent-decoded id segment without the `.json` suffix.
    pub id: Cow<'a, str>,
    pub configured: bool,
}

impl<'a> StreamRoute<'a> {
    pub fn classify(path: &'a str) -> Option<Self> {
        let captures = STREAM_ROUTE.captures(path)?;
        let kind = captures.name("type")?.as_str();
        let raw_id = captures.name("id")?.as_str();
        let id = urlencoding::decode(raw_id).unwrap_or(Cow::Borrowed(raw_id));

        Some(Self {
            kind,
            id,
            configured: captures.name("config").is_some(),
        })
    }

    /// Whether a meaningful id can be expected for this request.
    ///
    /// Addons that require user configuration only serve configured stream
    /// requests, so unconfigured ones are skipped.
    pub fn has_usable_id(&self, requires_user_data: bool) -> bool {
        !requires_user_data || self.configured
    }
}
