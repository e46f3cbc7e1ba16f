use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

// A magnet link runs until the next whitespace or line break.
static MAGNET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"magnet:\?\S+").expect("magnet pattern compiles"));
static TORRENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+\.torrent").expect("torrent pattern compiles"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkKind {
    #[default]
    Magnet,
    Torrent,
}

impl LinkKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LinkKind::Magnet => "magnet",
            LinkKind::Torrent => "torrent",
        }
    }

    pub fn other(self) -> Self {
        match self {
            LinkKind::Magnet => LinkKind::Torrent,
            LinkKind::Torrent => LinkKind::Magnet,
        }
    }

    fn pattern(self) -> &'static Regex {
        match self {
            LinkKind::Magnet => &*MAGNET_RE,
            LinkKind::Torrent => &*TORRENT_RE,
        }
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown link type {0:?} (expected \"magnet\" or \"torrent\")")]
pub struct ParseLinkKindError(pub String);

impl FromStr for LinkKind {
    type Err = ParseLinkKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "magnet" => Ok(LinkKind::Magnet),
            "torrent" => Ok(LinkKind::Torrent),
            _ => Err(ParseLinkKindError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedLink {
    pub url: String,
    pub kind: LinkKind,
}

/// Leftmost link of exactly `kind` in `text`.
pub fn find_link(text: &str, kind: LinkKind) -> Option<&str> {
    kind.pattern().find(text).map(|m| m.as_str())
}

/// Tries the preferred kind first and falls back to the other kind only when
/// the preferred one yields nothing.
pub fn extract_link(text: &str, preferred: LinkKind) -> Option<ExtractedLink> {
    [preferred, preferred.other()].into_iter().find_map(|kind| {
        find_link(text, kind).map(|url| ExtractedLink {
            url: url.to_string(),
            kind,
        })
    })
}
