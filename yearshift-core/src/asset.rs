//! Transition clip and idle image resolution

use crate::{Direction, Year, YearRange};

/// Media stack family, which decides the clip container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MediaFamily {
    /// Chromium, Firefox, Opera and anything else that plays WebM with alpha
    #[default]
    Standard,
    /// Apple WebKit Safari, which needs the HEVC-with-alpha MP4 variant
    WebKitSafari,
}

const CHROMIUM_TOKENS: [&str; 5] = ["crios", "chrome", "chromium", "edgios", "edge"];
const FIREFOX_TOKENS: [&str; 2] = ["fxios", "firefox"];
const OPERA_TOKENS: [&str; 2] = ["opr", "opera"];

impl MediaFamily {
    /// Probes a user-agent string.
    ///
    /// Safari-family is reported only when both the `Safari` and `AppleWebKit`
    /// tokens are present and no Chromium, Firefox or Opera signature is,
    /// since those engines also advertise `Safari` in their user agents.
    pub fn from_user_agent(user_agent: &str) -> Self {
        let ua = user_agent.to_ascii_lowercase();

        let has_safari = ua.contains("safari");
        let is_webkit = ua.contains("applewebkit");
        let foreign = contains_any(&ua, &CHROMIUM_TOKENS)
            || contains_any(&ua, &FIREFOX_TOKENS)
            || contains_any(&ua, &OPERA_TOKENS);

        if has_safari && is_webkit && !foreign {
            MediaFamily::WebKitSafari
        } else {
            MediaFamily::Standard
        }
    }

    fn clip_extension(self) -> &'static str {
        match self {
            MediaFamily::Standard => "webm",
            MediaFamily::WebKitSafari => "mp4",
        }
    }

    fn clip_suffix(self) -> &'static str {
        match self {
            MediaFamily::Standard => "",
            MediaFamily::WebKitSafari => "_safari",
        }
    }
}

fn contains_any(haystack: &str, tokens: &[&str]) -> bool {
    tokens.iter().any(|t| haystack.contains(t))
}

/// URL without its query string or fragment
pub fn url_path(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}

/// Loader category of a manifest entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Image,
    Video,
}

const VIDEO_EXTENSIONS: [&str; 3] = [".webm", ".mov", ".mp4"];

impl AssetKind {
    /// Classifies a URL by suffix; anything not a known video container is an image
    pub fn from_url(url: &str) -> Self {
        let lower = url_path(url).to_ascii_lowercase();
        if VIDEO_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
            AssetKind::Video
        } else {
            AssetKind::Image
        }
    }
}

/// Ordered list of URLs that must settle before interaction starts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreloadManifest {
    urls: Vec<String>,
}

impl PreloadManifest {
    /// Creates a manifest from URLs, keeping their order and dropping repeats
    pub fn new<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut manifest = Self::default();
        for url in urls {
            manifest.push(url);
        }
        manifest
    }

    /// Appends a URL unless already listed
    pub fn push(&mut self, url: impl Into<String>) {
        let url = url.into();
        if !self.urls.contains(&url) {
            self.urls.push(url);
        }
    }

    /// Entries with their loader category
    pub fn entries(&self) -> impl Iterator<Item = (&str, AssetKind)> {
        self.urls.iter().map(|u| (u.as_str(), AssetKind::from_url(u)))
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// Maps directions and years to concrete asset URLs for one environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetResolver {
    base_path: String,
    family: MediaFamily,
}

impl AssetResolver {
    /// Default public asset prefix
    pub const DEFAULT_BASE: &'static str = "/assets";

    /// Creates a resolver for the given base path and media family
    pub fn new(base_path: impl Into<String>, family: MediaFamily) -> Self {
        let base_path = base_path.into();
        let base_path = base_path.trim_end_matches('/').to_string();
        Self { base_path, family }
    }

    /// Creates a resolver under the default base, probing the user agent
    pub fn for_user_agent(user_agent: &str) -> Self {
        Self::new(Self::DEFAULT_BASE, MediaFamily::from_user_agent(user_agent))
    }

    pub fn family(&self) -> MediaFamily {
        self.family
    }

    /// Transition clip for a direction
    pub fn resolve_transition(&self, direction: Direction) -> String {
        format!(
            "{}/transition_{}{}.{}",
            self.base_path,
            direction.as_str(),
            self.family.clip_suffix(),
            self.family.clip_extension()
        )
    }

    /// Still background for a settled year
    pub fn idle_image(&self, year: Year) -> String {
        format!("{}/idle_{}.png", self.base_path, year)
    }

    /// Both transition clips, then one idle image per year
    pub fn preload_manifest(&self, range: &YearRange) -> PreloadManifest {
        let clips = Direction::ALL.map(|d| self.resolve_transition(d));
        let images = range.years().map(|y| self.idle_image(y));
        PreloadManifest::new(clips.into_iter().chain(images))
    }
}

impl Default for AssetResolver {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BASE, MediaFamily::Standard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAFARI_MAC: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15";
    const CHROME_MAC: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
    const CHROME_IOS: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) CriOS/124.0 Mobile/15E148 Safari/604.1";
    const FIREFOX_IOS: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) FxiOS/125.0 Mobile/15E148 Safari/605.1.15";
    const FIREFOX_LINUX: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0";

    #[test]
    fn test_user_agent_probe() {
        assert_eq!(MediaFamily::from_user_agent(SAFARI_MAC), MediaFamily::WebKitSafari);
        assert_eq!(MediaFamily::from_user_agent(CHROME_MAC), MediaFamily::Standard);
        assert_eq!(MediaFamily::from_user_agent(CHROME_IOS), MediaFamily::Standard);
        assert_eq!(MediaFamily::from_user_agent(FIREFOX_IOS), MediaFamily::Standard);
        assert_eq!(MediaFamily::from_user_agent(FIREFOX_LINUX), MediaFamily::Standard);
        assert_eq!(MediaFamily::from_user_agent(""), MediaFamily::Standard);
    }

    #[test]
    fn test_resolve_transition_per_family() {
        let standard = AssetResolver::default();
        assert_eq!(
            standard.resolve_transition(Direction::Forward),
            "/assets/transition_forward.webm"
        );
        assert_eq!(
            standard.resolve_transition(Direction::Back),
            "/assets/transition_back.webm"
        );

        let safari = AssetResolver::for_user_agent(SAFARI_MAC);
        assert_eq!(
            safari.resolve_transition(Direction::Back),
            "/assets/transition_back_safari.mp4"
        );
    }

    #[test]
    fn test_manifest_order_and_kinds() {
        let resolver = AssetResolver::new("/static/", MediaFamily::WebKitSafari);
        let manifest = resolver.preload_manifest(&YearRange::default());

        let entries: Vec<_> = manifest.entries().collect();
        assert_eq!(entries.len(), 6);
        assert_eq!(
            entries[0],
            ("/static/transition_forward_safari.mp4", AssetKind::Video)
        );
        assert_eq!(entries[1].1, AssetKind::Video);
        assert_eq!(entries[2], ("/static/idle_2023.png", AssetKind::Image));
        assert_eq!(entries[5], ("/static/idle_2026.png", AssetKind::Image));
    }

    #[test]
    fn test_asset_kind_from_url() {
        assert_eq!(AssetKind::from_url("/a/clip.webm"), AssetKind::Video);
        assert_eq!(AssetKind::from_url("/a/clip.MOV"), AssetKind::Video);
        assert_eq!(AssetKind::from_url("/a/clip.mp4?v=2"), AssetKind::Video);
        assert_eq!(AssetKind::from_url("/a/idle.png"), AssetKind::Image);
    }

    #[test]
    fn test_url_path_strips_query_and_fragment() {
        assert_eq!(url_path("/a/clip.mp4?v=2"), "/a/clip.mp4");
        assert_eq!(url_path("/a/idle.png#top"), "/a/idle.png");
        assert_eq!(url_path("/a/idle.png"), "/a/idle.png");
    }

    #[test]
    fn test_manifest_drops_duplicates() {
        let manifest = PreloadManifest::new(["/a.png", "/b.png", "/a.png"]);
        assert_eq!(manifest.urls(), &["/a.png".to_string(), "/b.png".to_string()]);
    }
}
