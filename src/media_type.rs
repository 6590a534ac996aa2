//! [`MediaType`] of the content held by a [`Resource`](crate::resource::Resource).

use crate::util::str::{StrExt, StringExt};
use std::borrow::Cow;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

/// The media type of a resource based on
/// [`MIME`](https://developer.mozilla.org/en-US/docs/Web/HTTP/Guides/MIME_types),
/// useful for inferring if a resource is an `XHTML` document, `PNG` image, etc.
///
/// MIME structure: `maintype/subtype[+suffix][;params]`
///
/// # Equality
/// Media types are compared by their components, so the following are treated as equivalent:
/// ```
/// # use lectern::MediaType;
/// let a = MediaType::from("text/html;charset=UTF-8;q=1");
/// let b = MediaType::from("  TEXT/html; Q = 1;charset = UTF-8;; ;   ");
/// assert_eq!(a, b);
/// ```
/// - Type components ([`maintype`](MediaType::maintype), [`subtype`](MediaType::subtype),
///   and [`suffix`](MediaType::suffix)) are case-insensitive.
/// - Parameter order does not matter; parameter keys are case-insensitive and
///   values are case-sensitive.
#[derive(Clone, Debug, Eq)]
pub struct MediaType(Cow<'static, str>);

impl MediaType {
    /// `text/html`, the assumed type of untyped reading order items.
    pub const HTML: Self = Self::borrowed("text/html");
    /// `application/xhtml+xml`
    pub const XHTML: Self = Self::borrowed("application/xhtml+xml");
    /// `application/xml`
    pub const XML: Self = Self::borrowed("application/xml");
    /// `text/css`
    pub const CSS: Self = Self::borrowed("text/css");
    /// `text/javascript`
    pub const JAVASCRIPT: Self = Self::borrowed("text/javascript");
    /// `text/plain`
    pub const TEXT: Self = Self::borrowed("text/plain");
    /// `application/json`
    pub const JSON: Self = Self::borrowed("application/json");
    /// `application/x-dtbncx+xml`
    pub const NCX: Self = Self::borrowed("application/x-dtbncx+xml");
    /// `application/oebps-package+xml`
    pub const OPF: Self = Self::borrowed("application/oebps-package+xml");
    /// `application/epub+zip`
    pub const EPUB: Self = Self::borrowed("application/epub+zip");
    /// `application/zip`
    pub const ZIP: Self = Self::borrowed("application/zip");
    /// `application/pdf`
    pub const PDF: Self = Self::borrowed("application/pdf");
    /// `image/jpeg`
    pub const JPEG: Self = Self::borrowed("image/jpeg");
    /// `image/png`
    pub const PNG: Self = Self::borrowed("image/png");
    /// `image/gif`
    pub const GIF: Self = Self::borrowed("image/gif");
    /// `image/webp`
    pub const WEBP: Self = Self::borrowed("image/webp");
    /// `image/svg+xml`
    pub const SVG: Self = Self::borrowed("image/svg+xml");
    /// `audio/mpeg`
    pub const MP3: Self = Self::borrowed("audio/mpeg");
    /// `font/woff`
    pub const WOFF: Self = Self::borrowed("font/woff");
    /// `font/woff2`
    pub const WOFF2: Self = Self::borrowed("font/woff2");
    /// `font/otf`
    pub const OTF: Self = Self::borrowed("font/otf");
    /// `font/ttf`
    pub const TTF: Self = Self::borrowed("font/ttf");
    /// `application/octet-stream`, used when nothing more specific is known.
    pub const BINARY: Self = Self::borrowed("application/octet-stream");

    const fn borrowed(value: &'static str) -> Self {
        Self(Cow::Borrowed(value))
    }

    /// Guesses a media type from a file extension (case-insensitive, without the dot).
    ///
    /// ```
    /// # use lectern::MediaType;
    /// assert_eq!(Some(MediaType::XHTML), MediaType::from_extension("XHTML"));
    /// assert_eq!(None, MediaType::from_extension("unknown"));
    /// ```
    pub fn from_extension(extension: &str) -> Option<Self> {
        let media_type = match extension.to_ascii_lowercase().as_str() {
            "html" | "htm" => Self::HTML,
            "xhtml" | "xht" => Self::XHTML,
            "xml" => Self::XML,
            "css" => Self::CSS,
            "js" | "mjs" => Self::JAVASCRIPT,
            "txt" => Self::TEXT,
            "json" => Self::JSON,
            "ncx" => Self::NCX,
            "opf" => Self::OPF,
            "epub" => Self::EPUB,
            "zip" => Self::ZIP,
            "pdf" => Self::PDF,
            "jpg" | "jpeg" => Self::JPEG,
            "png" => Self::PNG,
            "gif" => Self::GIF,
            "webp" => Self::WEBP,
            "svg" => Self::SVG,
            "mp3" => Self::MP3,
            "woff" => Self::WOFF,
            "woff2" => Self::WOFF2,
            "otf" => Self::OTF,
            "ttf" => Self::TTF,
            _ => return None,
        };
        Some(media_type)
    }

    /// Guesses a media type from the extension of the last segment of a path.
    pub fn from_path(path: &str) -> Option<Self> {
        let name = path.rsplit(['/', '\\']).next()?;
        let (_, extension) = name.rsplit_once('.')?;
        Self::from_extension(extension)
    }

    /// The raw underlying string.
    pub fn as_str(&self) -> &str {
        self.0.as_ref()
    }

    /// The maintype, such as `application` in `application/xhtml+xml`.
    pub fn maintype(&self) -> &str {
        self.0.split('/').next().unwrap_or_default().trim()
    }

    /// The subtype, such as `xhtml` in `application/xhtml+xml`.
    pub fn subtype(&self) -> &str {
        self.0.split(['/', '+', ';']).nth(1).unwrap_or_default().trim()
    }

    /// The suffix, such as `xml` in `application/xhtml+xml`.
    pub fn suffix(&self) -> Option<&str> {
        // Parameters can contain `+`
        let base_type = self.0.split(';').next()?;
        base_type.rfind('+').map(|index| base_type[index + 1..].trim())
    }

    /// The raw parameters string, such as `charset=UTF-8` in `text/html;charset=UTF-8`.
    pub fn params(&self) -> Option<&str> {
        self.0.find(';').map(|index| self.0[index + 1..].trim())
    }

    /// Iterates over `(key, value)` parameter pairs.
    pub fn params_iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params()
            .unwrap_or_default()
            .split(';')
            .filter_map(|param| param.split_once('='))
            .map(|(key, value)| (key.trim(), value.trim()))
    }

    /// Returns the parameter value associated with the given key (case-insensitive).
    pub fn get_param(&self, param_key: &str) -> Option<&str> {
        self.params_iter()
            .find_map(|(key, value)| key.eq_ignore_ascii_case(param_key).then_some(value))
    }

    /// Returns `true` if this media type matches `other` while ignoring parameters.
    ///
    /// ```
    /// # use lectern::MediaType;
    /// assert!(MediaType::from("text/html; charset=UTF-8").matches(&MediaType::HTML));
    /// ```
    pub fn matches(&self, other: &MediaType) -> bool {
        self.base_type().eq_ignore_ascii_case(other.base_type())
    }

    /// Returns `true` for HTML and XHTML documents.
    pub fn is_html(&self) -> bool {
        self.matches(&Self::HTML) || self.matches(&Self::XHTML)
    }

    /// Returns `true` if the maintype is `text`.
    pub fn is_text(&self) -> bool {
        self.maintype().eq_ignore_ascii_case("text")
    }

    /// Returns `true` if the maintype is `image`.
    pub fn is_image(&self) -> bool {
        self.maintype().eq_ignore_ascii_case("image")
    }

    /// Returns `true` if the media type is a font, including legacy variants
    /// such as `application/x-font-woff`.
    pub fn is_font(&self) -> bool {
        if self.maintype().eq_ignore_ascii_case("font") {
            return true;
        }

        let subtype = self.subtype();
        subtype.starts_with_ignore_case("font-")
            || subtype.starts_with_ignore_case("x-font")
            || subtype.eq_ignore_ascii_case("vnd.ms-fontobject")
            || subtype.eq_ignore_ascii_case("vnd.ms-opentype")
    }

    /// Returns `true` for ZIP-based packages, such as EPUB.
    pub fn is_zip(&self) -> bool {
        self.matches(&Self::ZIP) || self.suffix().is_some_and(|s| s.eq_ignore_ascii_case("zip"))
    }

    fn base_type(&self) -> &str {
        // Split guarantees at least one entry
        self.0.split(';').next().unwrap_or_default().trim()
    }
}

impl PartialEq for MediaType {
    fn eq(&self, other: &Self) -> bool {
        if !self.matches(other) {
            return false;
        }

        let mut self_params = self.params_iter().collect::<Vec<_>>();
        let mut other_params = other.params_iter().collect::<Vec<_>>();

        if self_params.len() != other_params.len() {
            return false;
        }

        self_params.sort_unstable_by_key(|(k, _)| k.to_ascii_lowercase());
        other_params.sort_unstable_by_key(|(k, _)| k.to_ascii_lowercase());

        // Keys are case-insensitive, values are not
        self_params
            .iter()
            .zip(other_params)
            .all(|(&(k1, v1), (k2, v2))| k1.eq_ignore_ascii_case(k2) && v1 == v2)
    }
}

impl Hash for MediaType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Parameters are unordered; hashing the base type keeps `a == b => hash(a) == hash(b)`
        self.base_type().to_ascii_lowercase().hash(state);
    }
}

impl Display for MediaType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for MediaType {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<&str> for MediaType {
    fn from(value: &str) -> Self {
        Self(Cow::Owned(value.trim().to_owned()))
    }
}

impl From<String> for MediaType {
    fn from(mut value: String) -> Self {
        value.trim_in_place();
        Self(Cow::Owned(value))
    }
}
