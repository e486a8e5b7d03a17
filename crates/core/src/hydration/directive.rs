use std::fmt;

use serde::Serialize;

use super::error::HydrationError;

/// When an island's client code runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum HydrationDirective {
    /// `client:load`: as soon as the page's scripts are parsed.
    Immediate,
    /// `client:idle`: once the browser reports it is idle.
    Idle,
    /// `client:visible`: once the element intersects the viewport.
    Visible,
    /// `client:media="<query>"`: once the media query matches.
    Media(String),
    /// `client:only="<runtime>"`: never rendered on the server.
    ClientOnly(String),
}

/// Directive without its payload, used to decide which loaders a page needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DirectiveKind {
    Immediate,
    Idle,
    Visible,
    Media,
    ClientOnly,
}

impl DirectiveKind {
    pub const ALL: [DirectiveKind; 5] = [
        DirectiveKind::Immediate,
        DirectiveKind::Idle,
        DirectiveKind::Visible,
        DirectiveKind::Media,
        DirectiveKind::ClientOnly,
    ];

    /// Name used in `client:<name>` and in emitted markup.
    pub fn name(self) -> &'static str {
        match self {
            DirectiveKind::Immediate => "load",
            DirectiveKind::Idle => "idle",
            DirectiveKind::Visible => "visible",
            DirectiveKind::Media => "media",
            DirectiveKind::ClientOnly => "only",
        }
    }

    /// Bit used to record the kind in a compact set.
    pub fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl HydrationDirective {
    /// Parse a directive from its name (`load`, `client:visible`, ...) and
    /// optional value.
    pub fn parse(name: &str, value: Option<&str>) -> Result<Self, HydrationError> {
        let name = name.strip_prefix("client:").unwrap_or(name);
        let value = value.map(str::trim).filter(|v| !v.is_empty());

        match name {
            "load" => Ok(Self::Immediate),
            "idle" => Ok(Self::Idle),
            "visible" => Ok(Self::Visible),
            "media" => value
                .map(|query| Self::Media(query.to_string()))
                .ok_or(HydrationError::MissingMediaQuery),
            "only" => value
                .map(|runtime| Self::ClientOnly(runtime.to_string()))
                .ok_or(HydrationError::MissingRuntime),
            other => Err(HydrationError::UnknownDirective(other.to_string())),
        }
    }

    pub fn kind(&self) -> DirectiveKind {
        match self {
            Self::Immediate => DirectiveKind::Immediate,
            Self::Idle => DirectiveKind::Idle,
            Self::Visible => DirectiveKind::Visible,
            Self::Media(_) => DirectiveKind::Media,
            Self::ClientOnly(_) => DirectiveKind::ClientOnly,
        }
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            Self::Media(value) | Self::ClientOnly(value) => Some(value),
            _ => None,
        }
    }

    /// Whether the server renders the component's markup before hydration.
    pub fn prerenders(&self) -> bool {
        !matches!(self, Self::ClientOnly(_))
    }
}

impl fmt::Display for HydrationDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value() {
            Some(value) => write!(f, "client:{}=\"{}\"", self.kind().name(), value),
            None => write!(f, "client:{}", self.kind().name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_directives() {
        assert_eq!(
            HydrationDirective::parse("load", None).unwrap(),
            HydrationDirective::Immediate
        );
        assert_eq!(
            HydrationDirective::parse("client:idle", None).unwrap(),
            HydrationDirective::Idle
        );
        assert_eq!(
            HydrationDirective::parse("visible", Some("ignored")).unwrap(),
            HydrationDirective::Visible
        );
    }

    #[test]
    fn test_parse_media_requires_query() {
        assert_eq!(
            HydrationDirective::parse("media", Some("(max-width: 600px)")).unwrap(),
            HydrationDirective::Media("(max-width: 600px)".to_string())
        );
        assert_eq!(
            HydrationDirective::parse("media", Some("  ")),
            Err(HydrationError::MissingMediaQuery)
        );
    }

    #[test]
    fn test_parse_only_requires_runtime() {
        assert_eq!(
            HydrationDirective::parse("client:only", Some("preact")).unwrap(),
            HydrationDirective::ClientOnly("preact".to_string())
        );
        assert_eq!(
            HydrationDirective::parse("only", None),
            Err(HydrationError::MissingRuntime)
        );
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(
            HydrationDirective::parse("client:hover", None),
            Err(HydrationError::UnknownDirective("hover".to_string()))
        );
    }

    #[test]
    fn test_only_client_only_skips_prerender() {
        assert!(HydrationDirective::Visible.prerenders());
        assert!(!HydrationDirective::ClientOnly("preact".to_string()).prerenders());
    }

    #[test]
    fn test_display() {
        assert_eq!(HydrationDirective::Idle.to_string(), "client:idle");
        assert_eq!(
            HydrationDirective::Media("(hover: hover)".to_string()).to_string(),
            "client:media=\"(hover: hover)\""
        );
    }

    #[test]
    fn test_kind_bits_are_distinct() {
        let combined = DirectiveKind::ALL.iter().fold(0u8, |acc, k| acc | k.bit());
        assert_eq!(combined.count_ones(), 5);
    }
}
