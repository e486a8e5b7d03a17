//! Client scripts appended to pages that contain hydrating islands.
//!
//! A page with no hydrating island gets nothing from this module. Otherwise it
//! receives one loader per directive kind actually used, the public
//! environment (when non-empty), and the `<valentine-island>` element
//! definition, in that order.

use crate::config::ClientEnv;

use super::directive::DirectiveKind;
use super::markup::escape_script_json;

/// Compact set of directive kinds used by one page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectiveSet(u8);

impl DirectiveSet {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn insert(&mut self, kind: DirectiveKind) {
        self.0 |= kind.bit();
    }

    pub fn contains(self, kind: DirectiveKind) -> bool {
        self.0 & kind.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = DirectiveKind> {
        DirectiveKind::ALL
            .into_iter()
            .filter(move |kind| self.contains(*kind))
    }
}

impl FromIterator<DirectiveKind> for DirectiveSet {
    fn from_iter<I: IntoIterator<Item = DirectiveKind>>(iter: I) -> Self {
        let mut set = Self::new();
        for kind in iter {
            set.insert(kind);
        }
        set
    }
}

/// Milliseconds `client:idle` waits before giving up on an idle callback.
pub const IDLE_TIMEOUT_MS: u32 = 2000;

const IMMEDIATE_LOADER: &str = r#"(self.Valentine ||= {}).load = (getHydrateCallback) => { (async () => { await (await getHydrateCallback())(); })(); };
window.dispatchEvent(new Event("valentine:load"));"#;

const IDLE_LOADER: &str = r#"(self.Valentine ||= {}).idle = (getHydrateCallback) => {
  const cb = async () => { await (await getHydrateCallback())(); };
  if ("requestIdleCallback" in window) { window.requestIdleCallback(cb, { timeout: __IDLE_TIMEOUT__ }); }
  else { setTimeout(cb, 200); }
};
window.dispatchEvent(new Event("valentine:idle"));"#;

const VISIBLE_LOADER: &str = r#"(self.Valentine ||= {}).visible = (getHydrateCallback, el) => {
  const cb = async () => { await (await getHydrateCallback())(); };
  const io = new IntersectionObserver((entries) => {
    for (const entry of entries) {
      if (!entry.isIntersecting) continue;
      io.disconnect();
      cb();
      break;
    }
  });
  const targets = el.children.length > 0 ? Array.from(el.children) : [el];
  for (const child of targets) io.observe(child);
};
window.dispatchEvent(new Event("valentine:visible"));"#;

const MEDIA_LOADER: &str = r#"(self.Valentine ||= {}).media = (getHydrateCallback, el) => {
  const cb = async () => { await (await getHydrateCallback())(); };
  const query = el.getAttribute("media-query");
  if (!query) return;
  const mql = matchMedia(query);
  if (mql.matches) { cb(); }
  else { mql.addEventListener("change", cb, { once: true }); }
};
window.dispatchEvent(new Event("valentine:media"));"#;

const ONLY_LOADER: &str = r#"(self.Valentine ||= {}).only = (getHydrateCallback) => { (async () => { await (await getHydrateCallback())(); })(); };
window.dispatchEvent(new Event("valentine:only"));"#;

const ISLAND_ELEMENT: &str = r#"(() => {
  if (customElements.get("valentine-island")) return;
  class ValentineIsland extends HTMLElement {
    connectedCallback() {
      const strategy = this.getAttribute("client");
      const start = () => {
        const loader = self.Valentine && self.Valentine[strategy];
        if (loader) loader(() => this.hydrator(), this);
      };
      if (self.Valentine && self.Valentine[strategy]) start();
      else window.addEventListener(`valentine:${strategy}`, start, { once: true });
    }
    async hydrator() {
      const mod = await import(this.getAttribute("component-url"));
      const exportName = this.getAttribute("component-export") || "default";
      const component = mod[exportName];
      const props = JSON.parse(this.getAttribute("props") || "{}");
      const ssr = this.hasAttribute("ssr");
      return async () => {
        await component(this, props, { ssr });
        this.removeAttribute("ssr");
        this.dispatchEvent(new CustomEvent("valentine:hydrate"));
      };
    }
  }
  customElements.define("valentine-island", ValentineIsland);
})();"#;

fn loader_for(kind: DirectiveKind) -> String {
    match kind {
        DirectiveKind::Immediate => IMMEDIATE_LOADER.to_string(),
        DirectiveKind::Idle => IDLE_LOADER.replace("__IDLE_TIMEOUT__", &IDLE_TIMEOUT_MS.to_string()),
        DirectiveKind::Visible => VISIBLE_LOADER.to_string(),
        DirectiveKind::Media => MEDIA_LOADER.to_string(),
        DirectiveKind::ClientOnly => ONLY_LOADER.to_string(),
    }
}

/// Scripts a page needs for its hydrating islands.
pub struct HydrationScripts;

impl HydrationScripts {
    /// Build the script block for a page. Empty when `kinds` is empty.
    pub fn for_directives(
        kinds: DirectiveSet,
        env: &ClientEnv,
    ) -> Result<String, serde_json::Error> {
        if kinds.is_empty() {
            return Ok(String::new());
        }

        let mut out = String::new();
        for kind in kinds.iter() {
            out.push_str("<script>");
            out.push_str(&loader_for(kind));
            out.push_str("</script>\n");
        }

        if !env.is_empty() {
            let json = serde_json::to_string(env)?;
            out.push_str(&format!(
                "<script>(self.Valentine ||= {{}}).env = {};</script>\n",
                escape_script_json(&json)
            ));
        }

        out.push_str("<script>");
        out.push_str(ISLAND_ELEMENT);
        out.push_str("</script>\n");
        Ok(out)
    }

    /// Standalone loader for one directive kind, served under `/_valentine/`.
    pub fn loader(kind: DirectiveKind) -> String {
        loader_for(kind)
    }

    /// Standalone `<valentine-island>` element definition.
    pub fn element_definition() -> &'static str {
        ISLAND_ELEMENT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnvVars;

    fn client_env(vars: &[(&str, &str)]) -> ClientEnv {
        EnvVars::partition(
            "PUBLIC_",
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())),
        )
        .client()
    }

    #[test]
    fn test_no_islands_no_scripts() {
        let env = client_env(&[("PUBLIC_SITE_NAME", "Be Mine")]);
        assert_eq!(HydrationScripts::for_directives(DirectiveSet::new(), &env).unwrap(), "");
    }

    #[test]
    fn test_only_used_loaders_are_emitted() {
        let kinds: DirectiveSet = [DirectiveKind::Visible].into_iter().collect();
        let html = HydrationScripts::for_directives(kinds, &client_env(&[])).unwrap();

        assert!(html.contains("IntersectionObserver"));
        assert!(!html.contains("requestIdleCallback"));
        assert!(!html.contains("matchMedia"));
        assert!(html.contains("customElements.define(\"valentine-island\""));
        assert!(!html.contains(".env ="));
    }

    #[test]
    fn test_idle_loader_has_timeout() {
        let kinds: DirectiveSet = [DirectiveKind::Idle, DirectiveKind::Media]
            .into_iter()
            .collect();
        let html = HydrationScripts::for_directives(kinds, &client_env(&[])).unwrap();
        assert!(html.contains("requestIdleCallback(cb, { timeout: 2000 })"));
        assert!(html.contains("matchMedia(query)"));
    }

    #[test]
    fn test_loaders_precede_element_definition() {
        let kinds: DirectiveSet = [DirectiveKind::Immediate].into_iter().collect();
        let html = HydrationScripts::for_directives(kinds, &client_env(&[])).unwrap();
        let loader = html.find(".load =").unwrap();
        let element = html.find("customElements.define").unwrap();
        assert!(loader < element);
    }

    #[test]
    fn test_public_env_is_exposed_private_is_not() {
        let env = EnvVars::partition(
            "PUBLIC_",
            vec![
                ("PUBLIC_SITE_NAME".to_string(), "</script>".to_string()),
                ("DATABASE_URL".to_string(), "postgres://secret".to_string()),
            ],
        );
        let kinds: DirectiveSet = [DirectiveKind::Idle].into_iter().collect();
        let html = HydrationScripts::for_directives(kinds, &env.client()).unwrap();

        assert!(html.contains(r#""PUBLIC_SITE_NAME":"<\/script>""#));
        assert!(!html.contains("DATABASE_URL"));
        assert!(!html.contains("postgres://secret"));
    }

    #[test]
    fn test_directive_set() {
        let mut set = DirectiveSet::new();
        assert!(set.is_empty());
        set.insert(DirectiveKind::Media);
        set.insert(DirectiveKind::Immediate);
        set.insert(DirectiveKind::Media);
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![DirectiveKind::Immediate, DirectiveKind::Media]
        );
        assert_eq!(DirectiveSet::from_bits(set.bits()), set);
    }
}
