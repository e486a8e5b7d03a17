//! The `sitemap` integration.

use valentine_core::hydration::escape_attr;

pub const SITEMAP_FILE: &str = "sitemap.xml";

/// Render a sitemap for absolute page URLs.
pub fn render_sitemap<'a>(urls: impl IntoIterator<Item = &'a str>) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for url in urls {
        xml.push_str("  <url><loc>");
        xml.push_str(&escape_attr(url));
        xml.push_str("</loc></url>\n");
    }
    xml.push_str("</urlset>\n");
    xml
}
