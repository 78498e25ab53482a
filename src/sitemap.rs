//! Sitemap rendering for published items

use std::fmt::Write;

use crate::publication::SiteLinks;
use crate::schemas::NewsItem;
use crate::text::escape_markup;

/// Renders a sitemaps.org `urlset` with one entry per item, in the given order
pub fn render_sitemap(items: &[NewsItem], links: &SiteLinks) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );

    for item in items {
        let loc = links.item_url(item.id, item.slug_url.as_deref());
        let _ = writeln!(xml, "  <url>\n    <loc>{}</loc>", escape_markup(&loc));
        if let Some(published_at) = item.published_at {
            let _ = writeln!(xml, "    <lastmod>{}</lastmod>", published_at.format("%Y-%m-%d"));
        }
        xml.push_str("    <changefreq>weekly</changefreq>\n    <priority>0.8</priority>\n  </url>\n");
    }

    xml.push_str("</urlset>\n");
    xml
}
