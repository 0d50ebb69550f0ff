//! RSS 2.0 rendering with iTunes and Media RSS extensions.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use xmlescape::escape::escape;

use podfeed_models::{FeedDocument, FeedItem};

const GENERATOR: &str = "Podfeed Generator";
const DEFAULT_CATEGORY: &str = "TV & Film";

pub const RSS_CONTENT_TYPE: &str = "application/rss+xml; charset=UTF-8";

/// Render `doc` as an RSS document. `self_link` is the public feed URL.
pub fn render(doc: &FeedDocument, self_link: &str) -> String {
    let mut out = String::with_capacity(1024 + doc.items.len() * 1024);

    out.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    out.push('\n');
    out.push_str(
        r#"<rss version="2.0" xmlns:itunes="http://www.itunes.com/dtds/podcast-1.0.dtd" xmlns:media="http://search.yahoo.com/mrss/" xmlns:atom="http://www.w3.org/2005/Atom">"#,
    );
    out.push_str("\n<channel>\n");

    element(&mut out, "title", &doc.title);
    element(&mut out, "link", &doc.link);
    element(&mut out, "description", &doc.description);
    element(&mut out, "generator", GENERATOR);
    element(&mut out, "lastBuildDate", &rfc2822(doc.last_build_date));
    if let Some(published) = doc.published_at {
        element(&mut out, "pubDate", &rfc2822(published));
    }
    let _ = writeln!(
        out,
        r#"<atom:link href="{}" rel="self" type="application/rss+xml"/>"#,
        escape(self_link)
    );

    element(&mut out, "itunes:subtitle", &doc.title);
    element(&mut out, "itunes:summary", &doc.description);
    if let Some(author) = &doc.author {
        element(&mut out, "itunes:author", author);
    }
    element(
        &mut out,
        "itunes:explicit",
        if doc.explicit { "yes" } else { "no" },
    );
    let _ = writeln!(
        out,
        r#"<itunes:category text="{}"/>"#,
        escape(doc.category.as_deref().unwrap_or(DEFAULT_CATEGORY))
    );
    if let Some(image) = &doc.image {
        let _ = writeln!(out, r#"<itunes:image href="{}"/>"#, escape(image));
        let _ = writeln!(out, r#"<media:thumbnail url="{}"/>"#, escape(image));
    }

    for item in &doc.items {
        render_item(&mut out, item);
    }

    out.push_str("</channel>\n</rss>\n");
    out
}

fn render_item(out: &mut String, item: &FeedItem) {
    out.push_str("<item>\n");

    element(out, "title", &item.title);
    element(out, "description", &item.description);
    element(out, "link", &item.link);
    element(out, "pubDate", &rfc2822(item.published_at));
    if let Some(author) = &item.author {
        element(out, "author", author);
    }
    let _ = writeln!(
        out,
        r#"<guid isPermaLink="true">{}</guid>"#,
        escape(&item.link)
    );
    let _ = writeln!(
        out,
        r#"<enclosure url="{}" length="{}" type="{}"/>"#,
        escape(&item.download_url),
        item.file_size,
        escape(&item.content_type)
    );
    let _ = writeln!(
        out,
        r#"<media:content url="{}" fileSize="{}" type="{}"/>"#,
        escape(&item.download_url),
        item.file_size,
        escape(&item.content_type)
    );

    element(out, "itunes:subtitle", &item.title);
    element(out, "itunes:summary", &item.description);
    element(out, "itunes:duration", &format_duration(item.duration_secs));
    if let Some(thumbnail) = &item.thumbnail {
        let _ = writeln!(out, r#"<itunes:image href="{}"/>"#, escape(thumbnail));
    }

    out.push_str("</item>\n");
}

fn element(out: &mut String, name: &str, text: &str) {
    let _ = writeln!(out, "<{name}>{}</{name}>", escape(text));
}

fn rfc2822(date: DateTime<Utc>) -> String {
    date.to_rfc2822()
}

/// `HH:MM:SS`, hours not wrapped at 24.
pub fn format_duration(secs: u64) -> String {
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}
