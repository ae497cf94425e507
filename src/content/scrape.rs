//! Webtoon page parsing.
//!
//! Episode pages are small and regular, so a handful of regexes plus a
//! `<div>` depth scan is enough to pull out the title, author and the
//! panel image URLs:
//!
//! | Field   | Source                                              | Fallback          |
//! |---------|-----------------------------------------------------|-------------------|
//! | title   | `<h2 class="title">`, then `<h3 class="title">`     | `Unknown Webtoon` |
//! | author  | `<span class="author">`                             | `Unknown Author`  |
//! | images  | `<img src>` inside `div.wt_viewer`, `div.viewer_lst`, `div#comic_view_area` | every `<img>` |

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

pub const UNKNOWN_TITLE: &str = "Unknown Webtoon";
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";

const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif"];

static OPEN_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<([a-z][a-z0-9]*)\b([^>]*)>").expect("valid regex"));

static ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)\b([a-z_:][-a-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("valid regex")
});

static DIV_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<div\b|</div\s*>").expect("valid regex"));

static ANY_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));

/// Title, author and image URLs of an episode page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageInfo {
    pub title: String,
    pub author: String,
    /// `src` of every `<img>` in the viewer container, in page order.
    pub image_urls: Vec<String>,
}

// ---------------------------------------------------------------------------
// Tag helpers
// ---------------------------------------------------------------------------

struct Tag<'a> {
    name: String,
    attrs: &'a str,
    /// Byte offset just past the closing `>` of the opening tag.
    end: usize,
}

fn open_tags(html: &str) -> impl Iterator<Item = Tag<'_>> {
    OPEN_TAG.captures_iter(html).filter_map(|c: Captures<'_>| {
        Some(Tag {
            name: c.get(1)?.as_str().to_ascii_lowercase(),
            attrs: c.get(2)?.as_str(),
            end: c.get(0)?.end(),
        })
    })
}

fn attr<'a>(attrs: &'a str, name: &str) -> Option<&'a str> {
    ATTR.captures_iter(attrs).find_map(|c| {
        if !c.get(1)?.as_str().eq_ignore_ascii_case(name) {
            return None;
        }
        c.get(2).or_else(|| c.get(3)).or_else(|| c.get(4)).map(|m| m.as_str())
    })
}

fn has_class(attrs: &str, class: &str) -> bool {
    attr(attrs, "class").is_some_and(|v| v.split_whitespace().any(|c| c == class))
}

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Text content of the first `<tag class="class">…</tag>`.
fn element_text(html: &str, tag: &str, class: &str) -> Option<String> {
    let open = open_tags(html).find(|t| t.name == tag && has_class(t.attrs, class))?;
    let close = Regex::new(&format!(r"(?i)</{tag}\s*>")).ok()?;
    let end = close.find_at(html, open.end).map_or(html.len(), |m| m.start());
    let text = ANY_TAG.replace_all(&html[open.end..end], " ");
    let text = decode_entities(&text);
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(text)
}

/// Inner HTML of the `<div>` whose opening tag ends at `start`.
fn div_inner(html: &str, start: usize) -> &str {
    let mut depth = 1usize;
    for m in DIV_TOKEN.find_iter(&html[start..]) {
        if m.as_str().starts_with("</") {
            depth -= 1;
            if depth == 0 {
                return &html[start..start + m.start()];
            }
        } else {
            depth += 1;
        }
    }
    &html[start..]
}

fn find_div<'a>(html: &'a str, pred: impl Fn(&str) -> bool) -> Option<&'a str> {
    open_tags(html)
        .find(|t| t.name == "div" && pred(t.attrs))
        .map(|t| div_inner(html, t.end))
}

fn image_sources(html: &str) -> Vec<String> {
    open_tags(html)
        .filter(|t| t.name == "img")
        .filter_map(|t| attr(t.attrs, "src"))
        .map(|src| {
            let src = decode_entities(src.trim());
            if src.starts_with("//") {
                format!("https:{src}")
            } else {
                src
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse an episode page.
pub fn parse_page(html: &str) -> PageInfo {
    let title = element_text(html, "h2", "title")
        .or_else(|| element_text(html, "h3", "title"))
        .unwrap_or_else(|| UNKNOWN_TITLE.to_string());
    let author = element_text(html, "span", "author").unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());

    let container = find_div(html, |a| has_class(a, "wt_viewer"))
        .or_else(|| find_div(html, |a| has_class(a, "viewer_lst")))
        .or_else(|| find_div(html, |a| attr(a, "id") == Some("comic_view_area")));

    let image_urls = match container {
        Some(inner) => image_sources(inner),
        None => {
            log::info!("No viewer container found, searching all images in page");
            image_sources(html)
        }
    };

    PageInfo {
        title,
        author,
        image_urls,
    }
}

/// `true` for image URLs on one of `allowed_hosts` with a raster extension.
pub fn is_comic_image(url: &str, allowed_hosts: &[String]) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url).to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
        && allowed_hosts.iter().any(|host| url.contains(host.as_str()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const EPISODE: &str = r#"
        <html><body>
          <div class="comicinfo"><h2 class="title detail">어느 날 &amp; 공주</h2>
          <span class="author">Plutus <em>작가</em></span></div>
          <img src="https://ssl.pstatic.net/static/logo.png">
          <div class="wt_viewer" style="background:#fff">
            <div class="inner"><img src="https://image-comic.pstatic.net/a/1.jpg"></div>
            <img alt="panel" src='https://image-comic.pstatic.net/a/2.jpg'>
          </div>
          <img src="https://image-comic.pstatic.net/ads/banner.jpg">
        </body></html>
    "#;

    fn hosts() -> Vec<String> {
        vec!["comic.pstatic.net".into(), "image-comic.pstatic.net".into()]
    }

    #[test]
    fn parses_title_author_and_viewer_images() {
        let page = parse_page(EPISODE);
        assert_eq!(page.title, "어느 날 & 공주");
        assert_eq!(page.author, "Plutus 작가");
        assert_eq!(
            page.image_urls,
            vec![
                "https://image-comic.pstatic.net/a/1.jpg",
                "https://image-comic.pstatic.net/a/2.jpg",
            ]
        );
    }

    #[test]
    fn falls_back_to_h3_and_defaults() {
        let page = parse_page(r#"<h3 class="title">Night</h3>"#);
        assert_eq!(page.title, "Night");
        assert_eq!(page.author, UNKNOWN_AUTHOR);
        assert!(page.image_urls.is_empty());

        let page = parse_page("<p>nothing</p>");
        assert_eq!(page.title, UNKNOWN_TITLE);
    }

    #[test]
    fn container_by_id() {
        let html = r#"<img src="x.jpg"><div id="comic_view_area"><img src="//comic.pstatic.net/1.png"></div>"#;
        let page = parse_page(html);
        assert_eq!(page.image_urls, vec!["https://comic.pstatic.net/1.png"]);
    }

    #[test]
    fn no_container_uses_every_image() {
        let html = r#"<img src="a.jpg"><p><IMG SRC="b.gif"></p>"#;
        assert_eq!(parse_page(html).image_urls, vec!["a.jpg", "b.gif"]);
    }

    #[test]
    fn comic_image_filter() {
        assert!(is_comic_image("https://image-comic.pstatic.net/x/1.jpg", &hosts()));
        assert!(is_comic_image("https://comic.pstatic.net/x/1.JPEG?type=w", &hosts()));
        assert!(!is_comic_image("https://ssl.pstatic.net/x/1.jpg", &hosts()));
        assert!(!is_comic_image("https://image-comic.pstatic.net/x/1.webp", &hosts()));
    }
}
