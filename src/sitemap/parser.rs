//! Sitemap XML parsing
//!
//! Elements are matched by local name, so default-namespace and prefixed
//! documents both parse. Only `<loc>`/`<lastmod>` elements that are direct
//! children of `<url>` or `<sitemap>` count; extension entries such as
//! `<image:loc>` are ignored.

use super::SitemapEntry;
use super::error::SitemapError;
use quick_xml::Reader;
use quick_xml::events::Event;

/// A parsed sitemap document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapDocument {
    /// A `<urlset>` listing pages
    UrlSet(Vec<SitemapEntry>),
    /// A `<sitemapindex>` listing other sitemaps
    Index(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Root {
    UrlSet,
    Index,
}

fn root_kind(name: &[u8]) -> Result<Root, SitemapError> {
    match name {
        b"urlset" => Ok(Root::UrlSet),
        b"sitemapindex" => Ok(Root::Index),
        other => Err(SitemapError::NotASitemap(
            String::from_utf8_lossy(other).into_owned(),
        )),
    }
}

#[derive(Default)]
struct Fields {
    loc: String,
    lastmod: String,
}

impl Fields {
    fn push_text(&mut self, stack: &[Vec<u8>], text: &str) {
        if stack.len() != 3 {
            return;
        }
        match stack[2].as_slice() {
            b"loc" => self.loc.push_str(text),
            b"lastmod" => self.lastmod.push_str(text),
            _ => {}
        }
    }

    fn take(&mut self) -> (String, Option<String>) {
        let loc = self.loc.trim().to_string();
        let lastmod = self.lastmod.trim().to_string();
        self.loc.clear();
        self.lastmod.clear();
        (loc, if lastmod.is_empty() { None } else { Some(lastmod) })
    }
}

/// Parse a sitemap document
///
/// # Arguments
///
/// * `xml` - The sitemap XML
///
/// # Returns
///
/// The entries of a urlset, or the child sitemap URLs of an index, in
/// document order
pub fn parse_sitemap(xml: &str) -> Result<SitemapDocument, SitemapError> {
    let mut reader = Reader::from_str(xml.trim_start_matches('\u{feff}'));
    reader.config_mut().trim_text(true);

    let mut root = None;
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut fields = Fields::default();
    let mut urls = Vec::new();
    let mut sitemaps = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.local_name().as_ref().to_vec();
                if root.is_none() {
                    root = Some(root_kind(&name)?);
                }
                stack.push(name);
            }
            Ok(Event::Empty(e)) => {
                if root.is_none() {
                    root = Some(root_kind(e.local_name().as_ref())?);
                }
            }
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| SitemapError::Xml(e.to_string()))?;
                fields.push_text(&stack, &text);
            }
            Ok(Event::CData(c)) => {
                let raw = c.into_inner();
                fields.push_text(&stack, &String::from_utf8_lossy(&raw));
            }
            Ok(Event::End(_)) => {
                let name = stack.pop().unwrap_or_default();
                if stack.len() == 1 {
                    match name.as_slice() {
                        b"url" => {
                            let (loc, lastmod) = fields.take();
                            if !loc.is_empty() {
                                urls.push(SitemapEntry { loc, lastmod });
                            }
                        }
                        b"sitemap" => {
                            let (loc, _) = fields.take();
                            if !loc.is_empty() {
                                sitemaps.push(loc);
                            }
                        }
                        _ => {}
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(SitemapError::Xml(format!(
                    "error at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
        }
    }

    match root {
        Some(Root::UrlSet) => Ok(SitemapDocument::UrlSet(urls)),
        Some(Root::Index) => Ok(SitemapDocument::Index(sitemaps)),
        None => Err(SitemapError::Xml("document has no root element".to_string())),
    }
}
