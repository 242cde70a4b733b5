use super::error::ExportError;
use crate::crawler::{CanonicalStatus, PageMetadata};
use crate::search::RelatedPage;
use crate::sitemap::SitemapEntry;
use serde::Serialize;
use std::io::Write;
use termcolor::{Color, ColorSpec, WriteColor};

fn heading() -> ColorSpec {
    let mut spec = ColorSpec::new();
    spec.set_fg(Some(Color::Cyan)).set_bold(true);
    spec
}

fn fg(color: Color) -> ColorSpec {
    let mut spec = ColorSpec::new();
    spec.set_fg(Some(color));
    spec
}

fn dimmed() -> ColorSpec {
    let mut spec = ColorSpec::new();
    spec.set_dimmed(true);
    spec
}

fn write_colored<W: WriteColor>(out: &mut W, spec: &ColorSpec, text: &str) -> Result<(), ExportError> {
    out.set_color(spec)?;
    write!(out, "{}", text)?;
    out.reset()?;
    Ok(())
}

/// Print sitemap URLs, one per line
///
/// Returns the number of URLs printed.
pub fn display_sitemap<W: WriteColor>(
    out: &mut W,
    entries: &[SitemapEntry],
) -> Result<usize, ExportError> {
    write_colored(out, &heading(), &format!("Found {} URLs", entries.len()))?;
    writeln!(out)?;

    for entry in entries {
        write!(out, "{}", entry.loc)?;
        if let Some(lastmod) = &entry.lastmod {
            write!(out, "  ")?;
            write_colored(out, &dimmed(), lastmod)?;
        }
        writeln!(out)?;
    }

    Ok(entries.len())
}

/// Print a metadata block per page
///
/// Placeholders stand in for missing fields. Returns the number of pages
/// printed.
pub fn display_metadata<W: WriteColor>(
    out: &mut W,
    pages: &[PageMetadata],
) -> Result<usize, ExportError> {
    for page in pages {
        write_colored(out, &heading(), &page.url)?;
        writeln!(out)?;

        field(out, "Title", page.title_or_placeholder(), page.title.is_some())?;
        field(
            out,
            "Description",
            page.description_or_placeholder(),
            page.description.is_some(),
        )?;
        field(out, "H1", page.h1_or_placeholder(), page.h1.is_some())?;

        write!(out, "  Canonical: {} ", page.canonical_or_placeholder())?;
        let status_color = match page.canonical_status {
            CanonicalStatus::SelfReferencing => Color::Green,
            CanonicalStatus::Elsewhere => Color::Yellow,
            CanonicalStatus::Missing => Color::Red,
        };
        write_colored(
            out,
            &fg(status_color),
            &format!("({})", page.canonical_status),
        )?;
        writeln!(out)?;

        write!(out, "  Robots: {} ", page.robots_or_default())?;
        let label_color = if page.noindex() || page.nofollow() {
            Color::Red
        } else {
            Color::Green
        };
        write_colored(out, &fg(label_color), &format!("[{}]", page.robots_label()))?;
        writeln!(out)?;
        writeln!(out)?;
    }

    Ok(pages.len())
}

fn field<W: WriteColor>(out: &mut W, name: &str, value: &str, found: bool) -> Result<(), ExportError> {
    write!(out, "  {}: ", name)?;
    if found {
        write!(out, "{}", value)?;
    } else {
        write_colored(out, &fg(Color::Red), value)?;
    }
    writeln!(out)?;
    Ok(())
}

/// Print link suggestions for a target page
///
/// Returns the number of suggestions printed.
pub fn display_related<W: WriteColor>(
    out: &mut W,
    target: &str,
    related: &[RelatedPage],
) -> Result<usize, ExportError> {
    if related.is_empty() {
        writeln!(out, "No related pages found for {}.", target)?;
        return Ok(0);
    }

    write_colored(out, &heading(), &format!("Related pages for {}:", target))?;
    writeln!(out)?;

    for page in related {
        write!(out, "🔗 {} ", page.url)?;
        write_colored(out, &fg(Color::Green), &format!("({:.2})", page.score))?;
        if page.already_linked {
            write!(out, " ")?;
            write_colored(out, &dimmed(), "[already linked]")?;
        }
        writeln!(out)?;
    }

    Ok(related.len())
}

/// Write a value as pretty JSON followed by a newline
pub fn write_json<T, W>(out: &mut W, value: &T) -> Result<(), ExportError>
where
    T: Serialize + ?Sized,
    W: Write,
{
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}
