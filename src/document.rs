//! Document rendering.
//!
//! Builds the Quarto page for one entry: a YAML front matter block with
//! title, authors, date, venue, optional image and an `about` section with
//! links, followed by the abstract as the page body.

use std::path::{Path, PathBuf};

use crate::author::{format_author, split_authors};
use crate::bibtex::Entry;
use crate::fields::{escape_yaml_string, format_date, format_title, venue_details};
use crate::sink::OutputSink;

/// Image extensions probed for an entry, in priority order.
pub const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Looks for `<id>.<ext>` in `image_dir`, returning the first match.
pub fn find_image<S: OutputSink + ?Sized>(sink: &S, image_dir: &Path, id: &str) -> Option<PathBuf> {
    IMAGE_EXTENSIONS
        .iter()
        .map(|ext| image_dir.join(format!("{}.{}", id, ext)))
        .find(|path| sink.exists(path))
}

/// Renders the full document for an entry.
///
/// `image` is the asset path relative to the site root; it is written
/// relative to the document, two levels down.
pub fn render_document(entry: &Entry, image: Option<&Path>, about_template: &str) -> String {
    let mut out = String::from("---\n");

    let title = format_title(&escape_yaml_string(entry.get("title").unwrap_or_default()));
    out.push_str(&format!("title: \"{}\"\n", title));

    match entry.get("author") {
        Some(authors) => {
            out.push_str("author:\n");
            for author in split_authors(authors) {
                out.push_str(&format!("  - {}\n", format_author(author)));
            }
        }
        None => out.push_str("author: []\n"),
    }

    let date = format_date(entry.get("date").unwrap_or_default());
    out.push_str(format!("date: {}", date).trim_end());
    out.push('\n');

    let details = format_title(&escape_yaml_string(&venue_details(entry)));
    out.push_str(&format!("details: \"{}\"\n", details));

    if let Some(image) = image {
        let image = image.to_string_lossy().replace('\\', "/");
        out.push_str(&format!("image: ../../{}\n", image));
    }

    out.push_str("\nabout:\n");
    out.push_str(&format!("  template: {}\n", about_template));

    let links = links(entry);
    if !links.is_empty() {
        out.push_str("  links:\n");
        for link in &links {
            render_link(link, &mut out);
        }
    }

    out.push_str("\nformat:\n  html:\n    page-layout: full\n");
    out.push_str("---");

    if let Some(abstract_text) = entry.get("abstract") {
        out.push_str("\n\n");
        out.push_str(abstract_text);
    }

    out
}

/// One item of the `links` list: ordered key/value pairs.
type Link = Vec<(&'static str, String)>;

fn links(entry: &Entry) -> Vec<Link> {
    let is_open = entry.get("open") == Some("true");
    let mut links = Vec::new();

    if let Some(doi) = entry.get("doi") {
        let text = if is_open {
            format!("'DOI: {} (Open Access)'", doi)
        } else {
            format!("'DOI: {}'", doi)
        };
        links.push(vec![
            ("text", text),
            ("href", format!("https://doi.org/{}", doi)),
            ("icon", "link".to_string()),
        ]);
    } else if let Some(url) = entry.get("url") {
        let text = if is_open { "'Open Access'" } else { "'Link'" };
        links.push(vec![
            ("href", url.to_string()),
            ("icon", "link".to_string()),
            ("text", text.to_string()),
        ]);
    }

    if let Some(repo) = entry.get("repo") {
        links.push(vec![
            ("icon", "github".to_string()),
            ("text", "Code".to_string()),
            ("href", repo.to_string()),
        ]);
    }

    if let Some(preprint) = entry.get("preprint") {
        links.push(vec![
            ("text", "Preprint".to_string()),
            ("icon", "file-pdf".to_string()),
            ("href", preprint.to_string()),
        ]);
    }

    links
}

fn render_link(link: &[(&'static str, String)], out: &mut String) {
    for (i, (key, value)) in link.iter().enumerate() {
        let marker = if i == 0 { "    - " } else { "      " };
        out.push_str(&format!("{}{}: {}\n", marker, key, value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;

    fn sample_article() -> Entry {
        Entry::new("article", "ab:2020")
            .with_field("title", "a study of {X-Ray} diffusion")
            .with_field("author", "Doe, Jane")
            .with_field("date", "2020")
            .with_field("journaltitle", "Physics Letters")
            .with_field("doi", "10.1/xyz")
            .with_field("open", "true")
    }

    #[test]
    fn test_render_full_article() {
        // Given: a complete article entry
        let entry = sample_article();

        // When: we render it without an image
        let doc = render_document(&entry, None, "solana");

        // Then: the front matter matches the expected layout exactly
        let expected = "---
title: \"A Study of X-Ray Diffusion\"
author:
  - Jane Doe
date: 2020-01-01
details: \"Physics Letters\"

about:
  template: solana
  links:
    - text: 'DOI: 10.1/xyz (Open Access)'
      href: https://doi.org/10.1/xyz
      icon: link

format:
  html:
    page-layout: full
---";
        assert_eq!(doc, expected);
    }

    #[test]
    fn test_render_multiple_authors_in_order() {
        let entry = Entry::new("misc", "k")
            .with_field("author", "Doe, Jane and family=Smith, given=John and Plato");

        let doc = render_document(&entry, None, "solana");

        assert!(
            doc.contains("author:\n  - Jane Doe\n  - John Smith\n  - Plato\n"),
            "got:\n{}",
            doc
        );
    }

    #[test]
    fn test_render_without_links_or_abstract() {
        let entry = Entry::new("misc", "k").with_field("title", "Bare");

        let doc = render_document(&entry, None, "solana");

        assert!(!doc.contains("links:"));
        assert!(doc.contains("details: \"\"\n"));
        assert!(doc.contains("author: []\n"));
        assert!(doc.contains("\ndate:\n"));
        assert!(doc.ends_with("page-layout: full\n---"));
    }

    #[test]
    fn test_render_abstract_body() {
        let entry = Entry::new("misc", "k").with_field("abstract", "We show *things*: \\& more.");

        let doc = render_document(&entry, None, "solana");

        assert!(doc.ends_with("---\n\nWe show *things*: \\& more."));
    }

    #[test]
    fn test_render_closed_doi() {
        let entry = Entry::new("article", "k").with_field("doi", "10.2/abc");
        let doc = render_document(&entry, None, "solana");
        assert!(doc.contains("    - text: 'DOI: 10.2/abc'\n      href: https://doi.org/10.2/abc\n      icon: link\n"));
    }

    #[test]
    fn test_render_url_only_when_no_doi() {
        let with_url = Entry::new("online", "k")
            .with_field("url", "https://example.org/paper")
            .with_field("open", "true");
        let doc = render_document(&with_url, None, "solana");
        assert!(doc.contains(
            "    - href: https://example.org/paper\n      icon: link\n      text: 'Open Access'\n"
        ));

        let closed = Entry::new("online", "k").with_field("url", "https://example.org/paper");
        assert!(render_document(&closed, None, "solana").contains("      text: 'Link'\n"));

        let both = Entry::new("online", "k")
            .with_field("url", "https://example.org/paper")
            .with_field("doi", "10.3/q");
        let doc = render_document(&both, None, "solana");
        assert!(!doc.contains("example.org"));
        assert!(doc.contains("https://doi.org/10.3/q"));
    }

    #[test]
    fn test_render_repo_and_preprint_links_follow_doi() {
        let entry = Entry::new("article", "k")
            .with_field("doi", "10.1/a")
            .with_field("repo", "https://github.com/x/y")
            .with_field("preprint", "https://arxiv.org/pdf/1")
            .with_field("abstract", "Body.");

        let doc = render_document(&entry, None, "solana");

        let expected_links = "  links:
    - text: 'DOI: 10.1/a'
      href: https://doi.org/10.1/a
      icon: link
    - icon: github
      text: Code
      href: https://github.com/x/y
    - text: Preprint
      icon: file-pdf
      href: https://arxiv.org/pdf/1

format:
  html:
    page-layout: full
---

Body.";
        assert!(doc.ends_with(expected_links), "got:\n{}", doc);
    }

    #[test]
    fn test_render_image_and_template() {
        let entry = Entry::new("misc", "k");

        let doc = render_document(&entry, Some(Path::new("_assets/img/pubs/k.jpg")), "custom");

        assert!(doc.contains("details: \"\"\nimage: ../../_assets/img/pubs/k.jpg\n\nabout:\n  template: custom\n"));
    }

    #[test]
    fn test_render_title_unescapes_before_casing() {
        let entry = Entry::new("inproceedings", "k")
            .with_field("title", r"research \& development\: a review")
            .with_field("booktitle", r"proceedings of {ACM} \& friends");

        let doc = render_document(&entry, None, "solana");

        assert!(doc.contains("title: \"Research & Development: A Review\"\n"), "got:\n{}", doc);
        assert!(doc.contains("details: \"Proceedings of ACM & Friends\"\n"), "got:\n{}", doc);
    }

    #[test]
    fn test_find_image_priority() {
        let dir = Path::new("_assets/img/pubs");
        let sink = MemorySink::new()
            .with_asset("_assets/img/pubs/k.jpeg")
            .with_asset("_assets/img/pubs/k.jpg");

        assert_eq!(
            find_image(&sink, dir, "k"),
            Some(PathBuf::from("_assets/img/pubs/k.jpg"))
        );
        assert_eq!(find_image(&sink, dir, "other"), None);
    }
}
