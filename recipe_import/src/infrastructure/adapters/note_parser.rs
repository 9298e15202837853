// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Heuristic Note Parser
//!
//! Minimal structural [`NoteParser`]: title from the first `<h1>` (falling
//! back to `<title>`), ingredient lines from unordered-list items,
//! instruction lines from ordered-list items, image references from
//! `<img src>`. The real extraction engine lives upstream of this
//! platform; this adapter exists so the notes pipeline has a working
//! collaborator in development and tests.

use once_cell::sync::Lazy;
use regex::Regex;

use recipe_import_domain::services::{NoteParser, ParsedImageRef, ParsedNote};
use recipe_import_domain::ImportError;

static H1: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<h1[^>]*>(.*?)</h1>").expect("static regex"));
static TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("static regex"));
static UL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<ul[^>]*>(.*?)</ul>").expect("static regex"));
static OL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<ol[^>]*>(.*?)</ol>").expect("static regex"));
static LI: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<li[^>]*>(.*?)</li>").expect("static regex"));
static IMG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?is)<img[^>]+src\s*=\s*["']([^"']+)["']"#).expect("static regex"));
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]+>").expect("static regex"));

pub struct HeuristicNoteParser;

impl HeuristicNoteParser {
    pub fn new() -> Self {
        Self
    }

    fn strip_tags(fragment: &str) -> String {
        let text = TAG.replace_all(fragment, " ");
        let text = text
            .replace("&amp;", "&")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#39;", "'")
            .replace("&nbsp;", " ");
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn list_items(list_body: &str) -> Vec<String> {
        LI.captures_iter(list_body)
            .map(|c| Self::strip_tags(&c[1]))
            .filter(|line| !line.is_empty())
            .collect()
    }
}

impl Default for HeuristicNoteParser {
    fn default() -> Self {
        Self::new()
    }
}

impl NoteParser for HeuristicNoteParser {
    fn parse(&self, html: &str) -> Result<ParsedNote, ImportError> {
        if html.trim().is_empty() {
            return Err(ImportError::parsing("note HTML is empty"));
        }

        let title = H1
            .captures(html)
            .or_else(|| TITLE.captures(html))
            .map(|c| Self::strip_tags(&c[1]))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Untitled".to_string());

        let ingredients = UL
            .captures_iter(html)
            .flat_map(|c| Self::list_items(&c[1]))
            .collect::<Vec<_>>();

        let instructions = OL
            .captures_iter(html)
            .flat_map(|c| Self::list_items(&c[1]))
            .collect::<Vec<_>>();

        let images = IMG
            .captures_iter(html)
            .map(|c| {
                let location = c[1].to_string();
                let filename = location
                    .rsplit('/')
                    .next()
                    .unwrap_or(location.as_str())
                    .to_string();
                ParsedImageRef { location, filename }
            })
            .collect();

        Ok(ParsedNote {
            title,
            ingredients,
            instructions,
            images,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        <html><head><title>Fallback Title</title></head><body>
        <h1>Pea &amp; Mint Soup</h1>
        <img src="/staged/i1/soup.jpg" alt="soup">
        <ul>
            <li>2 cups <b>peas</b></li>
            <li>1 bunch mint</li>
        </ul>
        <ol>
            <li>Boil the peas.</li>
            <li>Blend with mint.</li>
        </ol>
        </body></html>
    "#;

    #[test]
    fn test_extracts_title_ingredients_instructions_images() {
        let parsed = HeuristicNoteParser::new().parse(SAMPLE).unwrap();
        assert_eq!(parsed.title, "Pea & Mint Soup");
        assert_eq!(parsed.ingredients, vec!["2 cups peas", "1 bunch mint"]);
        assert_eq!(parsed.instructions, vec!["Boil the peas.", "Blend with mint."]);
        assert_eq!(parsed.images.len(), 1);
        assert_eq!(parsed.images[0].filename, "soup.jpg");
        assert_eq!(parsed.images[0].location, "/staged/i1/soup.jpg");
    }

    #[test]
    fn test_title_falls_back_to_title_tag() {
        let html = "<html><head><title>Only Title</title></head><body><p>x</p></body></html>";
        let parsed = HeuristicNoteParser::new().parse(html).unwrap();
        assert_eq!(parsed.title, "Only Title");
    }

    #[test]
    fn test_untitled_when_no_heading() {
        let parsed = HeuristicNoteParser::new().parse("<p>just text</p>").unwrap();
        assert_eq!(parsed.title, "Untitled");
        assert!(parsed.ingredients.is_empty());
    }

    #[test]
    fn test_empty_html_is_a_parse_error() {
        let err = HeuristicNoteParser::new().parse("   ").unwrap_err();
        assert!(!err.is_retryable());
    }
}
