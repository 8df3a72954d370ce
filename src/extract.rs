//! Result extraction from search result HTML.
//!
//! Result markup is not a stable contract, so every step is an ordered list
//! of rules tried in priority order with first-match-wins semantics:
//!
//! 1. **Containers**: each entry of [`CONTAINER_RULES`] is a selector group.
//!    The first group that matches anything on the page is used for the
//!    whole page; later groups are not consulted.
//! 2. **Title**: [`TITLE_RULES`] are tried inside a container until one
//!    yields visible text. Containers without a title are dropped.
//! 3. **Abstract**: [`ABSTRACT_RULES`] are tried the same way. A container
//!    with no abstract is kept with an empty one.

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};
use tracing::trace;

use crate::result::Candidate;
use crate::text::clean;
use crate::{Result, SearchError};

/// Container predicates, most specific first.
pub const CONTAINER_RULES: &[&str] = &[
    "div.result, div.c-container",
    "div.result-op, div.xpath-log",
    "#content_left > div[mu], #content_left > div[tpl]",
];

/// How a title is pulled out of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleRule {
    /// Text and `href` of the first anchor matching the selector.
    Anchor(&'static str),
    /// Text of the first element matching the selector. The link comes
    /// from an anchor inside it, or from the container.
    Text(&'static str),
}

impl TitleRule {
    fn css(&self) -> &'static str {
        match self {
            TitleRule::Anchor(css) | TitleRule::Text(css) => css,
        }
    }
}

/// Title rules in priority order.
pub const TITLE_RULES: &[TitleRule] = &[
    TitleRule::Anchor("h3.t > a"),
    TitleRule::Anchor("h3 a"),
    TitleRule::Anchor(".c-title a, a.c-title"),
    TitleRule::Text("h3"),
    TitleRule::Anchor("a[data-title]"),
];

/// How an abstract is pulled out of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbstractRule {
    /// Text of the first element matching the selector.
    First(&'static str),
    /// All text under every element matching the selector, space-joined.
    AllText(&'static str),
}

impl AbstractRule {
    fn css(&self) -> &'static str {
        match self {
            AbstractRule::First(css) | AbstractRule::AllText(css) => css,
        }
    }
}

/// Abstract rules: primary snippet, generic content blocks, then everything
/// under any snippet-like node.
pub const ABSTRACT_RULES: &[AbstractRule] = &[
    AbstractRule::First(".c-abstract"),
    AbstractRule::First("[class*='content-right'], .c-span-last"),
    AbstractRule::First(".c-font-normal, .c-color-text"),
    AbstractRule::AllText("[class*='snippet'], [class*='abstract'], .c-row"),
];

/// A parsed HTML page.
pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    /// Parses a full HTML document. Parsing is lenient and never fails.
    pub fn parse(text: &str) -> Self {
        Self {
            html: Html::parse_document(text),
        }
    }

    /// Returns the outermost elements matching `selector`.
    ///
    /// An element nested inside another match is skipped so one result block
    /// never yields two containers.
    pub fn find_containers(&self, selector: &Selector) -> Vec<ElementRef<'_>> {
        let matched: Vec<ElementRef<'_>> = self.html.select(selector).collect();
        let ids: HashSet<_> = matched.iter().map(|el| el.id()).collect();
        matched
            .into_iter()
            .filter(|el| !el.ancestors().any(|node| ids.contains(&node.id())))
            .collect()
    }
}

/// One result block located on a page.
#[derive(Debug, Clone, Copy)]
pub struct RawContainer<'a> {
    element: ElementRef<'a>,
    rule: usize,
}

impl RawContainer<'_> {
    /// Index into the container rule list that located this block.
    pub fn rule(&self) -> usize {
        self.rule
    }
}

/// Compiled extraction rules.
pub struct ExtractionEngine {
    containers: Vec<Selector>,
    titles: Vec<(TitleRule, Selector)>,
    abstracts: Vec<(AbstractRule, Selector)>,
    link: Selector,
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| SearchError::Parse(format!("Failed to parse selector '{}': {:?}", css, e)))
}

impl ExtractionEngine {
    /// Compiles the built-in rule lists.
    pub fn new() -> Result<Self> {
        Self::with_rules(CONTAINER_RULES, TITLE_RULES, ABSTRACT_RULES)
    }

    /// Compiles custom rule lists, keeping their order.
    pub fn with_rules(
        containers: &[&str],
        titles: &[TitleRule],
        abstracts: &[AbstractRule],
    ) -> Result<Self> {
        Ok(Self {
            containers: containers
                .iter()
                .map(|css| selector(css))
                .collect::<Result<_>>()?,
            titles: titles
                .iter()
                .map(|rule| -> Result<(TitleRule, Selector)> { Ok((*rule, selector(rule.css())?)) })
                .collect::<Result<_>>()?,
            abstracts: abstracts
                .iter()
                .map(|rule| -> Result<(AbstractRule, Selector)> {
                    Ok((*rule, selector(rule.css())?))
                })
                .collect::<Result<_>>()?,
            link: selector("a[href]")?,
        })
    }

    /// Locates result containers using the first container rule that matches.
    pub fn extract_containers<'a>(&self, doc: &'a HtmlDocument) -> Vec<RawContainer<'a>> {
        for (rule, selector) in self.containers.iter().enumerate() {
            let found = doc.find_containers(selector);
            if !found.is_empty() {
                trace!("Container rule {} matched {} blocks", rule, found.len());
                return found
                    .into_iter()
                    .map(|element| RawContainer { element, rule })
                    .collect();
            }
        }
        Vec::new()
    }

    /// Pulls the raw title, abstract and link out of one container.
    ///
    /// The title is empty when no title rule matched.
    pub fn extract_candidate(&self, container: &RawContainer<'_>) -> Candidate {
        let element = container.element;
        let mut candidate = Candidate::default();

        for (rule, selector) in &self.titles {
            let Some(matched) = element.select(selector).next() else {
                continue;
            };
            let text = element_text(matched);
            if clean(&text).is_empty() {
                continue;
            }
            candidate.raw_title = text;
            candidate.raw_href = match rule {
                TitleRule::Anchor(_) => matched.value().attr("href").unwrap_or_default().to_string(),
                TitleRule::Text(_) => matched
                    .select(&self.link)
                    .next()
                    .and_then(|a| a.value().attr("href"))
                    .unwrap_or_default()
                    .to_string(),
            };
            break;
        }

        if candidate.raw_href.trim().is_empty() {
            candidate.raw_href = self.fallback_href(element);
        }

        for (rule, selector) in &self.abstracts {
            let text = match rule {
                AbstractRule::First(_) => element
                    .select(selector)
                    .next()
                    .map(element_text)
                    .unwrap_or_default(),
                AbstractRule::AllText(_) => element
                    .select(selector)
                    .map(element_text)
                    .collect::<Vec<_>>()
                    .join(" "),
            };
            if !clean(&text).is_empty() {
                candidate.raw_abstract = text;
                break;
            }
        }

        candidate
    }

    /// Parses `html` and returns one candidate per container that has a title.
    pub fn extract_candidates(&self, html: &str) -> Vec<Candidate> {
        let doc = HtmlDocument::parse(html);
        self.extract_containers(&doc)
            .iter()
            .filter_map(|container| {
                let candidate = self.extract_candidate(container);
                if clean(&candidate.raw_title).is_empty() {
                    trace!("Dropping container without a title (rule {})", container.rule());
                    None
                } else {
                    Some(candidate)
                }
            })
            .collect()
    }

    /// Container `mu` attribute, then the first link inside the container.
    fn fallback_href(&self, element: ElementRef<'_>) -> String {
        if let Some(mu) = element.value().attr("mu").filter(|mu| !mu.trim().is_empty()) {
            return mu.to_string();
        }
        element
            .select(&self.link)
            .filter_map(|a| a.value().attr("href"))
            .find(|href| !href.trim().is_empty())
            .unwrap_or_default()
            .to_string()
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join("")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> ExtractionEngine {
        ExtractionEngine::new().unwrap()
    }

    #[test]
    fn test_builtin_rules_compile() {
        assert!(ExtractionEngine::new().is_ok());
    }

    #[test]
    fn test_invalid_rule_is_parse_error() {
        let result = ExtractionEngine::with_rules(&["div..bad"], TITLE_RULES, ABSTRACT_RULES);
        assert!(matches!(result, Err(SearchError::Parse(_))));
    }

    #[test]
    fn test_empty_html() {
        assert!(engine().extract_candidates("<html><body></body></html>").is_empty());
        assert!(engine().extract_candidates("").is_empty());
    }

    #[test]
    fn test_primary_containers() {
        let html = r#"
            <div id="content_left">
                <div class="result c-container" mu="https://www.rust-lang.org/">
                    <h3 class="t"><a href="http://www.baidu.com/link?url=aaa">Rust 编程语言</a></h3>
                    <div class="c-abstract">一门赋予每个人构建可靠软件能力的语言。</div>
                </div>
                <div class="c-container">
                    <h3 class="t"><a href="http://www.baidu.com/link?url=bbb">Rust 程序设计语言</a></h3>
                    <div class="c-abstract">Rust 官方教程。</div>
                </div>
            </div>
        "#;
        let candidates = engine().extract_candidates(html);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].raw_title, "Rust 编程语言");
        assert_eq!(candidates[0].raw_href, "http://www.baidu.com/link?url=aaa");
        assert_eq!(candidates[0].raw_abstract, "一门赋予每个人构建可靠软件能力的语言。");
        assert_eq!(candidates[1].raw_title, "Rust 程序设计语言");
    }

    #[test]
    fn test_container_fallback_chain_is_not_a_union() {
        let html = r#"
            <div class="result"><h3><a href="/a">First</a></h3></div>
            <div class="result-op"><h3><a href="/b">Second</a></h3></div>
        "#;
        let doc = HtmlDocument::parse(html);
        let containers = engine().extract_containers(&doc);
        assert_eq!(containers.len(), 1);
        assert_eq!(containers[0].rule(), 0);
    }

    #[test]
    fn test_container_fallback_used_when_primary_missing() {
        let html = r#"
            <div class="result-op"><h3><a href="/b">Second</a></h3></div>
            <div class="xpath-log"><h3><a href="/c">Third</a></h3></div>
        "#;
        let doc = HtmlDocument::parse(html);
        let eng = engine();
        let containers = eng.extract_containers(&doc);
        assert_eq!(containers.len(), 2);
        assert!(containers.iter().all(|c| c.rule() == 1));
        assert_eq!(eng.extract_candidate(&containers[1]).raw_title, "Third");
    }

    #[test]
    fn test_last_container_rule() {
        let html = r#"
            <div id="content_left">
                <div tpl="www_normal"><h3><a href="/x">Generic block</a></h3></div>
            </div>
        "#;
        let doc = HtmlDocument::parse(html);
        let containers = engine().extract_containers(&doc);
        assert_eq!(containers.len(), 1);
        assert_eq!(containers[0].rule(), 2);
    }

    #[test]
    fn test_nested_containers_counted_once() {
        let html = r#"
            <div class="c-container">
                <div class="result"><h3><a href="/a">Inner</a></h3></div>
            </div>
        "#;
        let candidates = engine().extract_candidates(html);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].raw_title, "Inner");
    }

    #[test]
    fn test_title_rule_priority() {
        let html = r#"
            <div class="result">
                <div class="c-title"><a href="/low">Lower priority</a></div>
                <h3 class="t"><a href="/high">Higher priority</a></h3>
            </div>
        "#;
        let candidates = engine().extract_candidates(html);
        assert_eq!(candidates[0].raw_title, "Higher priority");
        assert_eq!(candidates[0].raw_href, "/high");
    }

    #[test]
    fn test_title_skips_rule_with_invisible_text() {
        let html = "<div class=\"result\">\
            <h3 class=\"t\"><a href=\"/empty\">\u{200B} </a></h3>\
            <div class=\"c-title\"><a href=\"/real\">Real title</a></div>\
            </div>";
        let candidates = engine().extract_candidates(html);
        assert_eq!(candidates[0].raw_title, "Real title");
        assert_eq!(candidates[0].raw_href, "/real");
    }

    #[test]
    fn test_text_title_rule_uses_container_link() {
        let html = r#"
            <div class="result" mu="https://example.com/page">
                <h3>Plain heading</h3>
                <a href="/other">other</a>
            </div>
        "#;
        let candidates = engine().extract_candidates(html);
        assert_eq!(candidates[0].raw_title, "Plain heading");
        assert_eq!(candidates[0].raw_href, "https://example.com/page");
    }

    #[test]
    fn test_href_falls_back_to_first_link() {
        let html = r#"
            <div class="result">
                <h3>Heading only</h3>
                <a href="">empty</a>
                <a href="https://example.com/first">first</a>
            </div>
        "#;
        let candidates = engine().extract_candidates(html);
        assert_eq!(candidates[0].raw_href, "https://example.com/first");
    }

    #[test]
    fn test_container_without_title_is_dropped() {
        let html = r#"
            <div class="result"><div class="c-abstract">No title here</div></div>
            <div class="result"><h3><a href="/ok">Kept</a></h3></div>
        "#;
        let candidates = engine().extract_candidates(html);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].raw_title, "Kept");
    }

    #[test]
    fn test_container_without_abstract_is_kept() {
        let html = r#"<div class="result"><h3><a href="/ok">Title</a></h3></div>"#;
        let candidates = engine().extract_candidates(html);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].raw_abstract, "");
    }

    #[test]
    fn test_abstract_generic_content_fallback() {
        let html = r#"
            <div class="result">
                <h3><a href="/a">Title</a></h3>
                <div class="content-right_8Zs40">Generic content text</div>
                <div class="c-row">Row text</div>
            </div>
        "#;
        let candidates = engine().extract_candidates(html);
        assert_eq!(candidates[0].raw_abstract, "Generic content text");
    }

    #[test]
    fn test_abstract_primary_beats_fallbacks() {
        let html = r#"
            <div class="result">
                <h3><a href="/a">Title</a></h3>
                <div class="c-span-last">Generic</div>
                <div class="c-abstract">Primary</div>
            </div>
        "#;
        let candidates = engine().extract_candidates(html);
        assert_eq!(candidates[0].raw_abstract, "Primary");
    }

    #[test]
    fn test_abstract_last_resort_collects_all_snippet_text() {
        let html = r#"
            <div class="result">
                <h3><a href="/a">Title</a></h3>
                <div class="c-row">first part</div>
                <div class="c-row"><span>second</span> part</div>
            </div>
        "#;
        let candidates = engine().extract_candidates(html);
        assert_eq!(candidates[0].raw_abstract, "first part second part");
    }

    #[test]
    fn test_title_with_markup() {
        let html = r#"<div class="result"><h3 class="t"><a href="/a"><em>Rust</em> 官网</a></h3></div>"#;
        let candidates = engine().extract_candidates(html);
        assert_eq!(candidates[0].raw_title, "Rust 官网");
    }
}
