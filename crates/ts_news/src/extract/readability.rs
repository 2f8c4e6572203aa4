//! Readability-style main content detection.
//!
//! Paragraph-like elements award points to their parent and grandparent; the
//! best scoring container (discounted by link density) is taken as the article
//! body, together with any sibling that scores close enough to it. The result
//! is the markup of the container's block elements separated by blank lines,
//! ready for [`super::clean::clean_text`].

use lazy_static::lazy_static;
use regex::Regex;
use scraper::node::Element;
use scraper::{ElementRef, Html, Selector};

lazy_static! {
    static ref PARAGRAPHS: Selector = Selector::parse("p, pre, blockquote").unwrap();
    static ref BLOCKS: Selector =
        Selector::parse("h1, h2, h3, h4, h5, h6, p, pre, blockquote, li").unwrap();
    static ref LINKS: Selector = Selector::parse("a").unwrap();
    static ref FALLBACK_CONTAINERS: Selector =
        Selector::parse("article, main, [role='main']").unwrap();
    static ref UNLIKELY: Regex = Regex::new(
        r"(?i)comment|sidebar|footer|masthead|menu|nav|share|social|related|promo|sponsor|advert|cookie|popup|newsletter|subscribe"
    )
    .unwrap();
    static ref LIKELY: Regex =
        Regex::new(r"(?i)article|body|content|entry|main|post|story|text").unwrap();
}

const SKIPPED_TAGS: [&str; 11] = [
    "script", "style", "noscript", "nav", "header", "footer", "aside", "form", "iframe", "svg",
    "button",
];
const BLOCK_TAGS: [&str; 10] = ["h1", "h2", "h3", "h4", "h5", "h6", "p", "pre", "blockquote", "li"];

/// Finds the main content of `html`, returning `None` when nothing usable is found.
pub fn extract_content(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    let content = match Candidates::score(&document).containers() {
        Some(containers) => containers
            .into_iter()
            .map(collect_blocks)
            .collect::<Vec<_>>()
            .join("\n\n"),
        None => fallback(&document)?,
    };

    if content.trim().is_empty() {
        None
    } else {
        Some(content)
    }
}

struct Candidates<'a> {
    /// Kept in first-scored order so tie-breaking is stable across runs.
    scored: Vec<(ElementRef<'a>, f64)>,
}

impl<'a> Candidates<'a> {
    fn score(document: &'a Html) -> Self {
        let mut candidates = Self { scored: Vec::new() };

        for paragraph in document.select(&PARAGRAPHS) {
            if is_unlikely(&paragraph)
                || paragraph
                    .ancestors()
                    .filter_map(ElementRef::wrap)
                    .any(|a| is_unlikely(&a))
            {
                continue;
            }
            let text = normalized_text(&paragraph);
            if text.is_empty() {
                continue;
            }

            let commas = text.matches(',').count() as f64;
            let length_bonus = (text.chars().count() as f64 / 100.0).min(3.0);
            let score = 1.0 + commas + length_bonus;

            for (depth, ancestor) in paragraph
                .ancestors()
                .filter_map(ElementRef::wrap)
                .take(2)
                .enumerate()
            {
                let share = if depth == 0 { score } else { score / 2.0 };
                candidates.add(ancestor, share);
            }
        }

        candidates
    }

    fn add(&mut self, element: ElementRef<'a>, points: f64) {
        match self.scored.iter_mut().find(|(el, _)| el.id() == element.id()) {
            Some((_, score)) => *score += points,
            None => self
                .scored
                .push((element, initial_score(element.value()) + points)),
        }
    }

    fn final_score(&self, element: &ElementRef<'a>) -> Option<f64> {
        self.scored
            .iter()
            .find(|(el, _)| el.id() == element.id())
            .map(|(el, score)| score * (1.0 - link_density(el)))
    }

    /// The top candidate plus qualifying siblings, in document order.
    fn containers(&self) -> Option<Vec<ElementRef<'a>>> {
        let (top, top_score) = self
            .scored
            .iter()
            .filter_map(|(el, _)| self.final_score(el).map(|s| (*el, s)))
            .fold(None, |best: Option<(ElementRef<'a>, f64)>, (el, score)| match best {
                Some((_, best_score)) if best_score >= score => best,
                _ => Some((el, score)),
            })?;

        let Some(parent) = top.parent() else {
            return Some(vec![top]);
        };
        let threshold = (top_score * 0.2).max(10.0);
        let containers = parent
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|sibling| {
                sibling.id() == top.id()
                    || self.final_score(sibling).is_some_and(|score| score >= threshold)
            })
            .collect();
        Some(containers)
    }
}

fn initial_score(element: &Element) -> f64 {
    let tag_score = match element.name() {
        "article" | "main" => 10.0,
        "div" | "section" => 5.0,
        "pre" | "td" | "blockquote" => 3.0,
        "ul" | "ol" | "dl" | "form" | "address" => -3.0,
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "th" => -5.0,
        _ => 0.0,
    };
    tag_score + class_weight(element)
}

fn class_weight(element: &Element) -> f64 {
    [element.attr("class"), element.id()]
        .into_iter()
        .flatten()
        .map(|value| {
            let mut weight = 0.0;
            if UNLIKELY.is_match(value) {
                weight -= 25.0;
            }
            if LIKELY.is_match(value) {
                weight += 25.0;
            }
            weight
        })
        .sum()
}

fn is_unlikely(element: &ElementRef) -> bool {
    let value = element.value();
    match value.name() {
        "html" | "body" => false,
        name if SKIPPED_TAGS.contains(&name) => true,
        _ => [value.attr("class"), value.id()]
            .into_iter()
            .flatten()
            .any(|v| UNLIKELY.is_match(v) && !LIKELY.is_match(v)),
    }
}

fn normalized_text(element: &ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn link_density(element: &ElementRef) -> f64 {
    let total = normalized_text(element).chars().count();
    if total == 0 {
        return 0.0;
    }
    let linked: usize = element
        .select(&LINKS)
        .map(|a| normalized_text(&a).chars().count())
        .sum();
    (linked as f64 / total as f64).min(1.0)
}

/// Markup of every outermost block inside `container`, one per paragraph.
fn collect_blocks(container: ElementRef) -> String {
    container
        .select(&BLOCKS)
        .filter(|block| !normalized_text(block).is_empty())
        .filter(|block| {
            block
                .ancestors()
                .take_while(|node| node.id() != container.id())
                .filter_map(ElementRef::wrap)
                .all(|a| !is_unlikely(&a) && !BLOCK_TAGS.contains(&a.value().name()))
        })
        .filter(|block| !is_unlikely(block))
        .map(|block| block.html())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn fallback(document: &Html) -> Option<String> {
    let container = document
        .select(&FALLBACK_CONTAINERS)
        .find(|el| !normalized_text(el).is_empty())?;
    let blocks = collect_blocks(container);
    Some(if blocks.is_empty() { container.inner_html() } else { blocks })
}
