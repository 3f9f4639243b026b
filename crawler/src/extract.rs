//! HTML extraction for the question browser pages. Everything here is pure so
//! it can be checked against saved pages.

use context_core::question::{QuestionRecord, UNKNOWN_ANSWER};
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use url::Url;

/// Question text locations, most specific first.
pub const QUESTION_TEXT_SELECTORS: [&str; 4] = [
    "p.question-text",
    ".questionText",
    ".question > p:not([class])",
    "h1, h2, h3",
];

const CORRECT_ANSWER_CLASS: &str = "otazka_spravne";

lazy_static! {
    static ref QUESTION_ID: Regex = Regex::new(r"Otázka číslo (\d{8})").expect("valid regex");
    static ref QUESTION_LINK: Selector = selector("a[href^='?otazka=']");
    static ref QUESTION_TEXT: Vec<Selector> = QUESTION_TEXT_SELECTORS.iter().map(|s| selector(s)).collect();
    static ref QUESTION_IMAGE: Selector = selector("div.image-frame img");
    static ref ANSWER: Selector = selector("div.answer");
    static ref ANSWER_TEXT: Selector = selector("p");
    static ref ANSWER_IMAGE: Selector = selector("img");
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SkipReason {
    #[error("question id not found")]
    MissingId,
    #[error("question {0} has no answers")]
    NoAnswers(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnswerDraft {
    pub text: String,
    pub image: Option<Url>,
}

/// A question page before its image links have been checked.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionPage {
    pub id: String,
    pub text: String,
    pub image: Option<Url>,
    pub answers: Vec<AnswerDraft>,
    pub correct: i32,
}

impl QuestionPage {
    /// Every image URL that needs an existence check.
    pub fn image_urls(&self) -> Vec<&Url> {
        self.image.iter().chain(self.answers.iter().filter_map(|a| a.image.as_ref())).collect()
    }

    /// Turn the page into a record, keeping only images for which `exists` holds.
    /// An answer with a live image is represented by the image URL.
    pub fn into_record(self, exists: impl Fn(&Url) -> bool) -> QuestionRecord {
        let obrazek = self.image.filter(|u| exists(u)).map(String::from);
        let moznosti = self
            .answers
            .into_iter()
            .map(|a| match a.image {
                Some(img) if exists(&img) => img.into(),
                _ => a.text,
            })
            .collect();
        QuestionRecord { id: self.id, otazka: self.text, obrazek, moznosti, spravna: self.correct }
    }
}

/// Absolute links to all question pages found on a listing page, in document order.
pub fn question_links(html: &str, listing_url: &Url) -> Vec<Url> {
    let doc = Html::parse_document(html);
    doc.select(&QUESTION_LINK)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| listing_url.join(href).ok())
        .collect()
}

pub fn parse_question(html: &str, page_url: &Url) -> Result<QuestionPage, SkipReason> {
    let doc = Html::parse_document(html);

    let page_text: String = doc.root_element().text().collect();
    let id = QUESTION_ID
        .captures(&page_text)
        .map(|c| c[1].to_string())
        .ok_or(SkipReason::MissingId)?;

    let text = question_text(&doc).unwrap_or_else(|| {
        tracing::warn!(%id, url = %page_url, "question text not found");
        String::new()
    });

    let image = doc
        .select(&QUESTION_IMAGE)
        .next()
        .and_then(|img| resolve_src(img, page_url));

    let answer_divs: Vec<ElementRef> = doc.select(&ANSWER).collect();
    if answer_divs.is_empty() {
        return Err(SkipReason::NoAnswers(id));
    }
    let answers = answer_divs
        .iter()
        .map(|div| AnswerDraft {
            text: div
                .select(&ANSWER_TEXT)
                .next()
                .map(|p| joined_text(p, " "))
                .unwrap_or_default(),
            image: div.select(&ANSWER_IMAGE).next().and_then(|img| resolve_src(img, page_url)),
        })
        .collect();

    let correct = answer_divs
        .iter()
        .position(|div| div.value().classes().any(|c| c == CORRECT_ANSWER_CLASS))
        .and_then(|i| i32::try_from(i).ok())
        .unwrap_or_else(|| {
            tracing::warn!(%id, url = %page_url, "correct answer not marked");
            UNKNOWN_ANSWER
        });

    Ok(QuestionPage { id, text, image, answers, correct })
}

/// First non-empty text produced by the question text selectors, in priority order.
pub fn question_text(doc: &Html) -> Option<String> {
    QUESTION_TEXT.iter().find_map(|sel| {
        doc.select(sel)
            .next()
            .map(|el| joined_text(el, ""))
            .filter(|t| !t.is_empty())
    })
}

// Text nodes trimmed, blanks dropped, joined with `sep`.
fn joined_text(el: ElementRef, sep: &str) -> String {
    el.text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}

fn resolve_src(img: ElementRef, base: &Url) -> Option<Url> {
    let src = img.value().attr("src")?.trim();
    if src.is_empty() {
        return None;
    }
    base.join(src).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_text_selectors_parse() {
        assert_eq!(QUESTION_TEXT.len(), QUESTION_TEXT_SELECTORS.len());
    }

    #[test]
    fn joined_text_trims_nodes() {
        let doc = Html::parse_fragment("<p> Jedu <b>rovně</b>  dál </p>");
        let p = doc.select(&ANSWER_TEXT).next().unwrap();
        assert_eq!(joined_text(p, " "), "Jedu rovně dál");
        assert_eq!(joined_text(p, ""), "Jedurovnědál");
    }
}
