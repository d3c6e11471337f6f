use html5ever::tendril::TendrilSink;
use html5ever::{LocalName, parse_document};
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use porter_stemmer::stem;
use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::OnceLock;

static STOP_WORDS: OnceLock<HashSet<String>> = OnceLock::new();

/// English and Russian, matching the two OCR languages.
fn get_stop_words() -> &'static HashSet<String> {
    STOP_WORDS.get_or_init(|| {
        stop_words::get(stop_words::LANGUAGE::English)
            .into_iter()
            .chain(stop_words::get(stop_words::LANGUAGE::Russian))
            .map(|x| x.to_string())
            .collect()
    })
}

/// Elements whose whole subtree never contributes visible text.
pub const REMOVED_ELEMENTS: &[&str] = &[
    "script", "style", "nav", "footer", "header", "noscript", "template",
];

#[derive(Clone, Default, Debug)]
pub struct ExtractedText {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Copy)]
pub enum Context {
    Title,
    Body,
}

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// One unit of pending work for the DOM walk.
enum Step {
    Enter(Handle, Context),
    /// Closes a block-like element.
    Leave,
}

/// A character filter receives the text as a whole and returns a transformed copy:
/// collapsing whitespace, cutting to a budget.
pub trait CharacterFilter: Send + Sync {
    fn filter(&self, text: String) -> String;
}

/// Turns an HTML document into its visible body text. Whitespace is kept as found;
/// run [`WhitespaceCollapseFilter`] afterwards.
#[derive(Debug, Default)]
pub struct HTMLTagFilter;

impl HTMLTagFilter {
    pub fn get_dom(html: &str) -> RcDom {
        parse_document(RcDom::default(), Default::default())
            .from_utf8()
            .read_from(&mut std::io::Cursor::new(html))
            .unwrap_or_default()
    }

    pub fn is_removed(local: &LocalName) -> bool {
        REMOVED_ELEMENTS.contains(&&**local)
    }

    pub fn is_block_like(local: &LocalName) -> bool {
        matches!(
            &**local,
            "p" | "div"
                | "section"
                | "article"
                | "main"
                | "aside"
                | "li"
                | "ul"
                | "ol"
                | "table"
                | "tr"
                | "td"
                | "th"
                | "br"
                | "h1"
                | "h2"
                | "h3"
                | "h4"
                | "h5"
                | "h6"
                | "blockquote"
                | "pre"
        )
    }

    /// Depth-first walk with an explicit stack, so nesting depth is bounded
    /// by the heap rather than the thread stack.
    pub fn walk_html(root: &Handle, ctx: Context, out: &mut ExtractedText) {
        let mut stack = vec![Step::Enter(root.clone(), ctx)];

        while let Some(step) = stack.pop() {
            let (node, ctx) = match step {
                Step::Enter(node, ctx) => (node, ctx),
                Step::Leave => {
                    out.body.push(' ');
                    continue;
                }
            };

            let child_ctx = match &node.data {
                NodeData::Text { contents } => {
                    let s = contents.borrow();
                    match ctx {
                        Context::Title => out.title.push_str(&s),
                        Context::Body => out.body.push_str(&s),
                    }
                    continue;
                }
                NodeData::Element { name, .. } => {
                    let local = &name.local;

                    if Self::is_removed(local) {
                        continue;
                    }

                    // svg/mathml <title> is a tooltip, not the document title
                    let new_ctx = if &**local == "title" && &*name.ns == HTML_NAMESPACE {
                        Context::Title
                    } else {
                        ctx
                    };

                    // keeps "<p>a</p><p>b</p>" from reading as "ab"
                    if new_ctx == Context::Body && Self::is_block_like(local) {
                        out.body.push(' ');
                        stack.push(Step::Leave);
                    }
                    new_ctx
                }
                _ => ctx,
            };

            for child in node.children.borrow().iter().rev() {
                stack.push(Step::Enter(child.clone(), child_ctx));
            }
        }
    }

    pub fn extract(html: &str) -> ExtractedText {
        let dom = Self::get_dom(html);
        let mut out = ExtractedText::default();
        Self::walk_html(&dom.document, Context::Body, &mut out);
        out
    }
}

/// Replaces every run of whitespace with one space and trims both ends.
#[derive(Debug, Default)]
pub struct WhitespaceCollapseFilter;

impl CharacterFilter for WhitespaceCollapseFilter {
    fn filter(&self, text: String) -> String {
        text.split_whitespace().collect::<Vec<&str>>().join(" ")
    }
}

/// Cuts text to at most `max_chars` characters (not bytes). Whitespace left
/// dangling at the cut is dropped.
#[derive(Debug)]
pub struct TruncateFilter {
    max_chars: usize,
}

impl TruncateFilter {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }
}

impl CharacterFilter for TruncateFilter {
    fn filter(&self, mut text: String) -> String {
        if let Some((idx, _)) = text.char_indices().nth(self.max_chars) {
            text.truncate(idx);
            text.truncate(text.trim_end().len());
        }
        text
    }
}

/// Runs a sequence of character filters over the text of a parsed page. No IO, no async.
pub struct TextExtractor {
    char_filters: Vec<Box<dyn CharacterFilter>>,
}

impl TextExtractor {
    pub fn new(char_filters: Vec<Box<dyn CharacterFilter>>) -> Self {
        Self { char_filters }
    }

    /// Page pipeline: whitespace collapse, then truncation to `max_chars`.
    pub fn for_page(max_chars: usize) -> Self {
        Self::new(vec![
            Box::new(WhitespaceCollapseFilter),
            Box::new(TruncateFilter::new(max_chars)),
        ])
    }

    pub fn extract(&self, mut content: String) -> String {
        for filter in self.char_filters.iter() {
            content = filter.filter(content);
        }
        content
    }

    /// Parses `html`, filters its visible body text and collapses the title.
    pub fn extract_page(&self, html: &str) -> ExtractedText {
        let ExtractedText { title, body } = HTMLTagFilter::extract(html);
        ExtractedText {
            title: WhitespaceCollapseFilter.filter(title),
            body: self.extract(body),
        }
    }
}

/// Returns `text` cut to `max_chars` with `...` appended, the way the page
/// preview is shown.
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut out = TruncateFilter::new(max_chars).filter(text.to_string());
    out.push_str("...");
    out
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextToken {
    pub term: String,
    pub pos: usize,
}

impl std::ops::Deref for TextToken {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.term
    }
}

/// Breaks text into individual tokens.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<TextToken>;
}

pub struct WhiteSpaceTokenizer;

impl Tokenizer for WhiteSpaceTokenizer {
    fn tokenize(&self, text: &str) -> Vec<TextToken> {
        text.split_whitespace()
            .enumerate()
            .map(|(pos, w)| TextToken {
                term: w.to_string(),
                pos,
            })
            .collect()
    }
}

/// A token filter receives the token stream and may remove or change tokens.
pub trait TokenFilter: Send + Sync {
    fn filter(&self, tokens: Vec<TextToken>) -> Vec<TextToken>;
}

pub struct LowerCaseTokenFilter;

impl TokenFilter for LowerCaseTokenFilter {
    fn filter(&self, tokens: Vec<TextToken>) -> Vec<TextToken> {
        tokens
            .into_iter()
            .map(|mut t| {
                t.term = t.term.to_lowercase();
                t
            })
            .collect()
    }
}

pub struct StopWordTokenFilter;

impl TokenFilter for StopWordTokenFilter {
    fn filter(&self, mut tokens: Vec<TextToken>) -> Vec<TextToken> {
        let stop_words = get_stop_words();
        tokens.retain(|w| !stop_words.contains(&w.term));
        tokens
    }
}

/// Strips leading and trailing punctuation, dropping tokens shorter than
/// `min_length` characters afterwards.
pub struct PunctuationStripFilter {
    min_length: usize,
}

impl PunctuationStripFilter {
    pub fn new(min_length: usize) -> Self {
        Self { min_length }
    }
}

impl Default for PunctuationStripFilter {
    fn default() -> Self {
        Self { min_length: 3 }
    }
}

impl TokenFilter for PunctuationStripFilter {
    fn filter(&self, tokens: Vec<TextToken>) -> Vec<TextToken> {
        tokens
            .into_iter()
            .filter_map(|mut token| {
                let trimmed = token.term.trim_matches(|c: char| !c.is_alphanumeric());
                if trimmed.chars().count() >= self.min_length {
                    token.term = trimmed.to_string();
                    Some(token)
                } else {
                    None
                }
            })
            .collect()
    }
}

/// Keeps only tokens with at least one alphabetic character.
pub struct NumericTokenFilter;

impl TokenFilter for NumericTokenFilter {
    fn filter(&self, tokens: Vec<TextToken>) -> Vec<TextToken> {
        tokens
            .into_iter()
            .filter(|token| token.term.chars().any(|c| c.is_alphabetic()))
            .collect()
    }
}

/// Groups tokens by stem. Porter only knows English, so anything outside
/// ASCII is grouped by its exact form.
fn stem_key(term: &str) -> String {
    if term.chars().all(|c| c.is_ascii_alphabetic()) {
        stem(term)
    } else {
        term.to_string()
    }
}

#[derive(Default)]
struct StemGroup {
    count: usize,
    first_pos: usize,
    surfaces: Vec<(String, usize)>,
}

impl StemGroup {
    fn add(&mut self, term: &str) {
        self.count += 1;
        match self.surfaces.iter_mut().find(|(s, _)| s == term) {
            Some((_, n)) => *n += 1,
            None => self.surfaces.push((term.to_string(), 1)),
        }
    }

    /// Most frequent surface form, earliest seen on ties.
    fn label(&self) -> String {
        let mut best: Option<&(String, usize)> = None;
        for entry in &self.surfaces {
            if best.is_none_or(|b| entry.1 > b.1) {
                best = Some(entry);
            }
        }
        best.map(|(s, _)| s.clone()).unwrap_or_default()
    }
}

/// Picks the most frequent content words of a page for its summary.
pub struct KeywordExtractor {
    tokenizer: Box<dyn Tokenizer>,
    token_filters: Vec<Box<dyn TokenFilter>>,
    limit: usize,
}

impl KeywordExtractor {
    pub fn new(
        tokenizer: Box<dyn Tokenizer>,
        token_filters: Vec<Box<dyn TokenFilter>>,
        limit: usize,
    ) -> Self {
        Self {
            tokenizer,
            token_filters,
            limit,
        }
    }

    /// The page summary pipeline: punctuation, case, numbers and stop words
    /// stripped before grouping.
    pub fn with_limit(limit: usize) -> Self {
        Self::new(
            Box::new(WhiteSpaceTokenizer),
            vec![
                Box::new(PunctuationStripFilter::default()),
                Box::new(LowerCaseTokenFilter),
                Box::new(NumericTokenFilter),
                Box::new(StopWordTokenFilter),
            ],
            limit,
        )
    }

    pub fn token_filter(&self, mut tokens: Vec<TextToken>) -> Vec<TextToken> {
        for filter in self.token_filters.iter() {
            tokens = filter.filter(tokens);
        }
        tokens
    }

    pub fn analyze(&self, text: &str) -> Vec<TextToken> {
        let tokens = self.tokenizer.tokenize(text);
        self.token_filter(tokens)
    }

    pub fn keywords(&self, text: &str) -> Vec<String> {
        let mut groups: HashMap<String, StemGroup> = HashMap::new();
        for token in self.analyze(text) {
            let group = groups.entry(stem_key(&token.term)).or_insert_with(|| StemGroup {
                first_pos: token.pos,
                ..StemGroup::default()
            });
            group.add(&token.term);
        }

        let mut ranked: Vec<StemGroup> = groups.into_values().collect();
        ranked.sort_by(|a, b| b.count.cmp(&a.count).then(a.first_pos.cmp(&b.first_pos)));
        ranked
            .iter()
            .take(self.limit)
            .map(StemGroup::label)
            .collect()
    }
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self::with_limit(10)
    }
}
