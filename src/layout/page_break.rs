//! # Page Break Decisions
//!
//! Whether a primitive of a given height still fits on the current page.
//! Templates differ only in how far past the bottom margin they let content
//! run before breaking.

/// How strictly the bottom margin is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum BreakPolicy {
    /// Break as soon as content would cross the bottom margin.
    #[default]
    Strict,
    /// Allow content to run `slack` points into the bottom margin.
    Lenient { slack: f64 },
}

/// What to do with a primitive at the current cursor position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakDecision {
    /// Draw it on the current page.
    Place,
    /// Commit the page and draw it at the top of the next one.
    MoveToNextPage,
}

impl BreakPolicy {
    pub fn slack(&self) -> f64 {
        match self {
            BreakPolicy::Strict => 0.0,
            BreakPolicy::Lenient { slack } => slack.max(0.0),
        }
    }

    /// The lowest y a primitive may reach on a page.
    pub fn limit(&self, page_height: f64, bottom_margin: f64) -> f64 {
        page_height - bottom_margin + self.slack()
    }

    /// Decide whether `required` points starting at `y` fit.
    ///
    /// A primitive that already starts at the top of a page is always
    /// placed: moving it would only produce an empty page.
    pub fn decide(
        &self,
        y: f64,
        required: f64,
        page_height: f64,
        bottom_margin: f64,
        at_page_top: bool,
    ) -> BreakDecision {
        if at_page_top || y + required <= self.limit(page_height, bottom_margin) {
            BreakDecision::Place
        } else {
            BreakDecision::MoveToNextPage
        }
    }
}
