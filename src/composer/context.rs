//! Per-utterance dispatch state
//!
//! Five gates decide whether lower-priority sources may still answer. Each
//! composer step produces a [`DispatchOutcome`] and folds it into the context
//! with [`DispatchContext::apply`], which returns the updated context.

/// A lower-priority source that can be vetoed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gate {
    /// Knowledge engine lookup
    Engine,
    /// Encyclopedia lookup
    Encyclopedia,
    /// Web search and map search
    WebSearch,
    /// Confirmation handling
    NotConfirmation,
    /// Calculator
    Calculator,
}

/// Every gate
pub const ALL_GATES: &[Gate] = &[
    Gate::Engine,
    Gate::Encyclopedia,
    Gate::WebSearch,
    Gate::NotConfirmation,
    Gate::Calculator,
];

/// The four gates guarding answer sources and confirmations
pub const EXCLUSIVE_GATES: &[Gate] = &[
    Gate::Engine,
    Gate::Encyclopedia,
    Gate::WebSearch,
    Gate::NotConfirmation,
];

/// Result of one dispatch attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Whether the attempt produced a usable answer
    pub handled: bool,

    /// Text to add to the accumulated response
    pub response: Option<String>,

    /// Gates closed by this outcome
    pub suppress: &'static [Gate],
}

impl DispatchOutcome {
    /// An attempt that did not run or found nothing
    #[must_use]
    pub const fn unhandled() -> Self {
        Self {
            handled: false,
            response: None,
            suppress: &[],
        }
    }

    /// Outcome of a skill response; empty responses are unhandled
    #[must_use]
    pub fn from_response(response: String, suppress: &'static [Gate]) -> Self {
        if response.is_empty() {
            Self::unhandled()
        } else {
            Self {
                handled: true,
                response: Some(response),
                suppress,
            }
        }
    }
}

/// Gates and accumulated response for one utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchContext {
    pub ask_engine: bool,
    pub ask_encyclopedia: bool,
    pub ask_web_search: bool,
    pub not_confirmation: bool,
    pub use_calculator: bool,
    response: String,
}

impl Default for DispatchContext {
    fn default() -> Self {
        Self {
            ask_engine: true,
            ask_encyclopedia: true,
            ask_web_search: true,
            not_confirmation: true,
            use_calculator: true,
            response: String::new(),
        }
    }
}

impl DispatchContext {
    /// Fresh context with every gate open
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `gate` is still open
    #[must_use]
    pub const fn is_open(&self, gate: Gate) -> bool {
        match gate {
            Gate::Engine => self.ask_engine,
            Gate::Encyclopedia => self.ask_encyclopedia,
            Gate::WebSearch => self.ask_web_search,
            Gate::NotConfirmation => self.not_confirmation,
            Gate::Calculator => self.use_calculator,
        }
    }

    const fn close(&mut self, gate: Gate) {
        match gate {
            Gate::Engine => self.ask_engine = false,
            Gate::Encyclopedia => self.ask_encyclopedia = false,
            Gate::WebSearch => self.ask_web_search = false,
            Gate::NotConfirmation => self.not_confirmation = false,
            Gate::Calculator => self.use_calculator = false,
        }
    }

    /// Fold an outcome in: append its response and close its gates
    ///
    /// Unhandled outcomes leave the context untouched.
    #[must_use]
    pub fn apply(mut self, outcome: DispatchOutcome) -> Self {
        if !outcome.handled {
            return self;
        }
        if let Some(text) = outcome.response.as_deref().map(str::trim)
            && !text.is_empty()
        {
            if !self.response.is_empty() {
                self.response.push(' ');
            }
            self.response.push_str(text);
        }
        for gate in outcome.suppress {
            self.close(*gate);
        }
        self
    }

    /// Accumulated response so far
    #[must_use]
    pub fn response(&self) -> &str {
        &self.response
    }

    /// Consume the context, returning the accumulated response
    #[must_use]
    pub fn into_response(self) -> String {
        self.response
    }
}
