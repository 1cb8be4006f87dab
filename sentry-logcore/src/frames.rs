use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use sentry_core::protocol::{Frame, Stacktrace};

/// Function prefixes that are never useful in a reported trace: the adapter
/// itself and the machinery used to capture the trace.
const DEFAULT_SKIPPED_FUNCTIONS: &[&str] = &["sentry_logcore::", "sentry_backtrace::", "backtrace::"];

/// Decides whether a stack frame should be removed from reported traces.
///
/// Closures of the form `Fn(&Frame) -> bool` implement this trait as well.
pub trait FrameMatcher: Send + Sync {
    /// Returns `true` if `frame` should be skipped.
    fn matches(&self, frame: &Frame) -> bool;
}

impl<F> FrameMatcher for F
where
    F: Fn(&Frame) -> bool + Send + Sync,
{
    fn matches(&self, frame: &Frame) -> bool {
        self(frame)
    }
}

/// Skips frames whose module starts with a prefix.
///
/// When the frame carries no module, it is derived from the function path.
#[derive(Debug, Clone)]
pub struct SkipModulePrefix(pub Cow<'static, str>);

impl FrameMatcher for SkipModulePrefix {
    fn matches(&self, frame: &Frame) -> bool {
        frame_module(frame).is_some_and(|module| module.starts_with(self.0.as_ref()))
    }
}

/// Skips frames whose function starts with a prefix.
///
/// Trait implementation symbols like `<crate::Type as Trait>::method` match
/// a `crate::` prefix as well.
#[derive(Debug, Clone)]
pub struct SkipFunctionPrefix(pub Cow<'static, str>);

impl FrameMatcher for SkipFunctionPrefix {
    fn matches(&self, frame: &Frame) -> bool {
        frame
            .function
            .as_deref()
            .is_some_and(|function| function_starts_with(function, &self.0))
    }
}

/// Creates a matcher that skips frames in modules starting with `prefix`.
pub fn skip_module_prefix<P: Into<Cow<'static, str>>>(prefix: P) -> SkipModulePrefix {
    SkipModulePrefix(prefix.into())
}

/// Creates a matcher that skips frames of functions starting with `prefix`.
pub fn skip_function_prefix<P: Into<Cow<'static, str>>>(prefix: P) -> SkipFunctionPrefix {
    SkipFunctionPrefix(prefix.into())
}

/// A chain of matchers; a frame is skipped if any of them matches.
#[derive(Clone, Default)]
pub struct FrameMatchers(Vec<Arc<dyn FrameMatcher>>);

impl FrameMatchers {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a matcher to the chain.
    pub fn push<M: FrameMatcher + 'static>(&mut self, matcher: M) {
        self.0.push(Arc::new(matcher));
    }

    /// The number of matchers in the chain.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FrameMatcher for FrameMatchers {
    fn matches(&self, frame: &Frame) -> bool {
        self.0.iter().any(|matcher| matcher.matches(frame))
    }
}

impl fmt::Debug for FrameMatchers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FrameMatchers").field(&self.0.len()).finish()
    }
}

/// Combines several matchers into one chain.
///
/// # Examples
///
/// ```
/// use sentry_logcore::{combine_frame_matchers, skip_function_prefix, skip_module_prefix};
///
/// let matcher = combine_frame_matchers([
///     skip_function_prefix("my_logging_facade::"),
///     skip_function_prefix("tokio::runtime::"),
/// ]);
/// # let _ = skip_module_prefix("unused");
/// # let _ = matcher;
/// ```
pub fn combine_frame_matchers<I, M>(matchers: I) -> FrameMatchers
where
    I: IntoIterator<Item = M>,
    M: FrameMatcher + 'static,
{
    let mut chain = FrameMatchers::new();
    for matcher in matchers {
        chain.push(matcher);
    }
    chain
}

/// Removes unwanted frames from stack traces.
///
/// The default matchers always run first; a user supplied matcher is appended
/// behind them. Frames in test modules are always kept.
#[derive(Clone, Debug)]
pub(crate) struct FrameFilter {
    matchers: FrameMatchers,
}

impl FrameFilter {
    pub fn new(custom: Option<Arc<dyn FrameMatcher>>) -> Self {
        let mut matchers = FrameMatchers(
            DEFAULT_SKIPPED_FUNCTIONS
                .iter()
                .map(|prefix| Arc::new(skip_function_prefix(*prefix)) as Arc<dyn FrameMatcher>)
                .collect(),
        );
        if let Some(custom) = custom {
            matchers.0.push(custom);
        }
        FrameFilter { matchers }
    }

    /// Keeps the frames no matcher claims, in their original order.
    pub fn filter_frames(&self, frames: Vec<Frame>) -> Vec<Frame> {
        frames
            .into_iter()
            .filter(|frame| is_test_frame(frame) || !self.matchers.matches(frame))
            .collect()
    }

    /// Filters a trace, dropping it entirely when no frame survives.
    pub fn filter_stacktrace(&self, mut stacktrace: Stacktrace) -> Option<Stacktrace> {
        let frames = std::mem::take(&mut stacktrace.frames);
        stacktrace.frames = self.filter_frames(frames);
        if stacktrace.frames.is_empty() {
            None
        } else {
            Some(stacktrace)
        }
    }

    /// Captures and filters the trace of the calling thread.
    pub fn current_stacktrace(&self) -> Option<Stacktrace> {
        sentry_backtrace::current_stacktrace().and_then(|stacktrace| self.filter_stacktrace(stacktrace))
    }
}

fn is_test_frame(frame: &Frame) -> bool {
    frame_module(frame)
        .and_then(|module| module.rsplit("::").next())
        .is_some_and(|last| last == "test" || last == "tests")
}

/// The module of a frame, falling back to the path of its function.
fn frame_module(frame: &Frame) -> Option<&str> {
    if let Some(module) = frame.module.as_deref() {
        return Some(module);
    }
    let mut function = frame.function.as_deref()?;
    while let Some(stripped) = function.strip_suffix("::{{closure}}") {
        function = stripped;
    }
    function.rsplit_once("::").map(|(module, _)| module)
}

/// Checks whether the function name starts with the given pattern.
///
/// In trait implementations, the original type name is wrapped in "_< ... >" and colons are
/// replaced with dots. This function accounts for differences while checking.
fn function_starts_with(mut func_name: &str, mut pattern: &str) -> bool {
    if pattern.starts_with('<') {
        while let Some(rest) = pattern.strip_prefix('<') {
            pattern = rest;

            if let Some(rest) = func_name.strip_prefix('<') {
                func_name = rest;
            } else if let Some(rest) = func_name.strip_prefix("_<") {
                func_name = rest;
            } else {
                return false;
            }
        }
    } else {
        func_name = func_name.trim_start_matches('<').trim_start_matches("_<");
    }

    if !func_name.is_char_boundary(pattern.len()) {
        return false;
    }

    func_name
        .chars()
        .zip(pattern.chars())
        .all(|(f, p)| f == p || f == '.' && p == ':')
}
