//! Rule-matching execution tracing, gated behind the `debug` feature.
//!
//! Mirrors the instrumentation style used for parser-combinator tracing in
//! this family: a depth-indented `> name` / `< name` pair bracketing each
//! rule-element dispatch, colored by outcome, written to stderr. Disabled
//! (and free) builds compile the `trace` call down to nothing but the
//! traced closure itself.

#[cfg(feature = "debug")]
mod internals {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::error::ErrMode;

    static DEPTH: AtomicUsize = AtomicUsize::new(0);

    pub struct Depth {
        depth: usize,
        inc: bool,
    }

    impl Depth {
        pub fn new() -> Self {
            let depth = DEPTH.fetch_add(1, Ordering::SeqCst);
            Self { depth, inc: true }
        }

        pub fn existing() -> Self {
            Self {
                depth: DEPTH.load(Ordering::SeqCst),
                inc: false,
            }
        }
    }

    impl Drop for Depth {
        fn drop(&mut self) {
            if self.inc {
                let _ = DEPTH.fetch_sub(1, Ordering::SeqCst);
            }
        }
    }

    impl core::ops::Deref for Depth {
        type Target = usize;

        fn deref(&self) -> &usize {
            &self.depth
        }
    }

    pub enum Severity {
        Success,
        Backtrack,
        Cut,
    }

    impl Severity {
        pub fn with_result<T, E>(result: &Result<T, ErrMode<E>>) -> Self {
            match result {
                Ok(_) => Self::Success,
                Err(ErrMode::Backtrack(_)) => Self::Backtrack,
                Err(ErrMode::Cut(_)) => Self::Cut,
            }
        }
    }

    pub fn start(depth: usize, name: &dyn crate::lib::std::fmt::Display, at_index: usize) {
        use std::io::Write;
        let gutter = anstyle::Style::new().bold();
        let input = anstyle::Style::new().underline();
        let writer = anstream::stderr();
        let mut writer = writer.lock();
        let _ = writeln!(
            writer,
            "{:depth$}> {name}{g}|{gr} {input}@{at_index}{ir}",
            "",
            g = gutter.render(),
            gr = gutter.render_reset(),
            input = input.render(),
            ir = input.render_reset(),
        );
    }

    pub fn end(depth: usize, name: &dyn crate::lib::std::fmt::Display, severity: Severity) {
        use std::io::Write;
        let (style, status) = match severity {
            Severity::Success => (
                anstyle::Style::new().fg_color(Some(anstyle::AnsiColor::Green.into())),
                "match",
            ),
            Severity::Backtrack => (
                anstyle::Style::new().fg_color(Some(anstyle::AnsiColor::Yellow.into())),
                "backtrack",
            ),
            Severity::Cut => (
                anstyle::Style::new().fg_color(Some(anstyle::AnsiColor::Red.into())),
                "cut",
            ),
        };
        let writer = anstream::stderr();
        let mut writer = writer.lock();
        let _ = writeln!(
            writer,
            "{style}{:depth$}< {name}{reset} | {style}{status}{reset}",
            "",
            style = style.render(),
            reset = style.render_reset(),
        );
    }

    pub fn is_enabled() -> bool {
        use is_terminal_polyfill::IsTerminal;
        std::env::var_os("RAVEL_TRACE").is_some() || std::io::stderr().is_terminal()
    }
}

/// Trace one rule-element dispatch: logs entry at `at_index`, runs `body`,
/// logs the outcome. A no-op returning `body()` directly when `debug` isn't
/// enabled.
#[cfg_attr(not(feature = "debug"), allow(unused_variables))]
pub fn trace<T, E>(
    name: impl crate::lib::std::fmt::Display,
    at_index: usize,
    body: impl FnOnce() -> Result<T, crate::error::ErrMode<E>>,
) -> Result<T, crate::error::ErrMode<E>> {
    #[cfg(feature = "debug")]
    {
        if !internals::is_enabled() {
            return body();
        }
        let depth = internals::Depth::new();
        internals::start(*depth, &name, at_index);
        let res = body();
        let severity = internals::Severity::with_result(&res);
        internals::end(*depth, &name, severity);
        res
    }
    #[cfg(not(feature = "debug"))]
    {
        body()
    }
}
