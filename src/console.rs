// Operator-facing phase reports. A closed stdout (`mqtt-wakeup ... | head`)
// must not take the process down before the session is shut down, so write
// errors are logged and otherwise ignored.
use std::fmt;
use std::io::{self, Write};

pub struct Console {
    out: Box<dyn Write + Send>,
    err: Box<dyn Write + Send>,
}

impl Console {
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }

    pub fn new(out: impl Write + Send + 'static, err: impl Write + Send + 'static) -> Self {
        Self {
            out: Box::new(out),
            err: Box::new(err),
        }
    }

    /// Progress line on stdout.
    pub fn say(&mut self, line: fmt::Arguments<'_>) {
        if let Err(e) = writeln!(self.out, "{line}").and_then(|()| self.out.flush()) {
            tracing::debug!(error = %e, "failed to write to stdout");
        }
    }

    /// Failure line on stderr.
    pub fn complain(&mut self, line: fmt::Arguments<'_>) {
        if let Err(e) = writeln!(self.err, "{line}").and_then(|()| self.err.flush()) {
            tracing::debug!(error = %e, "failed to write to stderr");
        }
    }
}
