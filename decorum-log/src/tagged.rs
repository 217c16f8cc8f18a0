//! A logger that prefixes every message with the calling function's tag.

use tracing::{debug, error, info, warn};

/// Applies the `[FUN] <function>` tag to `msg`.
///
/// Messages already carrying `[ARG]`, `[RET]` or `[FUN]` pass through.
/// Request markers (`[POST]`, `[GET]`) get the function prefix only.
/// Anything else is marked as a plain message.
pub fn tag_message(function: &str, msg: &str) -> String {
    if ["[ARG]", "[RET]", "[FUN]"].iter().any(|tag| msg.contains(tag)) {
        msg.to_owned()
    } else if msg.contains("[POST]") || msg.contains("[GET]") {
        format!("[FUN] {function} {msg}")
    } else {
        format!("[FUN] {function} [MSG] {msg}")
    }
}

/// Logger bound to one function name.
#[derive(Clone, Debug)]
pub struct TaggedLogger {
    function: String,
}

impl TaggedLogger {
    /// Creates a logger that tags messages with `function`.
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
        }
    }

    /// Function name used in the tag.
    pub fn function(&self) -> &str {
        &self.function
    }

    /// Tags `msg` for this logger's function.
    pub fn tag(&self, msg: &str) -> String {
        tag_message(&self.function, msg)
    }

    /// Logs at `debug`.
    pub fn debug(&self, msg: &str) {
        debug!(function = %self.function, "{}", self.tag(msg));
    }

    /// Logs at `info`.
    pub fn info(&self, msg: &str) {
        info!(function = %self.function, "{}", self.tag(msg));
    }

    /// Logs at `warn`.
    pub fn warn(&self, msg: &str) {
        warn!(function = %self.function, "{}", self.tag(msg));
    }

    /// Logs at `error`.
    pub fn error(&self, msg: &str) {
        error!(function = %self.function, "{}", self.tag(msg));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("[FUN] g [ARG] x: 1", "[FUN] g [ARG] x: 1" ; "arg passes through")]
    #[test_case("value [RET] 3", "value [RET] 3" ; "ret passes through")]
    #[test_case("[FUN] other", "[FUN] other" ; "fun passes through")]
    #[test_case("[POST] /users", "[FUN] f [POST] /users" ; "post gets prefix")]
    #[test_case("[GET] /users", "[FUN] f [GET] /users" ; "get gets prefix")]
    #[test_case("hello", "[FUN] f [MSG] hello" ; "plain message")]
    #[test_case("", "[FUN] f [MSG] " ; "empty message")]
    fn test_tag_message(msg: &str, expected: &str) {
        assert_eq!(tag_message("f", msg), expected);
    }

    #[test]
    fn test_logger_tags_with_function() {
        let logger = TaggedLogger::new("handler");
        assert_eq!(logger.function(), "handler");
        assert_eq!(logger.tag("started"), "[FUN] handler [MSG] started");
    }
}
