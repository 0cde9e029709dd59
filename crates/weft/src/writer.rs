//! Line-oriented text output with indentation tracking.

/// Accumulates generated source one line at a time.
#[derive(Debug, Clone)]
pub(crate) struct CodeWriter {
    output: String,
    level: usize,
    unit: &'static str,
}

impl CodeWriter {
    /// A writer indenting with tabs, as gofmt does.
    pub fn tabs() -> Self {
        Self::new("\t")
    }

    /// A writer indenting with four spaces.
    pub fn spaces() -> Self {
        Self::new("    ")
    }

    fn new(unit: &'static str) -> Self {
        Self {
            output: String::with_capacity(4096),
            level: 0,
            unit,
        }
    }

    /// Start at `level` instead of column zero.
    pub fn at_level(mut self, level: usize) -> Self {
        self.level = level;
        self
    }

    pub fn level(&self) -> usize {
        self.level
    }

    /// The indentation string for `level`.
    pub fn pad(&self, level: usize) -> String {
        self.unit.repeat(level)
    }

    /// Write `text` at the current indentation. Embedded newlines are kept
    /// as they are, so multi-line fragments must carry their own padding.
    pub fn line(&mut self, text: impl AsRef<str>) {
        for _ in 0..self.level {
            self.output.push_str(self.unit);
        }
        self.output.push_str(text.as_ref());
        self.output.push('\n');
    }

    pub fn blank(&mut self) {
        self.output.push('\n');
    }

    pub fn indent(&mut self) {
        self.level += 1;
    }

    pub fn dedent(&mut self) {
        self.level = self.level.saturating_sub(1);
    }

    /// Append already formatted text without indentation.
    pub fn raw(&mut self, text: &str) {
        self.output.push_str(text);
    }

    pub fn is_empty(&self) -> bool {
        self.output.is_empty()
    }

    pub fn finish(self) -> String {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indentation() {
        let mut w = CodeWriter::tabs();
        w.line("func f() {");
        w.indent();
        w.line("return");
        w.dedent();
        w.line("}");
        assert_eq!(w.finish(), "func f() {\n\treturn\n}\n");
    }

    #[test]
    fn test_spaces_and_start_level() {
        let mut w = CodeWriter::spaces().at_level(2);
        w.line("x = 1;");
        w.dedent();
        w.dedent();
        w.dedent();
        w.line("}");
        assert_eq!(w.finish(), "        x = 1;\n}\n");
    }
}
