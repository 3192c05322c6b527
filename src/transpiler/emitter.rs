const INDENT: &str = "  ";

/// Line buffer with indentation bookkeeping. One per translation run.
#[derive(Debug, Default)]
pub struct Emitter {
    lines: Vec<String>,
    level: usize,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_line(&mut self, text: &str) {
        let mut line = String::with_capacity(self.level * INDENT.len() + text.len());
        for _ in 0..self.level {
            line.push_str(INDENT);
        }
        line.push_str(text);
        self.lines.push(line);
    }

    pub fn indent(&mut self) {
        self.level += 1;
    }

    pub fn dedent(&mut self) {
        self.level = self.level.saturating_sub(1);
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn render(&self) -> String {
        self.lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indents_two_spaces_per_level() {
        let mut emitter = Emitter::new();
        emitter.add_line("if (x) {");
        emitter.indent();
        emitter.add_line("y();");
        emitter.dedent();
        emitter.add_line("}");
        assert_eq!(emitter.render(), "if (x) {\n  y();\n}");
    }

    #[test]
    fn dedent_saturates_at_zero() {
        let mut emitter = Emitter::new();
        emitter.dedent();
        emitter.add_line("x;");
        assert_eq!(emitter.level(), 0);
        assert_eq!(emitter.render(), "x;");
    }
}
