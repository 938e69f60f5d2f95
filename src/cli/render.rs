const BOLD_ON: &str = "\x1b[1m";
const BOLD_OFF: &str = "\x1b[0m";

/// Renders markdown `**bold**` markers as ANSI bold while text streams in.
///
/// A lone `*` at the end of a chunk is held back until the next chunk shows
/// whether it starts a marker.
#[derive(Debug, Default)]
pub struct BoldRenderer {
    bold: bool,
    pending_star: bool,
}

impl BoldRenderer {
    pub fn render(&mut self, chunk: &str) -> String {
        let mut out = String::with_capacity(chunk.len());

        for c in chunk.chars() {
            if c == '*' {
                if self.pending_star {
                    self.pending_star = false;
                    self.toggle(&mut out);
                } else {
                    self.pending_star = true;
                }
                continue;
            }

            if self.pending_star {
                self.pending_star = false;
                out.push('*');
            }
            out.push(c);
        }

        out
    }

    /// Flushes any held `*` and resets the terminal if bold is still on
    pub fn finish(&mut self) -> String {
        let mut out = String::new();
        if self.pending_star {
            self.pending_star = false;
            out.push('*');
        }
        if self.bold {
            self.bold = false;
            out.push_str(BOLD_OFF);
        }
        out
    }

    fn toggle(&mut self, out: &mut String) {
        self.bold = !self.bold;
        out.push_str(if self.bold { BOLD_ON } else { BOLD_OFF });
    }
}
