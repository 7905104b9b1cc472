//! Single-line text editing over a caller-owned `String`.

const MAX_INPUT_CHARS: usize = 512;

/// Cursor position in characters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineEditor {
    cursor: usize,
}

impl LineEditor {
    /// Cursor placed after the last character of `text`.
    pub fn at_end(text: &str) -> Self {
        Self {
            cursor: text.chars().count(),
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn move_cursor(&mut self, text: &str, delta: isize) {
        let len = text.chars().count() as isize;
        let next = (self.cursor as isize + delta).clamp(0, len);
        self.cursor = next as usize;
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self, text: &str) {
        self.cursor = text.chars().count();
    }

    pub fn insert(&mut self, text: &mut String, ch: char) {
        if ch.is_control() || text.chars().count() >= MAX_INPUT_CHARS {
            return;
        }
        let idx = byte_index(text, self.cursor);
        text.insert(idx, ch);
        self.cursor += 1;
    }

    /// Insert pasted text, dropping line breaks.
    pub fn insert_str(&mut self, text: &mut String, pasted: &str) {
        for ch in pasted.chars().filter(|ch| *ch != '\n' && *ch != '\r') {
            self.insert(text, ch);
        }
    }

    pub fn backspace(&mut self, text: &mut String) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let idx = byte_index(text, self.cursor);
        text.remove(idx);
    }

    pub fn delete(&mut self, text: &mut String) {
        if self.cursor < text.chars().count() {
            let idx = byte_index(text, self.cursor);
            text.remove(idx);
        }
    }
}

fn byte_index(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edits_multibyte_text_by_character() {
        let mut text = "Ведьмак".to_string();
        let mut editor = LineEditor::at_end(&text);
        editor.insert(&mut text, ' ');
        editor.insert(&mut text, '3');
        assert_eq!(text, "Ведьмак 3");

        editor.move_home();
        editor.move_cursor(&text, 1);
        editor.backspace(&mut text);
        assert_eq!(text, "едьмак 3");
        assert_eq!(editor.cursor(), 0);

        editor.delete(&mut text);
        assert_eq!(text, "дьмак 3");
    }

    #[test]
    fn cursor_stays_in_bounds() {
        let mut text = "ab".to_string();
        let mut editor = LineEditor::default();
        editor.move_cursor(&text, -5);
        assert_eq!(editor.cursor(), 0);
        editor.move_cursor(&text, 10);
        assert_eq!(editor.cursor(), 2);
        editor.delete(&mut text);
        assert_eq!(text, "ab");
    }

    #[test]
    fn paste_drops_line_breaks() {
        let mut text = String::new();
        let mut editor = LineEditor::default();
        editor.insert_str(&mut text, "/tmp/shot.png\n");
        assert_eq!(text, "/tmp/shot.png");
        assert_eq!(editor.cursor(), 13);
    }
}
