// Grouping characters into words and cell text
use super::TextChar;
use crate::types::BBox;

/// Characters further apart than this (points) start a new word.
const WORD_SPACING_THRESHOLD: f32 = 3.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub text: String,
    pub bbox: BBox,
}

/// Groups characters into words, in content order. Whitespace ends a word
/// and is dropped.
pub fn group_words(chars: &[TextChar]) -> Vec<Word> {
    let mut words = Vec::new();
    let mut current: Option<Word> = None;

    for c in chars {
        if c.ch.is_whitespace() {
            words.extend(current.take());
            continue;
        }

        let continues = current
            .as_ref()
            .map(|w| {
                same_line(&w.bbox, &c.bbox)
                    && c.bbox.x0 - w.bbox.x1 <= WORD_SPACING_THRESHOLD
                    && c.bbox.x0 >= w.bbox.x0
            })
            .unwrap_or(false);

        if continues {
            if let Some(w) = current.as_mut() {
                w.text.push(c.ch);
                w.bbox = w.bbox.union(&c.bbox);
            }
        } else {
            words.extend(current.take());
            current = Some(Word { text: c.ch.to_string(), bbox: c.bbox });
        }
    }
    words.extend(current);
    words
}

/// Text of all characters whose centre lies in `area`, line by line.
pub fn text_within(chars: &[TextChar], area: &BBox) -> String {
    let inside: Vec<TextChar> = chars
        .iter()
        .filter(|c| {
            let (cx, cy) = c.bbox.center();
            area.contains_point(cx, cy)
        })
        .cloned()
        .collect();

    let mut words = group_words(&inside);
    words.sort_by(|a, b| a.bbox.y0.total_cmp(&b.bbox.y0));

    // Cluster into lines, then order each line left to right
    let mut lines: Vec<Vec<Word>> = Vec::new();
    for word in words {
        match lines.last_mut() {
            Some(line) if line.first().is_some_and(|f| same_line(&f.bbox, &word.bbox)) => line.push(word),
            _ => lines.push(vec![word]),
        }
    }

    lines
        .into_iter()
        .map(|mut line| {
            line.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));
            line.into_iter().map(|w| w.text).collect::<Vec<_>>().join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn same_line(a: &BBox, b: &BBox) -> bool {
    let (_, ay) = a.center();
    let (_, by) = b.center();
    (ay - by).abs() <= a.height().max(b.height()) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::fixtures::word;

    #[test]
    fn test_adjacent_chars_form_one_word() {
        let words = group_words(&word("Total", 10.0, 10.0));
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].text, "Total");
        assert_eq!(words[0].bbox, BBox::new(10.0, 10.0, 40.0, 20.0));
    }

    #[test]
    fn test_gap_and_whitespace_split_words() {
        let mut chars = word("ab", 0.0, 0.0);
        chars.extend(word(" ", 12.0, 0.0));
        chars.extend(word("cd", 18.0, 0.0));
        chars.extend(word("ef", 60.0, 0.0));
        let texts: Vec<String> = group_words(&chars).into_iter().map(|w| w.text).collect();
        assert_eq!(texts, vec!["ab", "cd", "ef"]);
    }

    #[test]
    fn test_text_within_keeps_lines() {
        let mut chars = word("second", 10.0, 30.0);
        chars.extend(word("first", 10.0, 10.0));
        chars.extend(word("line", 50.0, 10.0));
        chars.extend(word("outside", 500.0, 10.0));

        let text = text_within(&chars, &BBox::new(0.0, 0.0, 200.0, 100.0));
        assert_eq!(text, "first line\nsecond");
    }

    #[test]
    fn test_text_within_empty_area() {
        assert_eq!(text_within(&word("x", 0.0, 0.0), &BBox::new(100.0, 100.0, 200.0, 200.0)), "");
    }
}
