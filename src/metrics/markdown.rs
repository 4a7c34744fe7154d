//! Heading-bounded section lookup for README text.

/// Title of an ATX heading line (`## Title`), trimmed. The `#` run may be
/// followed directly by the title.
fn heading_title(line: &str) -> Option<&str> {
    let trimmed = line.trim_start_matches([' ', '\t']);
    let rest = trimmed.trim_start_matches('#');
    let level = trimmed.len() - rest.len();
    if (1..=6).contains(&level) {
        Some(rest.trim())
    } else {
        None
    }
}

/// A heading that closes the current section: `#` run, whitespace, text.
fn is_section_break(line: &str) -> bool {
    let trimmed = line.trim_start_matches([' ', '\t']);
    let rest = trimmed.trim_start_matches('#');
    let level = trimmed.len() - rest.len();
    (1..=6).contains(&level)
        && rest.starts_with([' ', '\t'])
        && !rest.trim().is_empty()
}

/// Lines of `text` paired with their byte offset.
fn lines_with_offsets(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.split_inclusive('\n').scan(0, |offset, line| {
        let start = *offset;
        *offset += line.len();
        Some((start, line))
    })
}

fn is_fence(line: &str) -> bool {
    let trimmed = line.trim_start_matches([' ', '\t']);
    trimmed.starts_with("```") || trimmed.starts_with("~~~")
}

/// Lines outside fenced code blocks, paired with their byte offset. Fence
/// lines themselves are dropped too.
fn prose_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    lines_with_offsets(text)
        .scan(false, |in_fence, (offset, line)| {
            let fence = is_fence(line);
            let hidden = *in_fence || fence;
            if fence {
                *in_fence = !*in_fence;
            }
            Some((offset, line, hidden))
        })
        .filter(|(_, _, hidden)| !hidden)
        .map(|(offset, line, _)| (offset, line))
}

/// Body of the first section whose heading title satisfies `matches`,
/// running up to the next heading or the end of the text. Headings inside
/// fenced code blocks are ignored.
pub fn find_section<'a>(text: &'a str, matches: impl Fn(&str) -> bool) -> Option<&'a str> {
    let mut lines = prose_lines(text);
    let body_start = lines.by_ref().find_map(|(offset, line)| {
        heading_title(line.trim_end())
            .filter(|title| matches(title))
            .map(|_| offset + line.len())
    })?;
    let body_end = lines
        .find(|(_, line)| is_section_break(line.trim_end()))
        .map(|(offset, _)| offset)
        .unwrap_or(text.len());
    Some(&text[body_start..body_end])
}

/// Every heading-led chunk (heading line included) whose heading title
/// satisfies `matches`. Chunks run up to the next heading of any level.
pub fn sections_where<'a>(text: &'a str, matches: impl Fn(&str) -> bool) -> Vec<&'a str> {
    let mut starts: Vec<(usize, bool)> = prose_lines(text)
        .filter_map(|(offset, line)| {
            let line = line.trim_end();
            if line.starts_with('#') && is_section_break(line) {
                heading_title(line).map(|title| (offset, matches(title)))
            } else {
                None
            }
        })
        .collect();
    starts.push((text.len(), false));

    starts
        .windows(2)
        .filter(|pair| pair[0].1)
        .map(|pair| &text[pair[0].0..pair[1].0])
        .collect()
}

/// True when `title` starts with `word` followed by a non-alphanumeric
/// character or the end of the title.
pub fn title_starts_with_word(title: &str, word: &str) -> bool {
    let title = title.to_lowercase();
    title.strip_prefix(word).is_some_and(|rest| {
        rest.chars()
            .next()
            .map_or(true, |next| !next.is_alphanumeric() && next != '_')
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const README: &str = "\
# Model card
Intro text.

## License
This model is released under the MIT license.

## Training data
Trained on BookCorpus.
### Preprocessing
Lowercased.
";

    #[test]
    fn find_section_returns_body_until_next_heading() {
        let body = find_section(README, |title| title_starts_with_word(title, "license"))
            .expect("license section should exist");
        assert_eq!(body.trim(), "This model is released under the MIT license.");
    }

    #[test]
    fn find_section_stops_at_deeper_headings() {
        let body = find_section(README, |title| title_starts_with_word(title, "training data"))
            .expect("training section should exist");
        assert_eq!(body.trim(), "Trained on BookCorpus.");
    }

    #[test]
    fn find_section_runs_to_end_of_text() {
        let body = find_section(README, |title| title_starts_with_word(title, "preprocessing"))
            .expect("last section should exist");
        assert_eq!(body, "Lowercased.\n");
        assert!(find_section(README, |title| title == "Citation").is_none());
    }

    #[test]
    fn sections_where_keeps_heading_lines() {
        let chunks = sections_where(README, |title| title.to_lowercase().contains("data"));
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].starts_with("## Training data"));
        assert!(!chunks[0].contains("Lowercased"));
    }

    #[test]
    fn title_word_match_respects_boundaries() {
        assert!(title_starts_with_word("Licensing", "licensing"));
        assert!(title_starts_with_word("License: MIT", "license"));
        assert!(!title_starts_with_word("Licensed works", "license"));
        assert!(title_starts_with_word("Datasets", "datasets"));
    }

    #[test]
    fn comments_in_code_fences_are_not_headings() {
        let readme = "\
## License
Apache-2.0

```python
# License check
import torch
```

~~~
# Datasets
~~~
Still licensed text.

## Usage
Run it.
";
        let body = find_section(readme, |title| title_starts_with_word(title, "license"))
            .expect("license section should exist");
        assert!(body.contains("import torch"));
        assert!(body.contains("Still licensed text."));
        assert!(!body.contains("Run it."));

        let chunks = sections_where(readme, |title| title_starts_with_word(title, "datasets"));
        assert!(chunks.is_empty());
    }
}
