//! Post-processing of raw model output before it is shown to a user.
//!
//! Models behind the completion API sometimes echo the prompt back, keep going
//! with an imagined transcript, or stop mid-sentence when they hit the token
//! limit. [`Sanitizer::sanitize`] undoes all three, in that order.

pub const TERMINAL_PUNCTUATION: [char; 4] = ['.', '!', '?', ';'];

const DEFAULT_MARKERS: [&str; 4] = ["\nQ:", "\nA:", "\nHuman:", "\nAssistant:"];

/// Substrings that mark the start of a hallucinated follow-up turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogueMarkers {
    markers: Vec<String>,
}

impl DialogueMarkers {
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            markers: markers
                .into_iter()
                .map(Into::into)
                .filter(|m: &String| !m.is_empty())
                .collect(),
        }
    }

    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        let marker = marker.into();
        if !marker.is_empty() && !self.markers.contains(&marker) {
            self.markers.push(marker);
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.markers.iter().map(String::as_str)
    }

    // Byte offset of the earliest marker in `text`, whichever marker it is
    fn first_in(&self, text: &str) -> Option<usize> {
        self.iter().filter_map(|marker| text.find(marker)).min()
    }
}

impl Default for DialogueMarkers {
    fn default() -> Self {
        Self::new(DEFAULT_MARKERS)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Sanitizer {
    markers: DialogueMarkers,
}

impl Sanitizer {
    pub fn new(markers: DialogueMarkers) -> Self {
        Self { markers }
    }

    pub fn markers(&self) -> &DialogueMarkers {
        &self.markers
    }

    /// Clean `raw` model output produced in answer to `prompt`.
    ///
    /// Never fails. Empty or whitespace-only input comes back as `"."`.
    pub fn sanitize(&self, raw: &str, prompt: &str) -> String {
        let text = strip_echo(raw, prompt);
        let text = self.truncate_dialogue(text);
        complete_sentence(text)
    }

    fn truncate_dialogue<'a>(&self, text: &'a str) -> &'a str {
        match self.markers.first_in(text) {
            Some(at) => text[..at].trim(),
            None => text,
        }
    }
}

pub fn sanitize(raw: &str, prompt: &str) -> String {
    Sanitizer::default().sanitize(raw, prompt)
}

fn strip_echo<'a>(raw: &'a str, prompt: &str) -> &'a str {
    match raw.strip_prefix(prompt) {
        Some(rest) => rest.trim(),
        None => raw,
    }
}

fn complete_sentence(text: &str) -> String {
    let text = text.trim();
    if text.ends_with(TERMINAL_PUNCTUATION) {
        return text.to_string();
    }
    match text.rfind(TERMINAL_PUNCTUATION) {
        // Terminal punctuation is ASCII, so `at + 1` is a char boundary
        Some(at) => text[..=at].to_string(),
        None => format!("{text}."),
    }
}
