use crate::models::ChatMessage;

const PREDEFINED_TONES: [(&str, &str); 10] = [
    ("playful", "fun and lighthearted"),
    ("serious", "formal and grave"),
    ("formal", "professional and proper"),
    ("casual", "relaxed and informal"),
    ("professional", "business-appropriate"),
    ("friendly", "warm and approachable"),
    ("enthusiastic", "energetic and excited"),
    ("sarcastic", "humorous with irony"),
    ("poetic", "descriptive and metaphorical"),
    ("technical", "precise and accurate"),
];

// Sample (text, tone) pairs offered by the tone rewriter UI
pub const TONE_EXAMPLES: [(&str, &str); 5] = [
    ("I missed the bus.", "sad"),
    ("The assignment is due tomorrow.", "anxious"),
    ("I love this new cafe!", "happy"),
    ("This is so boring.", "sarcastic"),
    ("Let's celebrate your success!", "joyful"),
];

// Sample prompts offered by the chatbot UI
pub const CHAT_EXAMPLES: [&str; 4] = [
    "Tell me a short story",
    "How do I create a Python function?",
    "What is the capital of France?",
    "Write code to sort a list in Python",
];

/// Style hint for `tone`. Unknown tones are described generically.
pub fn tone_description(tone: &str) -> String {
    let key = tone.trim().to_lowercase();
    PREDEFINED_TONES
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, style)| style.to_string())
        .unwrap_or_else(|| format!("{} emotional style", tone.trim()))
}

pub fn tone_messages(text: &str, tone: &str) -> Vec<ChatMessage> {
    let tone = tone.trim();
    vec![
        ChatMessage::system(format!(
            "Rewrite text in a {} tone ({}).",
            tone,
            tone_description(tone)
        )),
        ChatMessage::user(text),
    ]
}
