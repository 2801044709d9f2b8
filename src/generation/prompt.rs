use super::artifact::ArtifactKind;
use crate::llm::CompletionRequest;
use crate::storage::Slide;

/// Slides beyond this many are left out of the prompt.
pub const MAX_PROMPT_SLIDES: usize = 60;

pub const SYSTEM_PROMPT: &str = "You are a study assistant. \
ONLY use information present in the provided slide content. \
If something is not in the slides, say: 'Not found in the deck.' \
Be concise and structured for studying.";

const SUMMARY_INSTRUCTIONS: &str = r#"Create a study summary with:
1) A 1-paragraph overview
2) 8–15 key bullets (high-yield)
3) A short "Things to memorize" list
4) A short "Common pitfalls / misconceptions" list (if applicable)
Include slide references in parentheses like (Slides 3–5) when possible.
Return in markdown."#;

const FLASHCARD_INSTRUCTIONS: &str = r#"Create an appropriate number of flashcards to help a student study.

Return ONLY valid JSON in this exact shape:
{
  "flashcards": [
    {
      "q": "Question",
      "a": "Answer",
      "refs": [3,4],
      "difficulty": "easy" | "medium" | "hard"
    }
  ]
}

Rules:
- Use ONLY the slide content.
- Keep answers short (1–3 sentences or a compact list).
- refs must be slide numbers you used.
- Avoid trivia; focus on high-yield concepts."#;

const EXAM_INSTRUCTIONS: &str = r#"Create a practice exam from the slides.

Return ONLY valid JSON in this exact shape:
{
  "exam": {
    "title": "Practice Exam",
    "instructions": "How to take the exam",
    "questions": [
      {
        "id": "q1",
        "type": "mcq" | "short",
        "question": "Question text",
        "choices": ["A", "B", "C", "D"],
        "answer": "Correct answer",
        "explanation": "Why it is correct",
        "refs": [3,4],
        "difficulty": "easy" | "medium" | "hard"
      }
    ]
  }
}

Rules:
- Use ONLY the slide content.
- Write exactly 12 questions when the material supports it: 8 "mcq" with exactly 4 choices each, then 4 "short" without choices.
- If the slides do not contain enough material, write fewer questions. Never invent content.
- refs must be slide numbers you used."#;

/// Render up to [`MAX_PROMPT_SLIDES`] slides as plain text blocks separated by
/// blank lines.
pub fn deck_to_text(slides: &[Slide]) -> String {
    slides
        .iter()
        .take(MAX_PROMPT_SLIDES)
        .map(slide_to_text)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn slide_to_text(slide: &Slide) -> String {
    let title = slide.title().unwrap_or("(none)");
    let bullets = match slide.bullets() {
        [] => "Bullets: (none)".to_string(),
        items => format!("Bullets:\n- {}", items.join("\n- ")),
    };
    let notes = slide.notes().unwrap_or("(none)");
    format!("Slide {}\nTitle: {title}\n{bullets}\nNotes: {notes}", slide.index)
}

pub fn user_prompt(kind: ArtifactKind, deck_text: &str) -> String {
    let instructions = match kind {
        ArtifactKind::Summary => SUMMARY_INSTRUCTIONS,
        ArtifactKind::Flashcards => FLASHCARD_INSTRUCTIONS,
        ArtifactKind::Exam => EXAM_INSTRUCTIONS,
    };
    format!("Slide content:\n{deck_text}\n\n{instructions}")
}

pub fn build_request(kind: ArtifactKind, slides: &[Slide]) -> CompletionRequest {
    CompletionRequest {
        system: SYSTEM_PROMPT.to_string(),
        user: user_prompt(kind, &deck_to_text(slides)),
        json_mode: kind.wants_json(),
    }
}
