//! Keyword signals in user utterances.
//!
//! A stand-in for a real NLP collaborator: reassurance counts as a care event,
//! talk of doing things together counts as shared task progress.

const CARE_PHRASES: &[&str] = &[
    "don't be afraid",
    "dont be afraid",
    "don't worry",
    "dont worry",
    "it's safe here",
    "its safe here",
    "you're safe",
    "youre safe",
    "i'll protect you",
    "i will protect you",
    "i'm here for you",
    "im here for you",
    "别怕",
    "这里很安全",
    "不用担心",
    "我会保护你",
    "你很安全",
];

const TASK_PHRASES: &[&str] = &[
    "let's",
    "lets ",
    "together",
    "we did it",
    "we finished",
    "make a plan",
    "tidy up",
    "整理文件",
    "制定计划",
    "一起",
    "我们",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UtteranceSignals {
    /// Explicit reassurance or empathy.
    pub care: bool,
    /// A task shared with the companion.
    pub shared_task: bool,
}

impl UtteranceSignals {
    pub fn analyze(text: &str) -> Self {
        let lower = text.to_lowercase();
        Self {
            care: CARE_PHRASES.iter().any(|p| lower.contains(p)),
            shared_task: TASK_PHRASES.iter().any(|p| lower.contains(p)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_care() {
        assert!(UtteranceSignals::analyze("Don't worry, it's safe here").care);
        assert!(UtteranceSignals::analyze("别怕，我在").care);
        assert!(!UtteranceSignals::analyze("what's for dinner").care);
    }

    #[test]
    fn test_shared_task() {
        let s = UtteranceSignals::analyze("Let's tidy up the desktop together");
        assert!(s.shared_task);
        assert!(!s.care);
    }
}
