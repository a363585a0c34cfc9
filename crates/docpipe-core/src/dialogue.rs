use crate::error::Result;

// ---------------------------------------------------------------------------
// Question / Answer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub prompt: String,
    /// Suggested answers; empty for a free-text question.
    pub options: Vec<String>,
}

impl Question {
    pub fn open(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            options: Vec::new(),
        }
    }

    pub fn choice(prompt: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            prompt: prompt.into(),
            options,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Text(String),
    /// The user declined to answer; the prompt lands in Open Questions.
    Skipped,
}

impl Answer {
    pub fn text(&self) -> Option<&str> {
        match self {
            Answer::Text(s) => Some(s),
            Answer::Skipped => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Interviewer
// ---------------------------------------------------------------------------

/// Blocking question/answer collaborator.
///
/// `ask` must return exactly one answer per question, in order — an
/// interviewer that cannot answer returns `Answer::Skipped`, never a short
/// vector. `confirm` backs overwrite prompts.
pub trait Interviewer {
    fn ask(&mut self, questions: &[Question]) -> Result<Vec<Answer>>;
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// Answers every question with its first suggested option, or skips free-text
/// questions. Confirms everything. Backs the CLI's `--no-input` mode.
pub struct AssumeDefaults;

impl Interviewer for AssumeDefaults {
    fn ask(&mut self, questions: &[Question]) -> Result<Vec<Answer>> {
        Ok(questions
            .iter()
            .map(|q| match q.options.first() {
                Some(opt) => Answer::Text(opt.clone()),
                None => Answer::Skipped,
            })
            .collect())
    }

    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Canned answers consumed in order; once exhausted, skips. For tests and
/// for `--answer` flags on the CLI.
pub struct Scripted {
    answers: std::collections::VecDeque<String>,
    confirm: bool,
}

impl Scripted {
    pub fn new(answers: Vec<String>) -> Self {
        Self {
            answers: answers.into(),
            confirm: true,
        }
    }

    pub fn declining(mut self) -> Self {
        self.confirm = false;
        self
    }
}

impl Interviewer for Scripted {
    fn ask(&mut self, questions: &[Question]) -> Result<Vec<Answer>> {
        Ok(questions
            .iter()
            .map(|_| match self.answers.pop_front() {
                Some(text) if !text.is_empty() => Answer::Text(text),
                _ => Answer::Skipped,
            })
            .collect())
    }

    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(self.confirm)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assume_defaults_prefers_first_option() {
        let questions = vec![
            Question::choice("Pick one", vec!["a".into(), "b".into()]),
            Question::open("Anything else?"),
        ];
        let answers = AssumeDefaults.ask(&questions).unwrap();
        assert_eq!(answers, vec![Answer::Text("a".into()), Answer::Skipped]);
    }

    #[test]
    fn scripted_answers_in_order_then_skips() {
        let mut iv = Scripted::new(vec!["first".into()]);
        let questions = vec![Question::open("q1"), Question::open("q2")];
        let answers = iv.ask(&questions).unwrap();
        assert_eq!(answers[0], Answer::Text("first".into()));
        assert_eq!(answers[1], Answer::Skipped);
    }

    #[test]
    fn answer_count_matches_question_count() {
        let questions: Vec<_> = (0..4).map(|i| Question::open(format!("q{i}"))).collect();
        assert_eq!(AssumeDefaults.ask(&questions).unwrap().len(), 4);
        assert_eq!(Scripted::new(vec![]).ask(&questions).unwrap().len(), 4);
    }

    #[test]
    fn declining_scripted_refuses_confirm() {
        let mut iv = Scripted::new(vec![]).declining();
        assert!(!iv.confirm("overwrite?").unwrap());
    }
}
