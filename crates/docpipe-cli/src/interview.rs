use docpipe_core::dialogue::{Answer, Interviewer, Question, Scripted};
use docpipe_core::error::Result;
use std::io::{BufRead, Write};

/// Terminal-backed interviewer: prints each clarifying question and reads one
/// line; an empty line skips the question.
pub struct StdinInterviewer {
    /// Overwrite prompts auto-confirm when set (`--yes`).
    pub auto_confirm: bool,
}

impl Interviewer for StdinInterviewer {
    fn ask(&mut self, questions: &[Question]) -> Result<Vec<Answer>> {
        let stdin = std::io::stdin();
        let mut answers = Vec::with_capacity(questions.len());
        for (i, q) in questions.iter().enumerate() {
            println!("[{}/{}] {}", i + 1, questions.len(), q.prompt);
            if !q.options.is_empty() {
                println!("      ({})", q.options.join(" / "));
            }
            print!("> ");
            std::io::stdout().flush()?;

            let mut line = String::new();
            stdin.lock().read_line(&mut line)?;
            let line = line.trim();
            if line.is_empty() {
                answers.push(Answer::Skipped);
            } else {
                answers.push(Answer::Text(line.to_string()));
            }
        }
        Ok(answers)
    }

    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        if self.auto_confirm {
            return Ok(true);
        }
        print!("{prompt} [y/N] ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        Ok(matches!(line.trim(), "y" | "Y" | "yes"))
    }
}

/// Pick the interviewer for a command invocation: canned `--answer` values or
/// `--no-input` avoid the terminal entirely.
pub fn select(answers: Vec<String>, no_input: bool, yes: bool) -> Box<dyn Interviewer> {
    if no_input || !answers.is_empty() {
        Box::new(Scripted::new(answers))
    } else {
        Box::new(StdinInterviewer { auto_confirm: yes })
    }
}
