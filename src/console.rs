use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// Operator-facing I/O: result lines on stdout and interactive questions.
pub trait Console {
    fn print(&mut self, line: &str);
    /// Ask a question and return the trimmed answer.
    fn prompt(&mut self, question: &str) -> io::Result<String>;
}

pub struct StdConsole;

impl Console for StdConsole {
    fn print(&mut self, line: &str) {
        println!("{}", line);
    }

    fn prompt(&mut self, question: &str) -> io::Result<String> {
        let mut stdout = io::stdout();
        write!(stdout, "{}", question)?;
        stdout.flush()?;
        let mut answer = String::new();
        let read = io::stdin().lock().read_line(&mut answer)?;
        if read == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed"));
        }
        Ok(answer.trim().to_string())
    }
}

/// Console with canned answers, capturing everything printed.
#[derive(Debug, Default)]
pub struct ScriptedConsole {
    answers: VecDeque<String>,
    pub printed: Vec<String>,
    pub asked: Vec<String>,
}

impl ScriptedConsole {
    pub fn new(answers: &[&str]) -> Self {
        Self { answers: answers.iter().map(|a| a.to_string()).collect(), ..Default::default() }
    }
}

impl Console for ScriptedConsole {
    fn print(&mut self, line: &str) {
        self.printed.push(line.to_string());
    }

    fn prompt(&mut self, question: &str) -> io::Result<String> {
        self.asked.push(question.to_string());
        self.answers
            .pop_front()
            .map(|a| a.trim().to_string())
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no scripted answer left"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_console_replays_answers() {
        let mut c = ScriptedConsole::new(&[" y ", "n"]);
        assert_eq!(c.prompt("a? ").unwrap(), "y");
        assert_eq!(c.prompt("b? ").unwrap(), "n");
        assert!(c.prompt("c? ").is_err());
        assert_eq!(c.asked.len(), 3);
        c.print("done");
        assert_eq!(c.printed, vec!["done".to_string()]);
    }
}
