use std::collections::VecDeque;
use std::io;
use std::sync::Mutex;

/// Seam between argument resolution and the terminal. Production code talks
/// to dialoguer; tests script the answers.
pub trait Prompter: Send + Sync {
    fn read_line(&self, label: &str) -> io::Result<String>;

    /// Non-echoing input channel, so secrets never appear in terminal
    /// scrollback or shell history.
    fn read_secret(&self, label: &str) -> io::Result<String>;

    /// Line input with tab-completion over `candidates` where the terminal
    /// supports it. Falls back to a plain line read.
    fn read_command(&self, label: &str, candidates: &[String]) -> io::Result<String> {
        let _ = candidates;
        self.read_line(label)
    }
}

/// Completes a unique prefix to the full candidate; ambiguous prefixes stay
/// as typed.
pub struct NameCompletion {
    candidates: Vec<String>,
}

impl NameCompletion {
    pub fn new(candidates: &[String]) -> Self {
        Self {
            candidates: candidates.to_vec(),
        }
    }
}

impl dialoguer::Completion for NameCompletion {
    fn get(&self, input: &str) -> Option<String> {
        if input.is_empty() {
            return None;
        }
        let mut hits = self
            .candidates
            .iter()
            .filter(|candidate| candidate.starts_with(input));
        let first = hits.next()?;
        if hits.next().is_none() {
            Some(first.clone())
        } else {
            None
        }
    }
}

pub struct ConsolePrompter;

fn to_io_error(err: dialoguer::Error) -> io::Error {
    match err {
        dialoguer::Error::IO(inner) => inner,
    }
}

impl Prompter for ConsolePrompter {
    fn read_line(&self, label: &str) -> io::Result<String> {
        dialoguer::Input::<String>::new()
            .with_prompt(label)
            .allow_empty(true)
            .interact_text()
            .map_err(to_io_error)
    }

    fn read_secret(&self, label: &str) -> io::Result<String> {
        dialoguer::Password::new()
            .with_prompt(label)
            .allow_empty_password(true)
            .interact()
            .map_err(to_io_error)
    }

    fn read_command(&self, label: &str, candidates: &[String]) -> io::Result<String> {
        let completion = NameCompletion::new(candidates);
        dialoguer::Input::<String>::new()
            .with_prompt(label)
            .allow_empty(true)
            .completion_with(&completion)
            .interact_text()
            .map_err(to_io_error)
    }
}

/// Replays a fixed sequence of answers; an exhausted script reports an
/// interrupt, matching a user who walked away with Ctrl-C.
#[derive(Default)]
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<String>>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
        }
    }

    fn next_answer(&self) -> io::Result<String> {
        self.answers
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Interrupted, "no scripted answer left"))
    }
}

impl Prompter for ScriptedPrompter {
    fn read_line(&self, _label: &str) -> io::Result<String> {
        self.next_answer()
    }

    fn read_secret(&self, _label: &str) -> io::Result<String> {
        self.next_answer()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_prompter_replays_in_order() {
        let prompter = ScriptedPrompter::new(["first", "second"]);
        assert_eq!(prompter.read_line("x").unwrap(), "first");
        assert_eq!(prompter.read_secret("x").unwrap(), "second");
    }

    #[test]
    fn scripted_prompter_interrupts_when_exhausted() {
        let prompter = ScriptedPrompter::new(Vec::<String>::new());
        let err = prompter.read_line("x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Interrupted);
    }

    #[test]
    fn unique_prefix_completes_to_full_name() {
        use dialoguer::Completion;
        let completion = NameCompletion::new(&[
            "blog:post".to_string(),
            "auth:login".to_string(),
        ]);
        assert_eq!(completion.get("bl"), Some("blog:post".to_string()));
        assert_eq!(completion.get("auth:"), Some("auth:login".to_string()));
    }

    #[test]
    fn ambiguous_or_unknown_prefix_stays_as_typed() {
        use dialoguer::Completion;
        let completion = NameCompletion::new(&[
            "blog:post".to_string(),
            "blog:posts".to_string(),
        ]);
        assert_eq!(completion.get("blog:"), None);
        assert_eq!(completion.get("shop"), None);
        assert_eq!(completion.get(""), None);
    }

    #[test]
    fn read_command_falls_back_to_scripted_lines() {
        let prompter = ScriptedPrompter::new(["blog:post"]);
        let line = prompter
            .read_command(">", &["blog:post".to_string()])
            .unwrap();
        assert_eq!(line, "blog:post");
    }
}
