// s3-rewind/src/prompt/mod.rs
use anyhow::{Context, Result};
use std::io::{Write, stdin, stdout};

/// How to handle a key that does not have enough history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsufficientChoice {
    SkipThis,
    SkipAll,
    Abort,
}

/// Human decisions the restore flow needs before doing anything destructive.
pub trait Prompter {
    fn confirm(&self, message: &str) -> Result<bool>;

    fn insufficient_choice(&self, key: &str) -> Result<InsufficientChoice>;
}

/// Asks on the terminal. Anything but an explicit yes is a no.
pub struct StdinPrompter;

impl StdinPrompter {
    fn ask(&self, question: &str) -> Result<String> {
        print!("{}", question);
        stdout().flush().context("Failed to flush stdout")?;

        let mut input = String::new();
        stdin().read_line(&mut input).context("Failed to read user input")?;
        Ok(input.trim().to_string())
    }
}

impl Prompter for StdinPrompter {
    fn confirm(&self, message: &str) -> Result<bool> {
        let answer = self.ask(&format!("{} [y/N]: ", message))?;
        Ok(parse_confirmation(&answer))
    }

    fn insufficient_choice(&self, key: &str) -> Result<InsufficientChoice> {
        println!("Not enough versions for '{}'. How should this be handled?", key);
        println!("1. Skip this key");
        println!("2. Skip this and all future insufficient keys");
        println!("3. Abort run");
        let answer = self.ask("Enter your choice: ")?;
        Ok(parse_insufficient_choice(&answer))
    }
}

/// Non-interactive mode: confirms everything and skips every key that lacks history.
pub struct AssumeYesPrompter;

impl Prompter for AssumeYesPrompter {
    fn confirm(&self, message: &str) -> Result<bool> {
        println!("{} [assumed yes]", message);
        Ok(true)
    }

    fn insufficient_choice(&self, _key: &str) -> Result<InsufficientChoice> {
        Ok(InsufficientChoice::SkipAll)
    }
}

fn parse_confirmation(answer: &str) -> bool {
    matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes")
}

fn parse_insufficient_choice(answer: &str) -> InsufficientChoice {
    match answer.to_ascii_lowercase().as_str() {
        "1" | "skip" => InsufficientChoice::SkipThis,
        "2" | "skip-all" | "all" => InsufficientChoice::SkipAll,
        _ => InsufficientChoice::Abort,
    }
}
