//! Interactive chat loop.
//!
//! Plays the part of the site's chat widget: shows suggestion chips as a
//! numbered list, sends typed lines, and prints inline notices.

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};

use folio_chat::{ChatError, ChatOrchestrator, SendOutcome};
use folio_core::preferences::Preferences;
use folio_core::types::Mode;

/// What a line of visitor input means.
#[derive(Debug, PartialEq, Eq)]
pub enum Input {
    Quit,
    Help,
    Chip(String),
    Text(String),
    Ignored,
}

/// Interpret `line` against the chips currently shown.
pub fn interpret(line: &str, chips: &[String]) -> Input {
    let line = line.trim();
    match line {
        "" => Input::Ignored,
        "/quit" | "/exit" => Input::Quit,
        "/help" => Input::Help,
        _ => match line.parse::<usize>() {
            Ok(n) if (1..=chips.len()).contains(&n) => Input::Chip(chips[n - 1].clone()),
            _ => Input::Text(line.to_string()),
        },
    }
}

/// Interpret a mode choice typed at the picker.
pub fn interpret_mode(line: &str) -> Option<Mode> {
    match line.trim() {
        "1" => Some(Mode::Basic),
        "2" => Some(Mode::Technical),
        other => other.parse().ok(),
    }
}

fn print_chips(chips: &[String]) {
    for (i, chip) in chips.iter().enumerate() {
        println!("  [{}] {}", i + 1, chip);
    }
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

pub async fn run(orch: &ChatOrchestrator, prefs: Preferences) -> Result<(), ChatError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Folio chat ({} theme). Type /help for commands.", prefs.theme);

    while orch.mode()?.is_none() {
        println!("How would you like to chat?");
        println!("  [1] Casual: background, projects, availability");
        println!("  [2] Technical: stack, system design, practices");
        prompt();
        let Ok(Some(line)) = lines.next_line().await else {
            return Ok(());
        };
        match interpret_mode(&line) {
            Some(mode) => orch.select_mode(mode)?,
            None => println!("Please pick 1 or 2."),
        }
    }

    loop {
        let chips = orch.suggestions()?;
        print_chips(&chips);
        prompt();

        let Ok(Some(line)) = lines.next_line().await else {
            break;
        };

        let result = match interpret(&line, &chips) {
            Input::Ignored => continue,
            Input::Quit => break,
            Input::Help => {
                println!("Type a question, pick a suggestion by number, or /quit.");
                continue;
            }
            Input::Chip(chip) => {
                println!("you: {}", chip);
                orch.click_chip(&chip).await
            }
            Input::Text(text) => orch.send_text(&text).await,
        };

        match result {
            Ok(SendOutcome::Replied(reply)) => println!("\n{}\n", reply.content),
            Ok(SendOutcome::Cancelled) | Ok(SendOutcome::Superseded) => {}
            Err(e) => {
                tracing::debug!(error = %e, "Send rejected");
                println!("({})", e.user_notice());
            }
        }
    }

    orch.cancel()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chips() -> Vec<String> {
        vec!["What does he do?".to_string(), "What has he built?".to_string()]
    }

    #[test]
    fn test_numbers_pick_chips() {
        assert_eq!(interpret("2", &chips()), Input::Chip("What has he built?".into()));
        assert_eq!(interpret(" 1 ", &chips()), Input::Chip("What does he do?".into()));
    }

    #[test]
    fn test_out_of_range_number_is_text() {
        assert_eq!(interpret("3", &chips()), Input::Text("3".into()));
        assert_eq!(interpret("0", &chips()), Input::Text("0".into()));
        assert_eq!(interpret("1", &[]), Input::Text("1".into()));
    }

    #[test]
    fn test_commands_and_blank() {
        assert_eq!(interpret("/quit", &chips()), Input::Quit);
        assert_eq!(interpret("/help", &chips()), Input::Help);
        assert_eq!(interpret("   ", &chips()), Input::Ignored);
        assert_eq!(
            interpret("tell me about pulseops", &chips()),
            Input::Text("tell me about pulseops".into())
        );
    }

    #[test]
    fn test_mode_picker() {
        assert_eq!(interpret_mode("1"), Some(Mode::Basic));
        assert_eq!(interpret_mode("technical"), Some(Mode::Technical));
        assert_eq!(interpret_mode("9"), None);
    }
}
