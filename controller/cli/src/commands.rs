//! Operator Commands for `watch`
//!
//! One command per stdin line. Commands that need a file name the path;
//! reading it is left to the caller so parsing stays synchronous.
//!
//! ```text
//! text [--align=left|center|right] [--layout=NAME] [--temp] <message>
//! image <path> [--temp] [--crop=W:H]
//! idle-art <path>
//! delete <filename> [--yes]
//! display | clear | update | weather | met | refresh | poll
//! ai <prompt>
//! help | quit
//! ```

use std::path::PathBuf;

use inkframe_core::{Action, Alignment, AspectRatio, ControlEvent, TextOptions};

/// A parsed stdin line
#[derive(Clone, Debug)]
pub enum Command {
    /// Ready to send to the poll loop
    Event(ControlEvent),
    /// Stage a photo read from disk
    StageImage {
        /// Image path
        path: PathBuf,
        /// Show once
        temp_msg: bool,
        /// Crop override
        crop: Option<AspectRatio>,
    },
    /// Upload idle art read from disk
    UploadIdleArt {
        /// Image path
        path: PathBuf,
    },
    /// Ask before deleting
    ConfirmDelete {
        /// Gallery filename
        filename: String,
    },
    /// Print usage
    Help,
    /// Leave `watch`
    Quit,
}

/// Usage shown by `help`
pub const HELP: &str = "\
commands:
  text [--align=left|center|right] [--layout=NAME] [--temp] <message>
  image <path> [--temp] [--crop=W:H]
  idle-art <path>
  delete <filename> [--yes]
  display      promote staged content
  clear        clear the frame
  update       ask the frame to refresh
  weather      stage the weather card
  ai <prompt>  generate and stage an image
  met          stage a random museum piece
  refresh      reload the idle-art gallery
  poll         re-check the gateway now
  quit";

/// Parse one line; `Ok(None)` for a blank line
pub fn parse(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    let command = match verb {
        "text" => parse_text(rest)?,
        "image" => {
            let mut temp_msg = false;
            let mut crop = None;
            let mut path = None;
            for word in rest.split_whitespace() {
                if word == "--temp" {
                    temp_msg = true;
                } else if let Some(ratio) = word.strip_prefix("--crop=") {
                    crop = Some(ratio.parse()?);
                } else if path.is_none() {
                    path = Some(PathBuf::from(word));
                } else {
                    return Err(format!("unexpected argument '{word}'"));
                }
            }
            let path = path.ok_or("usage: image <path> [--temp] [--crop=W:H]")?;
            Command::StageImage {
                path,
                temp_msg,
                crop,
            }
        }
        "idle-art" => {
            if rest.is_empty() {
                return Err("usage: idle-art <path>".to_string());
            }
            Command::UploadIdleArt {
                path: PathBuf::from(rest),
            }
        }
        "delete" => {
            let (flags, words): (Vec<&str>, Vec<&str>) =
                rest.split_whitespace().partition(|word| *word == "--yes");
            let confirmed = !flags.is_empty();
            let filename = words.join(" ");
            if filename.is_empty() {
                return Err("usage: delete <filename> [--yes]".to_string());
            }
            if confirmed {
                action(Action::DeleteIdleArt {
                    filename,
                    confirmed: true,
                })
            } else {
                Command::ConfirmDelete { filename }
            }
        }
        "ai" => action(Action::GenerateAiImage {
            prompt: rest.to_string(),
        }),
        "display" => action(Action::Display),
        "clear" => action(Action::Clear),
        "update" => action(Action::RequestUpdate),
        "weather" => action(Action::SendWeather),
        "met" => action(Action::RandomMetArt),
        "refresh" => Command::Event(ControlEvent::RefreshIdleArt),
        "poll" => Command::Event(ControlEvent::PollNow),
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("unknown command '{other}' (try 'help')")),
    };
    Ok(Some(command))
}

fn action(action: Action) -> Command {
    Command::Event(ControlEvent::Action(action))
}

/// Leading `--flag` words are options, the remainder is the message
fn parse_text(rest: &str) -> Result<Command, String> {
    let mut options = TextOptions::default();
    let mut remaining = rest;

    while let Some(word) = remaining.split_whitespace().next() {
        if !word.starts_with("--") {
            break;
        }
        if word == "--temp" {
            options = options.temporary();
        } else if let Some(align) = word.strip_prefix("--align=") {
            options = options.with_alignment(align.parse::<Alignment>()?);
        } else if let Some(layout) = word.strip_prefix("--layout=") {
            options = options.with_layout(layout);
        } else {
            return Err(format!("unknown option '{word}'"));
        }
        remaining = remaining.trim_start()[word.len()..].trim_start();
    }

    Ok(action(Action::StageText {
        text: remaining.to_string(),
        options,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse_action(line: &str) -> Action {
        match parse(line).unwrap() {
            Some(Command::Event(ControlEvent::Action(action))) => action,
            other => panic!("expected an action, got {other:?}"),
        }
    }

    #[test]
    fn test_blank_line() {
        assert!(parse("   ").unwrap().is_none());
    }

    #[test]
    fn test_text_with_options() {
        match parse_action("text --align=center --temp  Happy Birthday  Sam") {
            Action::StageText { text, options } => {
                assert_eq!(text, "Happy Birthday  Sam");
                assert_eq!(options.alignment, Some(Alignment::Center));
                assert!(options.temp_msg);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_text_without_message_is_passed_through() {
        // The dispatcher rejects empty text with its own status line
        match parse_action("text") {
            Action::StageText { text, .. } => assert!(text.is_empty()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_bad_alignment() {
        assert!(parse("text --align=justify hi").is_err());
    }

    #[test]
    fn test_image_command() {
        match parse("image ./cat.jpg --crop=5:3 --temp").unwrap() {
            Some(Command::StageImage {
                path,
                temp_msg,
                crop,
            }) => {
                assert_eq!(path, PathBuf::from("./cat.jpg"));
                assert!(temp_msg);
                assert_eq!(crop, AspectRatio::new(5, 3));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(parse("image").is_err());
    }

    #[test]
    fn test_delete_needs_confirmation() {
        assert!(matches!(
            parse("delete sunset.png").unwrap(),
            Some(Command::ConfirmDelete { ref filename }) if filename == "sunset.png"
        ));
        match parse_action("delete sunset.png --yes") {
            Action::DeleteIdleArt {
                filename,
                confirmed,
            } => {
                assert_eq!(filename, "sunset.png");
                assert!(confirmed);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_delete_flag_must_be_its_own_word() {
        assert!(matches!(
            parse("delete foo--yes").unwrap(),
            Some(Command::ConfirmDelete { ref filename }) if filename == "foo--yes"
        ));
        match parse_action("delete --yes sunset.png") {
            Action::DeleteIdleArt {
                filename,
                confirmed,
            } => {
                assert_eq!(filename, "sunset.png");
                assert!(confirmed);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            parse("delete old sunset.png").unwrap(),
            Some(Command::ConfirmDelete { ref filename }) if filename == "old sunset.png"
        ));
        assert!(parse("delete --yes").is_err());
    }

    #[test]
    fn test_simple_verbs() {
        assert!(matches!(parse_action("display"), Action::Display));
        assert!(matches!(parse_action("clear"), Action::Clear));
        assert!(matches!(parse_action("met"), Action::RandomMetArt));
        assert!(matches!(
            parse("poll").unwrap(),
            Some(Command::Event(ControlEvent::PollNow))
        ));
        assert!(matches!(parse("quit").unwrap(), Some(Command::Quit)));
    }

    #[test]
    fn test_unknown_command() {
        let err = parse("dance").unwrap_err();
        assert!(err.contains("dance"));
    }
}
