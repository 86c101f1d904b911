//! Operator command parsing.

use canvas_core::{CanvasWrite, JobId, Rgb};
use raster::Placement;

/// What `progress` should report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressQuery {
    All,
    Compact,
    Job(JobId),
}

/// One line of operator input.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Image {
        reference: String,
        placement: Placement,
        modifiers: Vec<String>,
    },
    Text(String),
    /// `None` cancels everything.
    Cancel(Option<JobId>),
    Pause,
    Resume,
    Progress(ProgressQuery),
    Save(bool),
    Protect {
        reference: String,
        placement: Placement,
    },
    Unprotect,
    Mismatch(Option<Rgb>),
    /// A write observed on the canvas.
    Event(CanvasWrite),
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command: {0}")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("invalid {what}: {value}")]
    Invalid { what: &'static str, value: String },
}

pub const HELP: &str = "image <ref> <x> <y> [<w>x<h>] [modifiers..] | text <msg> | cancel [id] \
    | pause | resume | progress [id|compact] | save on|off | protect <ref> <x> <y> [<w>x<h>] \
    | unprotect | mismatch [#rrggbb] | quit";

impl Command {
    /// Parse one input line; blank lines are `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let line = line.trim();
        let Some((name, rest)) = split_word(line) else {
            return Ok(None);
        };

        let command = match name.to_ascii_lowercase().as_str() {
            "image" | "draw" => {
                let (reference, placement, tail) =
                    placement_args(rest, "image <ref> <x> <y> [<w>x<h>] [modifiers..]")?;
                Command::Image {
                    reference,
                    placement,
                    modifiers: tail.iter().map(|s| s.to_string()).collect(),
                }
            }
            "text" | "say" => {
                if rest.is_empty() {
                    return Err(CommandError::Usage("text <msg>"));
                }
                Command::Text(rest.to_string())
            }
            "cancel" => match rest {
                "" | "all" => Command::Cancel(None),
                id => Command::Cancel(Some(job_id(id)?)),
            },
            "pause" => Command::Pause,
            "resume" => Command::Resume,
            "progress" | "status" => Command::Progress(match rest {
                "" => ProgressQuery::All,
                "compact" => ProgressQuery::Compact,
                id => ProgressQuery::Job(job_id(id)?),
            }),
            "save" => match rest.to_ascii_lowercase().as_str() {
                "on" => Command::Save(true),
                "off" => Command::Save(false),
                _ => return Err(CommandError::Usage("save on|off")),
            },
            "protect" => {
                let (reference, placement, tail) =
                    placement_args(rest, "protect <ref> <x> <y> [<w>x<h>]")?;
                if !tail.is_empty() {
                    return Err(CommandError::Usage("protect <ref> <x> <y> [<w>x<h>]"));
                }
                Command::Protect {
                    reference,
                    placement,
                }
            }
            "unprotect" => Command::Unprotect,
            "mismatch" => Command::Mismatch(match rest {
                "" => None,
                color => Some(Rgb::parse_hex(color).ok_or_else(|| CommandError::Invalid {
                    what: "color",
                    value: color.to_string(),
                })?),
            }),
            "event" => Command::Event(event(rest)?),
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }
}

fn split_word(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    Some(match s.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (s, ""),
    })
}

fn job_id(s: &str) -> Result<JobId, CommandError> {
    JobId::parse(s).ok_or_else(|| CommandError::Invalid {
        what: "job id",
        value: s.to_string(),
    })
}

fn coordinate(s: &str) -> Result<i64, CommandError> {
    s.parse().map_err(|_| CommandError::Invalid {
        what: "coordinate",
        value: s.to_string(),
    })
}

/// `<w>x<h>`, if the token looks like one.
fn size(s: &str) -> Option<(u32, u32)> {
    let (w, h) = s.to_ascii_lowercase().split_once('x').map(|(w, h)| (w.to_string(), h.to_string()))?;
    Some((w.parse().ok()?, h.parse().ok()?))
}

/// `<ref> <x> <y> [<w>x<h>] rest..`
fn placement_args<'a>(
    rest: &'a str,
    usage: &'static str,
) -> Result<(String, Placement, Vec<&'a str>), CommandError> {
    let mut words = rest.split_whitespace();
    let (Some(reference), Some(x), Some(y)) = (words.next(), words.next(), words.next()) else {
        return Err(CommandError::Usage(usage));
    };

    let mut placement = Placement::at(coordinate(x)?, coordinate(y)?);
    let mut tail: Vec<&str> = words.collect();
    if let Some((w, h)) = tail.first().and_then(|t| size(t)) {
        placement = placement.with_size(w, h);
        tail.remove(0);
    }
    Ok((reference.to_string(), placement, tail))
}

/// `<x> <y> <#rrggbb> [actor]`
fn event(rest: &str) -> Result<CanvasWrite, CommandError> {
    const USAGE: &str = "event <x> <y> <#rrggbb> [actor]";
    let mut words = rest.split_whitespace();
    let (Some(x), Some(y), Some(color)) = (words.next(), words.next(), words.next()) else {
        return Err(CommandError::Usage(USAGE));
    };
    Ok(CanvasWrite {
        x: coordinate(x)?,
        y: coordinate(y)?,
        color: Rgb::parse_hex(color).ok_or_else(|| CommandError::Invalid {
            what: "color",
            value: color.to_string(),
        })?,
        actor: words.next().unwrap_or("unknown").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_image_with_size_and_modifiers() -> Result<(), CommandError> {
        let command = Command::parse("image cat.png 10 -4 32x16 center start=50")?;
        assert_eq!(
            command,
            Some(Command::Image {
                reference: "cat.png".to_string(),
                placement: Placement::at(10, -4).with_size(32, 16),
                modifiers: vec!["center".to_string(), "start=50".to_string()],
            })
        );
        Ok(())
    }

    #[test]
    fn parses_image_without_size() -> Result<(), CommandError> {
        let command = Command::parse("image https://x/y.png 1 2 flip")?;
        assert!(matches!(
            command,
            Some(Command::Image { placement, modifiers, .. })
                if placement == Placement::at(1, 2) && modifiers == vec!["flip".to_string()]
        ));
        Ok(())
    }

    #[test]
    fn parses_control_commands() -> Result<(), CommandError> {
        assert_eq!(Command::parse("  ")?, None);
        assert_eq!(Command::parse("cancel")?, Some(Command::Cancel(None)));
        assert_eq!(
            Command::parse("cancel abc")?,
            Some(Command::Cancel(JobId::parse("abc")))
        );
        assert_eq!(
            Command::parse("progress compact")?,
            Some(Command::Progress(ProgressQuery::Compact))
        );
        assert_eq!(Command::parse("save OFF")?, Some(Command::Save(false)));
        assert_eq!(
            Command::parse("mismatch #ff0000")?,
            Some(Command::Mismatch(Some(Rgb::new(255, 0, 0))))
        );
        assert_eq!(
            Command::parse("text hello  world")?,
            Some(Command::Text("hello  world".to_string()))
        );
        Ok(())
    }

    #[test]
    fn parses_events() -> Result<(), CommandError> {
        assert_eq!(
            Command::parse("event 5 5 #0000ff bob")?,
            Some(Command::Event(CanvasWrite {
                x: 5,
                y: 5,
                color: Rgb::new(0, 0, 255),
                actor: "bob".to_string(),
            }))
        );
        Ok(())
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(Command::parse("dance"), Err(CommandError::Unknown(_))));
        assert!(matches!(Command::parse("image a.png 1"), Err(CommandError::Usage(_))));
        assert!(matches!(
            Command::parse("image a.png one 2"),
            Err(CommandError::Invalid { what: "coordinate", .. })
        ));
        assert!(matches!(Command::parse("save maybe"), Err(CommandError::Usage(_))));
        assert!(matches!(Command::parse("mismatch red"), Err(CommandError::Invalid { .. })));
    }
}
