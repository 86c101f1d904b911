//! Canvas drawing daemon.
//!
//! Reads operator commands and observed canvas writes from stdin, one per
//! line, and speaks the `place`/`say` line protocol on stdout. Logs go to
//! stderr.

use std::error::Error;
use std::sync::Arc;

use actors::{
    AutoSource, CancelTarget, Canvas, CanvasConfig, FileSource, HttpSource, JobStore,
    MismatchReport,
};
use canvas_core::{DrawResult, JobStatus};
use db::DbConfig;
use storage::StorageConfig;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::command::{Command, HELP, ProgressQuery};
use crate::stdio::StdioChannel;

mod command;
mod stdio;

/// Mismatches listed individually before the report is summarized.
const MISMATCH_DETAIL: usize = 10;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let level = std::env::var("CANVAS_LOG_LEVEL")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let store = JobStore::open(StorageConfig::from_env()?, &DbConfig::from_env()).await?;
    let channel = Arc::new(StdioChannel::spawn());
    let source = Arc::new(AutoSource::new(FileSource::new(), HttpSource::new()?));
    let canvas = Canvas::start(CanvasConfig::from_env(), store, channel.clone(), source).await?;
    tracing::info!("Canvas daemon ready");

    let (commands, mut pending) = mpsc::unbounded_channel();
    let reader_channel = channel.clone();
    let reader = tokio::spawn(async move {
        let stdin = BufReader::new(tokio::io::stdin());
        if let Err(e) = read_input(stdin, &reader_channel, &commands).await {
            tracing::warn!("Failed to read stdin: {}", e);
        }
    });

    loop {
        let command = tokio::select! {
            command = pending.recv() => command,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
        };
        match command {
            None | Some(Command::Quit) => break,
            Some(command) => {
                if let Err(e) = dispatch(&canvas, &channel, command).await {
                    channel.say(&format!("error: {e}"));
                }
            }
        }
    }
    reader.abort();

    canvas.shutdown().await?;
    tracing::info!("Canvas daemon stopped");
    Ok(())
}

/// Read input lines until end of input or `quit`.
///
/// Observed writes go straight to the guard; everything else is queued for
/// the dispatch loop, so a slow fetch never holds up corrections.
async fn read_input<R: AsyncBufRead + Unpin>(
    input: R,
    channel: &StdioChannel,
    commands: &mpsc::UnboundedSender<Command>,
) -> std::io::Result<()> {
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Ok(Some(Command::Event(write))) => channel.publish(write),
            Ok(Some(command)) => {
                let quit = command == Command::Quit;
                if commands.send(command).is_err() || quit {
                    break;
                }
            }
            Ok(None) => {}
            Err(e) => channel.say(&e.to_string()),
        }
    }
    Ok(())
}

async fn dispatch(canvas: &Canvas, channel: &StdioChannel, command: Command) -> DrawResult<()> {
    match command {
        Command::Image {
            reference,
            placement,
            modifiers,
        } => {
            let modifiers: Vec<&str> = modifiers.iter().map(String::as_str).collect();
            let id = canvas.draw_image(&reference, placement, &modifiers).await?;
            channel.say(&format!("queued {id}"));
        }
        Command::Text(text) => {
            let id = canvas.draw_text(&text).await?;
            channel.say(&format!("queued {id}"));
        }
        Command::Cancel(target) => {
            let target = target.map_or(CancelTarget::All, CancelTarget::Job);
            canvas.cancel(target).await?;
            channel.say("cancel requested");
        }
        Command::Pause => {
            canvas.pause()?;
            channel.say("paused");
        }
        Command::Resume => {
            canvas.resume()?;
            channel.say("resumed");
        }
        Command::Progress(ProgressQuery::Job(id)) => match canvas.progress(&id).await? {
            Some(status) => channel.say(&status.to_string()),
            None => channel.say(&format!("{id} is not queued")),
        },
        Command::Progress(ProgressQuery::All) => {
            let jobs = canvas.list().await?;
            if jobs.is_empty() {
                channel.say("no jobs");
            }
            for status in jobs {
                channel.say(&status.to_string());
            }
        }
        Command::Progress(ProgressQuery::Compact) => {
            channel.say(&summarize(&canvas.list().await?));
        }
        Command::Save(enabled) => {
            canvas.set_guard(enabled)?;
            channel.say(if enabled { "guard on" } else { "guard off" });
        }
        Command::Protect {
            reference,
            placement,
        } => {
            canvas.protect(&reference, placement).await?;
            channel.say(&format!("protecting {reference}"));
        }
        Command::Unprotect => {
            canvas.unprotect()?;
            channel.say("protection cleared");
        }
        Command::Mismatch(filter) => report(channel, &canvas.mismatch(filter).await?),
        Command::Help => channel.say(HELP),
        Command::Event(_) | Command::Quit => {}
    }
    Ok(())
}

fn summarize(jobs: &[JobStatus]) -> String {
    let drawn: usize = jobs.iter().map(|s| s.drawn).sum();
    let total: usize = jobs.iter().map(|s| s.total).sum();
    format!("{} jobs, {}/{} pixels", jobs.len(), drawn, total)
}

fn report(channel: &StdioChannel, report: &MismatchReport) {
    channel.say(&report.to_string());
    for m in report.mismatches.iter().take(MISMATCH_DETAIL) {
        channel.say(&format!(
            "({}, {}) expected {} saw {}",
            m.x, m.y, m.expected, m.observed
        ));
    }
    if report.mismatches.len() > MISMATCH_DETAIL {
        channel.say(&format!(
            "... and {} more",
            report.mismatches.len() - MISMATCH_DETAIL
        ));
    }
}
