//! Terminal front-end driving a session.
//!
//! Runs on a single-threaded runtime. Pending calls sit in a
//! `FuturesUnordered` next to stdin; whichever finishes first is handled, so a
//! new search can be typed while an older one is still in flight.

use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Context};
use futures::{stream::FuturesUnordered, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::{
    app::SearchBackend,
    render::Renderer,
    session::{
        types::ImageUpload, Orchestrator, Outcome, PendingCall, Phase, Surface,
    },
};

const HELP: &str = "\
Type a query to search. Commands:
  /image PATH     search by example image
  /refine TEXT    refine the current results
  /history        list recent queries
  /again N        search history entry N again
  /open N         show image result N
  /close          close the image view
  /show           print the current results
  /reset          clear the session
  /help           this text
  /quit           exit";

#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Search(String),
    Image(PathBuf),
    Refine(String),
    History,
    Again(usize),
    Open(usize),
    Close,
    Show,
    Reset,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl ShellCommand {
    pub fn parse(line: &str) -> ShellCommand {
        let line = line.trim();
        if line.is_empty() {
            return ShellCommand::Empty;
        }

        let Some(command) = line.strip_prefix('/') else {
            return ShellCommand::Search(line.to_string());
        };

        let (name, arg) = command
            .split_once(char::is_whitespace)
            .map(|(name, arg)| (name, arg.trim()))
            .unwrap_or((command, ""));

        match name {
            "image" | "img" if !arg.is_empty() => ShellCommand::Image(PathBuf::from(arg)),
            "refine" | "r" => ShellCommand::Refine(arg.to_string()),
            "history" | "h" => ShellCommand::History,
            "again" | "a" => parse_index(arg).map_or_else(|| unknown(line), ShellCommand::Again),
            "open" | "o" => parse_index(arg).map_or_else(|| unknown(line), ShellCommand::Open),
            "close" => ShellCommand::Close,
            "show" => ShellCommand::Show,
            "reset" | "clear" => ShellCommand::Reset,
            "help" | "?" => ShellCommand::Help,
            "quit" | "q" | "exit" => ShellCommand::Quit,
            _ => unknown(line),
        }
    }
}

fn unknown(line: &str) -> ShellCommand {
    ShellCommand::Unknown(line.to_string())
}

/// 1-based on screen, 0-based inside.
fn parse_index(arg: &str) -> Option<usize> {
    arg.parse::<usize>().ok()?.checked_sub(1)
}

/// Spinner shown while a call is in flight.
#[derive(Default)]
struct Status {
    bar: Option<ProgressBar>,
}

impl Status {
    fn sync(&mut self, phase: Phase) {
        if !phase.is_loading() {
            if let Some(bar) = self.bar.take() {
                bar.finish_and_clear();
            }
            return;
        }

        let message = match phase {
            Phase::Refining => "refining…",
            _ => "searching…",
        };
        let bar = self.bar.get_or_insert_with(|| {
            let bar = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
                bar.set_style(style);
            }
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        });
        bar.set_message(message);
    }

    fn println(&self, text: &str) {
        match &self.bar {
            Some(bar) => bar.suspend(|| println!("{text}")),
            None => println!("{text}"),
        }
    }
}

/// Interactive loop. Returns when stdin closes, on `/quit` or on Ctrl-C.
pub async fn run<B: SearchBackend + 'static>(
    mut orchestrator: Orchestrator<B, Surface>,
    renderer: Renderer,
) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut in_flight: FuturesUnordered<PendingCall> = FuturesUnordered::new();
    let mut status = Status::default();

    println!("{HELP}");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                let command = ShellCommand::parse(&line);
                if command == ShellCommand::Quit {
                    break;
                }
                if let Some(call) = handle(&mut orchestrator, &renderer, &status, command).await {
                    in_flight.push(call);
                }
            }
            Some(completion) = in_flight.next(), if !in_flight.is_empty() => {
                match orchestrator.complete(completion) {
                    Outcome::Applied => {
                        status.sync(orchestrator.session().phase());
                        status.println(&renderer.session(orchestrator.session()));
                    }
                    Outcome::Failed => {
                        status.sync(orchestrator.session().phase());
                        if let Some(message) = orchestrator.boundary_mut().take() {
                            status.println(&format!("error: {message}"));
                        }
                    }
                    Outcome::Stale => {}
                }
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }

        status.sync(orchestrator.session().phase());
    }

    status.sync(Phase::Idle);
    Ok(())
}

async fn handle<B: SearchBackend + 'static>(
    orchestrator: &mut Orchestrator<B, Surface>,
    renderer: &Renderer,
    status: &Status,
    command: ShellCommand,
) -> Option<PendingCall> {
    match command {
        ShellCommand::Search(query) => orchestrator.text_search(&query),
        ShellCommand::Image(path) => match ImageUpload::from_path(&path).await {
            Ok(upload) => orchestrator.image_search(upload),
            Err(err) => {
                status.println(&format!("cannot read {}: {err}", path.display()));
                None
            }
        },
        ShellCommand::Refine(text) => {
            orchestrator.set_refine_draft(&text);
            let call = orchestrator.submit_refine_draft();
            if call.is_none() && orchestrator.session().continuity_embedding().is_none() {
                status.println("search for something first");
            }
            call
        }
        ShellCommand::History => {
            status.println(renderer.history(orchestrator.history()).trim_end());
            None
        }
        ShellCommand::Again(index) => {
            let call = orchestrator.reissue_at(index);
            if call.is_none() {
                status.println("no such history entry");
            }
            call
        }
        ShellCommand::Open(index) => {
            if orchestrator.select_image_at(index) {
                if let Some(detail) = renderer.selection(orchestrator.session()) {
                    status.println(detail.trim_end());
                }
            } else {
                status.println("no such image");
            }
            None
        }
        ShellCommand::Close => {
            orchestrator.clear_selection();
            None
        }
        ShellCommand::Show => {
            status.println(renderer.session(orchestrator.session()).trim_end());
            None
        }
        ShellCommand::Reset => {
            orchestrator.reset();
            status.println("session cleared");
            None
        }
        ShellCommand::Help => {
            status.println(HELP);
            None
        }
        ShellCommand::Unknown(line) => {
            status.println(&format!("unknown command: {line} (try /help)"));
            None
        }
        ShellCommand::Quit | ShellCommand::Empty => None,
    }
}

/// Non-interactive run: one search followed by a chain of refinements.
/// Stops at the first failure.
pub async fn drive<B: SearchBackend + 'static>(
    orchestrator: &mut Orchestrator<B, Surface>,
    first: PendingCall,
    refinements: &[String],
) -> anyhow::Result<()> {
    settle(orchestrator, first).await?;

    for text in refinements {
        let Some(call) = orchestrator.refine(text) else {
            tracing::warn!("skipping empty refinement {text:?}");
            continue;
        };
        settle(orchestrator, call).await?;
    }

    Ok(())
}

async fn settle<B: SearchBackend + 'static>(
    orchestrator: &mut Orchestrator<B, Surface>,
    call: PendingCall,
) -> anyhow::Result<()> {
    let completion = call.await;
    if orchestrator.complete(completion) == Outcome::Failed {
        let message = orchestrator
            .boundary_mut()
            .take()
            .unwrap_or_else(|| "search failed".to_string());
        bail!(message);
    }
    Ok(())
}
