//! Interactive loop: reads lines, dispatches actions, redraws the list.
//!
//! # Responsibility
//! - Feed parsed commands to the controller one at a time.
//! - Ask y/N questions for confirmations on the same input stream.
//! - Poll for changes from other terminals while waiting for input.
//!
//! # Invariants
//! - All controller work happens on the loop thread; the input thread only
//!   forwards raw lines.

use crate::commands::{parse_line, to_action, Command, HELP};
use crate::screen;
use anyhow::Result;
use chrono::TimeZone;
use log::{info, warn};
use std::fmt::Display;
use std::io::Write;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;
use tasklist_core::{Clock, Confirm, Controller, DurableSlot};

/// How often idle time is used to look for changes from other contexts.
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct Repl<S, C, Tz, W>
where
    S: DurableSlot,
    C: Clock,
    Tz: TimeZone,
    Tz::Offset: Display,
    W: Write,
{
    controller: Controller<S, C, Tz>,
    lines: Receiver<String>,
    out: W,
}

impl<S, C, Tz, W> Repl<S, C, Tz, W>
where
    S: DurableSlot,
    C: Clock,
    Tz: TimeZone,
    Tz::Offset: Display,
    W: Write,
{
    pub fn new(controller: Controller<S, C, Tz>, lines: Receiver<String>, out: W) -> Self {
        Self {
            controller,
            lines,
            out,
        }
    }

    pub fn controller(&self) -> &Controller<S, C, Tz> {
        &self.controller
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// Runs until `:quit` or the input stream closes.
    pub fn run(&mut self) -> Result<()> {
        info!("event=repl_start module=cli status=ok");
        self.redraw()?;

        loop {
            match self.lines.recv_timeout(POLL_INTERVAL) {
                Ok(line) => {
                    if self.handle_line(&line)? == Flow::Quit {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => self.idle(false)?,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        info!("event=repl_stop module=cli status=ok");
        Ok(())
    }

    fn handle_line(&mut self, line: &str) -> Result<Flow> {
        // Indices typed by the user must resolve against the latest list.
        if self.sync()? {
            self.controller.tick();
            self.redraw()?;
        }

        let editing = self.controller.view().editing_item().is_some();
        let command = match parse_line(line, editing) {
            Ok(Some(command)) => command,
            Ok(None) => {
                self.write_prompt()?;
                return Ok(Flow::Continue);
            }
            Err(err) => {
                writeln!(self.out, "  ! {err}")?;
                self.write_prompt()?;
                return Ok(Flow::Continue);
            }
        };

        match command {
            Command::Quit => return Ok(Flow::Quit),
            Command::Help => {
                writeln!(self.out, "{HELP}")?;
                self.write_prompt()?;
                return Ok(Flow::Continue);
            }
            Command::Refresh => {
                self.idle(true)?;
                return Ok(Flow::Continue);
            }
            _ => {}
        }

        let action = match to_action(command, self.controller.view()) {
            Ok(Some(action)) => action,
            Ok(None) => return Ok(Flow::Continue),
            Err(err) => {
                writeln!(self.out, "  ! {err}")?;
                self.write_prompt()?;
                return Ok(Flow::Continue);
            }
        };

        let mut confirm = LineConfirm {
            lines: &self.lines,
            out: &mut self.out,
        };
        if self.controller.dispatch(action, &mut confirm) {
            self.redraw()?;
        } else {
            self.write_prompt()?;
        }
        Ok(Flow::Continue)
    }

    /// Polls other contexts and the save indicator. `force` redraws even when
    /// nothing changed.
    fn idle(&mut self, force: bool) -> Result<()> {
        let synced = self.sync()?;

        if synced || force {
            self.controller.tick();
            return self.redraw();
        }

        if self.controller.tick() {
            writeln!(self.out, "\n  · {}", self.controller.indicator().label())?;
            self.write_prompt()?;
        }
        Ok(())
    }

    /// Reloads when another context changed the list; reports whether it did.
    fn sync(&mut self) -> Result<bool> {
        let synced = match self.controller.poll_sync() {
            Ok(synced) => synced,
            Err(err) => {
                warn!(
                    "event=sync_poll module=cli status=error error={}",
                    err
                );
                writeln!(self.out, "  ! could not check for changes: {err}")?;
                false
            }
        };
        if synced {
            writeln!(self.out, "\n  (updated from another terminal)")?;
        }
        Ok(synced)
    }

    fn redraw(&mut self) -> Result<()> {
        let text = screen::draw(
            self.controller.view(),
            self.controller.indicator().label(),
        );
        write!(self.out, "{text}")?;
        self.write_prompt()
    }

    fn write_prompt(&mut self) -> Result<()> {
        write!(self.out, "{}", screen::prompt(self.controller.view()))?;
        self.out.flush()?;
        Ok(())
    }
}

/// y/N confirmation read from the REPL's own input stream.
struct LineConfirm<'a, W: Write> {
    lines: &'a Receiver<String>,
    out: &'a mut W,
}

impl<W: Write> Confirm for LineConfirm<'_, W> {
    fn confirm(&mut self, prompt: &str) -> bool {
        if write!(self.out, "{prompt} [y/N] ")
            .and_then(|()| self.out.flush())
            .is_err()
        {
            return false;
        }
        match self.lines.recv() {
            Ok(answer) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }
}
