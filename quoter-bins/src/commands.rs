//! Interactive quote commands read from stdin
//!
//! ```text
//! start <offset> <ticks>   quote around reference + offset, ticks wide per side
//! stop                     cancel both quotes
//! status                   print state, quotes and counters
//! quit                     shut down
//! ```
//!
//! Input is validated here; nothing malformed reaches the controller.

use crossbeam_channel::Receiver;
use quoter_core::lifecycle::ControllerStatus;
use rust_decimal::Decimal;
use std::io::{self, BufRead};
use std::str::FromStr;
use std::thread;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteCommand {
    Start { offset: Decimal, ticks: u32 },
    Stop,
    Status,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command `{0}` (try start, stop, status, quit)")]
    Unknown(String),

    #[error("usage: start <offset> <ticks>")]
    Usage,

    #[error("offset `{0}` is not a decimal number")]
    Offset(String),

    #[error("ticks `{0}` must be a whole number of at least 1")]
    Ticks(String),
}

impl FromStr for QuoteCommand {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let verb = words.next().ok_or(CommandError::Empty)?;

        let command = match verb.to_ascii_lowercase().as_str() {
            "start" => {
                let (Some(offset), Some(ticks), None) = (words.next(), words.next(), words.next())
                else {
                    return Err(CommandError::Usage);
                };
                QuoteCommand::Start {
                    offset: parse_offset(offset)?,
                    ticks: parse_ticks(ticks)?,
                }
            }
            "stop" => QuoteCommand::Stop,
            "status" => QuoteCommand::Status,
            "quit" | "exit" => QuoteCommand::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

/// Decimal offset; a `,` decimal separator is accepted
pub fn parse_offset(raw: &str) -> Result<Decimal, CommandError> {
    let normalized = raw.replace(',', ".");
    Decimal::from_str(&normalized).map_err(|_| CommandError::Offset(raw.to_string()))
}

pub fn parse_ticks(raw: &str) -> Result<u32, CommandError> {
    match raw.parse::<u32>() {
        Ok(ticks) if ticks >= 1 => Ok(ticks),
        _ => Err(CommandError::Ticks(raw.to_string())),
    }
}

/// Forward stdin lines from a background thread
///
/// The channel disconnects at EOF.
pub fn spawn_stdin_reader() -> io::Result<Receiver<String>> {
    let (tx, rx) = crossbeam_channel::unbounded();
    thread::Builder::new()
        .name("stdin-commands".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        })?;
    Ok(rx)
}

pub fn print_help() {
    println!("commands: start <offset> <ticks> | stop | status | quit");
}

pub fn print_status(status: &ControllerStatus) {
    let quotes = &status.quotes;
    let price = status
        .latest_price
        .map_or_else(|| "-".to_string(), |p| p.to_string());
    println!("state: {}  reference: {}", status.state, price);
    println!(
        "buy:  {} key={} ticks={}",
        if quotes.buy_live { "live" } else { "idle" },
        quotes.buy_key,
        quotes.buy_ticks.0
    );
    println!(
        "sell: {} key={} ticks={}",
        if quotes.sell_live { "live" } else { "idle" },
        quotes.sell_key,
        quotes.sell_ticks.0
    );
    println!(
        "prices={} refreshes={} changes={} suppressed={} fills={}",
        status.stats.prices_received,
        status.stats.quote_refreshes,
        status.stats.changes_sent,
        status.stats.changes_suppressed,
        status.stats.fills_received
    );
}
