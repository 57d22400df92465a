use std::io::{self, BufRead, BufReader, Write};
use std::os::unix::io::AsRawFd;

use hash_tables::{CollisionResolution, KeyValueTable};
use log::debug;
use mio::unix::SourceFd;
use mio::{Events, Interest, Poll, Token};

use crate::event_loop::EventLoop;

pub struct TerminalEventLoop;

const STDIN_TOKEN: Token = Token(0);

impl EventLoop for TerminalEventLoop {
    fn run(
        &mut self,
        table: &mut dyn KeyValueTable<String, String>,
        strategy: CollisionResolution,
    ) -> io::Result<()> {
        let mut poll = Poll::new()?;
        let mut events = Events::with_capacity(128);

        let fd = io::stdin().as_raw_fd();
        let mut stdin_fd = SourceFd(&fd);
        poll.registry()
            .register(&mut stdin_fd, STDIN_TOKEN, Interest::READABLE)?;

        let mut reader = BufReader::new(io::stdin());
        let mut buffer = String::new();
        let mut stdout = io::stdout();

        loop {
            match poll.poll(&mut events, None) {
                Ok(_) => (),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }

            for event in events.iter() {
                if event.token() != STDIN_TOKEN {
                    continue;
                }
                // Read all available lines without blocking
                loop {
                    match reader.read_line(&mut buffer) {
                        Ok(0) => {
                            println!("\nInput stream closed. Exiting.");
                            return Ok(());
                        }
                        Ok(_) => {
                            let input = buffer.trim();
                            if !input.is_empty() {
                                writeln!(stdout, "> {}", input)?;
                                debug!("handling command: {}", input);
                                if handle_command(input, table, strategy, &mut stdout)? {
                                    return Ok(());
                                }
                                stdout.flush()?;
                            }
                            buffer.clear();
                        }
                        Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                        Err(e) => return Err(e),
                    }
                }
            }
        }
    }
}

/// Runs one shell command against the table, writing the reply to `out`.
/// Returns true if the command was to exit
pub fn handle_command<W: Write>(
    input: &str,
    table: &mut dyn KeyValueTable<String, String>,
    strategy: CollisionResolution,
    out: &mut W,
) -> io::Result<bool> {
    let parts: Vec<&str> = input.split_whitespace().collect();
    if parts.is_empty() {
        return Ok(false);
    }

    match parts[0].to_lowercase().as_str() {
        "exit" | "quit" => {
            writeln!(out, "Goodbye!")?;
            return Ok(true);
        }
        "help" => write_help(out)?,
        "stats" => write_stats(table, strategy, out)?,
        "insert" => {
            if parts.len() < 3 {
                writeln!(out, "Usage: insert <key> <value>")?;
            } else {
                let key = parts[1].to_string();
                let value = parts[2..].join(" ");
                handle_insert(table, key, value, out)?;
            }
        }
        "remove" | "delete" => {
            if parts.len() != 2 {
                writeln!(out, "Usage: remove <key>")?;
            } else if table.remove(&parts[1].to_string()) {
                writeln!(out, "✓ Removed {}", parts[1])?;
            } else {
                writeln!(out, "✗ Key '{}' not found", parts[1])?;
            }
        }
        "get" => {
            if parts.len() != 2 {
                writeln!(out, "Usage: get <key>")?;
            } else {
                match table.retrieve(&parts[1].to_string()) {
                    Some(value) => writeln!(out, "✓ {}: {}", parts[1], value)?,
                    None => writeln!(out, "✗ Key '{}' not found", parts[1])?,
                }
            }
        }
        "contains" => {
            if parts.len() != 2 {
                writeln!(out, "Usage: contains <key>")?;
            } else {
                let found = table.retrieve(&parts[1].to_string()).is_some();
                writeln!(out, "{}", if found { "yes" } else { "no" })?;
            }
        }
        _ => {
            writeln!(
                out,
                "Unknown command: {}. Type 'help' for available commands.",
                parts[0]
            )?;
        }
    }
    Ok(false)
}

fn handle_insert<W: Write>(
    table: &mut dyn KeyValueTable<String, String>,
    key: String,
    value: String,
    out: &mut W,
) -> io::Result<()> {
    let shown = format!("{}: {}", key, value);
    match table.insert(key, value) {
        Ok(Some(previous)) => writeln!(out, "✓ Updated {} (was: {})", shown, previous),
        Ok(None) => writeln!(out, "✓ Inserted {}", shown),
        Err(e) => writeln!(out, "✗ Failed to insert {}: {}", shown, e),
    }
}

fn write_stats<W: Write>(
    table: &dyn KeyValueTable<String, String>,
    strategy: CollisionResolution,
    out: &mut W,
) -> io::Result<()> {
    writeln!(out, "=== Table Statistics ===")?;
    writeln!(out, "  Strategy: {}", strategy)?;
    writeln!(out, "  Entries: {}", table.size())?;
    writeln!(out, "  Capacity: {}", table.capacity())?;
    writeln!(out, "  Load factor: {:.3}", table.load_factor())
}

fn write_help<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "Available commands:")?;
    writeln!(out, "  insert <key> <value>  - Insert or update a key-value pair")?;
    writeln!(out, "  get <key>             - Retrieve a value by key")?;
    writeln!(out, "  remove <key>          - Remove a key (alias: delete)")?;
    writeln!(out, "  contains <key>        - Check whether a key is present")?;
    writeln!(out, "  stats                 - Show size, capacity and load factor")?;
    writeln!(out, "  help                  - Show this help message")?;
    writeln!(out, "  exit                  - Exit the program")
}

pub fn show_help() {
    if let Err(e) = write_help(&mut io::stdout()) {
        debug!("failed to print help: {}", e);
    }
}
