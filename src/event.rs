//! Console event handling.
//!
//! Input lines are read on a background thread and delivered through a
//! channel, interleaved with periodic ticks that let the control thread
//! apply worker results while the user is idle.

use color_eyre::Result;
use std::io::BufRead;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Events that drive the console.
#[derive(Debug, PartialEq, Eq)]
pub enum Event {
    /// One line of input, without the line ending.
    Input(String),
    /// Input is closed.
    Eof,
    /// Periodic tick.
    Tick,
}

/// Reads input and generates ticks on background threads.
pub struct EventHandler {
    receiver: mpsc::Receiver<Event>,
}

impl EventHandler {
    /// Handler reading standard input, ticking every `tick_rate_ms`.
    pub fn new(tick_rate_ms: u64) -> Self {
        Self::with_reader(std::io::BufReader::new(std::io::stdin()), tick_rate_ms)
    }

    /// Handler over any line source.
    pub fn with_reader<R>(reader: R, tick_rate_ms: u64) -> Self
    where
        R: BufRead + Send + 'static,
    {
        let tick_rate = Duration::from_millis(tick_rate_ms);
        let (sender, receiver) = mpsc::channel();

        let input_tx = sender.clone();
        thread::spawn(move || {
            for line in reader.lines() {
                let Ok(line) = line else {
                    break;
                };
                if input_tx.send(Event::Input(line)).is_err() {
                    return;
                }
            }
            let _ = input_tx.send(Event::Eof);
        });

        thread::spawn(move || loop {
            thread::sleep(tick_rate);
            if sender.send(Event::Tick).is_err() {
                return;
            }
        });

        Self { receiver }
    }

    /// Blocks until the next event is available.
    ///
    /// # Errors
    ///
    /// Returns an error if the event channel is disconnected.
    pub fn next(&self) -> Result<Event> {
        Ok(self.receiver.recv()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_lines_then_eof() {
        let events = EventHandler::with_reader(Cursor::new("status\nwake pc\n"), 10_000);
        assert_eq!(events.next().unwrap(), Event::Input("status".to_string()));
        assert_eq!(events.next().unwrap(), Event::Input("wake pc".to_string()));
        assert_eq!(events.next().unwrap(), Event::Eof);
    }

    #[test]
    fn test_ticks_keep_coming_after_eof() {
        let events = EventHandler::with_reader(Cursor::new(""), 5);
        let mut saw_eof = false;
        let mut ticks = 0;
        while !saw_eof || ticks < 2 {
            match events.next().unwrap() {
                Event::Eof => saw_eof = true,
                Event::Tick => ticks += 1,
                Event::Input(_) => panic!("no input expected"),
            }
        }
        assert!(ticks >= 2);
    }
}
