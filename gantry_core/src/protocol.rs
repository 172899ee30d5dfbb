//! Command feed protocol: newline-terminated ASCII lines from the vision
//! subsystem.
//!
//! Three grammars, tried in priority order per line:
//! 1. `PICKUP,<id>,<row>,<col>` - rebind the active plate's target
//! 2. `RELEASE` - force-advance the current move/verify state
//! 3. `<id>,<row>,<col>` - position report
//!
//! Anything else is discarded silently. An overlong line is dropped in full
//! and the assembler resynchronizes at the next terminator.

use crate::workflow::GridPos;

/// Input buffer cap; lines longer than this are discarded.
pub const MAX_LINE_LEN: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedEvent {
    /// Ordinary position report: updates the marker observation and the
    /// logical current position.
    Report { id: i32, pos: GridPos },
    /// Rebind the awaiting/picking plate's target.
    Pickup { id: i32, pos: GridPos },
    /// Force-advance the current verify/move state.
    Release,
}

/// Byte-stream line assembler feeding the grammar parser. Never blocks;
/// call `ingest` with whatever bytes are currently available.
#[derive(Debug)]
pub struct FeedParser {
    buf: Vec<u8>,
    discarding: bool,
}

impl FeedParser {
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(MAX_LINE_LEN),
            discarding: false,
        }
    }

    pub fn ingest(&mut self, bytes: &[u8], events: &mut Vec<FeedEvent>) {
        for &b in bytes {
            match b {
                b'\n' => {
                    if self.discarding {
                        self.discarding = false;
                    } else if let Ok(line) = std::str::from_utf8(&self.buf) {
                        match parse_line(line) {
                            Some(ev) => events.push(ev),
                            None => {
                                if !line.trim().is_empty() {
                                    tracing::debug!(line, "unrecognized feed line discarded");
                                }
                            }
                        }
                    } else {
                        tracing::debug!("non-utf8 feed line discarded");
                    }
                    self.buf.clear();
                }
                b'\r' => {}
                _ if self.discarding => {}
                _ => {
                    if self.buf.len() >= MAX_LINE_LEN {
                        tracing::debug!("overlong feed line discarded");
                        self.buf.clear();
                        self.discarding = true;
                    } else {
                        self.buf.push(b);
                    }
                }
            }
        }
    }
}

impl Default for FeedParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse one complete line against the three grammars.
pub fn parse_line(line: &str) -> Option<FeedEvent> {
    let line = line.trim();
    if let Some(rest) = line.strip_prefix("PICKUP,") {
        let (id, pos) = parse_triplet(rest)?;
        return Some(FeedEvent::Pickup { id, pos });
    }
    if line == "RELEASE" {
        return Some(FeedEvent::Release);
    }
    let (id, pos) = parse_triplet(line)?;
    Some(FeedEvent::Report { id, pos })
}

/// `<id>,<row>,<col>` with row/col bounded to the grid.
fn parse_triplet(s: &str) -> Option<(i32, GridPos)> {
    let mut parts = s.split(',');
    let id: i32 = parts.next()?.trim().parse().ok()?;
    let row: u8 = parts.next()?.trim().parse().ok()?;
    let col: u8 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((id, GridPos::new(row, col)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_parses() {
        assert_eq!(
            parse_line("7,2,3"),
            Some(FeedEvent::Report {
                id: 7,
                pos: GridPos::new(2, 3).unwrap()
            })
        );
    }

    #[test]
    fn pickup_takes_priority_over_report() {
        // The tail of a PICKUP line is itself a valid triplet; the prefix wins.
        assert_eq!(
            parse_line("PICKUP,1,2,3"),
            Some(FeedEvent::Pickup {
                id: 1,
                pos: GridPos::new(2, 3).unwrap()
            })
        );
    }

    #[test]
    fn release_parses() {
        assert_eq!(parse_line("RELEASE"), Some(FeedEvent::Release));
        assert_eq!(parse_line("  RELEASE  "), Some(FeedEvent::Release));
    }

    #[test]
    fn out_of_grid_coordinates_are_discarded() {
        assert_eq!(parse_line("1,5,0"), None);
        assert_eq!(parse_line("1,0,9"), None);
        assert_eq!(parse_line("1,-1,0"), None);
        assert_eq!(parse_line("PICKUP,1,7,7"), None);
    }

    #[test]
    fn malformed_lines_are_discarded() {
        for line in ["", "1,2", "1,2,3,4", "a,b,c", "RELEASE,1", "PICKUP,1,2"] {
            assert_eq!(parse_line(line), None, "{line:?}");
        }
    }
}
