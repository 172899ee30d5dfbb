#![no_main]
use libfuzzer_sys::fuzz_target;

use gantry_core::protocol::FeedParser;

fuzz_target!(|data: &[u8]| {
    // Arbitrary byte streams must never panic the line assembler or the
    // grammar parser; malformed input is silently discarded.
    let mut parser = FeedParser::new();
    let mut events = Vec::new();
    for chunk in data.chunks(7) {
        parser.ingest(chunk, &mut events);
    }
    // Every surviving event carries in-grid coordinates by construction.
    for ev in &events {
        match ev {
            gantry_core::protocol::FeedEvent::Report { pos, .. }
            | gantry_core::protocol::FeedEvent::Pickup { pos, .. } => {
                assert!(pos.row() < 5 && pos.col() < 5);
            }
            gantry_core::protocol::FeedEvent::Release => {}
        }
    }
});
