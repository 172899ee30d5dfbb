use gantry_core::GridPos;
use gantry_core::protocol::{FeedEvent, FeedParser, MAX_LINE_LEN, parse_line};
use rstest::rstest;

fn pos(row: u8, col: u8) -> GridPos {
    GridPos::new(row, col).expect("in range")
}

fn ingest(parser: &mut FeedParser, bytes: &[u8]) -> Vec<FeedEvent> {
    let mut events = Vec::new();
    parser.ingest(bytes, &mut events);
    events
}

#[test]
fn parses_multiple_lines_in_one_chunk() {
    let mut parser = FeedParser::new();
    let events = ingest(&mut parser, b"1,0,0\nPICKUP,2,3,4\nRELEASE\n");
    assert_eq!(
        events,
        vec![
            FeedEvent::Report { id: 1, pos: pos(0, 0) },
            FeedEvent::Pickup { id: 2, pos: pos(3, 4) },
            FeedEvent::Release,
        ]
    );
}

#[test]
fn reassembles_lines_split_across_chunks() {
    let mut parser = FeedParser::new();
    assert!(ingest(&mut parser, b"7,2").is_empty());
    assert!(ingest(&mut parser, b",3\nRELE").is_empty());
    let events = ingest(&mut parser, b"ASE\n");
    assert_eq!(
        events,
        vec![
            FeedEvent::Report { id: 7, pos: pos(2, 3) },
            FeedEvent::Release,
        ]
    );
}

#[test]
fn carriage_returns_are_ignored() {
    let mut parser = FeedParser::new();
    let events = ingest(&mut parser, b"3,1,2\r\nRELEASE\r\n");
    assert_eq!(
        events,
        vec![
            FeedEvent::Report { id: 3, pos: pos(1, 2) },
            FeedEvent::Release,
        ]
    );
}

#[test]
fn incomplete_line_waits_for_its_terminator() {
    let mut parser = FeedParser::new();
    assert!(ingest(&mut parser, b"1,2,3").is_empty(), "no newline yet");
    assert_eq!(
        ingest(&mut parser, b"\n"),
        vec![FeedEvent::Report { id: 1, pos: pos(2, 3) }]
    );
}

#[test]
fn overlong_line_is_discarded_in_full() {
    let mut parser = FeedParser::new();
    // A line that keeps a valid-looking tail beyond the cap must not have
    // that tail spliced into a parseable line.
    let mut long = vec![b'9'; MAX_LINE_LEN + 10];
    long.extend_from_slice(b"1,2,3\n");
    assert!(ingest(&mut parser, &long).is_empty());

    // The parser resynchronizes on the next line
    assert_eq!(
        ingest(&mut parser, b"4,4,4\n"),
        vec![FeedEvent::Report { id: 4, pos: pos(4, 4) }]
    );
}

#[test]
fn malformed_lines_are_dropped_between_valid_ones() {
    let mut parser = FeedParser::new();
    let events = ingest(
        &mut parser,
        b"nonsense\n1,1,1\n,,,\n5,6,7\nPICKUP,1\n2,2,2\n",
    );
    assert_eq!(
        events,
        vec![
            FeedEvent::Report { id: 1, pos: pos(1, 1) },
            FeedEvent::Report { id: 2, pos: pos(2, 2) },
        ]
    );
}

#[test]
fn non_utf8_lines_are_dropped() {
    let mut parser = FeedParser::new();
    let events = ingest(&mut parser, b"\xff\xfe\n3,3,3\n");
    assert_eq!(
        events,
        vec![FeedEvent::Report { id: 3, pos: pos(3, 3) }]
    );
}

#[test]
fn empty_lines_produce_nothing() {
    let mut parser = FeedParser::new();
    assert!(ingest(&mut parser, b"\n\n\r\n").is_empty());
}

#[rstest]
#[case("1,5,0")]
#[case("1,0,5")]
#[case("PICKUP,1,9,9")]
#[case("1,2")]
#[case("1,2,3,4")]
#[case("PICKUP,1,2")]
#[case("RELEASE,now")]
#[case("release")]
#[case("1.5,2,3")]
fn rejected_grammars(#[case] line: &str) {
    assert_eq!(parse_line(line), None, "{line:?} must be discarded");
}
