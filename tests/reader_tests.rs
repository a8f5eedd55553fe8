use jsonblock::reader::LineBridgingReader;

/// Drain the reader through bounded reads, writing `\n` for every line it
/// reports crossing.
fn reassemble(source: &str, max_count: usize) -> (String, usize) {
    let mut reader = LineBridgingReader::new(source, 0).unwrap();
    let mut buf = vec![0u8; max_count];
    let mut out = Vec::new();
    loop {
        let before = reader.lines_read();
        let n = reader.read_into(&mut buf, 0, max_count).unwrap();
        out.extend_from_slice(&buf[..n]);
        for _ in before..reader.lines_read() {
            out.push(b'\n');
        }
        if n == 0 && reader.is_exhausted() {
            break;
        }
    }
    (String::from_utf8(out).unwrap(), reader.lines_read())
}

#[test]
fn round_trip_normalizes_line_endings() {
    let source = "line one\r\nline two\rthree\n\nfive";
    for max_count in [1, 3, 64] {
        let (text, lines) = reassemble(source, max_count);
        assert_eq!(text, "line one\nline two\nthree\n\nfive\n");
        assert_eq!(lines, 5);
    }
}

#[test]
fn trailing_terminator_adds_no_extra_line() {
    let (text, lines) = reassemble("a\nb\n", 8);
    assert_eq!(text, "a\nb\n");
    assert_eq!(lines, 2);
}

#[test]
fn multibyte_text_survives_small_reads() {
    let (text, lines) = reassemble("héllo\r\nwörld", 2);
    assert_eq!(text, "héllo\nwörld\n");
    assert_eq!(lines, 2);
}

#[test]
fn read_stops_after_one_terminator() {
    let mut reader = LineBridgingReader::new("ab\ncd\n", 0).unwrap();
    let mut buf = [0u8; 16];
    assert_eq!(reader.read_into(&mut buf, 0, 16).unwrap(), 2);
    assert_eq!(&buf[..2], b"ab");
    assert_eq!(reader.lines_read(), 1);
    assert_eq!(reader.position(), 3);
}

#[test]
fn partial_line_does_not_count() {
    let mut reader = LineBridgingReader::new("abcdef\nx", 0).unwrap();
    let mut buf = [0u8; 4];
    assert_eq!(reader.read_into(&mut buf, 0, 4).unwrap(), 4);
    assert_eq!(reader.lines_read(), 0);
    assert_eq!(reader.read_into(&mut buf, 0, 4).unwrap(), 2);
    assert_eq!(&buf[..2], b"ef");
    assert_eq!(reader.lines_read(), 1);
}

#[test]
fn writes_at_offset() {
    let mut reader = LineBridgingReader::new("xyz", 0).unwrap();
    let mut buf = [b'-'; 6];
    assert_eq!(reader.read_into(&mut buf, 2, 3).unwrap(), 3);
    assert_eq!(&buf, b"--xyz-");
    assert_eq!(reader.lines_read(), 1);
}

#[test]
fn empty_line_reads_zero_but_counts() {
    let mut reader = LineBridgingReader::new("\nx", 0).unwrap();
    let mut buf = [0u8; 4];
    assert_eq!(reader.read_into(&mut buf, 0, 4).unwrap(), 0);
    assert_eq!(reader.lines_read(), 1);
    assert!(!reader.is_exhausted());
}

#[test]
fn exhausted_buffer_reads_zero() {
    let mut reader = LineBridgingReader::new("", 0).unwrap();
    let mut buf = [0u8; 4];
    assert_eq!(reader.read_into(&mut buf, 0, 4).unwrap(), 0);
    assert_eq!(reader.lines_read(), 0);
    assert!(reader.is_exhausted());
}

#[test]
fn starts_from_given_offset() {
    let source = "skip\n{}\n";
    let mut reader = LineBridgingReader::new(source, 5).unwrap();
    let mut buf = [0u8; 8];
    assert_eq!(reader.read_into(&mut buf, 0, 8).unwrap(), 2);
    assert_eq!(&buf[..2], b"{}");
    assert_eq!(reader.lines_read(), 1);
}

#[test]
fn max_count_beyond_capacity_is_invalid() {
    let mut reader = LineBridgingReader::new("abc", 0).unwrap();
    let mut buf = [0u8; 4];
    let err = reader.read_into(&mut buf, 2, 3).unwrap_err();
    assert!(err.is_invalid_argument());
    // Nothing was consumed.
    assert_eq!(reader.position(), 0);
}

#[test]
fn offset_outside_buffer_is_invalid() {
    let mut reader = LineBridgingReader::new("abc", 0).unwrap();
    let mut buf = [0u8; 4];
    assert!(reader.read_into(&mut buf, 4, 0).unwrap_err().is_invalid_argument());
    assert!(reader.read_into(&mut [], 0, 0).unwrap_err().is_invalid_argument());
}

#[test]
fn start_past_end_is_invalid() {
    assert!(LineBridgingReader::new("abc", 4).unwrap_err().is_invalid_argument());
    assert!(LineBridgingReader::new("abc", 3).is_ok());
}
