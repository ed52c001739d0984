use std::io::{self, BufRead};

/// What to do after a line has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineFlow {
    Continue,
    Stop,
}

/// Read a newline-delimited streaming response, handing each non-empty line
/// to `on_line` until it asks to stop.
///
/// Returns `Ok(true)` if `on_line` stopped the stream, `Ok(false)` if the
/// reader hit EOF first.
pub fn read_stream_lines<R, F, E>(reader: R, mut on_line: F) -> Result<bool, E>
where
    R: BufRead,
    F: FnMut(&str) -> Result<LineFlow, E>,
    E: From<io::Error>,
{
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if on_line(line)? == LineFlow::Stop {
            return Ok(true);
        }
    }

    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn skips_blank_lines_and_stops_on_request() {
        let input = "one\n\n  \ntwo\nstop\nnever\n";
        let mut seen = Vec::new();

        let stopped = read_stream_lines(Cursor::new(input), |line| {
            seen.push(line.to_string());
            Ok::<_, io::Error>(if line == "stop" {
                LineFlow::Stop
            } else {
                LineFlow::Continue
            })
        })
        .unwrap();

        assert!(stopped);
        assert_eq!(seen, ["one", "two", "stop"]);
    }

    #[test]
    fn reports_eof_without_stop() {
        let stopped =
            read_stream_lines(Cursor::new("a\nb"), |_| Ok::<_, io::Error>(LineFlow::Continue))
                .unwrap();
        assert!(!stopped);
    }
}
