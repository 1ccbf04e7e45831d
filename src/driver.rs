use std::io::{BufRead, Write};

use tracing::{debug, trace};

use hapbench_logs::{ExtrasTemplate, LogParser, LogRecord, OffsetClock, RecordFilter, Verdict};

use crate::config::RunConfig;
use crate::error::DriverError;

/// Counters for one run
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Lines read from the input
    pub lines: u64,

    /// Lines that did not parse
    pub parse_failures: u64,

    /// Parsed records left out by the filter
    pub skipped: u64,

    /// Records written to the output
    pub emitted: u64,

    /// Whether the run ended at the end bound rather than end of input
    pub end_reached: bool,
}

/// Streams log lines through parse, filter, offset and output
pub struct Driver {
    parser: LogParser,
    filter: RecordFilter,
    clock: OffsetClock,
    extras: Option<ExtrasTemplate>,
}

impl Driver {
    pub fn new(config: &RunConfig) -> Self {
        Self {
            parser: LogParser::new(config.format),
            filter: config.filter.clone(),
            clock: OffsetClock::new(config.offset_mode),
            extras: config.extras.clone(),
        }
    }

    /// Process every line of `reader`, writing one CSV row per accepted record
    pub fn run<R: BufRead, W: Write>(
        &mut self,
        mut reader: R,
        mut writer: W,
    ) -> Result<RunStats, DriverError> {
        let mut stats = RunStats::default();
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let read = reader.read_until(b'\n', &mut buf).map_err(DriverError::Read)?;
            if read == 0 {
                break;
            }
            stats.lines += 1;

            let line = String::from_utf8_lossy(&buf);
            let record = match self.parser.parse(&line) {
                Ok(record) => record,
                Err(err) => {
                    stats.parse_failures += 1;
                    debug!(line_number = stats.lines, error = %err, line = err.line(), "Skipping unparsable line");
                    continue;
                }
            };

            match self.filter.check(&record) {
                Verdict::Accept => {}
                Verdict::Skip(reason) => {
                    stats.skipped += 1;
                    trace!(line_number = stats.lines, ?reason, "Record filtered out");
                    continue;
                }
                Verdict::Stop => {
                    stats.end_reached = true;
                    debug!(line_number = stats.lines, time = %record.time, "End time reached");
                    break;
                }
            }

            self.emit(&record, &mut writer)?;
            stats.emitted += 1;
        }

        writer.flush().map_err(DriverError::Write)?;
        Ok(stats)
    }

    /// Write `offset,method,uri,auth,extras`
    fn emit<W: Write>(&mut self, record: &LogRecord, writer: &mut W) -> Result<(), DriverError> {
        let offset = self.clock.advance(record.time);
        let extras = self
            .extras
            .as_ref()
            .map(|template| template.render(record))
            .unwrap_or_default();

        writeln!(
            writer,
            "{},{},{},{},{}",
            offset, record.http_method, record.http_uri, record.auth_header, extras
        )
        .map_err(DriverError::Write)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunOptions;
    use hapbench_logs::LogFormat;
    use std::io::{self, Cursor};

    fn standard_line(date: &str, method: &str, request: &str) -> String {
        format!(
            r#"Dec  2 16:41:06 local0 haproxy[2072]: 1.2.3.4:5555 [{}] front back/server 0/0/0/7/7 200 359 - - ---- 72/72/1/1/0 0/0 {{|ELB-HealthChecker/1.0|Basic something}} {{|}} "{} {}"#,
            date, method, request
        )
    }

    fn complete(date: &str, method: &str, uri: &str) -> String {
        standard_line(date, method, &format!(r#"{} HTTP/1.1""#, uri))
    }

    fn run_with(options: RunOptions, input: &str) -> (String, RunStats) {
        let config = RunConfig::from_options(options, None).unwrap();
        let mut out = Vec::new();
        let stats = Driver::new(&config)
            .run(Cursor::new(input.as_bytes()), &mut out)
            .unwrap();
        (String::from_utf8(out).unwrap(), stats)
    }

    fn lines(parts: &[String]) -> String {
        parts.iter().map(|l| format!("{}\n", l)).collect()
    }

    #[test]
    fn test_real_offsets() {
        let input = lines(&[
            complete("02/Dec/2014:16:41:06.226", "GET", "/a"),
            complete("02/Dec/2014:16:41:06.726", "GET", "/b"),
            complete("02/Dec/2014:16:41:09.000", "POST", "/c"),
        ]);
        let (out, stats) = run_with(RunOptions::default(), &input);
        assert_eq!(
            out,
            "0,GET,/a,Basic something,\n500,GET,/b,Basic something,\n2774,POST,/c,Basic something,\n"
        );
        assert_eq!(stats.emitted, 3);
        assert_eq!(stats.lines, 3);
        assert!(!stats.end_reached);
    }

    #[test]
    fn test_normalized_offsets() {
        let input = lines(&[
            complete("02/Dec/2014:16:41:06.226", "GET", "/a"),
            complete("02/Dec/2014:16:50:00.000", "GET", "/b"),
            complete("02/Dec/2014:16:50:00.001", "GET", "/c"),
        ]);
        let options = RunOptions {
            normalized: Some(true),
            ..Default::default()
        };
        let (out, _) = run_with(options, &input);
        let offsets: Vec<&str> = out.lines().map(|l| l.split(',').next().unwrap()).collect();
        assert_eq!(offsets, vec!["1000", "2000", "3000"]);
    }

    #[test]
    fn test_malformed_and_truncated_lines_skipped() {
        let input = lines(&[
            "garbage".to_string(),
            standard_line("02/Dec/2014:16:41:06.226", "GET", "/cut,off"),
            complete("not-a-date", "GET", "/x"),
            complete("02/Dec/2014:16:41:07.226", "GET", "/a,b"),
        ]);
        let (out, stats) = run_with(RunOptions::default(), &input);
        assert_eq!(out, "0,GET,/a%2cb,Basic something,\n");
        assert_eq!(
            stats,
            RunStats {
                lines: 4,
                parse_failures: 2,
                skipped: 1,
                emitted: 1,
                end_reached: false,
            }
        );
    }

    #[test]
    fn test_method_filter() {
        let input = lines(&[
            complete("02/Dec/2014:16:41:06.000", "GET", "/a"),
            complete("02/Dec/2014:16:41:07.000", "POST", "/b"),
            complete("02/Dec/2014:16:41:09.000", "post", "/c"),
        ]);
        let options = RunOptions {
            method: Some("Post".to_string()),
            ..Default::default()
        };
        let (out, stats) = run_with(options, &input);
        assert_eq!(out, "0,POST,/b,Basic something,\n2000,post,/c,Basic something,\n");
        assert_eq!(stats.skipped, 1);
    }

    #[test]
    fn test_time_window_stops_run() {
        let input = lines(&[
            complete("02/Dec/2014:16:40:00.000", "GET", "/early"),
            complete("02/Dec/2014:16:41:00.000", "GET", "/a"),
            complete("02/Dec/2014:16:41:30.000", "GET", "/b"),
            complete("02/Dec/2014:16:43:00.000", "GET", "/late"),
            complete("02/Dec/2014:16:41:45.000", "GET", "/never"),
        ]);
        let options = RunOptions {
            start: Some("2014-12-02T16:41:00Z".to_string()),
            end: Some("2014-12-02T16:42:00Z".to_string()),
            ..Default::default()
        };
        let (out, stats) = run_with(options, &input);
        assert_eq!(out, "0,GET,/a,Basic something,\n30000,GET,/b,Basic something,\n");
        assert!(stats.end_reached);
        assert_eq!(stats.lines, 4);
        assert_eq!(stats.skipped, 1);
    }

    #[test]
    fn test_extras_template() {
        let input = lines(&[complete("02/Dec/2014:16:41:06.226", "GET", "/a")]);
        let options = RunOptions {
            extras: Some("{{.UserAgent}}|{{.StatusCode}}".to_string()),
            ..Default::default()
        };
        let (out, _) = run_with(options, &input);
        assert_eq!(out, "0,GET,/a,Basic something,ELB-HealthChecker/1.0|200\n");
    }

    #[test]
    fn test_extended_format_scenario() {
        let input = concat!(
            r#"Jan 1 00:00:00 local0 haproxy[2344]: 1.2.3.4 - - [02/Dec/2014:16:41:32 +0000] "GET /elb/check HTTP/1.1" 200 359 "" "" 5555 073 "front" "back" "server" 4995 0 0 5 5000 ---- 72 72 1 1 0 0 0 "" "" "" "ELB-HealthChecker/1.0" "Basic something""#,
            "\r\n",
        );
        let options = RunOptions {
            format: Some(LogFormat::Extended),
            extras: Some("{{.FrontendName}}".to_string()),
            ..Default::default()
        };
        let (out, stats) = run_with(options, input);
        assert_eq!(out, "0,GET,/elb/check,Basic something,front\n");
        assert_eq!(stats.parse_failures, 0);
    }

    #[test]
    fn test_last_line_without_newline() {
        let input = complete("02/Dec/2014:16:41:06.226", "GET", "/a");
        let (out, stats) = run_with(RunOptions::default(), &input);
        assert_eq!(out, "0,GET,/a,Basic something,\n");
        assert_eq!(stats.lines, 1);
    }

    #[test]
    fn test_invalid_utf8_does_not_abort() {
        let mut input = b"\xff\xfe broken\n".to_vec();
        input.extend_from_slice(complete("02/Dec/2014:16:41:06.226", "GET", "/a").as_bytes());

        let config = RunConfig::from_options(RunOptions::default(), None).unwrap();
        let mut out = Vec::new();
        let stats = Driver::new(&config).run(Cursor::new(input), &mut out).unwrap();
        assert_eq!(stats.parse_failures, 1);
        assert_eq!(stats.emitted, 1);
    }

    struct FailingReader;

    impl io::Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("disk on fire"))
        }
    }

    #[test]
    fn test_read_error_is_fatal() {
        let config = RunConfig::from_options(RunOptions::default(), None).unwrap();
        let reader = io::BufReader::new(FailingReader);
        let err = Driver::new(&config).run(reader, Vec::new()).unwrap_err();
        assert!(matches!(err, DriverError::Read(_)));
    }
}
