//! HAProxy log line grammars
//!
//! One named-capture pattern per [`LogFormat`]. Both patterns expose the same
//! capture names so record assembly never needs to know which one matched.
//! Groups a format does not carry are simply absent from its pattern.

use chrono::{DateTime, FixedOffset, NaiveDateTime, ParseError};
use once_cell::sync::Lazy;
use regex::Regex;

use hapbench_types::LogFormat;

/// Accept date in the default HTTP format, e.g. `02/Dec/2014:16:41:06.226` (UTC)
const STANDARD_DATE_LAYOUT: &str = "%d/%b/%Y:%H:%M:%S.%3f";

/// Accept date in the custom format, e.g. `02/Dec/2014:16:41:32 +0000`
const EXTENDED_DATE_LAYOUT: &str = "%d/%b/%Y:%H:%M:%S %z";

/// `frontend backend/server Tq/Tw/Tc/Tr/Tt status bytes cookies state conns queues [{captures}] "request"`
static STANDARD: Lazy<Grammar> = Lazy::new(|| {
    let pattern = concat!(
        r"^.*haproxy\[(?P<pid>\d+)\]:\s",
        r"(?P<clientip>\d+\.\d+\.\d+\.\d+):(?P<clientport>\d+)\s",
        r"\[(?P<date>\d{2}/[A-Za-z]{3}/\d{4}:\d{2}:\d{2}:\d{2}\.\d{3})\]\s",
        r"(?P<frontend>\S+)\s",
        r"(?P<backend>\S+)/(?P<server>\S+)\s",
        r"(?P<timesend>[\d-]+)/(?P<timewait>[\d-]+)/(?P<timeconnection>[\d-]+)/(?P<timeresponse>[\d-]+)/(?P<timetotal>[\d-]+)\s",
        r"(?P<statuscode>[\d-]+)\s",
        r"(?P<bytesread>\d+)\s",
        r"(?P<requestcookie>\S+)\s(?P<responsecookie>\S+)\s",
        r"(?P<terminationstate>\S+)\s",
        r"(?P<activeconnections>\d+)/(?P<frontendconnections>\d+)/(?P<backendconnections>\d+)/(?P<serverconnections>\d+)/(?P<retries>\d+)\s",
        r"(?P<serverqueue>\d+)/(?P<backendqueue>\d+)\s",
        r"(?:\{[^|]*\|(?P<useragent>[^|]*)\|(?P<authheader>.*?)\}\s\{(?P<responseheaders>.*)\}\s)?",
        r#""(?P<httpmethod>\w+)\s(?P<httpuri>\S+)(?:\s(?P<httpprotocol>\S+)")?$"#,
    );
    Grammar::new(LogFormat::Standard, pattern, DateLayout::Utc(STANDARD_DATE_LAYOUT))
});

/// `ip - - [date] "request" status bytes "cookies" port ms "names" timers state conns queues "captures"`
static EXTENDED: Lazy<Grammar> = Lazy::new(|| {
    let pattern = concat!(
        r"^.*haproxy\[(?P<pid>\d+)\]:\s",
        r"(?P<clientip>\d+\.\d+\.\d+\.\d+)\s\S+\s\S+\s",
        r"\[(?P<date>\d{2}/[A-Za-z]{3}/\d{4}:\d{2}:\d{2}:\d{2}\s[+-]\d{4})\]\s",
        r#""(?P<httpmethod>\w+)\s(?P<httpuri>[^\s"]+)(?:\s(?P<httpprotocol>[^\s"]+))?"\s"#,
        r"(?P<statuscode>-?\d+)\s",
        r"(?P<bytesread>\d+)\s",
        r#""(?P<requestcookie>[^"]*)"\s"(?P<responsecookie>[^"]*)"\s"#,
        r"(?P<clientport>\d+)\s\d+\s",
        r#""(?P<frontend>[^"]*)"\s"(?P<backend>[^"]*)"\s"(?P<server>[^"]*)"\s"#,
        r"(?P<timesend>-?\d+)\s(?P<timewait>-?\d+)\s(?P<timeconnection>-?\d+)\s(?P<timeresponse>-?\d+)\s(?P<timetotal>-?\d+)\s",
        r"(?P<terminationstate>\S+)\s",
        r"(?P<activeconnections>\d+)\s(?P<frontendconnections>\d+)\s(?P<backendconnections>\d+)\s(?P<serverconnections>\d+)\s(?P<retries>\d+)\s",
        r"(?P<serverqueue>\d+)\s(?P<backendqueue>\d+)\s",
        r#""(?P<responseheaders>[^"]*)"\s"(?P<referer>[^"]*)"\s"(?P<xforward>[^"]*)"\s"#,
        r#""(?P<useragent>[^"]*)"\s"(?P<authheader>[^"]*)"$"#,
    );
    Grammar::new(LogFormat::Extended, pattern, DateLayout::Zoned(EXTENDED_DATE_LAYOUT))
});

/// How the accept-date token is turned into an absolute time
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DateLayout {
    /// No zone in the token; the time is taken as UTC
    Utc(&'static str),
    /// The token carries its own `±HHMM` offset
    Zoned(&'static str),
}

impl DateLayout {
    /// Parse an accept-date token
    pub fn parse(&self, text: &str) -> Result<DateTime<FixedOffset>, ParseError> {
        match self {
            Self::Utc(layout) => {
                NaiveDateTime::parse_from_str(text, layout).map(|naive| naive.and_utc().fixed_offset())
            }
            Self::Zoned(layout) => DateTime::parse_from_str(text, layout),
        }
    }
}

/// A compiled line pattern plus the date layout that goes with it
#[derive(Debug)]
pub struct Grammar {
    format: LogFormat,
    pattern: Regex,
    date: DateLayout,
}

impl Grammar {
    fn new(format: LogFormat, pattern: &str, date: DateLayout) -> Self {
        Self {
            format,
            pattern: Regex::new(pattern).unwrap_or_else(|_| unreachable!()),
            date,
        }
    }

    /// The process-wide grammar for a log format
    pub fn for_format(format: LogFormat) -> &'static Grammar {
        match format {
            LogFormat::Standard => &STANDARD,
            LogFormat::Extended => &EXTENDED,
        }
    }

    pub fn format(&self) -> LogFormat {
        self.format
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    pub fn date_layout(&self) -> DateLayout {
        self.date
    }
}
