use crate::error::{Error, ErrorKind};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Display, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingStatus {
    #[default]
    #[display("unread")]
    Unread,
    #[display("reading")]
    Reading,
    #[display("completed")]
    Completed,
}

impl ReadingStatus {
    pub const ALL: [ReadingStatus; 3] = [Self::Unread, Self::Reading, Self::Completed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unread => "unread",
            Self::Reading => "reading",
            Self::Completed => "completed",
        }
    }
}

impl FromStr for ReadingStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| exn::Exn::from(ErrorKind::InvalidData("reading status")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("unread", ReadingStatus::Unread)]
    #[case("Reading", ReadingStatus::Reading)]
    #[case(" COMPLETED ", ReadingStatus::Completed)]
    fn test_parse(#[case] input: &str, #[case] expected: ReadingStatus) {
        assert_eq!(input.parse::<ReadingStatus>().unwrap(), expected);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!("finished".parse::<ReadingStatus>().is_err());
    }
}
