use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

// Trailing volume number on a filename stem: "Saga 3", "Saga_03", "Saga-3", "Saga3".
regex!(SERIES_REGEX, r"^(.*?\D)[ _-]*(\d+)$");
// PDF dates ("D:20210314120000+01'00'") and ISO calendar dates ("2021-03-14").
regex!(DATE_REGEX, r"^(?:D:)?(\d{4})(?:-?(\d{2}))?(?:-?(\d{2}))?");
regex!(KEYWORD_SEPARATOR_REGEX, r"[,;]");
