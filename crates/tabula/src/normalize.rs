//! Canonical column definitions.
//!
//! Declared columns and live catalog columns are both turned into a canonical
//! string by [`normalize_definition`] so that a plain equality check decides
//! whether a column must be modified. Every rule here applies to both sides.
//!
//! Attribute order is not normalized: declare attributes in the order MySQL
//! reports them (`NOT NULL DEFAULT x AUTO_INCREMENT`). Primary key columns are
//! always reported `NOT NULL`; the updater adds it to the declared side for
//! them.

use std::sync::LazyLock;

use regex::Regex;

static INTEGER_DISPLAY_WIDTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(TINYINT|SMALLINT|MEDIUMINT|INTEGER|INT|BIGINT)\s*\(\s*\d+\s*\)")
        .expect("display width pattern is valid")
});

static DEFAULT_NULL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bDEFAULT\s+NULL\b").expect("default null pattern is valid"));

static QUOTED_DEFAULT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bDEFAULT\s+'((?:[^']|'')*)'").expect("quoted default pattern is valid")
});

static CURRENT_TIMESTAMP_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bCURRENT_TIMESTAMP\s*\(\s*\)").expect("current timestamp pattern is valid")
});

static DEFAULT_GENERATED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bDEFAULT_GENERATED\b").expect("default generated pattern is valid")
});

/// Canonical form of a declared column: `"{TYPE} {ATTRIBUTES}"`, normalized.
#[must_use]
pub fn normalize(sql_type: &str, attributes: &str) -> String {
    normalize_definition(&format!("{sql_type} {attributes}"))
}

/// Canonical form of a full column definition.
///
/// - case and whitespace are folded (`bigint  unsigned` is `BIGINT UNSIGNED`);
/// - integer display widths are dropped (`INT(11)` is `INT`);
/// - `DEFAULT NULL` and a bare `NULL` are dropped, nullable is the default;
/// - quotes around a `DEFAULT` literal are dropped (`DEFAULT '0'` is `DEFAULT 0`);
/// - the `DEFAULT_GENERATED` extra flag is dropped;
/// - `CURRENT_TIMESTAMP()` is written `CURRENT_TIMESTAMP`.
#[must_use]
pub fn normalize_definition(definition: &str) -> String {
    let upper = collapse_whitespace(&definition.to_uppercase());
    let stripped = INTEGER_DISPLAY_WIDTH.replace_all(&upper, "${1}");
    let stripped = DEFAULT_NULL.replace_all(&stripped, "");
    let stripped = QUOTED_DEFAULT.replace_all(&stripped, "DEFAULT ${1}");
    let stripped = DEFAULT_GENERATED.replace_all(&stripped, "");
    let stripped = CURRENT_TIMESTAMP_CALL.replace_all(&stripped, "CURRENT_TIMESTAMP");

    let mut tokens: Vec<&str> = Vec::new();
    for token in stripped.split_whitespace() {
        if token == "NULL" && tokens.last().map_or(true, |prev| *prev != "NOT") {
            continue;
        }
        tokens.push(token);
    }
    tokens.join(" ")
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
