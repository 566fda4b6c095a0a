use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Which colour prefix the log source puts in front of its brand text.
/// Hosts from 1.16 on render it as a hex colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatVersion {
    Legacy,
    #[default]
    Hex,
}

impl FormatVersion {
    /// Accepts `v1_16_R3` style package tags as well as `1.16.5`.
    /// Anything we can't read is assumed to be a modern host.
    pub fn detect(version: &str) -> Self {
        let mut parts = version
            .trim()
            .trim_start_matches('v')
            .split(['_', '.'])
            .map(|p| p.parse::<u32>());

        match (parts.next(), parts.next()) {
            (Some(Ok(major)), Some(Ok(minor))) if (major, minor) < (1, 16) => {
                FormatVersion::Legacy
            }
            _ => FormatVersion::Hex,
        }
    }

    fn colour(self) -> &'static str {
        match self {
            FormatVersion::Legacy => "§3",
            FormatVersion::Hex => "§x§3§1§b§0§e§8",
        }
    }
}

/// The `-`/`+` marker in front of the actor name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionSymbol {
    /// `§c-`
    Removed,
    /// `§f-`
    Neutral,
    /// `§a+`
    Added,
}

impl ActionSymbol {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "§c-" => Some(ActionSymbol::Removed),
            "§f-" => Some(ActionSymbol::Neutral),
            "§a+" => Some(ActionSymbol::Added),
            _ => None,
        }
    }
}

/// One classified line of log-source output.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedRecord {
    NoData {
        category: String,
        target_label: String,
    },
    SectionHeader {
        label: String,
        x: String,
        y: String,
        z: String,
    },
    DataRow {
        time_value: String,
        actor_name: String,
        action_symbol: ActionSymbol,
        action_label: String,
        block_label: String,
    },
    /// Pre-filter numbers straight from the log source.
    PageFooter {
        raw_page_number: i64,
        raw_total_pages: String,
    },
    Unrecognized,
}

impl ParsedRecord {
    /// Age in hours for data rows, `None` for everything else.
    pub fn age_hours(&self) -> Option<f64> {
        match self {
            ParsedRecord::DataRow { time_value, .. } => parse_age_hours(time_value),
            _ => None,
        }
    }
}

/// Reads the leading `value` of a `value/unit ago` field as hours.
/// The log source writes decimals with a comma.
pub fn parse_age_hours(time_value: &str) -> Option<f64> {
    let leading = time_value.split('/').next()?;
    leading.trim().replace(',', ".").parse::<f64>().ok()
}

struct Templates {
    no_data: Regex,
    header: Regex,
    data_line: Regex,
    footer: Regex,
}

impl Templates {
    fn build(version: FormatVersion) -> Self {
        let c = regex::escape(version.colour());
        let compile = |pattern: String| Regex::new(&pattern).expect("Invalid log template regex");

        Self {
            no_data: compile(format!(r"^{c}CoreProtect §f- §fNo (.*) found for (.*)\.$")),
            header: compile(format!(r"^§f----- {c}(.*) §f----- §7\(x(.*)/y(.*)/z(.*)\)$")),
            data_line: compile(format!(
                r"^§7(.*) ((?:§f|§c)-|§a\+) {c}(.*)§f(.*) {c}(.*)§f\.$"
            )),
            footer: compile(format!(r"^§f{c}Page §f(.*)/(.*)§7\)$")),
        }
    }
}

static LEGACY_TEMPLATES: OnceLock<Templates> = OnceLock::new();
static HEX_TEMPLATES: OnceLock<Templates> = OnceLock::new();

/// Turns log-source lines into typed records.
///
/// The log source only hands out pre-rendered chat text, so the four
/// templates below are the only place that knows its wire format.
#[derive(Clone, Copy)]
pub struct LogLineParser {
    version: FormatVersion,
    templates: &'static Templates,
}

impl std::fmt::Debug for LogLineParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogLineParser")
            .field("version", &self.version)
            .finish()
    }
}

impl LogLineParser {
    pub fn new(version: FormatVersion) -> Self {
        let cell = match version {
            FormatVersion::Legacy => &LEGACY_TEMPLATES,
            FormatVersion::Hex => &HEX_TEMPLATES,
        };
        let templates = cell.get_or_init(|| Templates::build(version));

        Self { version, templates }
    }

    pub fn version(&self) -> FormatVersion {
        self.version
    }

    /// Never fails: anything off-template is `Unrecognized`.
    pub fn parse(&self, line: &str) -> ParsedRecord {
        let t = self.templates;

        if let Some(caps) = t.no_data.captures(line) {
            return ParsedRecord::NoData {
                category: caps[1].to_string(),
                target_label: caps[2].to_string(),
            };
        }

        if let Some(caps) = t.header.captures(line) {
            return ParsedRecord::SectionHeader {
                label: caps[1].to_string(),
                x: caps[2].to_string(),
                y: caps[3].to_string(),
                z: caps[4].to_string(),
            };
        }

        if let Some(caps) = t.data_line.captures(line) {
            let Some(action_symbol) = ActionSymbol::from_token(&caps[2]) else {
                return ParsedRecord::Unrecognized;
            };
            return ParsedRecord::DataRow {
                time_value: caps[1].to_string(),
                actor_name: caps[3].to_string(),
                action_symbol,
                action_label: caps[4].to_string(),
                block_label: caps[5].to_string(),
            };
        }

        if let Some(caps) = t.footer.captures(line) {
            return match caps[1].trim().parse::<i64>() {
                Ok(raw_page_number) => ParsedRecord::PageFooter {
                    raw_page_number,
                    raw_total_pages: caps[2].to_string(),
                },
                Err(_) => ParsedRecord::Unrecognized,
            };
        }

        ParsedRecord::Unrecognized
    }
}
