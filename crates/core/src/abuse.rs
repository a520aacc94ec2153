//! Abuse gate.
//!
//! A pure admission check run before any cache or provider work. Signals come
//! from edge-supplied request headers (`x-known-bot`, `x-threat-score`).

/// Requests with a threat score strictly above this value are rejected.
pub const THREAT_SCORE_LIMIT: f64 = 10.0;

/// Abuse signals attached to an incoming request.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AbuseSignal {
    pub known_bot: bool,
    pub threat_score: f64,
}

/// Decision returned by [`admit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allow,
    Reject,
}

impl AbuseSignal {
    /// Build signals from raw header values.
    ///
    /// The bot flag is set only for a literal `true` (any case). A missing,
    /// non-numeric or NaN threat score counts as zero.
    pub fn from_headers(known_bot: Option<&str>, threat_score: Option<&str>) -> Self {
        let known_bot = known_bot.is_some_and(|v| v.trim().eq_ignore_ascii_case("true"));
        let threat_score = threat_score.map_or(0.0, parse_score);

        Self { known_bot, threat_score }
    }
}

/// Parse a threat score: a decimal (including `inf`/`Infinity`) or a
/// `0x`/`0o`/`0b` integer literal.
fn parse_score(raw: &str) -> f64 {
    let raw = raw.trim();
    let prefixed = [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)]
        .into_iter()
        .find_map(|(prefix, radix)| raw.strip_prefix(prefix).map(|digits| (digits, radix)));

    let score = match prefixed {
        Some((digits, radix)) => u64::from_str_radix(digits, radix).ok().map(|v| v as f64),
        None => raw.parse::<f64>().ok(),
    };

    score.filter(|v| !v.is_nan()).unwrap_or(0.0)
}

/// Decide whether a request may enter the pipeline.
pub fn admit(signals: &AbuseSignal) -> Admission {
    if signals.known_bot || signals.threat_score > THREAT_SCORE_LIMIT {
        Admission::Reject
    } else {
        Admission::Allow
    }
}
