// Directions text parser - duration and distance from rendered text
use regex::{Captures, Regex};
use serde::Deserialize;

/// How to choose between several candidate matches in the same text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Earliest duration expression ("X h Y min", "X h" or "Y min"). First km
    /// value, else first meter value.
    #[default]
    FirstMatch,
    /// A compound "X h Y min" expression beats lone tokens, then minutes beat
    /// hours. The distance with the most fractional digits wins. Ties go to
    /// the earliest match.
    MostSpecific,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ParsedDirections {
    pub duration_min: Option<u32>,
    pub distance_km: Option<f64>,
}

const HOUR_UNIT: &str = r"(?:hours?|hrs?|h)";
const MINUTE_UNIT: &str = r"(?:minutes?|mins?)";
/// A unit must not run on into a word ("2 hotels"), but may run into a digit ("1h30min").
const UNIT_END: &str = r"(?:[^\p{L}]|$)";
const NUMBER: &str = r"(\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?)";

/// One duration expression found in the text.
#[derive(Debug, Clone, Copy, PartialEq)]
enum DurationMatch {
    Compound { hours: u32, minutes: u32 },
    Hours(u32),
    Minutes(u32),
}

impl DurationMatch {
    fn total_minutes(self) -> u32 {
        match self {
            DurationMatch::Compound { hours, minutes } => {
                hours.saturating_mul(60).saturating_add(minutes)
            }
            DurationMatch::Hours(hours) => hours.saturating_mul(60),
            DurationMatch::Minutes(minutes) => minutes,
        }
    }

    fn specificity(self) -> u8 {
        match self {
            DurationMatch::Compound { .. } => 2,
            DurationMatch::Minutes(_) => 1,
            DurationMatch::Hours(_) => 0,
        }
    }
}

pub struct DirectionsParser {
    policy: MatchPolicy,
    duration_pattern: Regex,
    km_pattern: Regex,
    meter_pattern: Regex,
}

impl DirectionsParser {
    pub fn new(policy: MatchPolicy) -> Result<Self, regex::Error> {
        Ok(Self {
            policy,
            duration_pattern: Regex::new(&format!(
                r"(?i)(\d+)\s*{HOUR_UNIT}(?:\s*(\d+)\s*{MINUTE_UNIT})?{UNIT_END}|(\d+)\s*{MINUTE_UNIT}{UNIT_END}"
            ))?,
            km_pattern: Regex::new(&format!(r"(?i){NUMBER}\s*(?:km|kilomet(?:er|re)s?)\b"))?,
            meter_pattern: Regex::new(&format!(r"(?i){NUMBER}\s*(?:m|met(?:er|re)s?)\b"))?,
        })
    }

    /// Pure function of `text`. A zero or absent duration is `None`.
    pub fn parse(&self, text: &str) -> ParsedDirections {
        let duration = match self.policy {
            MatchPolicy::FirstMatch => self.durations(text).next(),
            MatchPolicy::MostSpecific => self.most_specific_duration(text),
        };
        let duration_min = duration
            .map(DurationMatch::total_minutes)
            .filter(|minutes| *minutes > 0);

        let distance_km = match self.policy {
            MatchPolicy::FirstMatch => self.first_distance(text),
            MatchPolicy::MostSpecific => self.most_specific_distance(text),
        };

        ParsedDirections {
            duration_min,
            distance_km,
        }
    }

    /// Duration expressions in order of appearance.
    fn durations<'t>(&'t self, text: &'t str) -> impl Iterator<Item = DurationMatch> + 't {
        self.duration_pattern
            .captures_iter(text)
            .filter_map(|caps| {
                if let Some(minutes) = capture_integer(&caps, 3) {
                    return Some(DurationMatch::Minutes(minutes));
                }
                let hours = capture_integer(&caps, 1)?;
                Some(match capture_integer(&caps, 2) {
                    Some(minutes) => DurationMatch::Compound { hours, minutes },
                    None => DurationMatch::Hours(hours),
                })
            })
    }

    fn most_specific_duration(&self, text: &str) -> Option<DurationMatch> {
        let mut best: Option<DurationMatch> = None;
        for duration in self.durations(text) {
            if best.is_none_or(|b| duration.specificity() > b.specificity()) {
                best = Some(duration);
            }
        }
        best
    }

    fn first_distance(&self, text: &str) -> Option<f64> {
        if let Some(km) = self.km_pattern.captures(text).and_then(|c| capture_decimal(&c, 1)) {
            return Some(km);
        }
        self.meter_pattern
            .captures(text)
            .and_then(|c| capture_decimal(&c, 1))
            .map(|m| m / 1000.0)
    }

    fn most_specific_distance(&self, text: &str) -> Option<f64> {
        most_precise(&self.km_pattern, text)
            .or_else(|| most_precise(&self.meter_pattern, text).map(|m| m / 1000.0))
    }
}

fn capture_integer(caps: &Captures, group: usize) -> Option<u32> {
    caps.get(group)?.as_str().parse().ok()
}

fn capture_decimal(caps: &Captures, group: usize) -> Option<f64> {
    caps.get(group)?.as_str().replace(',', "").parse().ok()
}

/// Value with the most fractional digits, earliest on ties.
fn most_precise(pattern: &Regex, text: &str) -> Option<f64> {
    let mut best: Option<(usize, f64)> = None;

    for caps in pattern.captures_iter(text) {
        let Some(raw) = caps.get(1).map(|m| m.as_str()) else {
            continue;
        };
        let Ok(value) = raw.replace(',', "").parse::<f64>() else {
            continue;
        };
        let digits = raw.split_once('.').map(|(_, frac)| frac.len()).unwrap_or(0);

        if best.is_none_or(|(best_digits, _)| digits > best_digits) {
            best = Some((digits, value));
        }
    }

    best.map(|(_, value)| value)
}
