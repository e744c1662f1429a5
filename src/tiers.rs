//! Tier rank parsing and the fixed tier color gradient.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TierColor {
    pub hex: &'static str,
    pub rgb: (u8, u8, u8),
}

const fn tier_color(hex: &'static str, r: u8, g: u8, b: u8) -> TierColor {
    TierColor { hex, rgb: (r, g, b) }
}

// Tier 1 (best) through tier 10 (worst).
const TIER_GRADIENT: [TierColor; 10] = [
    tier_color("#004d00", 0x00, 0x4d, 0x00),
    tier_color("#006400", 0x00, 0x64, 0x00),
    tier_color("#4CAF50", 0x4c, 0xaf, 0x50),
    tier_color("#8BC34A", 0x8b, 0xc3, 0x4a),
    tier_color("#FFC107", 0xff, 0xc1, 0x07),
    tier_color("#FFB74D", 0xff, 0xb7, 0x4d),
    tier_color("#FF9800", 0xff, 0x98, 0x00),
    tier_color("#FF5722", 0xff, 0x57, 0x22),
    tier_color("#F44336", 0xf4, 0x43, 0x36),
    tier_color("#B71C1C", 0xb7, 0x1c, 0x1c),
];

pub const WORST_TIER_COLOR: TierColor = TIER_GRADIENT[9];
pub const MAX_TIER: u8 = 10;

/// A positional or flex tier. Anything outside 1..=10 is unranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RankValue {
    Tier(u8),
    Unranked,
}

impl RankValue {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.and_then(parse_tier) {
            Some(tier) => Self::Tier(tier),
            None => Self::Unranked,
        }
    }

    pub fn tier(self) -> Option<u8> {
        match self {
            Self::Tier(tier) => Some(tier),
            Self::Unranked => None,
        }
    }

    pub fn color(self) -> TierColor {
        match self {
            Self::Tier(tier) => TIER_GRADIENT[usize::from(tier - 1)],
            Self::Unranked => WORST_TIER_COLOR,
        }
    }

    pub fn label(self) -> String {
        match self {
            Self::Tier(tier) => format!("Tier {tier}"),
            Self::Unranked => "Unranked".to_string(),
        }
    }
}

/// Display color for a raw rank string. Never fails: unknown input gets the worst color.
pub fn color_for(rank: Option<&str>) -> TierColor {
    RankValue::parse(rank).color()
}

pub fn parse_tier(raw: &str) -> Option<u8> {
    let value = parse_leading_int(raw)?;
    if (1..=i64::from(MAX_TIER)).contains(&value) {
        u8::try_from(value).ok()
    } else {
        None
    }
}

/// Leading-integer parse: "7", " 7", "+7" and "7th" all read as 7.
pub fn parse_leading_int(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let value = digits[..end].parse::<i64>().ok()?;
    Some(if negative { -value } else { value })
}
