//! Wire-format `Record` variants (one JSON object per line, per chart).
//!
//! The set of variants is closed and statically known (spec §3): adding a
//! new variant is a source change, never a runtime-registered plugin. An
//! unrecognised `type` value on the wire is not an error at this layer —
//! callers (the chart tailer) count it and skip the line.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// The four-tuple that uniquely identifies a record for dedupe purposes
/// (spec §3: "duplicates by `(symbol, timestamp, bar_index, variant)` are
/// discarded").
pub type DedupeKey = (String, i64, i64, &'static str);

fn ts_micros(secs: f64) -> i64 {
    (secs * 1_000_000.0).round() as i64
}

/// Common header fields present on every wire record.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RecordHeader {
    #[serde(rename = "sym")]
    pub symbol: String,
    #[serde(rename = "chart")]
    pub chart_id: i32,
    #[serde(rename = "t")]
    pub timestamp_secs: f64,
    #[serde(rename = "i")]
    pub bar_index: i64,
}

impl RecordHeader {
    pub fn timestamp(&self) -> DateTime<Utc> {
        Utc.timestamp_micros(ts_micros(self.timestamp_secs))
            .single()
            .unwrap_or_else(Utc::now)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BaseBarPayload {
    pub o: f64,
    pub h: f64,
    pub l: f64,
    pub c: f64,
    pub v: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct QuotePayload {
    pub bid: f64,
    pub ask: f64,
    pub bq: f64,
    pub aq: f64,
    pub seq: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TradePayload {
    pub px: f64,
    pub vol: f64,
    pub seq: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DepthLevelPayload {
    pub level: i32,
    pub bid_px: f64,
    pub bid_sz: f64,
    pub ask_px: f64,
    pub ask_sz: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VwapPayload {
    pub vwap: f64,
    pub up1: f64,
    pub dn1: f64,
    pub up2: f64,
    pub dn2: f64,
    pub up3: f64,
    pub dn3: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PvwapPayload {
    pub vwap: f64,
    pub up1: f64,
    pub dn1: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VvaPayload {
    pub vpoc: f64,
    pub vah: f64,
    pub val: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NbcvPayload {
    pub ask_volume: f64,
    pub bid_volume: f64,
    pub delta: f64,
    pub trades: i64,
    pub cumulative_delta: f64,
    pub total_volume: f64,
    pub delta_ratio: f64,
    pub ask_percent: f64,
    pub bid_percent: f64,
    #[serde(rename = "pressure_bullish")]
    pub pressure_bullish: i32,
    #[serde(rename = "pressure_bearish")]
    pub pressure_bearish: i32,
    pub pressure: i32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CumulativeDeltaPayload {
    pub delta: f64,
    pub cumulative_delta: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AtrBarPayload {
    pub atr: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VolumeProfilePayload {
    pub vpoc: f64,
    pub vah: f64,
    pub val: f64,
    #[serde(default)]
    pub hvn: Vec<f64>,
    #[serde(default)]
    pub lvn: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CorrelationPayload {
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct MenthorQLevelsPayload {
    #[serde(default)]
    pub gamma: std::collections::BTreeMap<String, f64>,
    #[serde(default)]
    pub blind_spots: std::collections::BTreeMap<String, f64>,
    #[serde(default)]
    pub swing: std::collections::BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VixPointPayload {
    pub last: f64,
}

/// A single ingested record: header + one of the closed set of payload
/// variants.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub header: RecordHeader,
    pub payload: RecordPayload,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordPayload {
    BaseBar(BaseBarPayload),
    Quote(QuotePayload),
    Trade(TradePayload),
    DepthLevel(DepthLevelPayload),
    Vwap(VwapPayload),
    Pvwap(PvwapPayload),
    Vva(VvaPayload),
    Nbcv(NbcvPayload),
    CumulativeDelta(CumulativeDeltaPayload),
    AtrBar(AtrBarPayload),
    VolumeProfile(VolumeProfilePayload),
    Correlation(CorrelationPayload),
    MenthorQLevels(MenthorQLevelsPayload),
    VixPoint(VixPointPayload),
}

impl RecordPayload {
    pub fn variant_tag(&self) -> &'static str {
        match self {
            RecordPayload::BaseBar(_) => "basedata",
            RecordPayload::Quote(_) => "quote",
            RecordPayload::Trade(_) => "trade",
            RecordPayload::DepthLevel(_) => "depth",
            RecordPayload::Vwap(_) => "vwap",
            RecordPayload::Pvwap(_) => "pvwap",
            RecordPayload::Vva(_) => "vva",
            RecordPayload::Nbcv(_) => "nbcv_footprint",
            RecordPayload::CumulativeDelta(_) => "cumulative_delta",
            RecordPayload::AtrBar(_) => "atr",
            RecordPayload::VolumeProfile(_) => "volume_profile",
            RecordPayload::Correlation(_) => "correlation",
            RecordPayload::MenthorQLevels(_) => "menthorq",
            RecordPayload::VixPoint(_) => "vix",
        }
    }

    /// The discriminant ordinal used as the last tiebreaker in `UnifiedEvent`
    /// total order (spec §3: "... variant_discriminator").
    pub fn discriminant_ordinal(&self) -> u8 {
        match self {
            RecordPayload::BaseBar(_) => 0,
            RecordPayload::Quote(_) => 1,
            RecordPayload::Trade(_) => 2,
            RecordPayload::DepthLevel(_) => 3,
            RecordPayload::Vwap(_) => 4,
            RecordPayload::Pvwap(_) => 5,
            RecordPayload::Vva(_) => 6,
            RecordPayload::Nbcv(_) => 7,
            RecordPayload::CumulativeDelta(_) => 8,
            RecordPayload::AtrBar(_) => 9,
            RecordPayload::VolumeProfile(_) => 10,
            RecordPayload::Correlation(_) => 11,
            RecordPayload::MenthorQLevels(_) => 12,
            RecordPayload::VixPoint(_) => 13,
        }
    }
}

impl Record {
    pub fn dedupe_key(&self) -> DedupeKey {
        (
            self.header.symbol.clone(),
            ts_micros(self.header.timestamp_secs),
            self.header.bar_index,
            self.payload.variant_tag(),
        )
    }

    /// Parse one JSONL line into a `Record`.
    ///
    /// Returns `Ok(None)` for a recognised-but-unknown `type` (counted by
    /// the caller, never fatal per spec §6 "Unknown `type` values MUST be
    /// ignored with a counter increment"). Returns `Err` only for malformed
    /// JSON or a missing/malformed header, which the caller treats as a
    /// `ParseError` (spec §7: skipped, counted, never fatal).
    pub fn parse_line(line: &str) -> Result<Option<Record>, ParseError> {
        let value: serde_json::Value =
            serde_json::from_str(line).map_err(|e| ParseError::MalformedJson(e.to_string()))?;

        let header: RecordHeader = serde_json::from_value(value.clone())
            .map_err(|e| ParseError::MalformedHeader(e.to_string()))?;

        let type_tag = value
            .get("type")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| ParseError::MissingTypeTag)?;

        macro_rules! decode {
            ($variant:ident) => {
                serde_json::from_value(value)
                    .map(|p| Some(RecordPayload::$variant(p)))
                    .map_err(|e| ParseError::MalformedPayload(type_tag.to_string(), e.to_string()))
            };
        }

        let payload = match type_tag.as_str() {
            "basedata" => decode!(BaseBar),
            "quote" => decode!(Quote),
            "trade" => decode!(Trade),
            "depth" => decode!(DepthLevel),
            "vwap" => decode!(Vwap),
            "pvwap" => decode!(Pvwap),
            "vva" => decode!(Vva),
            "nbcv_footprint" => decode!(Nbcv),
            "cumulative_delta" => decode!(CumulativeDelta),
            "atr" => decode!(AtrBar),
            "volume_profile" => decode!(VolumeProfile),
            "correlation" => decode!(Correlation),
            "menthorq" => decode!(MenthorQLevels),
            "vix" => decode!(VixPoint),
            _ => Ok(None),
        }?;

        Ok(payload.map(|payload| Record { header, payload }))
    }
}

/// Errors from parsing one wire record line. Never fatal (spec §7): the
/// chart tailer skips the line and increments `parse_errors`.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    MalformedJson(String),
    MalformedHeader(String),
    MissingTypeTag,
    MalformedPayload(String, String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::MalformedJson(e) => write!(f, "malformed json: {e}"),
            ParseError::MalformedHeader(e) => write!(f, "malformed record header: {e}"),
            ParseError::MissingTypeTag => write!(f, "missing 'type' field"),
            ParseError::MalformedPayload(tag, e) => {
                write!(f, "malformed '{tag}' payload: {e}")
            }
        }
    }
}

impl std::error::Error for ParseError {}
