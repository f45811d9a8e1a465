//! Domain models for the storm data analysis pipeline.
//!
//! - [`RawEvent`] - One row of the NOAA storm events file
//! - [`EventCategory`] - The 48 canonical event types
//! - [`TidyEvent`] - Decoded, inflation-adjusted, canonicalized event
//! - [`Metric`] - Quantity summed by the aggregator
//! - [`AggregateRow`] / [`MetricTable`] - Aggregation output
//! - [`InflationRatio`] - Year and CPI ratio to the base year

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Raw Event
// =============================================================================

/// One reported storm event, as it appears in the source CSV.
///
/// Columns not listed here are ignored by the loader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEvent {
    /// Unique identifier.
    #[serde(rename = "REFNUM", deserialize_with = "de_identifier")]
    pub refnum: u64,
    /// Free-text event type as recorded.
    #[serde(rename = "EVTYPE")]
    pub evtype: String,
    #[serde(rename = "STATE", default)]
    pub state: String,
    #[serde(rename = "COUNTYNAME", default)]
    pub county: String,
    /// `M/D/YYYY H:MM:SS`.
    #[serde(rename = "BGN_DATE")]
    pub begin_date: String,
    /// May be blank.
    #[serde(rename = "END_DATE", default)]
    pub end_date: String,
    #[serde(rename = "FATALITIES")]
    pub fatalities: f64,
    #[serde(rename = "INJURIES")]
    pub injuries: f64,
    #[serde(rename = "PROPDMG")]
    pub property_magnitude: f64,
    #[serde(rename = "PROPDMGEXP", default)]
    pub property_exponent: String,
    #[serde(rename = "CROPDMG")]
    pub crop_magnitude: f64,
    #[serde(rename = "CROPDMGEXP", default)]
    pub crop_exponent: String,
}

/// Column names the loader requires in the header row.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "REFNUM",
    "EVTYPE",
    "BGN_DATE",
    "FATALITIES",
    "INJURIES",
    "PROPDMG",
    "PROPDMGEXP",
    "CROPDMG",
    "CROPDMGEXP",
];

/// The identifier is written as a decimal (`"1.00"`) in the NOAA export.
fn de_identifier<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| serde::de::Error::custom(format!("invalid identifier '{}'", raw)))?;

    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 {
        return Err(serde::de::Error::custom(format!("invalid identifier '{}'", raw)));
    }
    Ok(value as u64)
}

// =============================================================================
// Canonical Event Category
// =============================================================================

/// One of the 48 standardized event types (NWS Directive 10-1605).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventCategory {
    AstronomicalLowTide,
    Avalanche,
    Blizzard,
    CoastalFlood,
    ColdWindChill,
    DebrisFlow,
    DenseFog,
    DenseSmoke,
    Drought,
    DustDevil,
    DustStorm,
    ExcessiveHeat,
    ExtremeColdWindChill,
    FlashFlood,
    Flood,
    FrostFreeze,
    FunnelCloud,
    FreezingFog,
    Hail,
    Heat,
    HeavyRain,
    HeavySnow,
    HighSurf,
    HighWind,
    HurricaneTyphoon,
    IceStorm,
    LakeEffectSnow,
    LakeshoreFlood,
    Lightning,
    MarineHail,
    MarineHighWind,
    MarineStrongWind,
    MarineThunderstormWind,
    RipCurrent,
    Seiche,
    Sleet,
    StormSurgeTide,
    StrongWind,
    ThunderstormWind,
    Tornado,
    TropicalDepression,
    TropicalStorm,
    Tsunami,
    VolcanicAsh,
    Waterspout,
    Wildfire,
    WinterStorm,
    WinterWeather,
}

impl EventCategory {
    /// Every category, in directive order.
    pub const ALL: [EventCategory; 48] = [
        Self::AstronomicalLowTide,
        Self::Avalanche,
        Self::Blizzard,
        Self::CoastalFlood,
        Self::ColdWindChill,
        Self::DebrisFlow,
        Self::DenseFog,
        Self::DenseSmoke,
        Self::Drought,
        Self::DustDevil,
        Self::DustStorm,
        Self::ExcessiveHeat,
        Self::ExtremeColdWindChill,
        Self::FlashFlood,
        Self::Flood,
        Self::FrostFreeze,
        Self::FunnelCloud,
        Self::FreezingFog,
        Self::Hail,
        Self::Heat,
        Self::HeavyRain,
        Self::HeavySnow,
        Self::HighSurf,
        Self::HighWind,
        Self::HurricaneTyphoon,
        Self::IceStorm,
        Self::LakeEffectSnow,
        Self::LakeshoreFlood,
        Self::Lightning,
        Self::MarineHail,
        Self::MarineHighWind,
        Self::MarineStrongWind,
        Self::MarineThunderstormWind,
        Self::RipCurrent,
        Self::Seiche,
        Self::Sleet,
        Self::StormSurgeTide,
        Self::StrongWind,
        Self::ThunderstormWind,
        Self::Tornado,
        Self::TropicalDepression,
        Self::TropicalStorm,
        Self::Tsunami,
        Self::VolcanicAsh,
        Self::Waterspout,
        Self::Wildfire,
        Self::WinterStorm,
        Self::WinterWeather,
    ];

    /// Upper-case label as used in the lookup asset.
    pub fn label(&self) -> &'static str {
        match self {
            Self::AstronomicalLowTide => "ASTRONOMICAL LOW TIDE",
            Self::Avalanche => "AVALANCHE",
            Self::Blizzard => "BLIZZARD",
            Self::CoastalFlood => "COASTAL FLOOD",
            Self::ColdWindChill => "COLD/WIND CHILL",
            Self::DebrisFlow => "DEBRIS FLOW",
            Self::DenseFog => "DENSE FOG",
            Self::DenseSmoke => "DENSE SMOKE",
            Self::Drought => "DROUGHT",
            Self::DustDevil => "DUST DEVIL",
            Self::DustStorm => "DUST STORM",
            Self::ExcessiveHeat => "EXCESSIVE HEAT",
            Self::ExtremeColdWindChill => "EXTREME COLD/WIND CHILL",
            Self::FlashFlood => "FLASH FLOOD",
            Self::Flood => "FLOOD",
            Self::FrostFreeze => "FROST/FREEZE",
            Self::FunnelCloud => "FUNNEL CLOUD",
            Self::FreezingFog => "FREEZING FOG",
            Self::Hail => "HAIL",
            Self::Heat => "HEAT",
            Self::HeavyRain => "HEAVY RAIN",
            Self::HeavySnow => "HEAVY SNOW",
            Self::HighSurf => "HIGH SURF",
            Self::HighWind => "HIGH WIND",
            Self::HurricaneTyphoon => "HURRICANE (TYPHOON)",
            Self::IceStorm => "ICE STORM",
            Self::LakeEffectSnow => "LAKE-EFFECT SNOW",
            Self::LakeshoreFlood => "LAKESHORE FLOOD",
            Self::Lightning => "LIGHTNING",
            Self::MarineHail => "MARINE HAIL",
            Self::MarineHighWind => "MARINE HIGH WIND",
            Self::MarineStrongWind => "MARINE STRONG WIND",
            Self::MarineThunderstormWind => "MARINE THUNDERSTORM WIND",
            Self::RipCurrent => "RIP CURRENT",
            Self::Seiche => "SEICHE",
            Self::Sleet => "SLEET",
            Self::StormSurgeTide => "STORM SURGE/TIDE",
            Self::StrongWind => "STRONG WIND",
            Self::ThunderstormWind => "THUNDERSTORM WIND",
            Self::Tornado => "TORNADO",
            Self::TropicalDepression => "TROPICAL DEPRESSION",
            Self::TropicalStorm => "TROPICAL STORM",
            Self::Tsunami => "TSUNAMI",
            Self::VolcanicAsh => "VOLCANIC ASH",
            Self::Waterspout => "WATERSPOUT",
            Self::Wildfire => "WILDFIRE",
            Self::WinterStorm => "WINTER STORM",
            Self::WinterWeather => "WINTER WEATHER",
        }
    }

    /// Parse a canonical label, ignoring case and surrounding whitespace.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = label.trim().to_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.label() == normalized)
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for EventCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

// =============================================================================
// Tidy Event
// =============================================================================

/// Raw event joined with decoded damage values and its canonical category.
///
/// Built once per run and never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct TidyEvent {
    pub refnum: u64,
    /// Original label, untouched.
    pub evtype: String,
    /// `None` when the label has no lookup entry.
    pub category: Option<EventCategory>,
    pub state: String,
    pub county: String,
    pub begin: NaiveDateTime,
    pub end: Option<NaiveDateTime>,
    pub year: i32,
    pub fatalities: f64,
    pub injuries: f64,
    /// Magnitude x 10^exponent x inflation ratio.
    pub property_damage: f64,
    /// Magnitude x 10^exponent x inflation ratio.
    pub crop_damage: f64,
}

impl TidyEvent {
    /// Fatalities plus injuries.
    pub fn health_total(&self) -> f64 {
        self.fatalities + self.injuries
    }

    /// Property plus crop damage.
    pub fn economic_total(&self) -> f64 {
        self.property_damage + self.crop_damage
    }
}

// =============================================================================
// Metric
// =============================================================================

/// Quantity summed per category by the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Fatalities,
    Injuries,
    PropertyDamage,
    CropDamage,
    HealthTotal,
    EconomicTotal,
}

impl Metric {
    /// All metrics, in report order.
    pub const ALL: [Metric; 6] = [
        Self::Fatalities,
        Self::Injuries,
        Self::HealthTotal,
        Self::PropertyDamage,
        Self::CropDamage,
        Self::EconomicTotal,
    ];

    /// Value of this metric for one event.
    pub fn value(&self, event: &TidyEvent) -> f64 {
        match self {
            Self::Fatalities => event.fatalities,
            Self::Injuries => event.injuries,
            Self::PropertyDamage => event.property_damage,
            Self::CropDamage => event.crop_damage,
            Self::HealthTotal => event.health_total(),
            Self::EconomicTotal => event.economic_total(),
        }
    }

    /// Human-readable title.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Fatalities => "Fatalities",
            Self::Injuries => "Injuries",
            Self::PropertyDamage => "Property damage",
            Self::CropDamage => "Crop damage",
            Self::HealthTotal => "Fatalities + injuries",
            Self::EconomicTotal => "Property + crop damage",
        }
    }

    /// Whether values are inflation-adjusted dollars.
    pub fn is_monetary(&self) -> bool {
        matches!(
            self,
            Self::PropertyDamage | Self::CropDamage | Self::EconomicTotal
        )
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "fatalities" | "deaths" => Ok(Self::Fatalities),
            "injuries" => Ok(Self::Injuries),
            "property" | "property_damage" | "propdmg" => Ok(Self::PropertyDamage),
            "crop" | "crop_damage" | "cropdmg" => Ok(Self::CropDamage),
            "health" | "health_total" => Ok(Self::HealthTotal),
            "economic" | "economic_total" => Ok(Self::EconomicTotal),
            other => Err(format!(
                "unknown metric '{}' (expected fatalities, injuries, property, crop, health, economic)",
                other
            )),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

// =============================================================================
// Aggregation Output
// =============================================================================

/// One category and its summed metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub category: EventCategory,
    pub total: f64,
}

/// Ranked aggregate for one metric.
#[derive(Debug, Clone, Serialize)]
pub struct MetricTable {
    pub metric: Metric,
    /// Sorted descending; may exceed the requested size on ties.
    pub rows: Vec<AggregateRow>,
}

// =============================================================================
// Inflation Ratio
// =============================================================================

/// CPI yearly average relative to the base year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InflationRatio {
    pub year: i32,
    pub average: f64,
    pub ratio: f64,
}

// =============================================================================
// Tests
// =============================================================================
