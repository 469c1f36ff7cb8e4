//! Background collection of population and crowd data.
//!
//! Two upstream feeds, polled on one interval:
//!
//! - the dong-level living-population feed, mapped through the static
//!   area-code table and classified per area type;
//! - the realtime crowd-station feed, filtered to congestion-relevant
//!   codes, deduplicated to one current record per station, classified
//!   by coordinate.
//!
//! Each pass recomputes every level from the raw counts and upserts the
//! results into the current-state store with per-source TTLs. A feed
//! failure logs a warning and leaves the previous state intact; the
//! service keeps answering from stale rows until they expire.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::balance::dedup_latest_by_station;
use crate::classify::{
    classify_crowd_level, classify_crowd_level_for, classify_noise_level, resolve_region_name,
    walking_recommendation, AreaKind,
};
use crate::geo::geohash;
use crate::models::{
    ClassifiedPlace, Coordinate, CrowdLevel, NoiseLevel, PlaceSource, SensorRecord,
};
use crate::store::{Clock, PlaceStore, SystemClock, CROWD_TTL_SECS, POPULATION_TTL_SECS};
use crate::Config;

// ---

/// Dong-code → (name, representative coordinate, area kind) mapping for
/// the population feed. Codes missing here fall back to the gu-level
/// entry for their 5-digit prefix, then to a generic labeled row.
const AREA_CODES: [(&str, &str, f64, f64, AreaKind); 18] = [
    ("11110515", "청운효자동", 37.5816, 126.9685, AreaKind::Residential),
    ("11110530", "사직동", 37.5751, 126.9730, AreaKind::Residential),
    ("11110540", "삼청동", 37.5816, 126.9816, AreaKind::Cultural),
    ("11110615", "종로1·2·3·4가동", 37.5701, 126.9816, AreaKind::Business),
    ("11110650", "혜화동", 37.5816, 127.0016, AreaKind::Cultural),
    ("11140520", "소공동", 37.5636, 126.9779, AreaKind::Business),
    ("11140550", "명동", 37.5636, 126.9879, AreaKind::Shopping),
    ("11140580", "장충동", 37.5536, 126.9879, AreaKind::Residential),
    ("11140605", "을지로동", 37.5636, 127.0079, AreaKind::Business),
    ("11170510", "후암동", 37.5486, 126.9779, AreaKind::Residential),
    ("11170625", "한남동", 37.5336, 127.0079, AreaKind::Luxury),
    ("11170650", "이태원1동", 37.5336, 127.0179, AreaKind::Entertainment),
    ("11200520", "왕십리도선동", 37.5636, 127.0379, AreaKind::General),
    ("11200650", "성수1가1동", 37.5086, 127.0379, AreaKind::Business),
    ("11215710", "화양동", 37.5436, 127.0679, AreaKind::Entertainment),
    ("11215840", "광장동", 37.4936, 127.0679, AreaKind::Residential),
    ("11230536", "신사동", 37.5236, 127.0279, AreaKind::Shopping),
    ("11230545", "논현1동", 37.5186, 127.0279, AreaKind::Residential),
];

/// Gu-level fallback for area codes outside the dong table.
const GU_CODES: [(&str, &str, f64, f64); 6] = [
    ("11110", "종로구", 37.5735, 126.9788),
    ("11140", "중구", 37.5641, 126.9979),
    ("11170", "용산구", 37.5326, 126.9900),
    ("11200", "성동구", 37.5636, 127.0365),
    ("11215", "광진구", 37.5384, 127.0822),
    ("11230", "강남구", 37.5173, 127.0473),
];

/// Default coordinate for completely unknown area codes (city center).
const CITY_CENTER: Coordinate = Coordinate { lat: 37.5665, lng: 126.9780 };

struct AreaInfo {
    name: String,
    coordinate: Coordinate,
    kind: Option<AreaKind>,
}

fn area_info(area_code: &str) -> AreaInfo {
    // ---
    if let Some((_, name, lat, lng, kind)) =
        AREA_CODES.iter().find(|(code, ..)| *code == area_code)
    {
        return AreaInfo {
            name: (*name).to_string(),
            coordinate: Coordinate::new(*lat, *lng),
            kind: Some(*kind),
        };
    }

    let gu_prefix = area_code.get(..5).unwrap_or("");
    if let Some((_, name, lat, lng)) = GU_CODES.iter().find(|(code, ..)| *code == gu_prefix) {
        return AreaInfo {
            name: (*name).to_string(),
            coordinate: Coordinate::new(*lat, *lng),
            kind: None,
        };
    }

    AreaInfo {
        name: format!("지역코드_{area_code}"),
        coordinate: CITY_CENTER,
        kind: None,
    }
}

// ---

/// One row of the dong-level population feed. Counts arrive as decimal
/// strings and are truncated to whole people.
#[derive(Debug, Deserialize)]
pub struct PopulationRow {
    // ---
    #[serde(rename = "ADSTRD_CODE_SE")]
    pub area_code: String,
    #[serde(rename = "TOT_LVPOP_CO")]
    pub total_population: String,
}

impl PopulationRow {
    fn population(&self) -> u32 {
        self.total_population.parse::<f64>().unwrap_or(0.0).max(0.0) as u32
    }
}

/// Pull the `row` array out of the feed's service-name-wrapped payload
/// (`{"<SERVICE>": {"row": [...]}}`), tolerating a bare `{"row": [...]}`
/// as well.
pub fn parse_population_payload(payload: &Value) -> Result<Vec<PopulationRow>> {
    // ---
    let rows = payload
        .get("row")
        .or_else(|| {
            payload
                .as_object()?
                .values()
                .find_map(|wrapper| wrapper.get("row"))
        })
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("population payload has no 'row' array"))?;

    let mut parsed = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        match serde_json::from_value::<PopulationRow>(row.clone()) {
            Ok(row) => parsed.push(row),
            Err(e) => debug!("Skipping unparseable population row {}: {}", i, e),
        }
    }

    Ok(parsed)
}

/// Classify one population row into a stored place. Curated areas get
/// the area-type-aware crowd scheme; gu fallbacks and unknown codes get
/// the general scheme.
pub fn classify_population_row(
    row: &PopulationRow,
    now: DateTime<Utc>,
    geohash_precision: usize,
) -> ClassifiedPlace {
    // ---
    let info = area_info(&row.area_code);
    let population = row.population();

    let crowd_level = match info.kind {
        Some(kind) => classify_crowd_level_for(population, kind),
        None => classify_crowd_level(population),
    };

    ClassifiedPlace {
        id: row.area_code.clone(),
        name: info.name,
        lat: info.coordinate.lat,
        lng: info.coordinate.lng,
        population,
        crowd_level,
        noise_level: classify_noise_level(population),
        region: resolve_region_name(info.coordinate).to_string(),
        geohash: geohash(info.coordinate, geohash_precision),
        category: info
            .kind
            .map(AreaKind::label)
            .unwrap_or("실시간 데이터")
            .to_string(),
        source: PlaceSource::Population,
        recommendation: walking_recommendation(population),
        last_updated: now,
        district_hint: None,
    }
}

// ---

/// Congestion codes worth keeping: plain levels and their ITIS
/// equivalents (1545 = normal, 1546 = crowded).
fn is_crowd_code(code: &str) -> bool {
    matches!(code, "1" | "2" | "1545" | "1546")
}

fn crowd_level_from_code(code: &str) -> CrowdLevel {
    // ---
    match code {
        "2" | "1546" => CrowdLevel::High,
        _ => CrowdLevel::Medium,
    }
}

/// Read a numeric field that the feed serializes as either a number or
/// a string.
fn value_as_f64(value: Option<&Value>) -> Option<f64> {
    // ---
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn value_as_string(value: Option<&Value>) -> Option<String> {
    // ---
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Extract sensor records from the crowd feed's loosely-shaped payload.
/// The feed has been observed wrapping its items as `result`, `data`,
/// or a bare array; field names differ between gateway versions, so
/// both spellings are accepted. Items with no usable station id,
/// coordinates, or congestion code are dropped.
pub fn parse_crowd_payload(payload: &Value, now: DateTime<Utc>) -> Vec<SensorRecord> {
    // ---
    let items = payload
        .get("result")
        .or_else(|| payload.get("data"))
        .unwrap_or(payload)
        .as_array()
        .cloned()
        .unwrap_or_default();

    items
        .iter()
        .filter_map(|item| {
            let station_id = value_as_string(item.get("stationId").or_else(|| item.get("sttnId")))?;
            if station_id.is_empty() {
                return None;
            }

            let lat = value_as_f64(item.get("lat").or_else(|| item.get("detcLat")))?;
            let lng = value_as_f64(item.get("lng").or_else(|| item.get("detcLot")))?;
            if !Coordinate::new(lat, lng).is_valid() {
                return None;
            }

            let congestion_code =
                value_as_string(item.get("congestionLevel").or_else(|| item.get("itisCd")))?;
            if !is_crowd_code(&congestion_code) {
                return None;
            }

            let timestamp = value_as_string(item.get("updateTime"))
                .and_then(|t| DateTime::parse_from_rfc3339(&t).ok())
                .map(|t| t.with_timezone(&Utc))
                .unwrap_or(now);

            Some(SensorRecord {
                station_id,
                coordinate: Coordinate::new(lat, lng),
                congestion_code,
                timestamp,
                district_hint: value_as_string(item.get("district")),
            })
        })
        .collect()
}

/// Classify one deduplicated sensor record into a stored place. The
/// feed carries no population count, so noise mirrors the crowd bucket
/// (the only signal available).
pub fn classify_crowd_record(
    record: &SensorRecord,
    now: DateTime<Utc>,
    geohash_precision: usize,
) -> ClassifiedPlace {
    // ---
    let crowd_level = crowd_level_from_code(&record.congestion_code);
    let noise_level = match crowd_level {
        CrowdLevel::High => NoiseLevel::High,
        CrowdLevel::Medium => NoiseLevel::Medium,
        CrowdLevel::Low => NoiseLevel::Low,
    };

    let district = record
        .district_hint
        .clone()
        .unwrap_or_else(|| resolve_region_name(record.coordinate).to_string());

    ClassifiedPlace {
        id: format!("station_{}", record.station_id),
        name: format!("{district} 정류장"),
        lat: record.coordinate.lat,
        lng: record.coordinate.lng,
        population: 0,
        crowd_level,
        noise_level,
        region: district.clone(),
        geohash: geohash(record.coordinate, geohash_precision),
        category: "실시간 군중 데이터".to_string(),
        source: PlaceSource::CrowdStation,
        recommendation: match crowd_level {
            CrowdLevel::High => "혼잡 주의",
            _ => "적당한 활기",
        },
        last_updated: now,
        district_hint: Some(district),
    }
}

// ---

async fn fetch_json(client: &reqwest::Client, url: &str) -> Result<Value> {
    Ok(client.get(url).send().await?.error_for_status()?.json().await?)
}

/// One full collection pass over both feeds.
pub async fn run_collection_pass<C: Clock>(
    client: &reqwest::Client,
    config: &Config,
    store: &PlaceStore<C>,
) -> Result<()> {
    // ---
    let now = Utc::now();

    match fetch_json(client, &config.population_api_url).await {
        Ok(payload) => {
            let rows = parse_population_payload(&payload)?;
            let places: Vec<ClassifiedPlace> = rows
                .iter()
                .map(|row| classify_population_row(row, now, config.geohash_precision))
                .collect();
            info!("Collected {} population rows", places.len());
            store.upsert_batch(places, POPULATION_TTL_SECS);
        }
        Err(e) => warn!("Population feed unavailable, keeping previous state: {}", e),
    }

    let Some(crowd_url) = &config.crowd_api_url else {
        debug!("Crowd feed not configured, skipping");
        return Ok(());
    };

    match fetch_json(client, crowd_url).await {
        Ok(payload) => {
            let records = parse_crowd_payload(&payload, now);
            let deduped = dedup_latest_by_station(records);
            let places: Vec<ClassifiedPlace> = deduped
                .iter()
                .map(|record| classify_crowd_record(record, now, config.geohash_precision))
                .collect();
            info!("Collected {} unique crowd stations", places.len());
            store.upsert_batch(places, CROWD_TTL_SECS);
        }
        Err(e) => warn!("Crowd feed unavailable, keeping previous state: {}", e),
    }

    Ok(())
}

/// Poll both feeds forever on the configured interval. Spawned once at
/// startup; the first pass runs immediately.
pub async fn run(store: Arc<PlaceStore<SystemClock>>, config: Config) {
    // ---
    let client = reqwest::Client::new();
    let mut interval =
        tokio::time::interval(std::time::Duration::from_secs(config.collect_interval_secs));

    loop {
        interval.tick().await;
        if let Err(e) = run_collection_pass(&client, &config, &store).await {
            warn!("Collection pass failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn test_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn population_payload_unwraps_service_name() {
        // ---
        let payload = json!({
            "SPOP_LOCAL_RESD_DONG": {
                "list_total_count": 2,
                "row": [
                    { "ADSTRD_CODE_SE": "11140550", "TOT_LVPOP_CO": "13421.72" },
                    { "ADSTRD_CODE_SE": "11170625", "TOT_LVPOP_CO": "2210.05" }
                ]
            }
        });

        let rows = parse_population_payload(&payload).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].area_code, "11140550");
        assert_eq!(rows[0].population(), 13_421);
    }

    #[test]
    fn population_payload_without_rows_is_an_error() {
        // ---
        let payload = json!({ "RESULT": { "CODE": "INFO-200" } });
        assert!(parse_population_payload(&payload).is_err());
    }

    #[test]
    fn curated_area_uses_type_aware_scheme() {
        // ---
        // 명동 is a shopping area: 9000 people is still medium there,
        // though the general scheme would call it high.
        let row = PopulationRow {
            area_code: "11140550".to_string(),
            total_population: "9000".to_string(),
        };

        let place = classify_population_row(&row, test_now(), 7);
        assert_eq!(place.name, "명동");
        assert_eq!(place.crowd_level, CrowdLevel::Medium);
        assert_eq!(place.noise_level, NoiseLevel::Medium);
        assert_eq!(place.category, "쇼핑 지역");
        assert_eq!(place.region, "중구");
        assert_eq!(place.geohash.len(), 7);
    }

    #[test]
    fn unknown_dong_falls_back_to_gu_then_generic() {
        // ---
        let gu_row = PopulationRow {
            area_code: "11140999".to_string(),
            total_population: "9000".to_string(),
        };
        let gu_place = classify_population_row(&gu_row, test_now(), 7);
        assert_eq!(gu_place.name, "중구");
        // General scheme: 9000 is high.
        assert_eq!(gu_place.crowd_level, CrowdLevel::High);

        let unknown_row = PopulationRow {
            area_code: "99999001".to_string(),
            total_population: "100".to_string(),
        };
        let unknown_place = classify_population_row(&unknown_row, test_now(), 7);
        assert_eq!(unknown_place.name, "지역코드_99999001");
        assert_eq!(unknown_place.lat, CITY_CENTER.lat);
    }

    #[test]
    fn crowd_payload_accepts_both_field_spellings() {
        // ---
        let payload = json!({
            "result": [
                {
                    "stationId": "4001",
                    "lat": "37.5009",
                    "lng": "127.0364",
                    "congestionLevel": "1"
                },
                {
                    "sttnId": "4002",
                    "detcLat": 37.5048,
                    "detcLot": 127.0280,
                    "itisCd": "1546",
                    "updateTime": "2025-06-01T11:58:00Z"
                }
            ]
        });

        let records = parse_crowd_payload(&payload, test_now());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].station_id, "4001");
        assert_eq!(records[0].timestamp, test_now());
        assert_eq!(records[1].station_id, "4002");
        assert_eq!(records[1].congestion_code, "1546");
        assert_eq!(
            records[1].timestamp,
            Utc.with_ymd_and_hms(2025, 6, 1, 11, 58, 0).unwrap()
        );
    }

    #[test]
    fn crowd_payload_drops_junk_items() {
        // ---
        let payload = json!({
            "data": [
                // Non-congestion ITIS code.
                { "stationId": "a", "lat": 37.5, "lng": 127.0, "itisCd": "9999" },
                // Unusable coordinates.
                { "stationId": "b", "lat": "not-a-number", "lng": 127.0, "congestionLevel": "1" },
                { "stationId": "c", "lat": 95.0, "lng": 127.0, "congestionLevel": "1" },
                // No station id.
                { "lat": 37.5, "lng": 127.0, "congestionLevel": "2" },
                // Good.
                { "stationId": "d", "lat": 37.5, "lng": 127.0, "congestionLevel": "2" }
            ]
        });

        let records = parse_crowd_payload(&payload, test_now());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].station_id, "d");
    }

    #[test]
    fn crowd_record_classification() {
        // ---
        let record = SensorRecord {
            station_id: "4001".to_string(),
            coordinate: Coordinate::new(37.5009, 127.0364),
            congestion_code: "1546".to_string(),
            timestamp: test_now(),
            district_hint: None,
        };

        let place = classify_crowd_record(&record, test_now(), 7);
        assert_eq!(place.id, "station_4001");
        assert_eq!(place.crowd_level, CrowdLevel::High);
        assert_eq!(place.noise_level, NoiseLevel::High);
        assert_eq!(place.region, "강남구");
        assert_eq!(place.name, "강남구 정류장");
        assert_eq!(place.district_hint.as_deref(), Some("강남구"));
        assert_eq!(place.recommendation, "혼잡 주의");
        assert_eq!(place.source, PlaceSource::CrowdStation);
    }
}
