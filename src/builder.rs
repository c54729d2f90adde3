// 🧱 Record Builder - provider venue → catalog payload
//
// The engines treat the builder as opaque. `PlacesRecordBuilder` is the
// default used by the binaries for Places-style venues.

use crate::models::{About, Address, GeoPoint, NewCatalogRecord, ScheduleEntry, Venue};
use anyhow::{bail, Result};
use async_trait::async_trait;

#[async_trait]
pub trait RecordBuilder: Send + Sync {
    async fn build(&self, venue: &Venue, origin: GeoPoint) -> Result<NewCatalogRecord>;
}

/// Place types that say nothing about what kind of venue it is
const GENERIC_PLACE_TYPES: &[&str] = &["point_of_interest", "establishment", "food", "store"];

const DEFAULT_BAR_TYPE: &str = "Bar";

pub struct PlacesRecordBuilder {
    /// Review volume at or above which the crowd meter reads "High"
    pub high_crowd_threshold: u64,

    /// Review volume at or above which the crowd meter reads "Medium"
    pub medium_crowd_threshold: u64,
}

impl PlacesRecordBuilder {
    pub fn new() -> Self {
        PlacesRecordBuilder {
            high_crowd_threshold: 500,
            medium_crowd_threshold: 100,
        }
    }

    pub fn crowd_meter(&self, reviews: u64) -> &'static str {
        if reviews >= self.high_crowd_threshold {
            "High"
        } else if reviews >= self.medium_crowd_threshold {
            "Medium"
        } else {
            "Low"
        }
    }
}

impl Default for PlacesRecordBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// "night_club" → "Night Club"
fn title_case_type(place_type: &str) -> String {
    place_type
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn bar_type_from(types: &[String]) -> String {
    types
        .iter()
        .find(|t| !GENERIC_PLACE_TYPES.contains(&t.as_str()))
        .map(|t| title_case_type(t))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_BAR_TYPE.to_string())
}

/// "Friday: 6:00 PM – 2:00 AM" → {day: "Fri", time: "6:00 PM – 2:00 AM"}
pub fn parse_weekday_line(line: &str) -> Option<ScheduleEntry> {
    let (day, time) = line.split_once(':')?;
    let day = day.trim();
    if day.len() < 3 || !day.is_char_boundary(3) {
        return None;
    }

    Some(ScheduleEntry {
        day: day[..3].to_string(),
        time: time.trim().to_string(),
    })
}

#[async_trait]
impl RecordBuilder for PlacesRecordBuilder {
    async fn build(&self, venue: &Venue, origin: GeoPoint) -> Result<NewCatalogRecord> {
        if venue.place_id.trim().is_empty() {
            bail!("venue has no place id");
        }
        let name = venue.name.trim();
        if name.is_empty() {
            bail!("venue {} has no name", venue.place_id);
        }

        let mut photos = venue.photos.iter().cloned();
        let cover = photos.next().unwrap_or_default();
        let gallery: Vec<String> = photos.collect();

        let reviews = venue.user_ratings_total.unwrap_or(0);

        Ok(NewCatalogRecord {
            name: name.to_string(),
            cover,
            gallery,
            bar_type: bar_type_from(&venue.types),
            crowd_meter: self.crowd_meter(reviews).to_string(),
            about: About {
                address: Address {
                    place_name: venue
                        .vicinity
                        .clone()
                        .filter(|v| !v.trim().is_empty())
                        .unwrap_or_else(|| name.to_string()),
                    location: Some(venue.location.unwrap_or(origin)),
                },
                schedule: venue
                    .weekday_text
                    .iter()
                    .filter_map(|line| parse_weekday_line(line))
                    .collect(),
            },
            total_reviewer: reviews,
            average_rating: venue.rating.filter(|r| r.is_finite()).unwrap_or(0.0),
        })
    }
}
