//! Exploratory summaries of the incident table.

use std::fmt;
use std::io;

use serde::Serialize;

use crate::dataset::DatasetStore;
use crate::error::Result;
use crate::records::{CASE_CLOSED, CITY, CRIME_DESCRIPTION, VICTIM_GENDER};

pub const TOP_N: usize = 5;
pub const PREVIEW_ROWS: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Share {
    pub value: String,
    pub count: usize,
    pub percent: f64,
}

/// Counts with their share of the non-null total, rounded to one decimal.
pub fn shares(counts: &[(String, usize)]) -> Vec<Share> {
    let total: usize = counts.iter().map(|(_, c)| c).sum();
    counts
        .iter()
        .map(|(value, count)| {
            let percent = if total == 0 {
                0.0
            } else {
                (*count as f64 * 1000.0 / total as f64).round() / 10.0
            };
            Share {
                value: value.clone(),
                count: *count,
                percent,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub incidents: usize,
    pub case_closure: Vec<Share>,
    pub victim_gender: Vec<(String, usize)>,
    pub top_cities: Vec<(String, usize)>,
    pub top_crimes: Vec<(String, usize)>,
}

#[derive(Serialize)]
struct CsvRow<'a> {
    section: &'a str,
    value: &'a str,
    count: usize,
    percent: Option<f64>,
}

impl Summary {
    pub fn from_dataset(store: &DatasetStore) -> Result<Self> {
        let mut top_cities = store.value_counts(CITY)?;
        top_cities.truncate(TOP_N);
        let mut top_crimes = store.value_counts(CRIME_DESCRIPTION)?;
        top_crimes.truncate(TOP_N);

        Ok(Summary {
            incidents: store.len(),
            case_closure: shares(&store.value_counts(CASE_CLOSED)?),
            victim_gender: store.value_counts(VICTIM_GENDER)?,
            top_cities,
            top_crimes,
        })
    }

    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        for share in &self.case_closure {
            wtr.serialize(CsvRow {
                section: "case_closure",
                value: &share.value,
                count: share.count,
                percent: Some(share.percent),
            })?;
        }
        let sections = [
            ("victim_gender", &self.victim_gender),
            ("top_cities", &self.top_cities),
            ("top_crimes", &self.top_crimes),
        ];
        for (section, counts) in sections {
            for (value, count) in counts.iter() {
                wtr.serialize(CsvRow {
                    section,
                    value,
                    count: *count,
                    percent: None,
                })?;
            }
        }
        wtr.flush().map_err(csv::Error::from)?;
        Ok(())
    }
}

fn write_counts(f: &mut fmt::Formatter<'_>, title: &str, counts: &[(String, usize)]) -> fmt::Result {
    writeln!(f, "{title}")?;
    for (value, count) in counts {
        writeln!(f, "  {value:<24} {count:>8}")?;
    }
    Ok(())
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Incidents: {}", self.incidents)?;
        writeln!(f, "Case Closure Distribution")?;
        for share in &self.case_closure {
            writeln!(
                f,
                "  {:<24} {:>8} {:>6.1}%",
                share.value, share.count, share.percent
            )?;
        }
        write_counts(f, "Victim Gender Distribution", &self.victim_gender)?;
        write_counts(f, "Top 5 Cities with Most Crimes", &self.top_cities)?;
        write_counts(f, "Top 5 Crime Types", &self.top_crimes)
    }
}
