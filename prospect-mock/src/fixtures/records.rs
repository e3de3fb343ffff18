use std::collections::BTreeMap;

use prospect_core::RawSourceData;
use serde_json::{Value, json};

fn record(fields: Value) -> Option<RawSourceData> {
    let Value::Object(map) = fields else {
        return None;
    };
    Some(RawSourceData::Record(map.into_iter().collect::<BTreeMap<_, _>>()))
}

pub fn professional_network(name: &str) -> Option<RawSourceData> {
    match name {
        "acme" => record(json!({
            "name": "Acme Robotics Inc.",
            "industry": "Industrial Automation",
            "employee_count": 240,
            "headquarters": "Pittsburgh, PA",
            "founded_year": 2014,
            "specialties": ["robotics", "machine vision"],
            "profile_url": "https://www.linkedin.com/company/acme",
        })),
        "partial" => record(json!({
            "name": "Partial Labs",
            "industry": "Research",
            "employee_count": 12,
        })),
        _ => None,
    }
}

pub fn company_database(name: &str) -> Option<RawSourceData> {
    match name {
        "acme" => record(json!({
            "name": "Acme Robotics",
            "description": "Maker of collaborative industrial robots.",
            "industry": "Robotics",
            "employee_count": 250,
            "founded_year": 2014,
            "total_funding_usd": 48_000_000,
            "website": "https://acme.example",
            "headquarters": "Pittsburgh, Pennsylvania, United States",
        })),
        "globex" => record(json!({
            "name": "Globex Corporation",
            "industry": "Logistics",
            "employee_count": 1800,
            "founded_year": 1989,
            "website": "https://globex.example",
        })),
        _ => None,
    }
}
