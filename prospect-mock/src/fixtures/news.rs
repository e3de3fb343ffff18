use chrono::{DateTime, Utc};
use prospect_core::{NewsArticle, RawSourceData};

fn at(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}

fn article(title: &str, slug: &str, published: i64, publisher: &str) -> NewsArticle {
    NewsArticle {
        title: title.to_string(),
        url: Some(format!("https://news.example/{slug}")),
        published_at: at(published),
        publisher: Some(publisher.to_string()),
        summary: None,
    }
}

pub fn by_company(name: &str) -> Option<RawSourceData> {
    let articles = match name {
        "acme" => vec![
            article(
                "Acme Robotics raises $30M Series B",
                "acme-series-b",
                1_717_200_000,
                "Tech Wire",
            ),
            article(
                "Acme opens second assembly plant",
                "acme-plant",
                1_709_000_000,
                "Manufacturing Daily",
            ),
        ],
        "globex" => vec![article(
            "Globex expands into Southeast Asia",
            "globex-asia",
            1_714_000_000,
            "Freight News",
        )],
        _ => return None,
    };
    Some(RawSourceData::Articles(articles))
}
