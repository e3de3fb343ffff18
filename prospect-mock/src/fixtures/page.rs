use std::collections::BTreeMap;

use prospect_core::RawSourceData;

pub fn by_company(name: &str) -> Option<RawSourceData> {
    let (site, description, products): (&str, &str, &[&str]) = match name {
        "acme" => (
            "Acme Robotics",
            "Industrial robots for small factories.",
            &["Acme Arm", "Acme Vision", "Fleet Console"],
        ),
        "globex" => (
            "Globex",
            "Logistics software for global shipping.",
            &["Globex Route"],
        ),
        "partial" => ("Partial Labs", "Sometimes reachable.", &[]),
        _ => return None,
    };
    let domain = format!("{name}.example");
    let social_links: BTreeMap<String, String> = [
        ("linkedin", format!("https://www.linkedin.com/company/{name}")),
        ("github", format!("https://github.com/{name}")),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();
    Some(RawSourceData::Page {
        url: format!("https://{domain}/"),
        title: Some(format!("{site} | Home")),
        site_name: Some(site.to_string()),
        description: Some(description.to_string()),
        products: products.iter().map(|p| (*p).to_string()).collect(),
        social_links,
        text: format!("{site}. {description}"),
    })
}
