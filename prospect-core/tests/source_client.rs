use async_trait::async_trait;
use prospect_core::{
    CompanyIdentifier, Fingerprint, ProspectError, RawSourceData, SourceClient, SourceKey,
    SourceRequest,
};
use std::collections::HashSet;

struct Fixed;

#[async_trait]
impl SourceClient for Fixed {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn fetch(&self, company: &CompanyIdentifier) -> Result<RawSourceData, ProspectError> {
        if company.domain().is_some() {
            Ok(RawSourceData::Empty)
        } else {
            Err(ProspectError::not_found(format!("no page for {company}")))
        }
    }
}

#[tokio::test]
async fn default_key_and_vendor() {
    let client: &dyn SourceClient = &Fixed;
    assert_eq!(client.key(), SourceKey::new("fixed"));
    assert_eq!(client.vendor(), "unknown");

    let domain = CompanyIdentifier::parse("acme.io").unwrap();
    assert_eq!(client.fetch(&domain).await.unwrap(), RawSourceData::Empty);
    let name = CompanyIdentifier::parse("Acme Robotics").unwrap();
    assert!(matches!(
        client.fetch(&name).await,
        Err(ProspectError::NotFound { .. })
    ));
}

#[test]
fn fingerprints_key_on_source_and_company() {
    let acme = CompanyIdentifier::parse("https://www.acme.io/about").unwrap();
    let same = CompanyIdentifier::parse("ACME.io").unwrap();
    let req = SourceRequest::first(SourceKey::WEB, acme.clone());
    assert!(!req.is_retry());

    let mut set = HashSet::new();
    set.insert(Fingerprint::from(&req));
    assert!(set.contains(&Fingerprint::new(SourceKey::WEB, same)));
    assert!(!set.contains(&Fingerprint::new(SourceKey::NEWS, acme)));
    assert_eq!(
        Fingerprint::from(&req).to_string(),
        "web:acme.io"
    );
}
