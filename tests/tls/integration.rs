use super::support::{TestCertificate, PKCS12_PASSWORD};
use crate::common::{file, request, target, Harness};
use vaultsync::domain::{Record, SecretKeyReference, SecretString};
use vaultsync::{SecretType, SyncReason, SyncStatus, TargetSecret, VaultSecret};

fn tls_request(name: &str, references: &[(&str, &str)]) -> VaultSecret {
    references.iter().fold(request(name).with_type(SecretType::TLS), |request, (key, record)| {
        request.with_reference(SecretKeyReference::new(*key, *record))
    })
}

async fn sync(harness: &Harness, request: &mut VaultSecret) -> TargetSecret {
    let mut target = target(request.name());
    let outcome = harness.reconcile(request, &mut target).await;
    assert_eq!(outcome.status, SyncStatus::Synced, "{:?}", outcome.event);
    target
}

#[tokio::test]
async fn test_pem_bundle_and_separate_records_are_identical() -> anyhow::Result<()> {
    let cert = TestCertificate::generate()?;
    let harness = Harness::new().await;
    harness.put(file("bundle", cert.pem_bundle())).await;
    harness.put(file("key", cert.key_pem.clone())).await;
    harness.put(file("crt", cert.leaf_pem.clone())).await;
    harness.put(file("ca", cert.ca_pem.clone())).await;

    let from_bundle = sync(&harness, &mut tls_request("bundle", &[("pem", "bundle")])).await;
    let from_parts = sync(
        &harness,
        &mut tls_request("parts", &[("tls.key", "key"), ("tls.crt", "crt"), ("ca.crt", "ca")]),
    )
    .await;

    assert_eq!(from_bundle.data, from_parts.data);
    assert_eq!(from_bundle.data.len(), 2);
    assert_eq!(from_bundle.get_str("tls.crt"), Some(cert.chain_pem().as_str()));
    assert_eq!(from_bundle.get_str("tls.key"), Some(cert.key_pem.as_str()));
    assert_eq!(from_bundle.metadata.annotations, from_parts.metadata.annotations);
    Ok(())
}

#[tokio::test]
async fn test_certificate_chain_wins_over_ca_record() -> anyhow::Result<()> {
    let cert = TestCertificate::generate()?;
    let other = TestCertificate::generate()?;
    let harness = Harness::new().await;
    harness.put(file("key", cert.key_pem.clone())).await;
    harness.put(file("crt", cert.chain_pem())).await;
    harness.put(file("ca", other.ca_pem.clone())).await;

    let target = sync(
        &harness,
        &mut tls_request("parts", &[("tls.key", "key"), ("tls.crt", "crt"), ("ca.crt", "ca")]),
    )
    .await;

    assert_eq!(target.get_str("tls.crt"), Some(cert.chain_pem().as_str()));
    Ok(())
}

#[tokio::test]
async fn test_shared_record_is_fetched_once() -> anyhow::Result<()> {
    let cert = TestCertificate::generate()?;
    let harness = Harness::new().await;
    harness.put(file("bundle", cert.pem_bundle())).await;

    let mut request = tls_request("shared", &[("tls.key", "bundle"), ("tls.crt", "bundle")]);
    let target = sync(&harness, &mut request).await;

    // One policy record plus the bundle
    assert_eq!(harness.record_fetches(), 2);
    assert_eq!(target.get_str("tls.crt"), Some(cert.chain_pem().as_str()));
    assert_eq!(target.get_str("tls.key"), Some(cert.key_pem.as_str()));
    assert_eq!(request.status.vault_record_statuses.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_pkcs12_bundle() -> anyhow::Result<()> {
    let cert = TestCertificate::generate()?;
    let harness = Harness::new().await;
    harness
        .put(Record {
            password: Some(SecretString::new(PKCS12_PASSWORD)),
            ..file("archive", cert.pkcs12()?)
        })
        .await;

    let target = sync(&harness, &mut tls_request("archive", &[("pkcs12", "archive")])).await;

    assert_eq!(target.get_str("tls.crt"), Some(cert.chain_pem().as_str()));
    assert_eq!(target.get_str("tls.key"), Some(cert.key_pem.as_str()));
    Ok(())
}

#[tokio::test]
async fn test_pkcs12_wrong_password() -> anyhow::Result<()> {
    let cert = TestCertificate::generate()?;
    let harness = Harness::new().await;
    harness
        .put(Record {
            password: Some(SecretString::new("wrong")),
            ..file("archive", cert.pkcs12()?)
        })
        .await;

    let mut request = tls_request("archive", &[("pkcs12", "archive")]);
    let outcome = harness.reconcile(&mut request, &mut target("archive")).await;

    assert_eq!(outcome.status, SyncStatus::OutOfSync);
    assert_eq!(outcome.event.unwrap().reason, SyncReason::ProcessingError);
    Ok(())
}

#[tokio::test]
async fn test_certificate_annotations() -> anyhow::Result<()> {
    let cert = TestCertificate::generate()?;
    let harness = Harness::new().await;
    harness.put(file("bundle", cert.pem_bundle())).await;

    let target = sync(&harness, &mut tls_request("bundle", &[("pem", "bundle")])).await;

    let annotations = &target.metadata.annotations;
    assert_eq!(annotations["field.cattle.io/algorithm"], "ECDSA");
    assert_eq!(annotations["field.cattle.io/keySize"], "256");
    assert_eq!(annotations["field.cattle.io/cn"], "www.example.io");
    assert_eq!(annotations["field.cattle.io/issuer"], "Test Root CA");
    assert_eq!(annotations["field.cattle.io/issuedAt"], "2024-01-01T00:00:00Z");
    assert_eq!(annotations["field.cattle.io/expiresAt"], "2034-01-01T00:00:00Z");
    assert_eq!(annotations["field.cattle.io/version"], "3");
    assert_eq!(
        annotations["field.cattle.io/subjectAlternativeNames"],
        r#"["www.example.io","192.168.1.10"]"#
    );
    assert!(annotations["field.cattle.io/certFingerprint"]
        .split(':')
        .all(|octet| octet.len() == 2 && octet == octet.to_uppercase()));
    Ok(())
}

#[tokio::test]
async fn test_removing_ca_reference_rebuilds() -> anyhow::Result<()> {
    let cert = TestCertificate::generate()?;
    let harness = Harness::new().await;
    harness.put(file("key", cert.key_pem.clone())).await;
    harness.put(file("crt", cert.leaf_pem.clone())).await;
    harness.put(file("ca", cert.ca_pem.clone())).await;

    let mut request =
        tls_request("parts", &[("tls.key", "key"), ("tls.crt", "crt"), ("ca.crt", "ca")]);
    let mut target = target("parts");
    harness.reconcile(&mut request, &mut target).await;
    assert_eq!(target.get_str("tls.crt"), Some(cert.chain_pem().as_str()));

    let fetches = harness.record_fetches();
    let outcome = harness.reconcile(&mut request, &mut target).await;
    assert!(outcome.event.is_none());
    assert_eq!(harness.record_fetches(), fetches);

    request.spec.data.retain(|r| r.name != "ca.crt");
    let outcome = harness.reconcile(&mut request, &mut target).await;

    assert_eq!(outcome.event.unwrap().reason, SyncReason::SecretUpdated);
    assert_eq!(harness.record_fetches(), fetches + 2);
    assert_eq!(target.get_str("tls.crt"), Some(cert.leaf_pem.as_str()));
    assert!(request.status.record_status(&"ca".into()).is_none());
    Ok(())
}

#[tokio::test]
async fn test_invalid_layouts() -> anyhow::Result<()> {
    let harness = Harness::new().await;
    harness.put(file("bundle", "not a certificate")).await;

    let cases: [(&[(&str, &str)], &str); 4] = [
        (&[("bundle", "bundle")], "only 'pem' or 'pkcs12' is allowed"),
        (&[("tls.key", "bundle"), ("extra", "bundle")], "unexpected key 'extra'"),
        (&[("tls.key", "bundle"), ("ca.crt", "bundle")], "missing key 'tls.crt'"),
        (&[("pem", "bundle")], "certificate"),
    ];
    for (references, expected) in cases {
        let mut request = tls_request("broken", references);
        let outcome = harness.reconcile(&mut request, &mut target("broken")).await;
        let message = outcome.event.unwrap().message;
        assert!(message.contains(expected), "'{}' does not mention '{}'", message, expected);
    }
    Ok(())
}
