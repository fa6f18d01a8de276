use rcgen::{
    date_time_ymd, BasicConstraints, CertificateParams, DnType, IsCa, KeyPair, SanType,
};
use std::net::Ipv4Addr;

pub const PKCS12_PASSWORD: &str = "changeit";

/// Key, leaf and issuing CA generated for one test.
pub struct TestCertificate {
    pub key_pem: String,
    pub key_der: Vec<u8>,
    pub leaf_pem: String,
    pub leaf_der: Vec<u8>,
    pub ca_pem: String,
    pub ca_der: Vec<u8>,
}

impl TestCertificate {
    /// ECDSA P-256 leaf for `www.example.io` signed by a fresh CA.
    pub fn generate() -> anyhow::Result<Self> {
        let ca_key = KeyPair::generate()?;
        let mut ca_params = CertificateParams::new(Vec::<String>::new())?;
        ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        ca_params.distinguished_name.push(DnType::CommonName, "Test Root CA");
        let ca = ca_params.self_signed(&ca_key)?;

        let key = KeyPair::generate()?;
        let mut params = CertificateParams::new(vec!["www.example.io".to_string()])?;
        params.distinguished_name.push(DnType::CommonName, "www.example.io");
        params.subject_alt_names.push(SanType::IpAddress(Ipv4Addr::new(192, 168, 1, 10).into()));
        params.not_before = date_time_ymd(2024, 1, 1);
        params.not_after = date_time_ymd(2034, 1, 1);
        let leaf = params.signed_by(&key, &ca, &ca_key)?;

        Ok(Self {
            key_pem: key.serialize_pem(),
            key_der: key.serialize_der(),
            leaf_pem: leaf.pem(),
            leaf_der: leaf.der().to_vec(),
            ca_pem: ca.pem(),
            ca_der: ca.der().to_vec(),
        })
    }

    /// Leaf, CA and key in one PEM blob
    pub fn pem_bundle(&self) -> String {
        format!("{}{}{}", self.leaf_pem, self.ca_pem, self.key_pem)
    }

    /// Leaf followed by its CA
    pub fn chain_pem(&self) -> String {
        format!("{}{}", self.leaf_pem, self.ca_pem)
    }

    /// PKCS#12 archive protected with [`PKCS12_PASSWORD`]
    pub fn pkcs12(&self) -> anyhow::Result<Vec<u8>> {
        let pfx = p12::PFX::new(
            &self.leaf_der,
            &self.key_der,
            Some(&self.ca_der),
            PKCS12_PASSWORD,
            "www.example.io",
        )
        .ok_or_else(|| anyhow::anyhow!("build pkcs12 archive"))?;
        Ok(pfx.to_der())
    }
}
