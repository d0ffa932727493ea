// OWASP Top 10 2021 reference data and draft auto-fill

use crate::model::{FindingDraft, OwaspCategory};

/// Static reference entry for one OWASP Top 10 2021 category.
#[derive(Debug, Clone, Copy)]
pub struct OwaspReference {
    pub category: OwaspCategory,
    pub id: &'static str,
    pub title: &'static str,
    pub cwe_ids: &'static [&'static str],
    pub cvss_vector: &'static str,
    pub owasp_url: &'static str,
}

pub const OWASP_REFERENCES: &[OwaspReference] = &[
    OwaspReference {
        category: OwaspCategory::BrokenAccessControl,
        id: "A01:2021",
        title: "Broken Access Control",
        cwe_ids: &["CWE-285", "CWE-639", "CWE-862", "CWE-863"],
        cvss_vector: "AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H",
        owasp_url: "https://owasp.org/Top10/A01_2021-Broken_Access_Control/",
    },
    OwaspReference {
        category: OwaspCategory::CryptographicFailures,
        id: "A02:2021",
        title: "Cryptographic Failures",
        cwe_ids: &["CWE-259", "CWE-327", "CWE-330"],
        cvss_vector: "AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H",
        owasp_url: "https://owasp.org/Top10/A02_2021-Cryptographic_Failures/",
    },
    OwaspReference {
        category: OwaspCategory::Injection,
        id: "A03:2021",
        title: "Injection",
        cwe_ids: &["CWE-89", "CWE-78", "CWE-79"],
        cvss_vector: "AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H",
        owasp_url: "https://owasp.org/Top10/A03_2021-Injection/",
    },
    OwaspReference {
        category: OwaspCategory::InsecureDesign,
        id: "A04:2021",
        title: "Insecure Design",
        cwe_ids: &["CWE-209", "CWE-213", "CWE-352"],
        cvss_vector: "AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H",
        owasp_url: "https://owasp.org/Top10/A04_2021-Insecure_Design/",
    },
    OwaspReference {
        category: OwaspCategory::SecurityMisconfiguration,
        id: "A05:2021",
        title: "Security Misconfiguration",
        cwe_ids: &["CWE-16", "CWE-200", "CWE-209"],
        cvss_vector: "AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H",
        owasp_url: "https://owasp.org/Top10/A05_2021-Security_Misconfiguration/",
    },
    OwaspReference {
        category: OwaspCategory::VulnerableComponents,
        id: "A06:2021",
        title: "Vulnerable and Outdated Components",
        cwe_ids: &["CWE-1104", "CWE-79", "CWE-89"],
        cvss_vector: "AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H",
        owasp_url: "https://owasp.org/Top10/A06_2021-Vulnerable_and_Outdated_Components/",
    },
    OwaspReference {
        category: OwaspCategory::AuthenticationFailures,
        id: "A07:2021",
        title: "Identification and Authentication Failures",
        cwe_ids: &["CWE-287", "CWE-798", "CWE-522"],
        cvss_vector: "AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H",
        owasp_url: "https://owasp.org/Top10/A07_2021-Identification_and_Authentication_Failures/",
    },
    OwaspReference {
        category: OwaspCategory::SoftwareIntegrityFailures,
        id: "A08:2021",
        title: "Software and Data Integrity Failures",
        cwe_ids: &["CWE-829", "CWE-494", "CWE-502"],
        cvss_vector: "AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H",
        owasp_url: "https://owasp.org/Top10/A08_2021-Software_and_Data_Integrity_Failures/",
    },
    OwaspReference {
        category: OwaspCategory::LoggingMonitoringFailures,
        id: "A09:2021",
        title: "Security Logging and Monitoring Failures",
        cwe_ids: &["CWE-778", "CWE-117", "CWE-223"],
        cvss_vector: "AV:N/AC:L/PR:N/UI:N/S:U/C:L/I:L/A:L",
        owasp_url: "https://owasp.org/Top10/A09_2021-Security_Logging_and_Monitoring_Failures/",
    },
    OwaspReference {
        category: OwaspCategory::Ssrf,
        id: "A10:2021",
        title: "Server-Side Request Forgery",
        cwe_ids: &["CWE-918"],
        cvss_vector: "AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:L/A:N",
        owasp_url: "https://owasp.org/Top10/A10_2021-Server-Side_Request_Forgery_%28SSRF%29/",
    },
];

/// Look up the reference entry for a category.
pub fn reference_for(category: OwaspCategory) -> &'static OwaspReference {
    OWASP_REFERENCES
        .iter()
        .find(|r| r.category == category)
        .unwrap_or(&OWASP_REFERENCES[0])
}

/// Apply category selection to a draft: set the category and fill the
/// first CWE id and the CVSS vector, as the form does on category change.
pub fn apply_owasp_autofill(draft: &mut FindingDraft, category: OwaspCategory) {
    let reference = reference_for(category);
    draft.owasp_category = Some(category);
    if let Some(first) = reference.cwe_ids.first() {
        draft.cwe_id = Some((*first).to_string());
    }
    draft.cvss_score = Some(reference.cvss_vector.to_string());
}
