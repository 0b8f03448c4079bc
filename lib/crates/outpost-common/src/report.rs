//! Canonical scanner report schema and row normalization.
//!
//! A scanner report carries a top-level `Results` array; each entry may
//! carry a `Vulnerabilities` array of PascalCase finding objects. Every
//! `Results` entry is walked, since multi-target images split OS packages
//! and language packages into separate entries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One normalized finding, the row shape a relational sink consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VulnerabilityRecord {
    pub library: String,
    pub vulnerability_id: String,
    pub severity: String,
    pub installed_version: String,
    pub fixed_version: Option<String>,
}

/// Flatten a scanner report into normalized records.
///
/// Findings missing `PkgName` or `VulnerabilityID` are skipped; a report
/// without `Results`, or with results that carry no `Vulnerabilities`
/// array, yields an empty list.
#[must_use]
pub fn normalize_report(report: &Value) -> Vec<VulnerabilityRecord> {
    let Some(results) = report.get("Results").and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut records = Vec::new();
    for result in results {
        let Some(vulns) = result.get("Vulnerabilities").and_then(Value::as_array) else {
            continue;
        };
        for vuln in vulns {
            let (Some(library), Some(id)) = (
                vuln.get("PkgName").and_then(Value::as_str),
                vuln.get("VulnerabilityID").and_then(Value::as_str),
            ) else {
                continue;
            };
            records.push(VulnerabilityRecord {
                library: library.to_string(),
                vulnerability_id: id.to_string(),
                severity: vuln
                    .get("Severity")
                    .and_then(Value::as_str)
                    .unwrap_or("UNKNOWN")
                    .to_string(),
                installed_version: vuln
                    .get("InstalledVersion")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                fixed_version: vuln
                    .get("FixedVersion")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            });
        }
    }
    records
}

/// Count records per severity label, ordered for stable log output.
#[must_use]
pub fn severity_totals(records: &[VulnerabilityRecord]) -> BTreeMap<String, usize> {
    let mut totals = BTreeMap::new();
    for record in records {
        *totals.entry(record.severity.clone()).or_insert(0) += 1;
    }
    totals
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_report() -> Value {
        json!({
            "SchemaVersion": 2,
            "ArtifactName": "registry.example.com/team/app:1.2.3",
            "Results": [
                {
                    "Target": "app (alpine 3.18.4)",
                    "Vulnerabilities": [
                        {
                            "VulnerabilityID": "CVE-2023-5363",
                            "PkgName": "libcrypto3",
                            "InstalledVersion": "3.1.3-r0",
                            "FixedVersion": "3.1.4-r0",
                            "Severity": "HIGH"
                        },
                        {
                            "VulnerabilityID": "CVE-2023-5678",
                            "PkgName": "libssl3",
                            "InstalledVersion": "3.1.3-r0",
                            "Severity": "MEDIUM"
                        }
                    ]
                },
                {
                    "Target": "usr/local/bin/app",
                    "Class": "lang-pkgs"
                },
                {
                    "Target": "Python",
                    "Vulnerabilities": [
                        {
                            "VulnerabilityID": "CVE-2024-0001",
                            "PkgName": "requests",
                            "InstalledVersion": "2.28.0",
                            "FixedVersion": "2.31.0",
                            "Severity": "HIGH"
                        },
                        {
                            "PkgName": "orphan-without-id"
                        }
                    ]
                }
            ]
        })
    }

    #[test]
    fn walks_every_results_entry() {
        let records = normalize_report(&sample_report());
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].library, "libcrypto3");
        assert_eq!(records[2].library, "requests");
    }

    #[test]
    fn missing_fixed_version_is_none() {
        let records = normalize_report(&sample_report());
        assert_eq!(records[0].fixed_version.as_deref(), Some("3.1.4-r0"));
        assert_eq!(records[1].fixed_version, None);
    }

    #[test]
    fn findings_without_identifiers_are_skipped() {
        let records = normalize_report(&sample_report());
        assert!(records.iter().all(|r| !r.vulnerability_id.is_empty()));
    }

    #[test]
    fn report_without_results_is_empty() {
        assert!(normalize_report(&json!({"ArtifactName": "x"})).is_empty());
        assert!(normalize_report(&json!("not even an object")).is_empty());
        assert!(normalize_report(&json!({"Results": "wrong type"})).is_empty());
    }

    #[test]
    fn totals_count_per_severity() {
        let totals = severity_totals(&normalize_report(&sample_report()));
        assert_eq!(totals.get("HIGH"), Some(&2));
        assert_eq!(totals.get("MEDIUM"), Some(&1));
        assert_eq!(totals.get("LOW"), None);
    }

    #[test]
    fn severity_defaults_to_unknown() {
        let report = json!({
            "Results": [{"Vulnerabilities": [{"VulnerabilityID": "CVE-1", "PkgName": "p"}]}]
        });
        let records = normalize_report(&report);
        assert_eq!(records[0].severity, "UNKNOWN");
        assert_eq!(records[0].installed_version, "");
    }
}
