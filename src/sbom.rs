//! SBOM upload rules and the summary shown after a successful analysis.

use std::fmt::Write as _;

use crate::constants::{SBOM_ALLOWED_EXTENSIONS, SBOM_ANALYSIS_PROMPT, SBOM_MAX_BYTES};
use crate::error::ClientError;
use crate::models::{Project, SbomInfo};

/// Reject files the backend cannot analyse before anything is sent.
pub fn validate_sbom_file(name: &str, size: u64) -> Result<(), ClientError> {
    let extension = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    if !SBOM_ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ClientError::Validation(format!(
            "Formato no soportado. Usa uno de: {}",
            SBOM_ALLOWED_EXTENSIONS.join(", ")
        )));
    }
    if size > SBOM_MAX_BYTES {
        return Err(ClientError::Validation(format!(
            "El archivo supera el tamaño máximo de {} MB",
            SBOM_MAX_BYTES / (1024 * 1024)
        )));
    }
    Ok(())
}

/// Form fields sent next to the file, in the order the backend lists them.
pub fn upload_fields(project: &Project) -> Vec<(&'static str, String)> {
    vec![
        ("proyecto_id", project.id.clone()),
        ("umbral_vulnerabilidades", project.vulnerability_threshold.to_string()),
        ("severidad_maxima", project.max_severity.to_string()),
        ("prompt", SBOM_ANALYSIS_PROMPT.to_string()),
    ]
}

/// Markdown summary: file metadata, then the analysis (if any) with a
/// pass/fail verdict against the project's vulnerability threshold.
pub fn format_sbom_summary(info: &SbomInfo, threshold: u32) -> String {
    let mut out = String::new();
    let format = if info.format.is_empty() { "desconocido" } else { info.format.as_str() };

    let _ = writeln!(out, "### Análisis del SBOM\n");
    let _ = writeln!(out, "- **Archivo**: {}", info.filename);
    let _ = writeln!(out, "- **Formato**: {}", format);
    let _ = writeln!(out, "- **Componentes**: {}", info.components_count);

    if let Some(analysis) = &info.vulnerability_analysis {
        let _ = writeln!(out, "\n#### Vulnerabilidades\n");
        let _ = writeln!(out, "- **Componentes analizados**: {}", analysis.analyzed_components);
        let _ = writeln!(out, "- **Vulnerabilidades encontradas**: {}", analysis.vulnerabilities_found);
        let _ = writeln!(out, "- **Componentes vulnerables**: {}", analysis.vulnerable_components);

        if !analysis.filters_applied.is_empty() {
            let _ = writeln!(out, "- **Filtros aplicados**: {}", analysis.filters_applied.join(", "));
        }
        let excluded: Vec<String> = analysis
            .excluded_by_severity
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(severity, count)| format!("{}: {}", severity, count))
            .collect();
        if !excluded.is_empty() {
            let _ = writeln!(out, "- **Excluidas por severidad**: {}", excluded.join(", "));
        }

        let verdict = if analysis.vulnerabilities_found <= threshold {
            format!("**APROBADO**: {} de un máximo de {}", analysis.vulnerabilities_found, threshold)
        } else {
            format!("**NO APROBADO**: {} supera el umbral de {}", analysis.vulnerabilities_found, threshold)
        };
        let _ = writeln!(out, "\n{}", verdict);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VulnerabilityAnalysis;

    const MIB: u64 = 1024 * 1024;

    #[test]
    fn rejects_disallowed_extension() {
        let err = validate_sbom_file("report.exe", 10).unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert!(validate_sbom_file("sinextension", 10).is_err());
    }

    #[test]
    fn rejects_oversized_file() {
        assert!(validate_sbom_file("sbom.json", 20 * MIB).is_err());
        assert!(validate_sbom_file("sbom.json", 16 * MIB).is_ok());
    }

    #[test]
    fn accepts_allowed_extensions_case_insensitively() {
        assert!(validate_sbom_file("sbom.json", MIB).is_ok());
        assert!(validate_sbom_file("BOM.SPDX", MIB).is_ok());
        assert!(validate_sbom_file("cyclonedx.bom.xml", MIB).is_ok());
    }

    fn info(found: u32) -> SbomInfo {
        SbomInfo {
            filename: "sbom.json".into(),
            format: "CycloneDX".into(),
            components_count: 42,
            vulnerability_analysis: Some(VulnerabilityAnalysis {
                analyzed_components: 40,
                vulnerabilities_found: found,
                vulnerable_components: 3,
                filters_applied: vec!["severidad >= HIGH".into()],
                excluded_by_severity: [("LOW".to_string(), 4), ("MEDIUM".to_string(), 0)]
                    .into_iter()
                    .collect(),
            }),
        }
    }

    #[test]
    fn summary_passes_within_threshold() {
        let summary = format_sbom_summary(&info(5), 10);
        assert!(summary.contains("**Archivo**: sbom.json"));
        assert!(summary.contains("**Componentes**: 42"));
        assert!(summary.contains("LOW: 4"));
        assert!(!summary.contains("MEDIUM: 0"));
        assert!(summary.contains("**APROBADO**"));
    }

    #[test]
    fn summary_fails_above_threshold() {
        assert!(format_sbom_summary(&info(11), 10).contains("**NO APROBADO**"));
    }

    #[test]
    fn summary_without_analysis_has_no_verdict() {
        let mut plain = info(0);
        plain.vulnerability_analysis = None;
        plain.format.clear();
        let summary = format_sbom_summary(&plain, 10);
        assert!(summary.contains("desconocido"));
        assert!(!summary.contains("APROBADO"));
    }
}
