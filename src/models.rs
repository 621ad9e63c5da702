use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Highest CVSS severity a project is willing to report on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    #[default]
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [Severity::Low, Severity::Medium, Severity::High, Severity::Critical];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(Severity::Low),
            "MEDIUM" => Ok(Severity::Medium),
            "HIGH" => Ok(Severity::High),
            "CRITICAL" => Ok(Severity::Critical),
            other => Err(format!("Severidad desconocida: {}", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

fn default_threshold() -> u32 {
    10
}

fn default_severity_weight() -> u8 {
    70
}

fn default_fixability_weight() -> u8 {
    30
}

fn default_fixability_low() -> f32 {
    3.0
}

fn default_fixability_high() -> f32 {
    7.0
}

/// Project as returned by `GET /proyectos[/:id]`.
///
/// Wire names follow the backend (Spanish) schema; every prioritisation
/// field is optional on the wire so older projects still deserialize.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion", default)]
    pub description: Option<String>,
    #[serde(rename = "umbral_vulnerabilidades", default = "default_threshold")]
    pub vulnerability_threshold: u32,
    #[serde(rename = "severidad_maxima", default)]
    pub max_severity: Severity,
    #[serde(flatten)]
    pub weights: PrioritizationWeights,
    #[serde(flatten)]
    pub fixability: FixabilityThresholds,
    #[serde(flatten)]
    pub flags: PrioritizationFlags,
    #[serde(rename = "usuario_id", default)]
    pub owner_id: Option<String>,
    #[serde(rename = "fecha_creacion", default)]
    pub created_at: Option<String>,
    #[serde(rename = "fecha_modificacion", default)]
    pub updated_at: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrioritizationWeights {
    #[serde(rename = "peso_severidad", default = "default_severity_weight")]
    pub severity: u8,
    #[serde(rename = "peso_solucionabilidad", default = "default_fixability_weight")]
    pub fixability: u8,
}

impl Default for PrioritizationWeights {
    fn default() -> Self {
        Self {
            severity: default_severity_weight(),
            fixability: default_fixability_weight(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FixabilityThresholds {
    #[serde(rename = "umbral_solucionabilidad_bajo", default = "default_fixability_low")]
    pub low: f32,
    #[serde(rename = "umbral_solucionabilidad_alto", default = "default_fixability_high")]
    pub high: f32,
}

impl Default for FixabilityThresholds {
    fn default() -> Self {
        Self {
            low: default_fixability_low(),
            high: default_fixability_high(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PrioritizationFlags {
    #[serde(rename = "priorizar_vector_red", default)]
    pub network_vector: bool,
    #[serde(rename = "priorizar_sin_parche", default)]
    pub unpatched: bool,
    #[serde(rename = "priorizar_exploit_publico", default)]
    pub public_exploit: bool,
    #[serde(rename = "priorizar_fixes_temporales", default)]
    pub temporary_fixes: bool,
    #[serde(rename = "excluir_privilegios_altos", default)]
    pub exclude_high_privilege: bool,
}

/// Body of `POST /proyectos` and `PUT /proyectos/:id`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProjectPayload {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "umbral_vulnerabilidades")]
    pub vulnerability_threshold: u32,
    #[serde(rename = "severidad_maxima")]
    pub max_severity: Severity,
    #[serde(flatten)]
    pub weights: PrioritizationWeights,
    #[serde(flatten)]
    pub fixability: FixabilityThresholds,
    #[serde(flatten)]
    pub flags: PrioritizationFlags,
}

// ---------------------------------------------------------------------------
// Users & auth
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub apellidos: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "fecha_creacion", default)]
    pub created_at: Option<String>,
}

/// Body of `POST /usuarios` and `PUT /usuarios/:id`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UserPayload {
    pub username: String,
    pub nombre: String,
    pub apellidos: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RoleResponse {
    #[serde(default)]
    pub rol: Vec<String>,
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// Body of `POST {chat}/chat/mensajes`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(rename = "proyecto_id", skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(rename = "proyecto_nombre", skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub message: String,
}

/// Response of `POST {chat}/chat/upload-sbom`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SbomUploadReply {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub sbom_info: Option<SbomInfo>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SbomInfo {
    pub filename: String,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub components_count: u32,
    #[serde(default)]
    pub vulnerability_analysis: Option<VulnerabilityAnalysis>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct VulnerabilityAnalysis {
    #[serde(default)]
    pub analyzed_components: u32,
    #[serde(default)]
    pub vulnerabilities_found: u32,
    #[serde(default)]
    pub vulnerable_components: u32,
    #[serde(default)]
    pub filters_applied: Vec<String>,
    #[serde(default)]
    pub excluded_by_severity: BTreeMap<String, u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn project_defaults_fill_missing_prioritisation_fields() {
        let project: Project = serde_json::from_value(json!({
            "id": "p-1",
            "nombre": "api-gateway",
            "descripcion": null
        }))
        .unwrap();

        assert_eq!(project.vulnerability_threshold, 10);
        assert_eq!(project.max_severity, Severity::High);
        assert_eq!(project.weights.severity + project.weights.fixability, 100);
        assert!(!project.flags.public_exploit);
    }

    #[test]
    fn project_reads_backend_field_names() {
        let project: Project = serde_json::from_value(json!({
            "id": "p-2",
            "nombre": "billing",
            "descripcion": "Servicio de cobros",
            "umbral_vulnerabilidades": 3,
            "severidad_maxima": "CRITICAL",
            "peso_severidad": 60,
            "peso_solucionabilidad": 40,
            "umbral_solucionabilidad_bajo": 2.5,
            "umbral_solucionabilidad_alto": 8.0,
            "priorizar_exploit_publico": true,
            "usuario_id": "u-9"
        }))
        .unwrap();

        assert_eq!(project.vulnerability_threshold, 3);
        assert_eq!(project.max_severity, Severity::Critical);
        assert_eq!(project.weights.fixability, 40);
        assert_eq!(project.fixability.high, 8.0);
        assert!(project.flags.public_exploit);
        assert_eq!(project.owner_id.as_deref(), Some("u-9"));
    }

    #[test]
    fn chat_request_uses_spanish_project_keys() {
        let body = serde_json::to_value(ChatRequest {
            message: "hola".into(),
            project_id: Some("p-1".into()),
            project_name: Some("api".into()),
        })
        .unwrap();
        assert_eq!(body, json!({"message": "hola", "proyecto_id": "p-1", "proyecto_nombre": "api"}));
    }

    #[test]
    fn severity_parses_case_insensitively() {
        assert_eq!("medium".parse::<Severity>(), Ok(Severity::Medium));
        assert!("extreme".parse::<Severity>().is_err());
    }
}
