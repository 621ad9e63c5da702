// src/pages/project_form.rs
//
// Create and edit forms for projects.  The create form is server-rendered;
// the edit form is rendered here once the project has been fetched.  Both
// read the same field ids, named after the wire fields.

use std::cell::Cell;
use std::rc::Rc;

use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, HtmlButtonElement};

use crate::auth;
use crate::constants::{EDIT_PROJECT_PATH, PROFILE_PATH, PROJECT_DESCRIPTION_MAX_CHARS, PROJECT_NAME_MAX_CHARS};
use crate::dom_utils;
use crate::error::ClientError;
use crate::models::{FixabilityThresholds, PrioritizationFlags, PrioritizationWeights, Project, ProjectPayload, Severity};
use crate::network::ApiClient;
use crate::storage;
use crate::toast::{self, AlertKind};
use crate::utils::{escape_html, grapheme_len};
use crate::{debug_log, error_log, warn_log};

const CREATE_FORM_ID: &str = "crear-proyecto-form";
const EDIT_CONTAINER_ID: &str = "proyecto-editar-container";
const EDIT_FORM_ID: &str = "editar-proyecto-form";

pub const CREATED_MESSAGE: &str = "Proyecto creado con éxito";
pub const UPDATED_MESSAGE: &str = "Proyecto actualizado con éxito";

const FIXABILITY_SCALE_MAX: f32 = 10.0;

mod field {
    pub const NAME: &str = "nombre";
    pub const DESCRIPTION: &str = "descripcion";
    pub const THRESHOLD: &str = "umbral_vulnerabilidades";
    pub const SEVERITY: &str = "severidad_maxima";
    pub const SEVERITY_WEIGHT: &str = "peso_severidad";
    pub const FIXABILITY_WEIGHT: &str = "peso_solucionabilidad";
    pub const FIXABILITY_LOW: &str = "umbral_solucionabilidad_bajo";
    pub const FIXABILITY_HIGH: &str = "umbral_solucionabilidad_alto";
    pub const NETWORK_VECTOR: &str = "priorizar_vector_red";
    pub const UNPATCHED: &str = "priorizar_sin_parche";
    pub const PUBLIC_EXPLOIT: &str = "priorizar_exploit_publico";
    pub const TEMPORARY_FIXES: &str = "priorizar_fixes_temporales";
    pub const EXCLUDE_HIGH_PRIVILEGE: &str = "excluir_privilegios_altos";
}

/// Raw form values as typed.  Empty numeric fields fall back to the
/// backend defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectFormInput {
    pub name: String,
    pub description: String,
    pub threshold: String,
    pub severity: String,
    pub severity_weight: String,
    pub fixability_weight: String,
    pub fixability_low: String,
    pub fixability_high: String,
    pub flags: PrioritizationFlags,
}

fn parse_or<T: std::str::FromStr>(raw: &str, default: T, label: &str) -> Result<T, ClientError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(default);
    }
    raw.parse()
        .map_err(|_| ClientError::Validation(format!("{} no es un número válido", label)))
}

pub fn validate_project_form(input: &ProjectFormInput) -> Result<ProjectPayload, ClientError> {
    let invalid = |msg: String| Err(ClientError::Validation(msg));

    let name = input.name.trim();
    if name.is_empty() {
        return invalid("El nombre del proyecto es obligatorio".into());
    }
    if grapheme_len(name) > PROJECT_NAME_MAX_CHARS {
        return invalid(format!(
            "El nombre no puede superar los {} caracteres",
            PROJECT_NAME_MAX_CHARS
        ));
    }
    let description = input.description.trim();
    if grapheme_len(description) > PROJECT_DESCRIPTION_MAX_CHARS {
        return invalid(format!(
            "La descripción no puede superar los {} caracteres",
            PROJECT_DESCRIPTION_MAX_CHARS
        ));
    }

    let defaults = PrioritizationWeights::default();
    let threshold: i64 = parse_or(&input.threshold, 10, "El umbral de vulnerabilidades")?;
    if threshold < 0 {
        return invalid("El umbral de vulnerabilidades no puede ser negativo".into());
    }
    let threshold = u32::try_from(threshold)
        .map_err(|_| ClientError::Validation("El umbral de vulnerabilidades es demasiado grande".into()))?;

    let max_severity = if input.severity.trim().is_empty() {
        Severity::default()
    } else {
        input.severity.parse().map_err(ClientError::Validation)?
    };

    let severity_weight: i64 = parse_or(&input.severity_weight, defaults.severity.into(), "El peso de severidad")?;
    let fixability_weight: i64 =
        parse_or(&input.fixability_weight, defaults.fixability.into(), "El peso de solucionabilidad")?;
    for weight in [severity_weight, fixability_weight] {
        if !(0..=100).contains(&weight) {
            return invalid("Los pesos deben estar entre 0 y 100".into());
        }
    }
    if severity_weight + fixability_weight != 100 {
        return invalid("Los pesos de severidad y solucionabilidad deben sumar 100".into());
    }

    let fix_defaults = FixabilityThresholds::default();
    let low: f32 = parse_or(&input.fixability_low, fix_defaults.low, "El umbral bajo de solucionabilidad")?;
    let high: f32 = parse_or(&input.fixability_high, fix_defaults.high, "El umbral alto de solucionabilidad")?;
    let scale = 0.0..=FIXABILITY_SCALE_MAX;
    if !scale.contains(&low) || !scale.contains(&high) {
        return invalid("Los umbrales de solucionabilidad deben estar entre 0 y 10".into());
    }
    if low > high {
        return invalid("El umbral bajo de solucionabilidad no puede superar al alto".into());
    }

    Ok(ProjectPayload {
        name: name.to_string(),
        description: description.to_string(),
        vulnerability_threshold: threshold,
        max_severity,
        // both in 0..=100 here
        weights: PrioritizationWeights {
            severity: severity_weight as u8,
            fixability: fixability_weight as u8,
        },
        fixability: FixabilityThresholds { low, high },
        flags: input.flags,
    })
}

fn read_form(document: &Document) -> ProjectFormInput {
    let value = |id| dom_utils::field_value(document, id);
    let checked = |id| dom_utils::checkbox_checked(document, id);
    ProjectFormInput {
        name: value(field::NAME),
        description: value(field::DESCRIPTION),
        threshold: value(field::THRESHOLD),
        severity: value(field::SEVERITY),
        severity_weight: value(field::SEVERITY_WEIGHT),
        fixability_weight: value(field::FIXABILITY_WEIGHT),
        fixability_low: value(field::FIXABILITY_LOW),
        fixability_high: value(field::FIXABILITY_HIGH),
        flags: PrioritizationFlags {
            network_vector: checked(field::NETWORK_VECTOR),
            unpatched: checked(field::UNPATCHED),
            public_exploit: checked(field::PUBLIC_EXPLOIT),
            temporary_fixes: checked(field::TEMPORARY_FIXES),
            exclude_high_privilege: checked(field::EXCLUDE_HIGH_PRIVILEGE),
        },
    }
}

// ---------------------------------------------------------------------------
// Edit form markup
// ---------------------------------------------------------------------------

fn checkbox_markup(id: &str, label: &str, checked: bool) -> String {
    format!(
        r#"<div class="form-check">
    <input class="form-check-input" type="checkbox" id="{id}" name="{id}"{checked}>
    <label class="form-check-label" for="{id}">{label}</label>
</div>"#,
        id = id,
        label = label,
        checked = if checked { " checked" } else { "" },
    )
}

pub fn edit_form_markup(project: &Project) -> String {
    let severity_options: String = Severity::ALL
        .iter()
        .map(|s| {
            format!(
                r#"<option value="{v}"{sel}>{v}</option>"#,
                v = s.as_str(),
                sel = if *s == project.max_severity { " selected" } else { "" },
            )
        })
        .collect();
    let flags = &project.flags;
    let checkboxes = [
        checkbox_markup(field::NETWORK_VECTOR, "Priorizar vector de red", flags.network_vector),
        checkbox_markup(field::UNPATCHED, "Priorizar vulnerabilidades sin parche", flags.unpatched),
        checkbox_markup(field::PUBLIC_EXPLOIT, "Priorizar exploits públicos", flags.public_exploit),
        checkbox_markup(field::TEMPORARY_FIXES, "Priorizar fixes temporales", flags.temporary_fixes),
        checkbox_markup(field::EXCLUDE_HIGH_PRIVILEGE, "Excluir las que requieren privilegios altos", flags.exclude_high_privilege),
    ]
    .join("\n");

    format!(
        r#"<div class="form-card">
    <div class="form-card-header">
        <div class="form-icon"><i class="fas fa-project-diagram"></i></div>
        <h3 class="form-title">Editar Proyecto</h3>
        <p class="form-subtitle">Actualiza la información de: <strong>{name}</strong></p>
    </div>
    <div class="form-card-body">
        <form id="{form_id}" novalidate>
            <div class="form-group">
                <label for="{f_name}" class="form-label required">Nombre del Proyecto</label>
                <input type="text" id="{f_name}" name="{f_name}" class="form-control" required maxlength="{name_max}" value="{name}">
            </div>
            <div class="form-group">
                <label for="{f_desc}" class="form-label">Descripción</label>
                <textarea id="{f_desc}" name="{f_desc}" class="form-control" rows="4" maxlength="{desc_max}">{description}</textarea>
            </div>
            <div class="form-group">
                <label for="{f_threshold}" class="form-label">Umbral de vulnerabilidades</label>
                <input type="number" min="0" id="{f_threshold}" name="{f_threshold}" class="form-control" value="{threshold}">
            </div>
            <div class="form-group">
                <label for="{f_severity}" class="form-label">Severidad máxima</label>
                <select id="{f_severity}" name="{f_severity}" class="form-select">{severity_options}</select>
            </div>
            <div class="form-group row">
                <div class="col">
                    <label for="{f_sw}" class="form-label">Peso severidad (%)</label>
                    <input type="number" min="0" max="100" id="{f_sw}" name="{f_sw}" class="form-control" value="{sw}">
                </div>
                <div class="col">
                    <label for="{f_fw}" class="form-label">Peso solucionabilidad (%)</label>
                    <input type="number" min="0" max="100" id="{f_fw}" name="{f_fw}" class="form-control" value="{fw}">
                </div>
            </div>
            <div class="form-group row">
                <div class="col">
                    <label for="{f_low}" class="form-label">Umbral bajo de solucionabilidad</label>
                    <input type="number" min="0" max="10" step="0.1" id="{f_low}" name="{f_low}" class="form-control" value="{low}">
                </div>
                <div class="col">
                    <label for="{f_high}" class="form-label">Umbral alto de solucionabilidad</label>
                    <input type="number" min="0" max="10" step="0.1" id="{f_high}" name="{f_high}" class="form-control" value="{high}">
                </div>
            </div>
            <div class="form-group">
{checkboxes}
            </div>
            <div class="form-actions">
                <button type="submit" class="btn btn-primary btn-lg"><i class="fas fa-save me-2"></i>Guardar Cambios</button>
                <a href="{profile}" class="btn btn-secondary btn-lg"><i class="fas fa-times me-2"></i>Cancelar</a>
            </div>
        </form>
    </div>
</div>"#,
        form_id = EDIT_FORM_ID,
        name = escape_html(&project.name),
        description = escape_html(project.description.as_deref().unwrap_or_default()),
        name_max = PROJECT_NAME_MAX_CHARS,
        desc_max = PROJECT_DESCRIPTION_MAX_CHARS,
        threshold = project.vulnerability_threshold,
        severity_options = severity_options,
        sw = project.weights.severity,
        fw = project.weights.fixability,
        low = project.fixability.low,
        high = project.fixability.high,
        checkboxes = checkboxes,
        profile = PROFILE_PATH,
        f_name = field::NAME,
        f_desc = field::DESCRIPTION,
        f_threshold = field::THRESHOLD,
        f_severity = field::SEVERITY,
        f_sw = field::SEVERITY_WEIGHT,
        f_fw = field::FIXABILITY_WEIGHT,
        f_low = field::FIXABILITY_LOW,
        f_high = field::FIXABILITY_HIGH,
    )
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum SaveMode {
    Create,
    Update(String),
}

pub fn mount_create(api: &ApiClient) -> Result<(), JsValue> {
    let document = dom_utils::document()?;
    let Some(form) = document.get_element_by_id(CREATE_FORM_ID) else {
        warn_log!("new-project page without #{}", CREATE_FORM_ID);
        return Ok(());
    };
    bind_submit(&document, &form, api, SaveMode::Create)
}

/// The id comes from the host, else from the slot the dashboard filled,
/// else from the path.
pub fn mount_edit(api: &ApiClient, resource_id: Option<String>) -> Result<(), JsValue> {
    let document = dom_utils::document()?;
    let Some(container) = document.get_element_by_id(EDIT_CONTAINER_ID) else {
        warn_log!("edit-project page without #{}", EDIT_CONTAINER_ID);
        return Ok(());
    };

    let stored = storage::local_storage()
        .ok()
        .and_then(|store| storage::take_project_to_edit(&store));
    let from_path = dom_utils::window()
        .and_then(|w| w.location().pathname())
        .ok()
        .and_then(|path| super::id_after_route(&path, EDIT_PROJECT_PATH));
    let Some(project_id) = resource_id.or(stored).or(from_path) else {
        container.set_inner_html(&format!(
            r#"<div class="alert alert-warning">No se ha indicado ningún proyecto. <a href="{}">Volver al perfil</a></div>"#,
            PROFILE_PATH
        ));
        return Ok(());
    };

    container.set_inner_html(
        r#"<div class="loading-container"><i class="fas fa-spinner fa-spin fa-2x"></i><p>Cargando proyecto...</p></div>"#,
    );
    let api = api.clone();
    spawn_local(async move {
        match api.get_project(&project_id).await {
            Ok(project) => {
                debug_log!("editing project {}", project.id);
                container.set_inner_html(&edit_form_markup(&project));
                let bound = document
                    .get_element_by_id(EDIT_FORM_ID)
                    .ok_or_else(|| JsValue::from_str("edit form missing after render"))
                    .and_then(|form| bind_submit(&document, &form, &api, SaveMode::Update(project.id.clone())));
                if let Err(e) = bound {
                    error_log!("could not wire the edit form: {:?}", e);
                }
            }
            Err(ClientError::Unauthorized) => auth::redirect_to_login(0),
            Err(e) => container.set_inner_html(&format!(
                r#"<div class="alert alert-danger">Error al cargar el proyecto: {} <a href="{}">Volver al perfil</a></div>"#,
                escape_html(&e.to_string()),
                PROFILE_PATH
            )),
        }
    });
    Ok(())
}

fn bind_submit(document: &Document, form: &Element, api: &ApiClient, mode: SaveMode) -> Result<(), JsValue> {
    let in_flight = Rc::new(Cell::new(false));
    let document = document.clone();
    let api = api.clone();
    let button = form
        .query_selector(r#"button[type="submit"]"#)?
        .and_then(|el| el.dyn_into::<HtmlButtonElement>().ok());

    dom_utils::on(form, "submit", move |e| {
        e.prevent_default();
        if in_flight.get() {
            return;
        }
        let payload = match validate_project_form(&read_form(&document)) {
            Ok(payload) => payload,
            Err(e) => {
                toast::warning(&e.to_string());
                return;
            }
        };
        in_flight.set(true);
        dom_utils::set_busy(button.as_ref(), true);

        let api = api.clone();
        let mode = mode.clone();
        let in_flight = in_flight.clone();
        let button = button.clone();
        spawn_local(async move {
            let (result, done_message) = match &mode {
                SaveMode::Create => (api.create_project(&payload).await, CREATED_MESSAGE),
                SaveMode::Update(id) => (api.update_project(id, &payload).await, UPDATED_MESSAGE),
            };
            match result {
                Ok(()) => {
                    storage::save_alert_for_next_page(done_message, AlertKind::Success);
                    dom_utils::navigate(PROFILE_PATH);
                }
                Err(ClientError::Unauthorized) => auth::redirect_to_login(0),
                Err(e) => {
                    toast::show_alert(&e.to_string(), AlertKind::Danger);
                    in_flight.set(false);
                    dom_utils::set_busy(button.as_ref(), false);
                }
            }
        });
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str) -> ProjectFormInput {
        ProjectFormInput {
            name: name.into(),
            ..Default::default()
        }
    }

    fn rejected(input: &ProjectFormInput) -> String {
        match validate_project_form(input) {
            Err(ClientError::Validation(msg)) => msg,
            other => panic!("expected a validation error, got {:?}", other),
        }
    }

    #[test]
    fn defaults_fill_empty_fields() {
        let payload = validate_project_form(&input("  web  ")).unwrap();
        assert_eq!(payload.name, "web");
        assert_eq!(payload.vulnerability_threshold, 10);
        assert_eq!(payload.max_severity, Severity::High);
        assert_eq!(payload.weights, PrioritizationWeights::default());
        assert_eq!(payload.fixability, FixabilityThresholds::default());
    }

    #[test]
    fn name_is_required_and_bounded() {
        assert!(rejected(&input("   ")).contains("obligatorio"));
        assert!(validate_project_form(&input(&"a".repeat(PROJECT_NAME_MAX_CHARS))).is_ok());
        assert!(rejected(&input(&"a".repeat(PROJECT_NAME_MAX_CHARS + 1))).contains("20"));
    }

    #[test]
    fn description_is_bounded() {
        let mut form = input("web");
        form.description = "d".repeat(PROJECT_DESCRIPTION_MAX_CHARS + 1);
        assert!(rejected(&form).contains("500"));
    }

    #[test]
    fn threshold_must_be_non_negative() {
        let mut form = input("web");
        form.threshold = "-1".into();
        assert!(rejected(&form).contains("negativo"));
        form.threshold = "0".into();
        assert_eq!(validate_project_form(&form).unwrap().vulnerability_threshold, 0);
        form.threshold = "diez".into();
        assert!(rejected(&form).contains("número"));
    }

    #[test]
    fn weights_must_sum_to_one_hundred() {
        let mut form = input("web");
        form.severity_weight = "60".into();
        form.fixability_weight = "30".into();
        assert!(rejected(&form).contains("sumar 100"));
        form.fixability_weight = "40".into();
        let payload = validate_project_form(&form).unwrap();
        assert_eq!((payload.weights.severity, payload.weights.fixability), (60, 40));
        form.severity_weight = "150".into();
        form.fixability_weight = "-50".into();
        assert!(rejected(&form).contains("entre 0 y 100"));
    }

    #[test]
    fn fixability_range_is_ordered() {
        let mut form = input("web");
        form.fixability_low = "8".into();
        form.fixability_high = "4".into();
        assert!(rejected(&form).contains("no puede superar"));
        form.fixability_high = "11".into();
        assert!(rejected(&form).contains("entre 0 y 10"));
        form.fixability_low = "4".into();
        form.fixability_high = "4".into();
        assert!(validate_project_form(&form).is_ok());
    }

    #[test]
    fn unknown_severity_is_rejected() {
        let mut form = input("web");
        form.severity = "extreme".into();
        assert!(rejected(&form).contains("Severidad"));
        form.severity = "critical".into();
        assert_eq!(validate_project_form(&form).unwrap().max_severity, Severity::Critical);
    }

    #[test]
    fn edit_markup_is_prefilled_and_escaped() {
        let project: Project = serde_json::from_value(serde_json::json!({
            "id": "p1",
            "nombre": "<web>",
            "descripcion": "a & b",
            "severidad_maxima": "LOW",
            "priorizar_sin_parche": true,
        }))
        .unwrap();
        let html = edit_form_markup(&project);
        assert!(html.contains(r#"value="&lt;web&gt;""#));
        assert!(html.contains(">a &amp; b</textarea>"));
        assert!(html.contains(r#"<option value="LOW" selected>"#));
        assert!(html.contains(r#"id="priorizar_sin_parche" name="priorizar_sin_parche" checked"#));
        assert!(!html.contains(r#"id="priorizar_vector_red" name="priorizar_vector_red" checked"#));
    }
}
