//! Project list shown next to the chat.
//!
//! The sidebar knows nothing about the chat state: selection and deletion
//! are reported through the callbacks handed to [`ProjectSidebar::new`].

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element};

use crate::auth;
use crate::constants::{NEW_PROJECT_PATH, SIDEBAR_DESCRIPTION_GRAPHEMES, SIDEBAR_SKELETON_ROWS};
use crate::dom_utils;
use crate::error::ClientError;
use crate::models::Project;
use crate::network::ApiClient;
use crate::toast;
use crate::utils::{parse_backend_timestamp, truncate_graphemes};
use crate::{debug_log, error_log};

pub const SIDEBAR_ID: &str = "proyectos-sidebar";

/// What the sidebar should display for a finished load.
#[derive(Debug, Clone, PartialEq)]
pub enum SidebarContent {
    Rows(Vec<SidebarRow>),
    Empty,
    /// Session expired: leave for the login page.
    Redirect,
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SidebarRow {
    pub project: Project,
    pub excerpt: Option<String>,
    pub active: bool,
}

/// Newest first; descriptions cut to a fixed number of graphemes.  The row
/// of `active_id` keeps its highlight across reloads.
pub fn sidebar_content(result: Result<Vec<Project>, ClientError>, active_id: Option<&str>) -> SidebarContent {
    match result {
        Ok(projects) if projects.is_empty() => SidebarContent::Empty,
        Ok(mut projects) => {
            projects.sort_by_key(|p| {
                std::cmp::Reverse(p.created_at.as_deref().and_then(parse_backend_timestamp))
            });
            SidebarContent::Rows(
                projects
                    .into_iter()
                    .map(|project| SidebarRow {
                        active: active_id == Some(project.id.as_str()),
                        excerpt: project
                            .description
                            .as_deref()
                            .map(str::trim)
                            .filter(|d| !d.is_empty())
                            .map(|d| truncate_graphemes(d, SIDEBAR_DESCRIPTION_GRAPHEMES)),
                        project,
                    })
                    .collect(),
            )
        }
        Err(ClientError::Unauthorized) => SidebarContent::Redirect,
        Err(e) => SidebarContent::Error(e.to_string()),
    }
}

/// Move the `active` marker to the row of `project_id` (or clear it).
pub fn highlight_active(document: &Document, project_id: Option<&str>) {
    let Ok(rows) = document.query_selector_all("[data-proyecto-id]") else {
        return;
    };
    for i in 0..rows.length() {
        let Some(row) = rows.item(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
            continue;
        };
        let is_active = project_id.is_some() && row.get_attribute("data-proyecto-id").as_deref() == project_id;
        let classes = row.class_list();
        if is_active {
            let _ = classes.add_2("active", "text-white");
        } else {
            let _ = classes.remove_2("active", "text-white");
        }
    }
}

type SelectCallback = Rc<dyn Fn(Project)>;
type DeletedCallback = Rc<dyn Fn(String)>;

struct Inner {
    document: Document,
    container: Element,
    api: ApiClient,
    /// Last project picked in this sidebar.
    active_id: RefCell<Option<String>>,
    on_select: SelectCallback,
    on_deleted: DeletedCallback,
}

#[derive(Clone)]
pub struct ProjectSidebar {
    inner: Rc<Inner>,
}

impl ProjectSidebar {
    pub fn new(
        document: &Document,
        api: ApiClient,
        on_select: impl Fn(Project) + 'static,
        on_deleted: impl Fn(String) + 'static,
    ) -> Result<Self, JsValue> {
        let container = document
            .get_element_by_id(SIDEBAR_ID)
            .ok_or_else(|| JsValue::from_str("#proyectos-sidebar not found"))?;
        Ok(Self {
            inner: Rc::new(Inner {
                document: document.clone(),
                container,
                api,
                active_id: RefCell::new(None),
                on_select: Rc::new(on_select),
                on_deleted: Rc::new(on_deleted),
            }),
        })
    }

    /// Skeleton rows, then `GET /proyectos`.
    pub fn load(&self) {
        if let Err(e) = self.render_skeleton() {
            error_log!("sidebar skeleton failed: {:?}", e);
        }
        let sidebar = self.clone();
        spawn_local(async move {
            let result = sidebar.inner.api.list_projects().await;
            let active = sidebar.inner.active_id.borrow().clone();
            let content = sidebar_content(result, active.as_deref());
            if let Err(e) = sidebar.render(content) {
                error_log!("sidebar render failed: {:?}", e);
            }
        });
    }

    fn render_skeleton(&self) -> Result<(), JsValue> {
        let container = &self.inner.container;
        container.set_inner_html("");
        for _ in 0..SIDEBAR_SKELETON_ROWS {
            let row = self.inner.document.create_element("div")?;
            row.set_class_name("list-group-item project-item skeleton");
            row.set_inner_html(r#"<div class="skeleton-line"></div><div class="skeleton-line short"></div>"#);
            container.append_child(&row)?;
        }
        Ok(())
    }

    fn render(&self, content: SidebarContent) -> Result<(), JsValue> {
        let container = &self.inner.container;
        container.set_inner_html("");
        match content {
            SidebarContent::Rows(rows) => {
                debug_log!("sidebar: {} projects", rows.len());
                for row in rows {
                    let el = self.render_row(row)?;
                    container.append_child(&el)?;
                }
            }
            SidebarContent::Empty => container.set_inner_html(&format!(
                r#"<div class="sidebar-empty text-center p-3">
    <i class="fas fa-folder-open fa-2x mb-2"></i>
    <p class="mb-2">Todavía no tienes proyectos</p>
    <a class="btn btn-sm btn-primary" href="{}">Crea tu primer proyecto</a>
</div>"#,
                NEW_PROJECT_PATH
            )),
            SidebarContent::Redirect => auth::redirect_to_login(0),
            SidebarContent::Error(message) => {
                let wrapper = self.inner.document.create_element("div")?;
                wrapper.set_class_name("sidebar-error text-center p-3");
                let text = self.inner.document.create_element("p")?;
                text.set_text_content(Some(&format!("Error al cargar los proyectos: {}", message)));
                let retry = self.inner.document.create_element("button")?;
                retry.set_class_name("btn btn-sm btn-outline-secondary retry-button");
                retry.set_attribute("type", "button")?;
                retry.set_text_content(Some("Reintentar"));
                let sidebar = self.clone();
                dom_utils::on(&retry, "click", move |_| sidebar.load())?;
                wrapper.append_child(&text)?;
                wrapper.append_child(&retry)?;
                container.append_child(&wrapper)?;
            }
        }
        Ok(())
    }

    fn render_row(&self, row: SidebarRow) -> Result<Element, JsValue> {
        let document = &self.inner.document;
        let project = row.project;

        let wrapper = document.create_element("div")?;
        wrapper.set_class_name("proyecto-chat");

        let item = document.create_element("div")?;
        item.set_class_name("list-group-item list-group-item-action project-item");
        if row.active {
            item.class_list().add_2("active", "text-white")?;
        }
        item.set_attribute("data-proyecto-id", &project.id)?;

        let header = document.create_element("div")?;
        header.set_class_name("d-flex align-items-center justify-content-between");
        let name = document.create_element("span")?;
        name.set_class_name("project-name");
        name.set_text_content(Some(&project.name));
        let delete = document.create_element("button")?;
        delete.set_class_name("btn btn-sm delete-button");
        delete.set_attribute("type", "button")?;
        delete.set_attribute("title", "Eliminar proyecto")?;
        delete.set_inner_html(r#"<i class="fas fa-trash"></i>"#);
        header.append_child(&name)?;
        header.append_child(&delete)?;
        item.append_child(&header)?;

        if let Some(excerpt) = &row.excerpt {
            let desc = document.create_element("small")?;
            desc.set_class_name("project-description text-muted");
            desc.set_text_content(Some(excerpt));
            item.append_child(&desc)?;
        }
        wrapper.append_child(&item)?;

        {
            let sidebar = self.clone();
            let project = project.clone();
            dom_utils::on(&item, "click", move |e| {
                let on_delete = e
                    .target()
                    .and_then(|t| t.dyn_into::<Element>().ok())
                    .and_then(|el| el.closest(".delete-button").ok().flatten())
                    .is_some();
                if !on_delete {
                    *sidebar.inner.active_id.borrow_mut() = Some(project.id.clone());
                    (sidebar.inner.on_select)(project.clone());
                }
            })?;
        }

        {
            let sidebar = self.clone();
            dom_utils::on(&delete, "click", move |e| {
                e.stop_propagation();
                sidebar.confirm_and_delete(&project);
            })?;
        }
        Ok(wrapper)
    }

    fn confirm_and_delete(&self, project: &Project) {
        let question = format!(
            "¿Seguro que quieres eliminar el proyecto \"{}\"? Esta acción no se puede deshacer.",
            project.name
        );
        if !dom_utils::confirm(&question) {
            return;
        }
        let sidebar = self.clone();
        let project_id = project.id.clone();
        spawn_local(async move {
            match sidebar.inner.api.delete_project(&project_id).await {
                Ok(()) => {
                    toast::success("Proyecto eliminado correctamente");
                    {
                        let mut active = sidebar.inner.active_id.borrow_mut();
                        if active.as_deref() == Some(project_id.as_str()) {
                            *active = None;
                        }
                    }
                    (sidebar.inner.on_deleted)(project_id);
                    sidebar.load();
                }
                Err(ClientError::Unauthorized) => auth::redirect_to_login(0),
                Err(e) => toast::error(&format!("No se pudo eliminar el proyecto: {}", e)),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(id: &str, created: Option<&str>, description: Option<&str>) -> Project {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "nombre": format!("proyecto {}", id),
            "descripcion": description,
            "fecha_creacion": created,
        }))
        .unwrap()
    }

    #[test]
    fn empty_list_shows_call_to_action() {
        assert_eq!(sidebar_content(Ok(vec![]), None), SidebarContent::Empty);
    }

    #[test]
    fn unauthorized_redirects() {
        assert_eq!(sidebar_content(Err(ClientError::Unauthorized), None), SidebarContent::Redirect);
    }

    #[test]
    fn other_errors_offer_retry() {
        let content = sidebar_content(Err(ClientError::Network("timeout".into())), None);
        assert!(matches!(content, SidebarContent::Error(msg) if msg.contains("timeout")));
    }

    #[test]
    fn rows_are_newest_first_with_excerpts() {
        let long = "x".repeat(SIDEBAR_DESCRIPTION_GRAPHEMES + 10);
        let content = sidebar_content(Ok(vec![
            project("a", Some("2024-01-01 10:00:00"), Some("  ")),
            project("b", Some("2024-03-01T10:00:00Z"), Some(&long)),
            project("c", None, None),
        ]), None);
        let SidebarContent::Rows(rows) = content else {
            panic!("expected rows");
        };
        let ids: Vec<&str> = rows.iter().map(|r| r.project.id.as_str()).collect();
        assert_eq!(ids, ["b", "a", "c"]);
        assert!(rows[0].excerpt.as_deref().unwrap().ends_with('…'));
        assert_eq!(rows[1].excerpt, None);
        assert!(rows.iter().all(|r| !r.active));
    }

    #[test]
    fn date_only_values_still_sort_newest_first() {
        let content = sidebar_content(Ok(vec![
            project("viejo", Some("2024-01-15"), None),
            project("nuevo", Some("2024-05-10"), None),
            project("medio", Some("2024-03-02"), None),
        ]), None);
        let SidebarContent::Rows(rows) = content else {
            panic!("expected rows");
        };
        let ids: Vec<&str> = rows.iter().map(|r| r.project.id.as_str()).collect();
        assert_eq!(ids, ["nuevo", "medio", "viejo"]);
    }

    #[test]
    fn active_project_survives_a_reload() {
        // After deleting "b" the list reloads while "a" is still open in the chat.
        let content = sidebar_content(Ok(vec![
            project("a", Some("2024-05-01"), None),
            project("c", Some("2024-05-02"), None),
        ]), Some("a"));
        let SidebarContent::Rows(rows) = content else {
            panic!("expected rows");
        };
        let active: Vec<&str> = rows
            .iter()
            .filter(|r| r.active)
            .map(|r| r.project.id.as_str())
            .collect();
        assert_eq!(active, ["a"]);
    }
}
