// Backend defaults used when no build-time or runtime URL is supplied.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5001";
pub const DEFAULT_CHAT_API_URL: &str = "http://localhost:5002";

// Routes of the server-rendered pages
pub const LOGIN_PATH: &str = "/login";
pub const PROFILE_PATH: &str = "/perfil";
pub const CHAT_PATH: &str = "/chat";
pub const NEW_PROJECT_PATH: &str = "/perfil/proyecto_nuevo";
pub const EDIT_PROJECT_PATH: &str = "/perfil/proyecto_editar";
pub const NEW_USER_PATH: &str = "/perfil/usuario_nuevo";
pub const EDIT_USER_PATH: &str = "/perfil/usuario_editar";

// Notification timings (ms)
pub const DEFAULT_TOAST_DURATION_MS: u32 = 5000;
pub const TOAST_RESUME_MS: u32 = 2000;
pub const TOAST_FADE_MS: u32 = 300;

// Chat timings (ms)
pub const REPLY_REVEAL_DELAY_MS: u32 = 300;
pub const SESSION_EXPIRED_REDIRECT_MS: u32 = 2000;
pub const LOGIN_SUCCESS_REDIRECT_MS: u32 = 1500;

// SBOM upload
pub const SBOM_MAX_BYTES: u64 = 16 * 1024 * 1024;
pub const SBOM_ALLOWED_EXTENSIONS: [&str; 6] = ["json", "xml", "yaml", "yml", "spdx", "txt"];
pub const SBOM_STEP_INTERVAL_MS: u32 = 1500;
pub const SBOM_INDICATOR_TIMEOUT_MS: u32 = 10_000;
pub const SBOM_PROCESSING_STEPS: [&str; 4] = [
    "Leyendo archivo",
    "Detectando formato",
    "Analizando componentes",
    "Buscando vulnerabilidades",
];
pub const SBOM_ANALYSIS_PROMPT: &str =
    "Analiza este SBOM y resume las vulnerabilidades más relevantes para el proyecto.";

// User-facing chat texts
pub const CHAT_PLACEHOLDER_NO_PROJECT: &str = "Selecciona un proyecto para empezar a chatear";
pub const CHAT_PLACEHOLDER_ACTIVE: &str = "Escribe tu mensaje...";
pub const NO_PROJECT_WARNING: &str = "Selecciona un proyecto antes de enviar mensajes";
pub const SESSION_EXPIRED_MESSAGE: &str = "Sesión expirada. Redirigiendo al login...";

// Sidebar
pub const SIDEBAR_SKELETON_ROWS: usize = 3;
pub const SIDEBAR_DESCRIPTION_GRAPHEMES: usize = 60;

// Form limits
pub const PROJECT_NAME_MAX_CHARS: usize = 20;
pub const PROJECT_DESCRIPTION_MAX_CHARS: usize = 500;
pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MIN_PASSWORD_LENGTH: usize = 6;

// Scroll effects
pub const NAVBAR_SCROLLED_OFFSET_PX: f64 = 100.0;
