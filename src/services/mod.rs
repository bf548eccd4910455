pub mod adapters;
pub mod health;
pub mod probe;
pub mod testing;

/// Maps a service's native health payload into a small summary shown on the
/// dashboard. Pure; input is the already-parsed JSON body.
pub type AdapterFn = fn(&serde_json::Value) -> serde_json::Value;

/// Static description of one external service we watch.
pub struct ServiceDef {
    pub id: &'static str,
    pub url_key: &'static str,
    pub default_url: &'static str,
    pub health_path: &'static str,
    pub timeout_ms: u64,
    /// Gateway-style services have no real health endpoint; any HTTP
    /// response (even 4xx/5xx) proves the process is up. Only a
    /// connection-level failure counts as offline.
    pub gateway_style: bool,
    pub adapter: Option<AdapterFn>,
}

const HEALTH_TIMEOUT_MS: u64 = 3000;

/// The full fleet, probed by `health::aggregate_all`.
pub const SERVICES: &[ServiceDef] = &[
    ServiceDef {
        id: "n8n",
        url_key: "N8N_BASE_URL",
        default_url: "http://localhost:5678",
        health_path: "/healthz",
        timeout_ms: HEALTH_TIMEOUT_MS,
        gateway_style: false,
        adapter: None,
    },
    ServiceDef {
        id: "ollama",
        url_key: "OLLAMA_BASE_URL",
        default_url: "http://localhost:11434",
        health_path: "/api/tags",
        timeout_ms: HEALTH_TIMEOUT_MS,
        gateway_style: false,
        adapter: Some(adapters::ollama_tags),
    },
    ServiceDef {
        id: "comfyui",
        url_key: "COMFYUI_BASE_URL",
        default_url: "http://localhost:8188",
        health_path: "/system_stats",
        timeout_ms: HEALTH_TIMEOUT_MS,
        gateway_style: false,
        adapter: Some(adapters::comfyui_stats),
    },
    ServiceDef {
        id: "automatic1111",
        url_key: "A1111_BASE_URL",
        default_url: "http://localhost:7860",
        health_path: "/sdapi/v1/sd-models",
        timeout_ms: HEALTH_TIMEOUT_MS,
        gateway_style: false,
        adapter: Some(adapters::a1111_models),
    },
    ServiceDef {
        id: "wan2",
        url_key: "WAN2_BASE_URL",
        default_url: "http://localhost:8085",
        health_path: "/health",
        timeout_ms: HEALTH_TIMEOUT_MS,
        gateway_style: false,
        adapter: None,
    },
    ServiceDef {
        id: "cogvideox",
        url_key: "COGVIDEOX_BASE_URL",
        default_url: "http://localhost:8086",
        health_path: "/health",
        timeout_ms: HEALTH_TIMEOUT_MS,
        gateway_style: false,
        adapter: None,
    },
    ServiceDef {
        id: "lmstudio",
        url_key: "LMSTUDIO_BASE_URL",
        default_url: "http://localhost:1234",
        health_path: "/v1/models",
        timeout_ms: HEALTH_TIMEOUT_MS,
        gateway_style: false,
        adapter: Some(adapters::lmstudio_models),
    },
    ServiceDef {
        id: "airllm",
        url_key: "AIRLLM_BASE_URL",
        default_url: "http://localhost:8087",
        health_path: "/health",
        timeout_ms: HEALTH_TIMEOUT_MS,
        gateway_style: false,
        adapter: None,
    },
    ServiceDef {
        id: "fooocus",
        url_key: "FOOOCUS_BASE_URL",
        default_url: "http://localhost:8888",
        health_path: "/",
        timeout_ms: HEALTH_TIMEOUT_MS,
        gateway_style: false,
        adapter: None,
    },
    ServiceDef {
        id: "gateway",
        url_key: "GATEWAY_BASE_URL",
        default_url: "http://localhost:18789",
        health_path: "/health",
        timeout_ms: HEALTH_TIMEOUT_MS,
        gateway_style: true,
        adapter: None,
    },
];

/// Subset shown on the top-level status bar, in display order.
pub const STATUS_SERVICE_IDS: &[&str] =
    &["n8n", "ollama", "comfyui", "gateway", "automatic1111", "wan2"];

pub fn service(id: &str) -> Option<&'static ServiceDef> {
    SERVICES.iter().find(|def| def.id == id)
}
