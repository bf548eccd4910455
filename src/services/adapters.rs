//! Per-provider health-payload adapters.
//!
//! Each upstream speaks its own dialect for "what models are loaded" or
//! "how much VRAM is in use". One pure function per provider maps that
//! native shape into the small summary the dashboard renders, keeping the
//! aggregator itself provider-agnostic.

use serde_json::{Value, json};

/// Ollama `/api/tags` → `{"models": [name, ...]}`.
pub fn ollama_tags(body: &Value) -> Value {
    let names: Vec<&str> = body
        .get("models")
        .and_then(Value::as_array)
        .map(|models| {
            models
                .iter()
                .filter_map(|m| m.get("name").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();
    json!({ "models": names })
}

/// ComfyUI `/system_stats` → VRAM usage of the first device.
pub fn comfyui_stats(body: &Value) -> Value {
    let device = body
        .get("devices")
        .and_then(Value::as_array)
        .and_then(|d| d.first());
    json!({
        "vram_used": device.and_then(|d| d.get("vram_used")).cloned().unwrap_or(Value::Null),
        "vram_total": device.and_then(|d| d.get("vram_total")).cloned().unwrap_or(Value::Null),
    })
}

/// Automatic1111 `/sdapi/v1/sd-models` returns a bare array; report count.
pub fn a1111_models(body: &Value) -> Value {
    let count = body.as_array().map(Vec::len).unwrap_or(0);
    json!({ "models": count })
}

/// LM Studio `/v1/models` (OpenAI shape) → `{"models": [id, ...]}`.
pub fn lmstudio_models(body: &Value) -> Value {
    let ids: Vec<&str> = body
        .get("data")
        .and_then(Value::as_array)
        .map(|models| {
            models
                .iter()
                .filter_map(|m| m.get("id").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();
    json!({ "models": ids })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ollama_tags_extracts_model_names() {
        let body = json!({
            "models": [
                { "name": "llama3.2:latest", "size": 2019393189 },
                { "name": "qwen2.5-coder:7b", "size": 4683087332u64 },
            ]
        });
        assert_eq!(
            ollama_tags(&body),
            json!({ "models": ["llama3.2:latest", "qwen2.5-coder:7b"] })
        );
    }

    #[test]
    fn ollama_tags_tolerates_missing_field() {
        assert_eq!(ollama_tags(&json!({})), json!({ "models": [] }));
    }

    #[test]
    fn comfyui_stats_reads_first_device() {
        let body = json!({
            "devices": [
                { "vram_used": 123, "vram_total": 24576 },
                { "vram_used": 0, "vram_total": 8192 },
            ]
        });
        assert_eq!(
            comfyui_stats(&body),
            json!({ "vram_used": 123, "vram_total": 24576 })
        );
    }

    #[test]
    fn comfyui_stats_nulls_when_no_devices() {
        assert_eq!(
            comfyui_stats(&json!({ "devices": [] })),
            json!({ "vram_used": null, "vram_total": null })
        );
    }

    #[test]
    fn a1111_counts_array_entries() {
        let body = json!([{ "title": "sdxl.safetensors" }, { "title": "sd15.ckpt" }]);
        assert_eq!(a1111_models(&body), json!({ "models": 2 }));
        assert_eq!(a1111_models(&json!({})), json!({ "models": 0 }));
    }

    #[test]
    fn lmstudio_extracts_loaded_model_ids() {
        let body = json!({ "data": [{ "id": "qwen2.5-7b-instruct" }] });
        assert_eq!(
            lmstudio_models(&body),
            json!({ "models": ["qwen2.5-7b-instruct"] })
        );
    }
}
