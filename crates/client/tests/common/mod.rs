//! In-process mock of the studio backend for integration tests.
//!
//! Serves the studio REST routes from an axum router bound to an
//! ephemeral port. Status responses are scripted per test; configs live
//! in memory so save/refetch round-trips can be asserted.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use mecca_client::api::StudioApi;
use mecca_client::config::ClientConfig;

type Reply = (StatusCode, Json<Value>);

#[derive(Default)]
pub struct MockStudio {
    statuses: Mutex<VecDeque<(StatusCode, Value)>>,
    last_status: Mutex<Option<(StatusCode, Value)>>,
    status_calls: AtomicUsize,
    submit_reply: Mutex<Option<(StatusCode, Value)>>,
    pub submitted: Mutex<Vec<Value>>,
    configs: Mutex<HashMap<String, Value>>,
    pub regenerated: Mutex<Vec<Value>>,
    pub uploads: Mutex<Vec<(usize, String, Vec<u8>)>>,
    pub image_prompts: Mutex<Vec<(String, String)>>,
    thumbnail_versions: Mutex<HashMap<String, Vec<(u32, String)>>>,
    pub thumbnail_forms: Mutex<Vec<HashMap<String, String>>>,
    pub reference_images: Mutex<Vec<(String, Vec<u8>)>>,
    pub thumbnail_regenerations: Mutex<Vec<Value>>,
    profile: Mutex<Option<Value>>,
}

impl MockStudio {
    /// Queue a status response. The last one repeats once the queue drains.
    pub fn push_status(&self, status: StatusCode, body: Value) {
        self.statuses.lock().unwrap().push_back((status, body));
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn set_submit_reply(&self, status: StatusCode, body: Value) {
        *self.submit_reply.lock().unwrap() = Some((status, body));
    }

    pub fn insert_config(&self, video_id: &str, config: Value) {
        self.configs
            .lock()
            .unwrap()
            .insert(video_id.to_string(), config);
    }

    pub fn stored_config(&self, video_id: &str) -> Option<Value> {
        self.configs.lock().unwrap().get(video_id).cloned()
    }

    pub fn stored_profile(&self) -> Option<Value> {
        self.profile.lock().unwrap().clone()
    }

    /// Append a version to a thumbnail session, creating it if needed.
    fn add_thumbnail(&self, session_id: &str, variation: &str) -> u32 {
        let mut sessions = self.thumbnail_versions.lock().unwrap();
        let versions = sessions.entry(session_id.to_string()).or_default();
        let version = versions.len() as u32 + 1;
        versions.push((version, variation.to_string()));
        version
    }
}

/// Start the mock backend. Returns its base URL and shared state.
pub async fn spawn_studio() -> (String, Arc<MockStudio>) {
    let state = Arc::new(MockStudio::default());
    let app = Router::new()
        .route("/api/generate", post(generate))
        .route("/api/status/{task_id}", get(status))
        .route("/api/movie-quotes", get(movie_quotes))
        .route("/api/video/{id}/config", get(get_config).post(save_config))
        .route("/api/video/{id}/regenerate", post(regenerate))
        .route("/api/video/{id}/upload-media/{index}", post(upload_media))
        .route(
            "/api/video/{id}/generate-clip-image/{index}",
            post(generate_clip_image),
        )
        .route("/api/video/{id}/generate-intro-image", post(generate_intro_image))
        .route("/api/video/{id}/generate-outro-image", post(generate_outro_image))
        .route("/thumbnail-studio/api/analyze-url", post(analyze_url))
        .route("/thumbnail-studio/api/analyze-channel", post(analyze_channel))
        .route("/thumbnail-studio/api/generate", post(generate_thumbnails))
        .route("/thumbnail-studio/api/regenerate", post(regenerate_thumbnail))
        .route("/thumbnail-studio/api/history/{session_id}", get(thumbnail_history))
        .route(
            "/thumbnail-studio/api/channel-profile",
            get(get_profile).post(save_profile),
        )
        .with_state(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), state)
}

/// Client config pointing at `base_url` with a fast poll interval.
pub fn test_config(base_url: &str) -> ClientConfig {
    ClientConfig {
        poll_interval: Duration::from_millis(20),
        request_timeout: Duration::from_secs(5),
        regenerate_timeout: Duration::from_secs(10),
        thumbnail_timeout: Duration::from_secs(10),
        ..ClientConfig::default()
    }
    .with_base_url(base_url)
}

pub fn test_api(base_url: &str) -> StudioApi {
    StudioApi::new(&test_config(base_url)).unwrap()
}

/// Config document in the shape the backend stores.
pub fn config_doc(video_id: &str) -> Value {
    json!({
        "version": "1.0",
        "video_id": video_id,
        "created_at": "2026-10-01T09:00:00",
        "edited_at": null,
        "global_settings": {
            "background_music": {"file": "background_music.mp3", "volume": 0.15, "enabled": true},
            "intro": {"enabled": true, "duration": 5},
            "outro": {"enabled": true, "duration": 3}
        },
        "clips": [
            {
                "clip_id": "sentence_0",
                "type": "sentence",
                "sentence_index": 0,
                "sentence_text": "Break a leg!",
                "translation": "행운을 빌어!",
                "audio": {"tts_voices": ["alloy", "nova", "shimmer"], "pause_after": 1.0, "repeat_count": 3},
                "text": {"font_size": 60, "position": "center", "color": "white", "enabled": true},
                "image": {"path": "resources/images/leg.jpg", "filter": null},
                "transition": "fade"
            }
        ]
    })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn generate(State(state): State<Arc<MockStudio>>, Json(body): Json<Value>) -> Reply {
    state.submitted.lock().unwrap().push(body);
    match state.submit_reply.lock().unwrap().clone() {
        Some((status, body)) => (status, Json(body)),
        None => (
            StatusCode::OK,
            Json(json!({"task_id": "t1", "status": "processing", "message": "started"})),
        ),
    }
}

async fn status(State(state): State<Arc<MockStudio>>, Path(task_id): Path<String>) -> Reply {
    state.status_calls.fetch_add(1, Ordering::SeqCst);
    let next = state.statuses.lock().unwrap().pop_front();
    let (status, mut body) = match next {
        Some(reply) => {
            *state.last_status.lock().unwrap() = Some(reply.clone());
            reply
        }
        None => state
            .last_status
            .lock()
            .unwrap()
            .clone()
            .unwrap_or((StatusCode::OK, json!({"status": "processing", "progress": 0}))),
    };
    if status.is_success() {
        body["task_id"] = json!(task_id);
    }
    (status, Json(body))
}

async fn movie_quotes() -> Json<Value> {
    Json(json!({
        "quotes": [
            {"id": 1, "quote": "May the Force be with you.", "movie": "Star Wars", "year": 1977},
            {"id": 2, "quote": "I'll be back.", "movie": "The Terminator", "year": 1984}
        ]
    }))
}

async fn get_config(State(state): State<Arc<MockStudio>>, Path(id): Path<String>) -> Reply {
    match state.stored_config(&id) {
        Some(config) => (
            StatusCode::OK,
            Json(json!({
                "config": config,
                "video_exists": true,
                "video_path": format!("/output/videos/{id}.mp4"),
            })),
        ),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Config not found"})),
        ),
    }
}

/// Replaces `global_settings` and `clips`; other stored keys survive.
async fn save_config(
    State(state): State<Arc<MockStudio>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    let Some(mut config) = state.stored_config(&id) else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Config not found"})),
        );
    };
    config["global_settings"] = body["global_settings"].clone();
    config["clips"] = body["clips"].clone();
    config["edited_at"] = json!("2026-10-18T12:00:00");
    state.insert_config(&id, config);
    (StatusCode::OK, Json(json!({"success": true})))
}

async fn regenerate(
    State(state): State<Arc<MockStudio>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    state.regenerated.lock().unwrap().push(body);
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "video_path": format!("/api/video/{id}/preview"),
            "processing_time": 3.2,
        })),
    )
}

async fn upload_media(
    State(state): State<Arc<MockStudio>>,
    Path((id, index)): Path<(String, usize)>,
    mut multipart: Multipart,
) -> Reply {
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("media") {
            continue;
        }
        let name = field.file_name().unwrap_or("media").to_string();
        let bytes = field.bytes().await.unwrap_or_default().to_vec();
        state.uploads.lock().unwrap().push((index, name.clone(), bytes));
        return (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "file_path": format!("uploads/{id}/{index}_{name}"),
                "file_type": "image",
            })),
        );
    }
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"error": "No media file"})),
    )
}

fn image_reply(state: &MockStudio, target: String, body: &Value, image_path: String) -> Reply {
    let prompt = body["prompt"].as_str().unwrap_or_default().to_string();
    state.image_prompts.lock().unwrap().push((target, prompt));
    (
        StatusCode::OK,
        Json(json!({"success": true, "image_path": image_path, "message": "Image generated"})),
    )
}

async fn generate_clip_image(
    State(state): State<Arc<MockStudio>>,
    Path((id, index)): Path<(String, usize)>,
    Json(body): Json<Value>,
) -> Reply {
    image_reply(
        &state,
        format!("clip-{index}"),
        &body,
        format!("resources/images/{id}_clip_{index}.png"),
    )
}

async fn generate_intro_image(
    State(state): State<Arc<MockStudio>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    image_reply(&state, "intro".into(), &body, format!("resources/images/{id}_intro.png"))
}

async fn generate_outro_image(
    State(state): State<Arc<MockStudio>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    image_reply(&state, "outro".into(), &body, format!("resources/images/{id}_outro.png"))
}

// ---------------------------------------------------------------------------
// Thumbnail studio handlers
// ---------------------------------------------------------------------------

fn thumbnail_error(status: StatusCode, message: &str) -> Reply {
    (status, Json(json!({"success": false, "error": message})))
}

fn thumbnail_download(session_id: &str, version: u32) -> String {
    format!("/thumbnail-studio/api/download/{session_id}/v{version}")
}

async fn analyze_url(Json(body): Json<Value>) -> Reply {
    let url = body["url"].as_str().unwrap_or_default();
    if url.is_empty() {
        return thumbnail_error(StatusCode::BAD_REQUEST, "A YouTube URL is required");
    }
    if !url.contains("youtube.com") {
        return thumbnail_error(StatusCode::BAD_REQUEST, "Could not analyse that URL");
    }
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "metadata": {
                "title": "How to order coffee in English without freezing up",
                "duration_string": "3:42",
                "channel": "Daily English Mecca",
                "thumbnail_url": "https://i.ytimg.com/vi/abc/maxresdefault.jpg",
                "view_count": 1200
            }
        })),
    )
}

async fn analyze_channel(Json(body): Json<Value>) -> Reply {
    if body["channel_url"].as_str().unwrap_or_default().is_empty() {
        return thumbnail_error(StatusCode::BAD_REQUEST, "A channel URL is required");
    }
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "channel_info": {
                "channel_name": "Daily English Mecca",
                "channel_id": "UC123",
                "icon_url": "https://yt3.ggpht.com/icon.jpg",
                "icon_path": "output/youtube_thumbnails/icons/UC123.jpg",
                "subscriber_count": 15300
            }
        })),
    )
}

/// Three candidates when a source video is given, one otherwise. A known
/// `session_id` adds to that session.
async fn generate_thumbnails(
    State(state): State<Arc<MockStudio>>,
    mut multipart: Multipart,
) -> Reply {
    let mut fields = HashMap::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        if name == "reference_image" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await.unwrap_or_default().to_vec();
            state.reference_images.lock().unwrap().push((file_name, bytes));
            continue;
        }
        fields.insert(name, field.text().await.unwrap_or_default());
    }
    state.thumbnail_forms.lock().unwrap().push(fields.clone());

    if fields.get("main_text").map_or(true, |t| t.is_empty()) {
        return thumbnail_error(StatusCode::BAD_REQUEST, "Main text is required");
    }

    let known = fields
        .get("session_id")
        .filter(|id| state.thumbnail_versions.lock().unwrap().contains_key(*id))
        .cloned();
    let session_id = known.unwrap_or_else(|| {
        let n = state.thumbnail_versions.lock().unwrap().len() + 1;
        format!("session_{n}")
    });
    let count = if fields.get("youtube_url").map_or(false, |u| !u.is_empty()) {
        3
    } else {
        1
    };
    let versions: Vec<u32> = (0..count)
        .map(|_| state.add_thumbnail(&session_id, "original"))
        .collect();
    let urls: Vec<String> = versions
        .iter()
        .map(|&v| thumbnail_download(&session_id, v))
        .collect();

    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "session_id": session_id,
            "versions": versions,
            "thumbnail_urls": urls,
            "count": count,
        })),
    )
}

async fn regenerate_thumbnail(
    State(state): State<Arc<MockStudio>>,
    Json(body): Json<Value>,
) -> Reply {
    state.thumbnail_regenerations.lock().unwrap().push(body.clone());
    let session_id = body["session_id"].as_str().unwrap_or_default().to_string();
    let current = body["current_version"].as_u64().unwrap_or(1) as u32;
    let variation = body["variation_type"].as_str().unwrap_or("color").to_string();

    let exists = state
        .thumbnail_versions
        .lock()
        .unwrap()
        .get(&session_id)
        .map_or(false, |versions| versions.iter().any(|(v, _)| *v == current));
    if !exists {
        return thumbnail_error(StatusCode::NOT_FOUND, "Version not found");
    }

    let version = state.add_thumbnail(&session_id, &variation);
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "session_id": session_id,
            "version": version,
            "thumbnail_url": thumbnail_download(&session_id, version),
        })),
    )
}

async fn thumbnail_history(
    State(state): State<Arc<MockStudio>>,
    Path(session_id): Path<String>,
) -> Reply {
    let versions = state.thumbnail_versions.lock().unwrap().get(&session_id).cloned();
    let Some(versions) = versions else {
        return thumbnail_error(StatusCode::NOT_FOUND, "Session not found");
    };
    let thumbnails: Vec<Value> = versions
        .iter()
        .map(|(version, variation)| {
            json!({
                "version": version,
                "url": thumbnail_download(&session_id, *version),
                "variation_type": variation,
                "created_at": "2026-10-18T10:00:00",
            })
        })
        .collect();
    (
        StatusCode::OK,
        Json(json!({"session_id": session_id, "thumbnails": thumbnails})),
    )
}

async fn get_profile(State(state): State<Arc<MockStudio>>) -> Reply {
    let profile = state.stored_profile().unwrap_or_else(|| {
        json!({
            "channel_name": "Daily English Mecca",
            "logo_path": null,
            "brand_colors": {"primary": "#FF5733", "secondary": "#3357FF", "accent": "#FFD700"},
            "use_kelly": true
        })
    });
    (StatusCode::OK, Json(json!({"success": true, "profile": profile})))
}

async fn save_profile(State(state): State<Arc<MockStudio>>, Json(body): Json<Value>) -> Reply {
    *state.profile.lock().unwrap() = Some(body);
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": "Profile saved",
            "profile_path": "output/youtube_thumbnails/profiles/default.json",
        })),
    )
}
