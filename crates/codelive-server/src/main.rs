//! codelive web server.
//!
//! Run with: cargo run -p codelive-server
//!
//! Then open http://localhost:5000 in your browser. Environment:
//! - `PORT` - listen port (default 5000)
//! - `CODELIVE_EXERCISES` - path to a JSON exercise file; without it a
//!   built-in seed set is served

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::State,
    response::Html,
    routing::get,
};
use codelive_core::{Exercise, ExerciseCatalog, ExerciseSummary};
use codelive_session::{SessionRegistry, catalog};
use codelive_transport::websocket::{WsState, create_ws_router};
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type Catalog = Arc<catalog::MemoryCatalog>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let catalog: Catalog = match std::env::var("CODELIVE_EXERCISES") {
        Ok(path) => {
            tracing::info!(path, "loading exercise catalog");
            Arc::new(catalog::file::load(&path)?)
        }
        Err(_) => Arc::new(catalog::MemoryCatalog::new(seed_exercises())?),
    };

    let registry = Arc::new(SessionRegistry::new(Arc::clone(&catalog)));
    let ws_state = Arc::new(WsState::new(registry));

    let app = Router::new()
        .route("/", get(index_handler))
        .route("/api/exercises", get(list_exercises))
        .with_state(catalog)
        .merge(create_ws_router(ws_state))
        .layer(CorsLayer::permissive());

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(5000);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    tracing::info!("Server listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn list_exercises(State(catalog): State<Catalog>) -> Json<Vec<ExerciseSummary>> {
    match catalog.list().await {
        Ok(exercises) => Json(exercises.iter().map(Exercise::summary).collect()),
        Err(e) => {
            tracing::error!("Failed to list exercises: {e}");
            Json(Vec::new())
        }
    }
}

/// Built-in exercise set for running without a catalog file.
fn seed_exercises() -> Vec<Exercise> {
    vec![
        Exercise::new(
            "async-case",
            "Async case",
            "async function fetchUser(id) {\n  // return the user object\n}",
            "async function fetchUser(id) {\n  return await db.users.get(id);\n}",
        ),
        Exercise::new(
            "array-sum",
            "Sum an array",
            "function sum(xs) {\n  // add them up\n}",
            "function sum(xs) {\n  return xs.reduce((a, b) => a + b, 0);\n}",
        ),
        Exercise::new(
            "promise-chain",
            "Promise chaining",
            "function load() {\n  // fetch then parse\n}",
            "function load() {\n  return fetch('/data').then(r => r.json());\n}",
        ),
        Exercise::new(
            "closure-counter",
            "Closure counter",
            "function makeCounter() {\n  // return an incrementer\n}",
            "function makeCounter() {\n  let n = 0;\n  return () => ++n;\n}",
        ),
    ]
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>codelive</title>
    <style>
        body {
            margin: 0;
            padding: 20px;
            background: #1e1e1e;
            color: #d4d4d4;
            font-family: system-ui, sans-serif;
        }
        h1 { color: #fff; margin-bottom: 10px; }
        .status { color: #888; font-size: 14px; margin-bottom: 10px; }
        .connected { color: #4a4; }
        .disconnected { color: #a44; }
        .matched { color: #4a4; font-size: 18px; }
        #lobby li { margin: 6px 0; cursor: pointer; color: #6cf; }
        #editor {
            width: 100%;
            height: calc(100vh - 180px);
            background: #252526;
            color: #d4d4d4;
            font-family: Menlo, Monaco, "Courier New", monospace;
            font-size: 14px;
            border: 1px solid #333;
            box-sizing: border-box;
        }
        #back { color: #6cf; cursor: pointer; }
        .hidden { display: none; }
    </style>
</head>
<body>
    <h1>codelive</h1>
    <div class="status" id="status">Connecting...</div>

    <div id="lobby-view">
        <h2>Choose a code block</h2>
        <ul id="lobby"></ul>
    </div>

    <div id="session-view" class="hidden">
        <div><span id="back">&larr; lobby</span> &mdash; role: <b id="role">?</b></div>
        <div class="matched hidden" id="matched">Solution matched!</div>
        <textarea id="editor" spellcheck="false"></textarea>
    </div>

    <script>
        const status = document.getElementById('status');
        const lobbyView = document.getElementById('lobby-view');
        const sessionView = document.getElementById('session-view');
        const editor = document.getElementById('editor');
        const roleEl = document.getElementById('role');
        const matchedEl = document.getElementById('matched');
        let ws;

        function connect() {
            const protocol = window.location.protocol === 'https:' ? 'wss:' : 'ws:';
            ws = new WebSocket(`${protocol}//${window.location.host}/ws`);

            ws.onopen = () => {
                status.textContent = 'Connected';
                status.className = 'status connected';
            };

            ws.onclose = () => {
                status.textContent = 'Disconnected - reconnecting...';
                status.className = 'status disconnected';
                showLobby();
                setTimeout(connect, 2000);
            };

            ws.onmessage = (event) => {
                const msg = JSON.parse(event.data);
                if (msg.type === 'joined') {
                    roleEl.textContent = msg.role;
                    editor.value = msg.buffer;
                    editor.readOnly = msg.role === 'mentor';
                    matchedEl.classList.add('hidden');
                    lobbyView.classList.add('hidden');
                    sessionView.classList.remove('hidden');
                } else if (msg.type === 'buffer_updated') {
                    editor.value = msg.text;
                    matchedEl.classList.add('hidden');
                } else if (msg.type === 'solution_matched') {
                    matchedEl.classList.remove('hidden');
                } else if (msg.type === 'error') {
                    status.textContent = msg.message;
                    status.className = 'status disconnected';
                }
            };
        }

        function showLobby() {
            sessionView.classList.add('hidden');
            lobbyView.classList.remove('hidden');
        }

        async function loadLobby() {
            const res = await fetch('/api/exercises');
            const exercises = await res.json();
            const list = document.getElementById('lobby');
            list.innerHTML = '';
            for (const ex of exercises) {
                const li = document.createElement('li');
                li.textContent = ex.title;
                li.onclick = () => {
                    ws.send(JSON.stringify({ type: 'join', exercise_id: ex.id }));
                };
                list.appendChild(li);
            }
        }

        editor.addEventListener('input', () => {
            if (ws && ws.readyState === WebSocket.OPEN && !editor.readOnly) {
                ws.send(JSON.stringify({ type: 'edit', text: editor.value }));
                matchedEl.classList.add('hidden');
            }
        });

        document.getElementById('back').onclick = () => {
            ws.send(JSON.stringify({ type: 'leave' }));
            showLobby();
        };

        connect();
        loadLobby();
    </script>
</body>
</html>
"#;
