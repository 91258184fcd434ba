use axum::{
    response::Html,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use super::{api, AppState};

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Dashboard page
        .route("/", get(serve_dashboard))
        // Read endpoints
        .route("/api/health", get(api::health_check))
        .route("/api/overview", get(api::get_overview))
        .route("/api/records", get(api::get_records))
        // Operator actions
        .route("/api/scrape", post(api::post_scrape))
        .route("/api/generate", post(api::post_generate))
        .route("/api/train", post(api::post_train))
        .route("/api/predict", post(api::post_predict))
        .route("/api/simulate", post(api::post_simulate))
        .layer(cors)
        .with_state(state)
}

pub async fn start_dashboard_server(state: AppState, port: u16) -> anyhow::Result<()> {
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Dashboard server starting on http://localhost:{}", port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn serve_dashboard() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

const DASHBOARD_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Jackpot Predictor</title>
    <style>
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Oxygen, Ubuntu, sans-serif;
            background: #0f172a; color: #e2e8f0; padding: 24px;
        }
        h1 { font-size: 1.5rem; margin-bottom: 16px; }
        h2 { font-size: 1.1rem; margin-bottom: 12px; color: #94a3b8; }
        .grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(320px, 1fr)); gap: 16px; }
        .card { background: #1e293b; border-radius: 8px; padding: 16px; }
        .stat { display: flex; justify-content: space-between; padding: 4px 0; }
        button {
            background: #2563eb; color: white; border: none; border-radius: 4px;
            padding: 8px 14px; margin: 4px 4px 4px 0; cursor: pointer;
        }
        button:hover { background: #1d4ed8; }
        input { background: #0f172a; color: #e2e8f0; border: 1px solid #334155; border-radius: 4px; padding: 6px; width: 90px; }
        label { display: inline-block; margin: 4px 8px 4px 0; font-size: 0.9rem; }
        table { width: 100%; border-collapse: collapse; font-size: 0.85rem; }
        th, td { text-align: right; padding: 4px 6px; border-bottom: 1px solid #334155; }
        th:first-child, td:first-child { text-align: left; }
        pre { white-space: pre-wrap; font-size: 0.8rem; max-height: 360px; overflow-y: auto; }
        .error { color: #f87171; }
    </style>
</head>
<body>
    <h1>Jackpot Predictor</h1>
    <div class="grid">
        <div class="card">
            <h2>History</h2>
            <div id="overview">Loading...</div>
            <div style="margin-top: 12px">
                <button onclick="action('/api/scrape', {append: false})">Scrape</button>
                <button onclick="action('/api/generate', {})">Generate</button>
                <button onclick="action('/api/train')">Train</button>
            </div>
        </div>
        <div class="card">
            <h2>Predict</h2>
            <label>Plays <input id="plays" type="number" value="60"></label>
            <label>Free game <input id="free" type="number" min="0" max="1" value="1"></label>
            <label>Small hit <input id="small" type="number" min="0" max="1" value="0"></label>
            <div><button onclick="predict()">Predict</button></div>
            <pre id="prediction"></pre>
        </div>
        <div class="card">
            <h2>Simulate</h2>
            <label>Capital <input id="capital" type="number" value="1000"></label>
            <label>Rounds <input id="rounds" type="number" value="50"></label>
            <label>Bet <input id="bet" type="number" value="10"></label>
            <div><button onclick="simulate()">Run</button></div>
            <pre id="simulation"></pre>
        </div>
    </div>
    <div class="card" style="margin-top: 16px">
        <h2>Recent Records</h2>
        <table id="records"></table>
    </div>
    <pre id="status" style="margin-top: 12px"></pre>
    <script>
        async function call(path, body) {
            const opts = body === undefined ? { method: 'GET' } : {
                method: 'POST',
                headers: { 'Content-Type': 'application/json' },
                body: JSON.stringify(body),
            };
            const res = await fetch(path, opts);
            const data = await res.json();
            if (!res.ok) throw new Error(data.error || data.message || res.statusText);
            return data;
        }

        function show(id, text, isError) {
            const el = document.getElementById(id);
            el.textContent = text;
            el.className = isError ? 'error' : '';
        }

        async function refresh() {
            try {
                const o = await call('/api/overview');
                document.getElementById('overview').innerHTML = `
                    <div class="stat"><span>Records</span><span>${o.total_records}</span></div>
                    <div class="stat"><span>Jackpots</span><span>${o.total_jackpots}</span></div>
                    <div class="stat"><span>Jackpot rate</span><span>${o.jackpot_rate_pct.toFixed(2)}%</span></div>
                    <div class="stat"><span>Avg plays</span><span>${o.avg_play_count.toFixed(1)}</span></div>
                    <div>${o.latest || 'No data yet'}</div>`;
                const rows = o.recent.map(r => `<tr><td>${r.date}</td><td>${r.play_count}</td>
                    <td>${r.jackpot}</td><td>${r.small_hit}</td><td>${r.free_game_triggered}</td>
                    <td>${r.burst_index.toFixed(2)}</td></tr>`).join('');
                document.getElementById('records').innerHTML =
                    '<tr><th>Date</th><th>Plays</th><th>Jackpot</th><th>Small</th><th>Free</th><th>Burst</th></tr>' + rows;
            } catch (e) {
                show('status', e.message, true);
            }
        }

        async function action(path, body) {
            try {
                const data = await call(path, body === undefined ? {} : body);
                show('status', JSON.stringify(data, null, 2), false);
                refresh();
            } catch (e) {
                show('status', e.message, true);
            }
        }

        async function predict() {
            try {
                const data = await call('/api/predict', {
                    play_count: document.getElementById('plays').value,
                    free_game_triggered: document.getElementById('free').value,
                    small_hit: document.getElementById('small').value,
                });
                show('prediction', `${(data.probability * 100).toFixed(2)}% (${data.advice})`, false);
            } catch (e) {
                show('prediction', e.message, true);
            }
        }

        async function simulate() {
            try {
                const data = await call('/api/simulate', {
                    capital: document.getElementById('capital').value,
                    rounds: parseInt(document.getElementById('rounds').value, 10),
                    bet_unit: document.getElementById('bet').value,
                });
                show('simulation', data.log.join('\n') + '\n\n' + data.summary, false);
            } catch (e) {
                show('simulation', e.message, true);
            }
        }

        refresh();
    </script>
</body>
</html>
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_state(dir: &tempfile::TempDir) -> AppState {
        let mut config = AppConfig::default();
        config.storage.records_path = dir.path().join("history.csv").to_string_lossy().into_owned();
        config.storage.model_path = dir.path().join("model/jackpot_model.json").to_string_lossy().into_owned();
        config.storage.prediction_log_path = dir.path().join("predictions.csv").to_string_lossy().into_owned();
        AppState::new(config)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health_and_dashboard_page() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(&dir));

        let (status, body) = send(&app, "GET", "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["model_trained"], false);

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_empty_store_reads() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(&dir));

        let (status, body) = send(&app, "GET", "/api/overview", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_records"], 0);

        let (status, body) = send(&app, "GET", "/api/records", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 0);
    }

    #[tokio::test]
    async fn test_simulate_without_data_is_data_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(&dir));

        let (status, body) = send(&app, "POST", "/api/simulate", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "data_unavailable");
    }

    #[tokio::test]
    async fn test_simulate_without_model_is_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(&dir));
        send(&app, "POST", "/api/generate", Some(json!({"count": 8, "seed": 3}))).await;

        let (status, body) = send(&app, "POST", "/api/simulate", Some(json!({"rounds": 4}))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["kind"], "not_trained");
    }

    #[tokio::test]
    async fn test_predict_without_model_fails_softly() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(&dir));

        let input = json!({"play_count": 60, "free_game_triggered": 1, "small_hit": false});
        let (status, body) = send(&app, "POST", "/api/predict", Some(input)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["status"], "failed");
    }

    #[tokio::test]
    async fn test_generate_train_predict_simulate() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(&dir));

        let (status, body) = send(&app, "POST", "/api/generate", Some(json!({"count": 30, "seed": 11}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rows"], 30);

        let (status, body) = send(&app, "POST", "/api/train", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["version"], "1.0.0");
        assert_eq!(body["report"]["samples"], 30);

        let input = json!({"play_count": "60", "free_game_triggered": "1", "small_hit": "0"});
        let (status, body) = send(&app, "POST", "/api/predict", Some(input)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "predicted");
        let probability = body["probability"].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&probability));
        let logged = std::fs::read_to_string(dir.path().join("predictions.csv")).unwrap();
        assert_eq!(logged.lines().count(), 2);

        let (status, body) = send(&app, "POST", "/api/simulate", Some(json!({"rounds": 12, "bet_unit": "5"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["log"].as_array().unwrap().len(), 12);
        assert_eq!(body["requested_rounds"], 12);
    }

    #[tokio::test]
    async fn test_invalid_simulation_parameters_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(&dir));
        send(&app, "POST", "/api/generate", Some(json!({"count": 5, "seed": 1}))).await;

        let (status, body) = send(&app, "POST", "/api/simulate", Some(json!({"bet_unit": "0"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid_parameter");
    }
}
