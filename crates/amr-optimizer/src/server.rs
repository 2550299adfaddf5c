//! Axum HTTP surface for the GA optimizer, grounded in the original FastAPI
//! `app/main.py` for the request/response shape and the workspace's established axum
//! server setup.

use std::net::SocketAddr;
use std::sync::Arc;

use amr_ga::{optimize, GaParams};
use axum::{extract::State, routing::get, routing::post, Json, Router};
use tracing::info;

use crate::schemas::{AssignmentDto, HealthResponse, OptimizeRequest, OptimizeResponse};

pub struct OptimizerState {
    pub params: GaParams,
}

fn create_router(state: Arc<OptimizerState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/optimize", post(optimize_handler))
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn optimize_handler(
    State(state): State<Arc<OptimizerState>>,
    Json(req): Json<OptimizeRequest>,
) -> Json<OptimizeResponse> {
    let robots: Vec<_> = req.robots.into_iter().map(|r| r.into_robot()).collect();
    let jobs: Vec<_> = req.pending_jobs.into_iter().map(|j| j.into_job()).collect();

    let (assignments, meta) = optimize(&robots, &jobs, req.seed, &state.params);

    let assignments = assignments
        .into_iter()
        .map(|a| AssignmentDto {
            job_id: a.job_id.to_string(),
            robot_id: a.robot_id.0,
            score: a.score,
        })
        .collect();

    let meta = serde_json::to_value(meta).expect("optimize meta is always serializable");
    Json(OptimizeResponse { assignments, meta })
}

pub async fn run_server(port: u16, params: GaParams) -> anyhow::Result<()> {
    let state = Arc::new(OptimizerState { params });
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "optimizer service listening");

    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn default_params() -> GaParams {
        GaParams {
            population_size: 8,
            generations: 3,
            elite_size: 1,
            crossover_rate: 0.9,
            mutation_rate: 0.1,
            service_time_s: 5.0,
        }
    }

    #[tokio::test]
    async fn test_health_endpoint_returns_ok() {
        let state = Arc::new(OptimizerState { params: default_params() });
        let app = create_router(state);
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_optimize_endpoint_returns_assignment_per_job() {
        let state = Arc::new(OptimizerState { params: default_params() });
        let app = create_router(state);

        let body = serde_json::json!({
            "run_id": "run-1",
            "seed": 42,
            "scale": "mini",
            "mode": "ga",
            "sim_time_s": 0,
            "robots": [{"id": 1, "x": 0.0, "y": 0.0, "speed": 1.0, "battery": 100.0, "state": "idle"}],
            "pending_jobs": [{"id": "job_1", "pickup_x": 1.0, "pickup_y": 0.0, "dropoff_x": 2.0, "dropoff_y": 0.0, "deadline_ts": 100, "priority": 3}],
        });

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/optimize")
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_vec(&body).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
