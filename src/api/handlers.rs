//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::debug;

use super::types::{
    ErrorResponse, EvaluateRequest, EvaluateResponse, ModelResponse, SimulateRequest,
    SimulateResponse,
};
use super::{AppState, MAX_SAMPLES};
use crate::model::DemandCurve;
use crate::problem::ScheduleProblem;
use crate::sim::error::SimError;
use crate::sim::kpi::TraceReport;
use crate::sim::simulate;
use crate::sim::types::TimeGrid;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// 422 for a run without a pump operating point, 400 for bad input.
fn sim_error(e: SimError) -> ApiError {
    let status = if e.is_infeasible() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::BAD_REQUEST
    };
    error(status, e.to_string())
}

fn grid_for(state: &AppState, samples: Option<usize>) -> Result<TimeGrid, ApiError> {
    let count = samples.unwrap_or(state.default_samples);
    if count > MAX_SAMPLES {
        return Err(error(
            StatusCode::BAD_REQUEST,
            format!("`samples` ({count}) must be <= {MAX_SAMPLES}"),
        ));
    }
    TimeGrid::day(count).map_err(sim_error)
}

/// Runs a simulation off the async workers.
async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("simulation task failed: {e}"),
        )
    })?
}

/// Returns the plant parameters.
///
/// `GET /model` → 200 + `ModelResponse` JSON
pub async fn get_model(State(state): State<Arc<AppState>>) -> Json<ModelResponse> {
    Json(ModelResponse::from(&state.model))
}

/// Simulates a decision vector and returns its report and trace.
///
/// `POST /simulate` → 200 + `SimulateResponse` JSON
/// malformed vector, bad grid, or `stride = 0` → 400 + `ErrorResponse`
/// no pump operating point → 422 + `ErrorResponse`
pub async fn post_simulate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SimulateRequest>,
) -> Result<Json<SimulateResponse>, ApiError> {
    let stride = req.stride.unwrap_or(1);
    if stride == 0 {
        return Err(error(StatusCode::BAD_REQUEST, "`stride` must be >= 1"));
    }
    let grid = grid_for(&state, req.samples)?;
    let curve = req.demand.unwrap_or(DemandCurve::Max);

    run_blocking(move || {
        let trace = simulate(&state.model, &req.x, &grid, curve).map_err(sim_error)?;
        let report = TraceReport::from_trace(&trace, &grid, state.model.tank());
        let rows = (0..trace.len())
            .step_by(stride)
            .filter_map(|k| trace.sample(&grid, k))
            .collect();
        debug!(samples = grid.len(), cost = report.total_cost, "served simulation");
        Ok(Json(SimulateResponse {
            report,
            switches: trace.switches,
            trace: rows,
        }))
    })
    .await
}

/// Evaluates a decision vector against the objective and constraints.
///
/// `POST /evaluate` → 200 + `EvaluateResponse` JSON
/// malformed vector or bad grid → 400 + `ErrorResponse`
/// no pump operating point → 422 + `ErrorResponse`
pub async fn post_evaluate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EvaluateRequest>,
) -> Result<Json<EvaluateResponse>, ApiError> {
    let grid = grid_for(&state, req.samples)?;
    let curve = req.demand.unwrap_or(DemandCurve::Max);
    let limits = req.limits.unwrap_or_default();

    run_blocking(move || {
        let problem = ScheduleProblem::new(&state.model, grid, curve, limits);
        let eval = problem.evaluate(&req.x).map_err(sim_error)?;
        let constraints = problem.schedule_constraints(&req.x).map_err(sim_error)?;
        EvaluateResponse::from_evaluation(eval, constraints)
            .map(Json)
            .map_err(sim_error)
    })
    .await
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::util::ServiceExt;

    use super::*;
    use crate::api::router;
    use crate::model::{LevelBounds, PhysicalModel, Tank};

    fn make_test_state() -> Arc<AppState> {
        Arc::new(AppState {
            model: PhysicalModel::reference(),
            default_samples: 2_401,
        })
    }

    fn post(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(resp: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn model_returns_200() {
        let app = router(make_test_state());

        let req = Request::builder()
            .uri("/model")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = json_body(resp).await;
        assert_eq!(json["shutoff_head_m"], 260.0);
        assert_eq!(json["tariff"].as_array().map(Vec::len), Some(12));
        assert!(json.get("operational").is_some());
    }

    #[tokio::test]
    async fn simulate_returns_strided_trace() {
        let app = router(make_test_state());
        let req = post(
            "/simulate",
            serde_json::json!({ "x": [1.0, 5.0], "stride": 100 }),
        );
        let resp = app.oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = json_body(resp).await;
        // samples 0, 100, ..., 2400
        assert_eq!(json["trace"].as_array().map(Vec::len), Some(25));
        assert_eq!(json["switches"].as_array().map(Vec::len), Some(2));
        assert!(json["report"]["total_cost"].as_f64().unwrap_or(0.0) > 0.0);
    }

    #[tokio::test]
    async fn simulate_odd_vector_returns_400() {
        let app = router(make_test_state());
        let req = post("/simulate", serde_json::json!({ "x": [1.0, 2.0, 3.0] }));
        let resp = app.oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = json_body(resp).await;
        assert!(json.get("error").is_some());
    }

    #[tokio::test]
    async fn simulate_zero_stride_returns_400() {
        let app = router(make_test_state());
        let req = post("/simulate", serde_json::json!({ "x": [], "stride": 0 }));
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn simulate_infeasible_returns_422() {
        let reference = PhysicalModel::reference();
        let model = PhysicalModel::new(
            *reference.pump(),
            reference.demand().clone(),
            *reference.pipes(),
            Tank::new(
                185.0,
                300.0,
                LevelBounds::new(290.0, 310.0),
                LevelBounds::new(280.0, 320.0),
            ),
            *reference.tariff(),
            reference.density_kg_m3(),
            9.81,
        );
        let app = router(Arc::new(AppState {
            model,
            default_samples: 241,
        }));
        let req = post("/simulate", serde_json::json!({ "x": [1.0, 1.0] }));
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn evaluate_flags_overlap() {
        let app = router(make_test_state());
        let req = post(
            "/evaluate",
            serde_json::json!({ "x": [1.0, 4.0, 5.0, 1.0], "limits": "absolute" }),
        );
        let resp = app.oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = json_body(resp).await;
        assert_eq!(json["status"], "violating");
        assert_eq!(json["schedule_constraints"][0], -2.0);
    }

    #[tokio::test]
    async fn evaluate_too_many_samples_returns_400() {
        let app = router(make_test_state());
        let req = post(
            "/evaluate",
            serde_json::json!({ "x": [], "samples": MAX_SAMPLES + 1 }),
        );
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
