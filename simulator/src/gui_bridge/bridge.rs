use crate::generator::profile::{build_frames, ScenarioConfig};
use crate::gui_bridge::model::AlertBoard;
use crate::workflow::runner::Runner;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, RwLock};
use tcascore::interface::CycleFrame;
use warp::{http::StatusCode, reply, Filter};

pub fn bridge_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9000))
}

type SharedBoard = Arc<RwLock<AlertBoard>>;
type JsonReply = reply::WithStatus<reply::Json>;

#[derive(Debug, Deserialize)]
pub struct ScenarioRequest {
    #[serde(default)]
    pub scenario: ScenarioConfig,
    #[serde(default = "default_scenario_cycles")]
    pub cycles: usize,
}

fn default_scenario_cycles() -> usize {
    300
}

fn status_reply(body: serde_json::Value, status: StatusCode) -> JsonReply {
    reply::with_status(reply::json(&body), status)
}

/// Hosts the alert board over HTTP and feeds posted frames to the engine.
pub struct GuiBridge {
    state: SharedBoard,
    runner: Arc<Runner>,
}

impl GuiBridge {
    pub fn new(runner: Arc<Runner>) -> Self {
        Self {
            state: Arc::new(RwLock::new(AlertBoard::default())),
            runner,
        }
    }

    pub fn routes(&self) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
        let state = self.state.clone();
        let state_filter = warp::any().map(move || state.clone());
        let runner = self.runner.clone();
        let runner_filter = warp::any().map(move || runner.clone());

        let alerts_route = warp::path("alerts")
            .and(warp::path::end())
            .and(warp::get())
            .and(state_filter.clone())
            .map(|state: SharedBoard| match state.read() {
                Ok(board) => reply::with_status(reply::json(&*board), StatusCode::OK),
                Err(_) => status_reply(
                    json!({"status": "error", "reason": "alert board unavailable"}),
                    StatusCode::INTERNAL_SERVER_ERROR,
                ),
            });

        let ingest_route = warp::path("ingest")
            .and(warp::path::end())
            .and(warp::post())
            .and(warp::body::json())
            .and(state_filter.clone())
            .and(runner_filter.clone())
            .and_then(
                |frame: CycleFrame, state: SharedBoard, runner: Arc<Runner>| async move {
                    let work = move || ingest_frame(&runner, &state, &frame);
                    Ok::<_, Infallible>(run_blocking("ingest", work).await)
                },
            );

        let scenario_route = warp::path("ingest-scenario")
            .and(warp::path::end())
            .and(warp::post())
            .and(warp::body::json())
            .and(state_filter)
            .and(runner_filter)
            .and_then(
                |request: ScenarioRequest, state: SharedBoard, runner: Arc<Runner>| async move {
                    let work = move || ingest_scenario(&runner, &state, &request);
                    Ok::<_, Infallible>(run_blocking("ingest-scenario", work).await)
                },
            );

        alerts_route.or(ingest_route).or(scenario_route)
    }

    /// Binds the routes; the returned future serves until dropped.
    pub fn bind(&self, addr: SocketAddr) -> Result<(SocketAddr, impl Future<Output = ()>)> {
        warp::serve(self.routes())
            .try_bind_ephemeral(addr)
            .with_context(|| format!("binding alert bridge on {}", addr))
    }

    pub fn publish(&self, board: AlertBoard) -> Result<()> {
        log::debug!("[bridge] {}", board.headline());
        store_board(&self.state, board)
    }

    pub fn publish_status(&self, message: &str) {
        println!("[BRIDGE] {}", message);
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> AlertBoard {
        self.state.read().unwrap().clone()
    }
}

/// Engine cycles hold a mutex and fan out on rayon, so they run on the
/// blocking pool instead of a reactor thread.
async fn run_blocking<F>(route: &'static str, work: F) -> JsonReply
where
    F: FnOnce() -> JsonReply + Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(reply) => reply,
        Err(err) => {
            log::error!("{} worker failed: {}", route, err);
            status_reply(
                json!({"status": "error", "reason": "engine worker failed"}),
                StatusCode::INTERNAL_SERVER_ERROR,
            )
        }
    }
}

fn store_board(state: &SharedBoard, board: AlertBoard) -> Result<()> {
    let mut guard = state.write().map_err(|_| anyhow!("alert board lock poisoned"))?;
    *guard = board;
    Ok(())
}

fn ingest_frame(runner: &Runner, state: &SharedBoard, frame: &CycleFrame) -> JsonReply {
    let outcome = runner.step(frame).and_then(|report| {
        let board = AlertBoard::from_report(&report, runner.metrics()?);
        store_board(state, board)?;
        Ok(report)
    });
    match outcome {
        Ok(report) => status_reply(
            json!({
                "status": "ok",
                "cycle": report.cycle,
                "cycle_status": report.status,
                "alerts": report.alerts,
            }),
            StatusCode::OK,
        ),
        Err(err) => {
            log::error!("ingest error: {:#}", err);
            status_reply(
                json!({"status": "error", "reason": err.to_string()}),
                StatusCode::INTERNAL_SERVER_ERROR,
            )
        }
    }
}

/// Runs a posted scenario on a fresh engine so it cannot disturb live tracks.
fn ingest_scenario(runner: &Runner, state: &SharedBoard, request: &ScenarioRequest) -> JsonReply {
    let outcome = build_frames(&request.scenario, request.cycles).and_then(|frames| {
        let scratch = Runner::new(runner.config().clone())?;
        let result = scratch.execute(&frames)?;
        if let Some(last) = result.last() {
            let board = AlertBoard::from_report(last, result.metrics).with_scenario(request.scenario.name());
            store_board(state, board)?;
        }
        Ok(result)
    });
    match outcome {
        Ok(result) => {
            log::info!(
                "[bridge] scenario {} -> {} alerts over {} cycles",
                request.scenario.name(),
                result.alert_count,
                result.reports.len()
            );
            status_reply(
                json!({
                    "status": "ok",
                    "scenario": request.scenario.name(),
                    "cycles": result.reports.len(),
                    "alerts": result.alert_count,
                    "peak_levels": result.peak_levels,
                }),
                StatusCode::OK,
            )
        }
        Err(err) => {
            log::error!("ingest-scenario error: {:#}", err);
            status_reply(
                json!({"status": "error", "reason": err.to_string()}),
                StatusCode::BAD_REQUEST,
            )
        }
    }
}
