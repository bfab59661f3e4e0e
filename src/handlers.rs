use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderValue, Method},
    response::sse::{Event, Sse},
    routing::{get, post},
    Json, Router,
};
use futures::stream::Stream;
use log::{error, info, warn};
use serde_json::json;
use tokio::sync::{broadcast, watch, Mutex, RwLock};
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer};

use crate::config::AppConfig;
use crate::enrollment::{CourseRecord, EnrollmentIndex};
use crate::error::{AppError, AppResult, InputError, RosterError};
use crate::models::{AttemptStatus, SolveParameters, TimetableRequest};
use crate::roster::parse_roster;
use crate::solver::{RestartSolver, SolverParameters};
use crate::timetable::{StudentSchedule, Timetable};

/// The most recent solve, kept so students can look up their schedule.
#[derive(Debug)]
pub struct Solved {
    pub index: EnrollmentIndex,
    pub timetable: Timetable,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub status_tx: broadcast::Sender<AttemptStatus>,
    /// One stop flag per solve that may still be running.
    pub running: Arc<Mutex<Vec<watch::Sender<bool>>>>,
    pub latest: Arc<RwLock<Option<Arc<Solved>>>>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let (status_tx, _) = broadcast::channel(1024);
        Self {
            config: Arc::new(config),
            status_tx,
            running: Arc::new(Mutex::new(Vec::new())),
            latest: Arc::new(RwLock::new(None)),
        }
    }

    /// Gives a new solve its own stop flag, so starting it never clears a
    /// stop already raised for another solve.
    async fn register_solve(&self) -> watch::Receiver<bool> {
        let (stop_tx, stop_rx) = watch::channel(false);
        let mut running = self.running.lock().await;
        running.retain(|tx| !tx.is_closed());
        running.push(stop_tx);
        stop_rx
    }

    /// Raises the stop flag of every solve still running. Returns how many.
    async fn stop_all(&self) -> usize {
        let mut running = self.running.lock().await;
        running.retain(|tx| !tx.is_closed());
        for tx in running.iter() {
            tx.send_replace(true);
        }
        running.len()
    }
}

pub fn router(state: AppState) -> Router {
    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));
    match state.config.cors_origin.parse::<HeaderValue>() {
        Ok(origin) => cors = cors.allow_origin(origin),
        Err(_) => warn!("Ignoring invalid CORS origin '{}'", state.config.cors_origin),
    }

    Router::new()
        .route("/timetable", post(solve_handler).get(latest_handler))
        .route("/timetable/students/:student_id", get(student_handler))
        .route("/roster", post(roster_handler))
        .route("/status", get(status_handler))
        .route("/stop", post(stop_handler))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(cors)
        .with_state(state)
}

pub async fn solve_handler(
    State(state): State<AppState>,
    Json(req): Json<TimetableRequest>,
) -> AppResult<Json<Timetable>> {
    let parameters = req.parameters.resolve(&state.config.solver);
    let records = req.courses.into_iter().map(CourseRecord::from).collect();

    let solved = run_solver(&state, records, parameters).await?;
    Ok(Json(solved.timetable.clone()))
}

/// Accepts one roster CSV per multipart field and solves over all of them.
pub async fn roster_handler(
    State(state): State<AppState>,
    Query(overrides): Query<SolveParameters>,
    mut multipart: Multipart,
) -> AppResult<Json<Timetable>> {
    let mut records = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let file_name = field
            .file_name()
            .or(field.name())
            .unwrap_or("roster")
            .to_string();
        let bytes = field.bytes().await?;
        let text = String::from_utf8(bytes.to_vec())
            .map_err(|_| RosterError::Encoding { file: file_name.clone() })?;
        records.push(parse_roster(&file_name, &text)?);
    }

    if records.is_empty() {
        return Err(RosterError::NoFiles.into());
    }
    info!("Received {} roster file(s)", records.len());

    let parameters = overrides.resolve(&state.config.solver);
    let solved = run_solver(&state, records, parameters).await?;
    Ok(Json(solved.timetable.clone()))
}

pub async fn latest_handler(State(state): State<AppState>) -> AppResult<Json<Timetable>> {
    let latest = state.latest.read().await;
    match latest.as_ref() {
        Some(solved) => Ok(Json(solved.timetable.clone())),
        None => Err(AppError::NotFound("no timetable has been generated yet".to_string())),
    }
}

pub async fn student_handler(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> AppResult<Json<StudentSchedule>> {
    let latest = state.latest.read().await;
    let solved = latest
        .as_ref()
        .ok_or_else(|| AppError::NotFound("no timetable has been generated yet".to_string()))?;

    solved
        .timetable
        .for_student(&solved.index, &student_id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("student '{}' is not enrolled in any course", student_id)))
}

pub async fn stop_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let stopped = state.stop_all().await;
    info!("Stop requested for {} running solve(s)", stopped);
    Json(json!({ "success": true }))
}

pub async fn status_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>> + 'static> {
    let mut rx = state.status_tx.subscribe();

    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(status) => match serde_json::to_string(&status) {
                    Ok(data) => {
                        yield Ok(Event::default().data(data).event("status"));
                    }
                    Err(e) => error!("Serialization error: {}", e),
                },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Status stream lagged, {} update(s) skipped", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream)
}

async fn run_solver(
    state: &AppState,
    records: Vec<CourseRecord>,
    parameters: SolverParameters,
) -> AppResult<Arc<Solved>> {
    let status_tx = state.status_tx.clone();
    let stop_rx = state.register_solve().await;

    let solved = tokio::task::spawn_blocking(move || -> Result<Solved, InputError> {
        let index = EnrollmentIndex::build(records)?;
        let outcome = RestartSolver::new(&index, parameters)
            .with_status(status_tx)
            .with_stop(stop_rx)
            .solve()?;
        let timetable = Timetable::project(&index, &outcome);
        Ok(Solved { index, timetable })
    })
    .await
    .map_err(|e| AppError::Internal(format!("solver task failed: {e}")))??;

    if !solved.timetable.complete {
        warn!(
            "Timetable is partial: {} course(s) unplaced",
            solved.timetable.unplaced.len()
        );
    }

    let solved = Arc::new(solved);
    *state.latest.write().await = Some(Arc::clone(&solved));
    Ok(solved)
}
