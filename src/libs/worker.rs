//! Off-thread clustering with one request in flight.
//!
//! A [`ClusterWorker`] belongs to one visualization. Each `submit` abandons
//! whatever was running before and starts a fresh thread, so only the most
//! recent request can ever produce a response. The abandoned thread has its
//! cancellation flag raised and stops at the next merge step; its result, if
//! any, goes nowhere.

use crate::libs::axis::{self, Axis, ClusterConfig, ClusteringResult};
use crate::libs::dendro::LeafOrder;
use crate::libs::distance::DistanceMetric;
use crate::libs::error::ClusterError;
use crate::libs::linkage::Linkage;
use crate::libs::matrix::Matrix;
use crate::libs::scale::Scaling;
use crossbeam::channel::{self, Receiver, RecvTimeoutError, TryRecvError};
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Messages accepted by the worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Request {
    Cluster(ClusterRequest),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterRequest {
    /// Signed so a negative dimension is reported as a shape error.
    pub nrows: i64,
    pub ncols: i64,
    #[serde(with = "nullable_f64")]
    pub values: Vec<f64>,
    #[serde(default)]
    pub axis: Axis,
    #[serde(default)]
    pub linkage: Linkage,
    #[serde(default)]
    pub distance: DistanceMetric,
    #[serde(default)]
    pub scaling: Scaling,
    #[serde(default, rename = "leafOrder")]
    pub leaf_order: LeafOrder,
}

impl ClusterRequest {
    pub fn new(matrix: &Matrix, config: &ClusterConfig) -> Self {
        Self {
            nrows: matrix.nrows() as i64,
            ncols: matrix.ncols() as i64,
            values: matrix.values().to_vec(),
            axis: config.axis,
            linkage: config.linkage,
            distance: config.distance,
            scaling: config.scaling,
            leaf_order: config.leaf_order,
        }
    }

    pub fn config(&self) -> ClusterConfig {
        ClusterConfig {
            axis: self.axis,
            linkage: self.linkage,
            distance: self.distance,
            scaling: self.scaling,
            leaf_order: self.leaf_order,
        }
    }
}

/// Messages sent back by the worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Response {
    Result(ClusterResponse),
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterResponse {
    pub row_order: Vec<u32>,
    pub col_order: Vec<u32>,
    #[serde(with = "nullable_f64")]
    pub values: Vec<f64>,
}

impl From<ClusteringResult> for ClusterResponse {
    fn from(result: ClusteringResult) -> Self {
        Self {
            row_order: result.row_order.iter().map(|&i| i as u32).collect(),
            col_order: result.col_order.iter().map(|&i| i as u32).collect(),
            values: result.values,
        }
    }
}

impl Response {
    pub fn error(err: impl std::fmt::Display) -> Self {
        Response::Error {
            message: err.to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error { .. })
    }
}

/// Run one request to completion on the current thread.
///
/// Shape errors are reported before any work starts.
pub fn process(request: Request) -> Response {
    process_cancellable(request, &AtomicBool::new(false))
}

/// [`process`], abandoning the clustering once `cancel` is set.
pub fn process_cancellable(request: Request, cancel: &AtomicBool) -> Response {
    let Request::Cluster(request) = request;
    let config = request.config();
    match Matrix::from_signed(request.nrows, request.ncols, request.values)
        .and_then(|matrix| axis::run_cancellable(&matrix, &config, cancel))
    {
        Ok((result, _)) => Response::Result(result.into()),
        Err(ClusterError::Cancelled) => Response::error(ClusterError::Cancelled),
        Err(err) => {
            log::warn!("clustering request failed: {}", err);
            Response::error(err)
        }
    }
}

/// Decode one JSON request; malformed input becomes a transport error.
pub fn parse_request(line: &str) -> Result<Request, ClusterError> {
    serde_json::from_str(line)
        .map_err(|e| ClusterError::Transport(format!("malformed request: {}", e)))
}

struct Job {
    generation: u64,
    rx: Receiver<Response>,
    cancel: Arc<AtomicBool>,
}

// A job that is dropped before answering is never read again; stop its thread
impl Drop for Job {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
    }
}

/// Handle to the clustering worker of one visualization.
#[derive(Default)]
pub struct ClusterWorker {
    current: Option<Job>,
    generation: u64,
}

impl ClusterWorker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `request` on a fresh thread, abandoning any in-flight one.
    ///
    /// The abandoned thread sees its cancellation flag at the next merge step
    /// and exits without answering. Returns the generation number of the new
    /// request.
    pub fn submit(&mut self, request: Request) -> u64 {
        self.spawn_job(move |cancel| process_cancellable(request, cancel))
    }

    fn spawn_job<F>(&mut self, job: F) -> u64
    where
        F: FnOnce(&AtomicBool) -> Response + Send + 'static,
    {
        if let Some(stale) = self.current.take() {
            log::debug!("abandoning clustering request #{}", stale.generation);
        }
        self.generation += 1;
        let generation = self.generation;

        let cancel = Arc::new(AtomicBool::new(false));
        let (tx, rx) = channel::bounded::<Response>(1);
        let spawned = thread::Builder::new()
            .name(format!("heatclust-worker-{}", generation))
            .spawn({
                let tx = tx.clone();
                let cancel = Arc::clone(&cancel);
                move || {
                    let response = panic::catch_unwind(AssertUnwindSafe(|| job(&cancel)))
                        .unwrap_or_else(|payload| {
                            Response::error(ClusterError::Transport(format!(
                                "worker panicked: {}",
                                panic_message(payload.as_ref())
                            )))
                        });
                    // The receiver is gone when the request was replaced
                    if tx.send(response).is_err() {
                        log::debug!("discarding result of replaced request #{}", generation);
                    }
                }
            });

        if let Err(err) = spawned {
            log::error!("cannot start worker for request #{}: {}", generation, err);
            // `rx` is alive and the channel is empty
            if tx
                .send(Response::error(ClusterError::Transport(format!(
                    "cannot start worker: {}",
                    err
                ))))
                .is_err()
            {
                log::error!("request #{} lost its spawn error", generation);
            }
        }

        self.current = Some(Job {
            generation,
            rx,
            cancel,
        });
        generation
    }

    /// Drop the in-flight request, if any.
    pub fn cancel(&mut self) {
        if let Some(job) = self.current.take() {
            log::debug!("cancelled clustering request #{}", job.generation);
        }
    }

    pub fn is_busy(&self) -> bool {
        self.current.is_some()
    }

    /// Generation of the in-flight request.
    pub fn generation(&self) -> Option<u64> {
        self.current.as_ref().map(|job| job.generation)
    }

    /// Receiver of the in-flight request, for use in `select!`.
    pub fn receiver(&self) -> Option<&Receiver<Response>> {
        self.current.as_ref().map(|job| &job.rx)
    }

    /// Take the response if it is ready.
    pub fn try_result(&mut self) -> Option<Response> {
        let job = self.current.as_ref()?;
        let response = match job.rx.try_recv() {
            Ok(response) => response,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => disconnected(),
        };
        self.current = None;
        Some(response)
    }

    /// Block until the in-flight request answers. `None` when idle.
    pub fn wait(&mut self) -> Option<Response> {
        let job = self.current.take()?;
        Some(job.rx.recv().unwrap_or_else(|_| disconnected()))
    }

    /// Like [`ClusterWorker::wait`], giving up after `timeout`.
    /// The request stays in flight on timeout.
    pub fn wait_timeout(&mut self, timeout: Duration) -> Option<Response> {
        let job = self.current.as_ref()?;
        let response = match job.rx.recv_timeout(timeout) {
            Ok(response) => response,
            Err(RecvTimeoutError::Timeout) => return None,
            Err(RecvTimeoutError::Disconnected) => disconnected(),
        };
        self.current = None;
        Some(response)
    }

    /// Record a message received through [`ClusterWorker::receiver`].
    pub fn complete(&mut self, received: Result<Response, channel::RecvError>) -> Response {
        self.current = None;
        received.unwrap_or_else(|_| disconnected())
    }
}

fn disconnected() -> Response {
    Response::error(ClusterError::Transport(
        "worker channel closed without a response".to_string(),
    ))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// JSON has no `NaN`; missing cells travel as `null`.
mod nullable_f64 {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(values.iter().map(|v| if v.is_finite() { Some(*v) } else { None }))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let values: Vec<Option<f64>> = Vec::deserialize(deserializer)?;
        Ok(values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(nrows: i64, ncols: i64, values: Vec<f64>) -> Request {
        Request::Cluster(ClusterRequest {
            nrows,
            ncols,
            values,
            axis: Axis::Both,
            linkage: Linkage::Average,
            distance: DistanceMetric::Euclidean,
            scaling: Scaling::None,
            leaf_order: LeafOrder::MinIndex,
        })
    }

    fn big_request(n: usize) -> Request {
        let values: Vec<f64> = (0..n * 8).map(|i| ((i * 7919) % 101) as f64).collect();
        request(n as i64, 8, values)
    }

    #[test]
    fn test_wire_format() {
        let line = r#"{"kind":"cluster","nrows":2,"ncols":2,"values":[1.0,null,3.0,4.0],
                      "axis":"Row","linkage":"Ward","distance":"Chebyshev"}"#;
        let Request::Cluster(req) = parse_request(line).unwrap();
        assert_eq!(req.axis, Axis::Row);
        assert_eq!(req.linkage, Linkage::Ward);
        assert_eq!(req.distance, DistanceMetric::Chebyshev);
        assert_eq!(req.scaling, Scaling::None);
        assert!(req.values[1].is_nan());

        let response = Response::Result(ClusterResponse {
            row_order: vec![1, 0],
            col_order: vec![0],
            values: vec![0.5, f64::NAN],
        });
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(
            json,
            r#"{"kind":"result","rowOrder":[1,0],"colOrder":[0],"values":[0.5,null]}"#
        );

        let json = serde_json::to_string(&Response::error("boom")).unwrap();
        assert_eq!(json, r#"{"kind":"error","message":"boom"}"#);
    }

    #[test]
    fn test_malformed_request() {
        let err = parse_request(r#"{"kind":"explode"}"#).unwrap_err();
        assert!(matches!(err, ClusterError::Transport(_)));
        assert!(parse_request("not json").is_err());
    }

    #[test]
    fn test_process_shape_errors() {
        let response = process(request(2, 2, vec![1.0, 2.0, 3.0]));
        assert!(response.is_error());

        let response = process(request(-1, 2, vec![]));
        match response {
            Response::Error { message } => assert!(message.contains("-1x2")),
            _ => panic!("expected an error"),
        }
    }

    #[test]
    fn test_process_result() {
        let response = process(request(
            4,
            3,
            vec![1.0, 2.0, 3.0, 2.0, 3.0, 4.0, 8.0, 8.0, 8.0, 0.0, 0.0, 0.0],
        ));
        match response {
            Response::Result(result) => {
                assert_eq!(result.row_order, vec![0, 1, 3, 2]);
                assert_eq!(result.col_order.len(), 3);
                assert_eq!(result.values.len(), 12);
            }
            Response::Error { message } => panic!("{}", message),
        }
    }

    #[test]
    fn test_worker_roundtrip() {
        let mut worker = ClusterWorker::new();
        assert!(!worker.is_busy());
        assert!(worker.wait().is_none());

        let generation = worker.submit(request(1, 1, vec![5.0]));
        assert_eq!(worker.generation(), Some(generation));

        let response = worker.wait().unwrap();
        assert_eq!(
            response,
            Response::Result(ClusterResponse {
                row_order: vec![0],
                col_order: vec![0],
                values: vec![5.0],
            })
        );
        assert!(!worker.is_busy());
    }

    #[test]
    fn test_worker_replacement() {
        let mut worker = ClusterWorker::new();
        let first = worker.submit(big_request(300));
        let second = worker.submit(request(2, 1, vec![0.0, 1.0]));
        assert!(second > first);
        assert_eq!(worker.generation(), Some(second));

        // only the latest request answers
        match worker.wait().unwrap() {
            Response::Result(result) => assert_eq!(result.row_order.len(), 2),
            Response::Error { message } => panic!("{}", message),
        }
        assert!(worker.try_result().is_none());
    }

    #[test]
    fn test_worker_cancel_and_timeout() {
        let mut worker = ClusterWorker::new();
        worker.submit(big_request(300));
        worker.cancel();
        assert!(!worker.is_busy());
        assert!(worker.wait_timeout(Duration::from_millis(10)).is_none());

        worker.submit(request(2, 2, vec![0.0; 3]));
        let response = worker.wait_timeout(Duration::from_secs(30)).unwrap();
        assert!(response.is_error());
    }

    #[test]
    fn test_worker_panic_is_an_error() {
        let mut worker = ClusterWorker::new();
        worker.spawn_job(|_| panic!("bad matrix"));
        match worker.wait_timeout(Duration::from_secs(30)).unwrap() {
            Response::Error { message } => {
                assert!(message.contains("worker panicked"));
                assert!(message.contains("bad matrix"));
            }
            other => panic!("expected an error, got {:?}", other),
        }

        // the worker stays usable
        worker.submit(request(1, 1, vec![5.0]));
        assert!(!worker.wait().unwrap().is_error());
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("static str");
        assert_eq!(panic_message(payload.as_ref()), "static str");
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
        let payload: Box<dyn std::any::Any + Send> = Box::new(42);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }

    #[test]
    fn test_replaced_job_is_cancelled() {
        let (seen_tx, seen_rx) = channel::bounded::<bool>(1);
        let (go_tx, go_rx) = channel::bounded::<()>(0);

        let mut worker = ClusterWorker::new();
        worker.spawn_job(move |cancel| {
            // hold until the job has been replaced
            let _ = go_rx.recv();
            let _ = seen_tx.send(cancel.load(Ordering::Relaxed));
            Response::error("stale")
        });
        worker.submit(request(1, 1, vec![1.0]));
        go_tx.send(()).unwrap();

        assert!(seen_rx.recv_timeout(Duration::from_secs(30)).unwrap());
        assert!(!worker.wait().unwrap().is_error());
    }

    #[test]
    fn test_process_cancelled() {
        let cancel = AtomicBool::new(true);
        match process_cancellable(big_request(10), &cancel) {
            Response::Error { message } => assert!(message.contains("cancelled")),
            other => panic!("expected an error, got {:?}", other),
        }
    }
}
