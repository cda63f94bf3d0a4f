//! Scripted in-memory transport for tests.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;

use super::{BoxError, BoxFuture, HttpResponse, HttpTransport};

#[derive(Debug, Clone)]
pub(crate) enum Scripted {
    Status(u16, &'static str),
    NetworkError,
}

#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub(crate) method: &'static str,
    pub(crate) url: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Option<Value>,
}

#[derive(Debug, Clone)]
pub(crate) struct FakeTransport {
    state: Arc<Mutex<FakeTransportState>>,
}

#[derive(Debug)]
struct FakeTransportState {
    script: VecDeque<Scripted>,
    fallback: Scripted,
    calls: Vec<RecordedCall>,
}

impl FakeTransport {
    /// Plays `script` in order, then repeats `fallback` forever.
    pub(crate) fn new(script: Vec<Scripted>, fallback: Scripted) -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeTransportState {
                script: script.into(),
                fallback,
                calls: Vec::new(),
            })),
        }
    }

    pub(crate) fn always(response: Scripted) -> Self {
        Self::new(Vec::new(), response)
    }

    pub(crate) fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().unwrap().calls.clone()
    }

    fn respond(&self, call: RecordedCall) -> Result<HttpResponse, BoxError> {
        let next = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(call);
            let fallback = state.fallback.clone();
            state.script.pop_front().unwrap_or(fallback)
        };
        match next {
            Scripted::Status(status, body) => Ok(HttpResponse {
                status,
                body: body.to_owned(),
            }),
            Scripted::NetworkError => Err(Box::new(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))),
        }
    }
}

impl HttpTransport for FakeTransport {
    fn post_json<'a>(
        &'a self,
        url: &'a str,
        headers: &'a [(String, String)],
        body: &'a Value,
        _timeout: Duration,
    ) -> BoxFuture<'a, Result<HttpResponse, BoxError>> {
        Box::pin(async move {
            self.respond(RecordedCall {
                method: "POST",
                url: url.to_owned(),
                headers: headers.to_vec(),
                body: Some(body.clone()),
            })
        })
    }

    fn get<'a>(
        &'a self,
        url: &'a str,
        headers: &'a [(String, String)],
        _timeout: Duration,
    ) -> BoxFuture<'a, Result<HttpResponse, BoxError>> {
        Box::pin(async move {
            self.respond(RecordedCall {
                method: "GET",
                url: url.to_owned(),
                headers: headers.to_vec(),
                body: None,
            })
        })
    }
}
