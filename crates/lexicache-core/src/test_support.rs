//! Scripted fetcher for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::net::{FetchError, Fetcher, Response};

enum Scripted {
    Respond(u16, Vec<u8>),
    Fail,
    Hang,
}

/// Answers from a fixed script and records every URL it is asked for.
/// Unscripted URLs get a 404.
#[derive(Default)]
pub struct ScriptedFetcher {
    script: HashMap<String, Scripted>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ok(mut self, url: &str, body: &str) -> Self {
        self.script
            .insert(url.to_string(), Scripted::Respond(200, body.as_bytes().to_vec()));
        self
    }

    pub fn status(mut self, url: &str, status: u16) -> Self {
        self.script
            .insert(url.to_string(), Scripted::Respond(status, Vec::new()));
        self
    }

    /// Transport failure: the request never gets a response.
    pub fn fail(mut self, url: &str) -> Self {
        self.script.insert(url.to_string(), Scripted::Fail);
        self
    }

    /// The request never completes.
    pub fn hang(mut self, url: &str) -> Self {
        self.script.insert(url.to_string(), Scripted::Hang);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_for(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<Response, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        match self.script.get(url) {
            Some(Scripted::Respond(status, body)) => Ok(Response::new(url, *status, body.clone())),
            Some(Scripted::Fail) => Err(FetchError::Timeout {
                url: url.to_string(),
                secs: 0,
            }),
            Some(Scripted::Hang) => futures::future::pending().await,
            None => Ok(Response::new(url, 404, "Not Found")),
        }
    }
}
