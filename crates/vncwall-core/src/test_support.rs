// In-memory backend for engine tests.

#![allow(clippy::unwrap_used)]

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use vncwall_api::{ListAction, ListMutation, NamedLists};

use crate::backend::Backend;
use crate::error::CoreError;
use crate::model::Server;

pub(crate) fn server(ip: &str, username: &str, excluded: bool) -> Server {
    Server {
        ip: ip.to_owned(),
        username: username.to_owned(),
        excluded,
        display_port: 6080,
    }
}

#[derive(Default)]
struct State {
    servers: Vec<Server>,
    lists: NamedLists,
    unreachable: HashSet<String>,
    probe_errors: HashSet<String>,
    reject_mutations: HashSet<String>,
    fail_fetch: bool,
    fetch_delay: Option<Duration>,
    probe_log: Vec<String>,
    fetch_count: usize,
    mutations: Vec<ListMutation>,
    toggles: Vec<(String, bool)>,
}

#[derive(Default)]
pub(crate) struct FakeBackend {
    state: Mutex<State>,
}

impl FakeBackend {
    pub(crate) fn new(servers: Vec<Server>) -> Self {
        let backend = Self::default();
        backend.set_servers(servers);
        backend
    }

    pub(crate) fn set_servers(&self, servers: Vec<Server>) {
        self.state.lock().unwrap().servers = servers;
    }

    pub(crate) fn set_lists(&self, lists: NamedLists) {
        self.state.lock().unwrap().lists = lists;
    }

    pub(crate) fn lists(&self) -> NamedLists {
        self.state.lock().unwrap().lists.clone()
    }

    pub(crate) fn set_unreachable(&self, ip: &str) {
        self.state.lock().unwrap().unreachable.insert(ip.to_owned());
    }

    pub(crate) fn fail_probe(&self, ip: &str) {
        self.state.lock().unwrap().probe_errors.insert(ip.to_owned());
    }

    /// Make exclude/include calls for `ip` fail.
    pub(crate) fn reject(&self, ip: &str) {
        self.state
            .lock()
            .unwrap()
            .reject_mutations
            .insert(ip.to_owned());
    }

    pub(crate) fn fail_fetch(&self, fail: bool) {
        self.state.lock().unwrap().fail_fetch = fail;
    }

    pub(crate) fn set_fetch_delay(&self, delay: Duration) {
        self.state.lock().unwrap().fetch_delay = Some(delay);
    }

    pub(crate) fn probe_log(&self) -> Vec<String> {
        self.state.lock().unwrap().probe_log.clone()
    }

    pub(crate) fn fetch_count(&self) -> usize {
        self.state.lock().unwrap().fetch_count
    }

    pub(crate) fn mutations(&self) -> Vec<ListMutation> {
        self.state.lock().unwrap().mutations.clone()
    }

    /// `(ip, excluded)` for every exclude/include call, in call order.
    pub(crate) fn toggles(&self) -> Vec<(String, bool)> {
        self.state.lock().unwrap().toggles.clone()
    }

    fn set_excluded(&self, ip: &str, excluded: bool) -> Result<(), CoreError> {
        let mut state = self.state.lock().unwrap();
        state.toggles.push((ip.to_owned(), excluded));
        if state.reject_mutations.contains(ip) {
            return Err(CoreError::Api {
                message: format!("rejected {ip}"),
                status: Some(500),
            });
        }
        match state.servers.iter_mut().find(|s| s.ip == ip) {
            Some(server) => {
                server.excluded = excluded;
                Ok(())
            }
            None => Err(CoreError::Api {
                message: "no such server".into(),
                status: Some(404),
            }),
        }
    }
}

impl Backend for FakeBackend {
    async fn fetch_servers(&self, include_excluded: bool) -> Result<Vec<Server>, CoreError> {
        let delay = {
            let mut state = self.state.lock().unwrap();
            state.fetch_count += 1;
            state.fetch_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let state = self.state.lock().unwrap();
        if state.fail_fetch {
            return Err(CoreError::ConnectionFailed {
                url: "fake://backend".into(),
                reason: "connection refused".into(),
            });
        }
        Ok(state
            .servers
            .iter()
            .filter(|s| include_excluded || !s.excluded)
            .cloned()
            .collect())
    }

    async fn check_reachable(&self, ip: &str, _port: u16) -> Result<bool, CoreError> {
        let mut state = self.state.lock().unwrap();
        state.probe_log.push(ip.to_owned());
        if state.probe_errors.contains(ip) {
            return Err(CoreError::Api {
                message: "probe failed".into(),
                status: Some(502),
            });
        }
        Ok(!state.unreachable.contains(ip))
    }

    async fn exclude(&self, ip: &str) -> Result<(), CoreError> {
        self.set_excluded(ip, true)
    }

    async fn include(&self, ip: &str) -> Result<(), CoreError> {
        self.set_excluded(ip, false)
    }

    async fn fetch_lists(&self) -> Result<NamedLists, CoreError> {
        Ok(self.state.lock().unwrap().lists.clone())
    }

    async fn mutate_list(&self, mutation: ListMutation) -> Result<(), CoreError> {
        let mut state = self.state.lock().unwrap();
        let members = state.lists.entry(mutation.list_name.clone()).or_default();
        match mutation.action {
            ListAction::Add => {
                for ip in &mutation.servers {
                    if !members.contains(ip) {
                        members.push(ip.clone());
                    }
                }
            }
            ListAction::Remove if mutation.servers.is_empty() => {
                state.lists.shift_remove(&mutation.list_name);
            }
            ListAction::Remove => members.retain(|ip| !mutation.servers.contains(ip)),
        }
        state.mutations.push(mutation);
        Ok(())
    }
}
