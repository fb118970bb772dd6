use std::collections::{HashMap, HashSet};
use std::future::ready;
use std::sync::Mutex;

use runjob::auth::RegistryCredentials;
use runjob::container::{
    ContainerEngine, ContainerSpec, ContainerStatus, EngineError, EngineFuture, EngineResult,
    NetworkSummary,
};
use runjob::parse::ImageReference;

/// One call made against the fake engine, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Pull {
        repository: String,
        tag: String,
        registry: String,
        username: Option<String>,
    },
    Create(ContainerSpec),
    ListNetworks(String),
    Connect {
        network_id: String,
        container_id: String,
    },
    Start(String),
    Inspect(String),
    Remove(String),
}

/// Engine operations that can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Pull,
    Create,
    ListNetworks,
    Connect,
    Start,
    Inspect,
    Remove,
}

/// How a container behaves once started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behaviour {
    /// Report running for `polls` inspections after start, then stopped
    /// with exit code `code`.
    ExitAfter { polls: usize, code: i64 },
    NeverExits,
}

#[derive(Debug)]
struct FakeContainer {
    behaviour: Behaviour,
    started: bool,
    polls: usize,
}

#[derive(Debug)]
struct State {
    calls: Vec<EngineCall>,
    containers: HashMap<String, FakeContainer>,
    networks: Vec<NetworkSummary>,
    failures: HashSet<Operation>,
    new_container_behaviour: Behaviour,
    next_id: u64,
}

/// A scripted in-memory container engine.
///
/// - records every call (see [`FakeEngine::calls`])
/// - containers created through it follow a configurable [`Behaviour`]
///   (default: one running poll, then exit code 0)
/// - any operation can be made to fail with [`FakeEngine::failing`]
/// - the network list filter is a substring match, like Docker's
#[derive(Debug)]
pub struct FakeEngine {
    state: Mutex<State>,
}

impl Default for FakeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeEngine {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                calls: Vec::new(),
                containers: HashMap::new(),
                networks: Vec::new(),
                failures: HashSet::new(),
                new_container_behaviour: Behaviour::ExitAfter { polls: 1, code: 0 },
                next_id: 1,
            }),
        }
    }

    /// Behaviour of containers created from now on.
    pub fn with_behaviour(self, behaviour: Behaviour) -> Self {
        self.state.lock().unwrap().new_container_behaviour = behaviour;
        self
    }

    /// Register a pre-existing container.
    pub fn with_container(self, id: &str, behaviour: Behaviour) -> Self {
        self.state.lock().unwrap().containers.insert(
            id.to_string(),
            FakeContainer {
                behaviour,
                started: false,
                polls: 0,
            },
        );
        self
    }

    pub fn with_network(self, id: &str, name: &str) -> Self {
        self.state.lock().unwrap().networks.push(NetworkSummary {
            id: id.to_string(),
            name: name.to_string(),
        });
        self
    }

    pub fn failing(self, operation: Operation) -> Self {
        self.state.lock().unwrap().failures.insert(operation);
        self
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, operation: Operation) -> usize {
        self.calls()
            .iter()
            .filter(|call| operation_of(call) == operation)
            .count()
    }

    pub fn created(&self) -> Vec<ContainerSpec> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                EngineCall::Create(spec) => Some(spec),
                _ => None,
            })
            .collect()
    }

    pub fn removed(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                EngineCall::Remove(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    /// Whether a container with this id still exists.
    pub fn exists(&self, id: &str) -> bool {
        self.state.lock().unwrap().containers.contains_key(id)
    }

    fn record(&self, call: EngineCall) -> std::sync::MutexGuard<'_, State> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        state
    }
}

fn operation_of(call: &EngineCall) -> Operation {
    match call {
        EngineCall::Pull { .. } => Operation::Pull,
        EngineCall::Create(_) => Operation::Create,
        EngineCall::ListNetworks(_) => Operation::ListNetworks,
        EngineCall::Connect { .. } => Operation::Connect,
        EngineCall::Start(_) => Operation::Start,
        EngineCall::Inspect(_) => Operation::Inspect,
        EngineCall::Remove(_) => Operation::Remove,
    }
}

fn check(state: &State, operation: Operation) -> EngineResult<()> {
    if state.failures.contains(&operation) {
        return Err(EngineError::Other(format!("injected {operation:?} failure")));
    }
    Ok(())
}

impl ContainerEngine for FakeEngine {
    fn pull_image<'a>(
        &'a self,
        image: &'a ImageReference,
        credentials: Option<&'a RegistryCredentials>,
    ) -> EngineFuture<'a, ()> {
        let state = self.record(EngineCall::Pull {
            repository: image.repository.clone(),
            tag: image.tag.clone(),
            registry: image.registry.clone(),
            username: credentials.map(|c| c.username.clone()),
        });
        Box::pin(ready(check(&state, Operation::Pull)))
    }

    fn create_container<'a>(&'a self, spec: &'a ContainerSpec) -> EngineFuture<'a, String> {
        let mut state = self.record(EngineCall::Create(spec.clone()));
        let result = check(&state, Operation::Create).map(|()| {
            let id = format!("fake-{}", state.next_id);
            state.next_id += 1;
            let behaviour = state.new_container_behaviour;
            state.containers.insert(
                id.clone(),
                FakeContainer {
                    behaviour,
                    started: false,
                    polls: 0,
                },
            );
            id
        });
        Box::pin(ready(result))
    }

    fn list_networks<'a>(&'a self, name: &'a str) -> EngineFuture<'a, Vec<NetworkSummary>> {
        let state = self.record(EngineCall::ListNetworks(name.to_string()));
        let result = check(&state, Operation::ListNetworks).map(|()| {
            state
                .networks
                .iter()
                .filter(|n| n.name.contains(name))
                .cloned()
                .collect()
        });
        Box::pin(ready(result))
    }

    fn connect_network<'a>(
        &'a self,
        network_id: &'a str,
        container_id: &'a str,
    ) -> EngineFuture<'a, ()> {
        let state = self.record(EngineCall::Connect {
            network_id: network_id.to_string(),
            container_id: container_id.to_string(),
        });
        Box::pin(ready(check(&state, Operation::Connect)))
    }

    fn start_container<'a>(&'a self, container_id: &'a str) -> EngineFuture<'a, ()> {
        let mut state = self.record(EngineCall::Start(container_id.to_string()));
        let result = check(&state, Operation::Start).and_then(|()| {
            match state.containers.get_mut(container_id) {
                Some(container) => {
                    container.started = true;
                    Ok(())
                }
                None => Err(EngineError::NotFound(container_id.to_string())),
            }
        });
        Box::pin(ready(result))
    }

    fn inspect_container<'a>(
        &'a self,
        container_id: &'a str,
    ) -> EngineFuture<'a, ContainerStatus> {
        let mut state = self.record(EngineCall::Inspect(container_id.to_string()));
        let result = check(&state, Operation::Inspect).and_then(|()| {
            let container = state
                .containers
                .get_mut(container_id)
                .ok_or_else(|| EngineError::NotFound(container_id.to_string()))?;

            if !container.started {
                return Ok(ContainerStatus {
                    running: false,
                    exit_code: 0,
                });
            }

            container.polls += 1;
            Ok(match container.behaviour {
                Behaviour::NeverExits => ContainerStatus {
                    running: true,
                    exit_code: 0,
                },
                Behaviour::ExitAfter { polls, code } if container.polls > polls => {
                    ContainerStatus {
                        running: false,
                        exit_code: code,
                    }
                }
                Behaviour::ExitAfter { .. } => ContainerStatus {
                    running: true,
                    exit_code: 0,
                },
            })
        });
        Box::pin(ready(result))
    }

    fn remove_container<'a>(&'a self, container_id: &'a str) -> EngineFuture<'a, ()> {
        let mut state = self.record(EngineCall::Remove(container_id.to_string()));
        let result = check(&state, Operation::Remove).and_then(|()| {
            state
                .containers
                .remove(container_id)
                .map(|_| ())
                .ok_or_else(|| EngineError::NotFound(container_id.to_string()))
        });
        Box::pin(ready(result))
    }
}
