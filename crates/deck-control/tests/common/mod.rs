//! Scripted transport for driving controllers without a host backend

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use deck_gateway::{CommandArgs, CommandGateway, Transport};
use serde_json::{json, Value};
use tokio::sync::{watch, Semaphore};

/// What the transport answers for one call
#[derive(Debug, Clone)]
pub enum Reply {
    /// Resolve with a value
    Ok(Value),
    /// Reject with a reason
    Err(Value),
    /// Never answer
    Hang,
}

/// Transport that answers from per-command scripts and records every call
pub struct ScriptedTransport {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    gates: Mutex<HashMap<String, Arc<Semaphore>>>,
    calls: Mutex<Vec<(String, CommandArgs)>>,
    seen: watch::Sender<usize>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        let (seen, _) = watch::channel(0);
        Arc::new(Self {
            replies: Mutex::new(HashMap::new()),
            gates: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            seen,
        })
    }

    /// Queue a reply for `command`
    pub fn script(&self, command: &str, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .entry(command.to_string())
            .or_default()
            .push_back(reply);
    }

    /// Hold replies to `command` until [`release`](Self::release) is called
    pub fn gate(&self, command: &str) {
        self.gates
            .lock()
            .unwrap()
            .insert(command.to_string(), Arc::new(Semaphore::new(0)));
    }

    /// Let one held call to `command` reply
    pub fn release(&self, command: &str) {
        if let Some(gate) = self.gates.lock().unwrap().get(command) {
            gate.add_permits(1);
        }
    }

    /// Every call so far
    pub fn calls(&self) -> Vec<(String, CommandArgs)> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls made to `command`
    pub fn count(&self, command: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _)| c == command)
            .count()
    }

    /// Wait until at least `n` calls have arrived
    pub async fn wait_for_calls(&self, n: usize) {
        let mut rx = self.seen.subscribe();
        rx.wait_for(|seen| *seen >= n).await.unwrap();
    }

    pub fn gateway(self: &Arc<Self>) -> CommandGateway {
        CommandGateway::new(self.clone())
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn call(&self, command: &str, args: CommandArgs) -> Result<Value, Value> {
        self.calls
            .lock()
            .unwrap()
            .push((command.to_string(), args));
        self.seen.send_modify(|seen| *seen += 1);

        let gate = self.gates.lock().unwrap().get(command).cloned();
        if let Some(gate) = gate {
            gate.acquire().await.unwrap().forget();
        }

        let reply = self
            .replies
            .lock()
            .unwrap()
            .get_mut(command)
            .and_then(VecDeque::pop_front);

        match reply {
            Some(Reply::Ok(value)) => Ok(value),
            Some(Reply::Err(reason)) => Err(reason),
            Some(Reply::Hang) => std::future::pending().await,
            None => Err(json!(format!("no scripted reply for {command}"))),
        }
    }
}
