#![allow(dead_code)]
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sftp_relay::transfer::{Credentials, RemoteSession, Sleeper, TransferClient};
use sftp_relay::{Endpoint, TransferError};

/// How a scripted endpoint treats sessions and puts.
#[derive(Clone, Debug)]
pub enum Behavior {
    Healthy,
    RefuseConnect,
    /// Every put fails.
    FailPuts,
    /// The first `sessions` sessions fail once `files` puts have succeeded.
    FailAfter { files: usize, sessions: u32 },
    /// Puts of files with one of these names fail.
    RejectNames(Vec<String>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PutRecord {
    pub endpoint: Endpoint,
    pub local: PathBuf,
    pub remote: String,
    pub ok: bool,
}

#[derive(Default, Debug)]
pub struct State {
    pub connects: Vec<Endpoint>,
    pub puts: Vec<PutRecord>,
    pub sessions: HashMap<Endpoint, u32>,
    pub opened: u32,
    pub closed: u32,
}

#[derive(Clone, Default)]
pub struct ScriptedClient {
    behaviors: HashMap<Endpoint, Behavior>,
    pub state: Arc<Mutex<State>>,
}

impl ScriptedClient {
    pub fn new(behaviors: &[(Endpoint, Behavior)]) -> Self {
        Self { behaviors: behaviors.iter().cloned().collect(), state: Arc::default() }
    }

    pub fn connects(&self) -> Vec<Endpoint> {
        self.state.lock().unwrap().connects.clone()
    }

    /// Names of successfully put files on `ep`, in order.
    pub fn delivered(&self, ep: &Endpoint) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .puts
            .iter()
            .filter(|p| &p.endpoint == ep && p.ok)
            .map(|p| file_name(&p.local))
            .collect()
    }

    pub fn attempted_puts(&self, ep: &Endpoint) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .puts
            .iter()
            .filter(|p| &p.endpoint == ep)
            .map(|p| file_name(&p.local))
            .collect()
    }

    pub fn remote_paths(&self) -> Vec<String> {
        self.state.lock().unwrap().puts.iter().filter(|p| p.ok).map(|p| p.remote.clone()).collect()
    }

    pub fn open_closed(&self) -> (u32, u32) {
        let s = self.state.lock().unwrap();
        (s.opened, s.closed)
    }
}

impl TransferClient for ScriptedClient {
    fn connect(
        &self,
        endpoint: &Endpoint,
        _credentials: &Credentials,
    ) -> Result<Box<dyn RemoteSession>, TransferError> {
        let behavior = self.behaviors.get(endpoint).cloned().unwrap_or(Behavior::Healthy);
        let mut st = self.state.lock().unwrap();
        st.connects.push(endpoint.clone());
        if matches!(behavior, Behavior::RefuseConnect) {
            return Err(TransferError::Connect {
                addr: endpoint.addr(),
                msg: "connection refused".to_string(),
            });
        }
        let n = st.sessions.entry(endpoint.clone()).or_insert(0);
        *n += 1;
        let session_no = *n;
        st.opened += 1;
        Ok(Box::new(ScriptedSession {
            endpoint: endpoint.clone(),
            behavior,
            session_no,
            puts_ok: 0,
            closed: false,
            state: Arc::clone(&self.state),
        }))
    }
}

struct ScriptedSession {
    endpoint: Endpoint,
    behavior: Behavior,
    session_no: u32,
    puts_ok: usize,
    closed: bool,
    state: Arc<Mutex<State>>,
}

impl RemoteSession for ScriptedSession {
    fn put_file(&mut self, local: &Path, remote: &str) -> Result<(), TransferError> {
        let ok = match &self.behavior {
            Behavior::Healthy => true,
            Behavior::RefuseConnect | Behavior::FailPuts => false,
            Behavior::FailAfter { files, sessions } => {
                !(self.session_no <= *sessions && self.puts_ok >= *files)
            }
            Behavior::RejectNames(names) => !names.contains(&file_name(local)),
        };
        self.state.lock().unwrap().puts.push(PutRecord {
            endpoint: self.endpoint.clone(),
            local: local.to_path_buf(),
            remote: remote.to_string(),
            ok,
        });
        if ok {
            self.puts_ok += 1;
            Ok(())
        } else {
            Err(TransferError::RemoteIo {
                path: remote.to_string(),
                msg: "simulated remote write failure".to_string(),
            })
        }
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.state.lock().unwrap().closed += 1;
        }
    }
}

#[derive(Default)]
pub struct RecordingSleeper {
    pub waits: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().unwrap().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, d: Duration) {
        self.waits.lock().unwrap().push(d);
    }
}

pub fn endpoints(n: u16) -> Vec<Endpoint> {
    (0..n).map(|i| Endpoint::new(format!("sftp-{}", i), 2222 + i)).collect()
}

pub fn credentials() -> Credentials {
    Credentials {
        username: "sftpuser".to_string(),
        private_key: PathBuf::from("/dev/null"),
        passphrase: None,
    }
}

pub fn file_name(p: &Path) -> String {
    p.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
}

/// `dir/name` files with small contents; returns the directory path.
pub fn populate(dir: &Path, names: &[&str]) -> PathBuf {
    for name in names {
        let p = dir.join(name);
        if let Some(parent) = p.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&p, name.as_bytes()).unwrap();
    }
    dir.to_path_buf()
}
